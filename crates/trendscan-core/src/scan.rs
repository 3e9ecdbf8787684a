//! Scan orchestration: benchmark first, then bounded fan-out over candidates.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::analyzer::{AnalysisResult, AnalysisRules, CandidateAnalyzer, Outcome, UnavailableReason};
use crate::data_source::MarketDataClient;
use crate::{BenchmarkContext, HistoryPeriod, ScanError, Symbol, ValidationError};

/// Upper bound on how many candidates one scan may dispatch.
pub const MAX_CANDIDATE_LIMIT: usize = 40;
/// Upper bound on simultaneously in-flight provider fetches.
pub const MAX_CONCURRENCY: usize = 64;

const DEFAULT_CONCURRENCY: usize = 10;
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(60);

/// Per-request scan thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    pub min_price: f64,
    pub min_volume: u64,
    /// Candidates past this many are never dispatched.
    pub candidate_limit: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_price: 15.0,
            min_volume: 200_000,
            candidate_limit: 35,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.min_price.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "min_price" });
        }
        if self.min_price < 0.0 {
            return Err(ValidationError::NegativeValue { field: "min_price" });
        }
        if self.candidate_limit == 0 || self.candidate_limit > MAX_CANDIDATE_LIMIT {
            return Err(ValidationError::InvalidCandidateLimit {
                value: self.candidate_limit,
                max: MAX_CANDIDATE_LIMIT,
            });
        }
        Ok(())
    }
}

/// Process-wide orchestrator settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSettings {
    pub concurrency: usize,
    pub fetch_timeout: Duration,
    pub scan_timeout: Duration,
    pub benchmark: Symbol,
    pub benchmark_period: HistoryPeriod,
    pub history_period: HistoryPeriod,
    pub rules: AnalysisRules,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
            benchmark: Symbol::from_static("SPY"),
            benchmark_period: HistoryPeriod::SixMonths,
            history_period: HistoryPeriod::OneYear,
            rules: AnalysisRules::default(),
        }
    }
}

impl ScanSettings {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    pub fn with_benchmark(mut self, benchmark: Symbol) -> Self {
        self.benchmark = benchmark;
        self
    }

    pub fn with_rules(mut self, rules: AnalysisRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            return Err(ValidationError::InvalidConcurrency {
                value: self.concurrency,
                max: MAX_CONCURRENCY,
            });
        }
        if self.fetch_timeout.is_zero() {
            return Err(ValidationError::ZeroTimeout {
                field: "fetch_timeout",
            });
        }
        if self.scan_timeout.is_zero() {
            return Err(ValidationError::ZeroTimeout {
                field: "scan_timeout",
            });
        }
        self.rules.validate()
    }
}

/// Outcome of one dispatched candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateOutcome {
    pub symbol: Symbol,
    pub outcome: Outcome,
}

/// Counts describing one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub requested: usize,
    pub dispatched: usize,
    pub qualified: usize,
    pub not_qualified: usize,
    pub unavailable: usize,
    pub elapsed_ms: u64,
}

/// Everything a scan produced, outcomes in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub scan_id: Uuid,
    /// `None` only when nothing was dispatched.
    pub benchmark: Option<BenchmarkContext>,
    pub results: Vec<AnalysisResult>,
    pub outcomes: Vec<CandidateOutcome>,
    pub summary: ScanSummary,
}

/// Top-level entry point of the screener.
///
/// Holds no state across scans; one orchestrator can serve any number of
/// concurrent requests.
pub struct ScanOrchestrator {
    client: Arc<dyn MarketDataClient>,
    settings: ScanSettings,
}

impl ScanOrchestrator {
    pub fn new(
        client: Arc<dyn MarketDataClient>,
        settings: ScanSettings,
    ) -> Result<Self, ValidationError> {
        settings.validate()?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Qualifying candidates, in input order.
    pub async fn scan(
        &self,
        candidates: &[Symbol],
        config: &ScanConfig,
    ) -> Result<Vec<AnalysisResult>, ScanError> {
        Ok(self.scan_report(candidates, config).await?.results)
    }

    pub async fn scan_report(
        &self,
        candidates: &[Symbol],
        config: &ScanConfig,
    ) -> Result<ScanReport, ScanError> {
        let scan_id = Uuid::new_v4();
        let span = info_span!("scan", %scan_id, provider = self.client.name());
        self.run(scan_id, candidates, config).instrument(span).await
    }

    async fn run(
        &self,
        scan_id: Uuid,
        candidates: &[Symbol],
        config: &ScanConfig,
    ) -> Result<ScanReport, ScanError> {
        config.validate()?;
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.settings.scan_timeout;

        let dispatch = &candidates[..candidates.len().min(config.candidate_limit)];
        if dispatch.len() < candidates.len() {
            debug!(
                requested = candidates.len(),
                limit = config.candidate_limit,
                "candidate list truncated"
            );
        }

        if dispatch.is_empty() {
            info!(requested = candidates.len(), "no candidates to scan");
            return Ok(ScanReport {
                scan_id,
                benchmark: None,
                results: Vec::new(),
                outcomes: Vec::new(),
                summary: ScanSummary {
                    requested: candidates.len(),
                    dispatched: 0,
                    qualified: 0,
                    not_qualified: 0,
                    unavailable: 0,
                    elapsed_ms: elapsed_ms(started),
                },
            });
        }

        let benchmark = tokio::time::timeout_at(
            deadline,
            BenchmarkContext::fetch(
                self.client.as_ref(),
                &self.settings.benchmark,
                self.settings.benchmark_period,
                self.settings.rules.rs_lookback,
                self.settings.fetch_timeout,
            ),
        )
        .await
        .map_err(|_| {
            warn!(
                benchmark = %self.settings.benchmark,
                scan_timeout_ms = self.settings.scan_timeout.as_millis() as u64,
                "scan deadline elapsed while fetching the benchmark"
            );
            ScanError::BenchmarkUnavailable {
                symbol: self.settings.benchmark.clone(),
                reason: format!(
                    "scan deadline of {}ms elapsed before the benchmark arrived",
                    self.settings.scan_timeout.as_millis()
                ),
            }
        })??;
        let benchmark = Arc::new(benchmark);

        let analyzer = CandidateAnalyzer::new(
            Arc::clone(&self.client),
            Arc::new(Semaphore::new(self.settings.concurrency)),
            self.settings.history_period,
            self.settings.fetch_timeout,
            self.settings.rules,
        );

        let mut tasks = JoinSet::new();
        for (index, symbol) in dispatch.iter().cloned().enumerate() {
            let analyzer = analyzer.clone();
            let benchmark = Arc::clone(&benchmark);
            tasks.spawn(async move {
                let outcome = AssertUnwindSafe(analyzer.analyze(&symbol, &benchmark))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| {
                        Outcome::Unavailable(UnavailableReason::Panicked(panic_message(payload)))
                    });
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<Outcome>> = vec![None; dispatch.len()];
        let mut deadline_hit = false;
        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((index, outcome)))) => slots[index] = Some(outcome),
                Ok(Some(Err(error))) => warn!(%error, "candidate task ended abnormally"),
                Ok(None) => break,
                Err(_) => {
                    deadline_hit = true;
                    tasks.abort_all();
                    break;
                }
            }
        }
        if deadline_hit {
            warn!(
                timeout_ms = self.settings.scan_timeout.as_millis() as u64,
                unfinished = slots.iter().filter(|slot| slot.is_none()).count(),
                "scan deadline elapsed, aborting in-flight candidates"
            );
        }

        let outcomes: Vec<CandidateOutcome> = dispatch
            .iter()
            .zip(slots)
            .map(|(symbol, slot)| {
                let outcome = slot.unwrap_or_else(|| {
                    let reason = if deadline_hit {
                        UnavailableReason::ScanDeadline
                    } else {
                        UnavailableReason::Panicked(String::from("task did not report an outcome"))
                    };
                    Outcome::Unavailable(reason)
                });
                log_outcome(symbol, &outcome);
                CandidateOutcome {
                    symbol: symbol.clone(),
                    outcome,
                }
            })
            .collect();

        let results: Vec<AnalysisResult> = outcomes
            .iter()
            .filter_map(|candidate| candidate.outcome.result().cloned())
            .collect();
        let summary = summarize(candidates.len(), &outcomes, elapsed_ms(started));
        info!(
            requested = summary.requested,
            dispatched = summary.dispatched,
            qualified = summary.qualified,
            not_qualified = summary.not_qualified,
            unavailable = summary.unavailable,
            elapsed_ms = summary.elapsed_ms,
            "scan complete"
        );

        Ok(ScanReport {
            scan_id,
            benchmark: Some(benchmark.as_ref().clone()),
            results,
            outcomes,
            summary,
        })
    }
}

fn log_outcome(symbol: &Symbol, outcome: &Outcome) {
    match outcome {
        Outcome::Qualified(result) => debug!(
            %symbol,
            classification = result.classification.label(),
            rs_rating = result.rs_rating,
            "candidate qualified"
        ),
        Outcome::NotQualified(rejection) => debug!(%symbol, %rejection, "candidate not qualified"),
        Outcome::Unavailable(reason) => warn!(%symbol, %reason, "candidate unavailable"),
    }
}

fn summarize(requested: usize, outcomes: &[CandidateOutcome], elapsed_ms: u64) -> ScanSummary {
    let mut summary = ScanSummary {
        requested,
        dispatched: outcomes.len(),
        qualified: 0,
        not_qualified: 0,
        unavailable: 0,
        elapsed_ms,
    };
    for candidate in outcomes {
        match candidate.outcome {
            Outcome::Qualified(_) => summary.qualified += 1,
            Outcome::NotQualified(_) => summary.not_qualified += 1,
            Outcome::Unavailable(_) => summary.unavailable += 1,
        }
    }
    summary
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("unknown panic payload")
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
