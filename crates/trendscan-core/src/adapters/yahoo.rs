use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::data_source::{HistoryFuture, HistoryRequest, MarketDataClient, SourceError};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::{Bar, BarSeries, Symbol, UtcDateTime};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

// ============================================================================
// Yahoo Chart Client
// ============================================================================

/// Daily history from the Yahoo Finance v8 chart endpoint.
///
/// Prices are split/dividend adjusted by default: when the payload carries
/// an `adjclose` array each OHLC value of a row is scaled by
/// `adjclose / close`.
#[derive(Clone)]
pub struct YahooChartClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
    auto_adjust: bool,
}

impl Default for YahooChartClient {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::default()))
    }
}

impl YahooChartClient {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(DEFAULT_BASE_URL),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            auto_adjust: true,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_auto_adjust(mut self, auto_adjust: bool) -> Self {
        self.auto_adjust = auto_adjust;
        self
    }

    fn chart_url(&self, req: &HistoryRequest) -> String {
        format!(
            "{}/v8/finance/chart/{}?range={}&interval=1d&includePrePost=false&events=div%2Csplit",
            self.base_url,
            urlencoding::encode(req.symbol.as_str()),
            req.period.as_str(),
        )
    }

    async fn fetch_chart(&self, req: HistoryRequest) -> Result<BarSeries, SourceError> {
        let request = HttpRequest::get(self.chart_url(&req))
            .with_header("referer", "https://finance.yahoo.com/")
            .with_header("accept", "application/json")
            .with_timeout_ms(self.timeout_ms);

        let response = self.http_client.execute(request).await.map_err(|error| {
            if error.timed_out() {
                SourceError::timeout(format!("yahoo chart timed out: {}", error.message()))
            } else {
                SourceError::unavailable(format!("yahoo transport error: {}", error.message()))
            }
        })?;

        match response.status {
            404 => return Err(SourceError::not_found(&req.symbol)),
            429 => {
                return Err(SourceError::rate_limited(
                    "yahoo returned status 429 (too many requests)",
                ))
            }
            status if !response.is_success() => {
                return Err(SourceError::unavailable(format!(
                    "yahoo returned status {status}"
                )))
            }
            _ => {}
        }

        parse_chart(&req.symbol, &response.body, self.auto_adjust)
    }
}

impl MarketDataClient for YahooChartClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn fetch_history<'a>(&'a self, req: HistoryRequest) -> HistoryFuture<'a> {
        Box::pin(self.fetch_chart(req))
    }
}

// ============================================================================
// Payload decoding
// ============================================================================

fn parse_chart(symbol: &Symbol, body: &str, auto_adjust: bool) -> Result<BarSeries, SourceError> {
    let chart_response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = chart_response.chart.error {
        if error.code.eq_ignore_ascii_case("not found") {
            return Err(SourceError::not_found(symbol));
        }
        return Err(SourceError::unavailable(format!(
            "yahoo chart API error: {} ({})",
            error.description.unwrap_or_default(),
            error.code
        )));
    }

    let result = chart_response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| SourceError::not_found(symbol))?;

    // Listed symbols without sessions in range come back with no timestamps.
    let Some(timestamps) = result.timestamp else {
        return BarSeries::new(symbol.clone(), Vec::new())
            .map_err(|e| SourceError::malformed(e.to_string()));
    };

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::malformed("no quote data in yahoo chart"))?;
    let adjclose = if auto_adjust {
        result
            .indicators
            .adjclose
            .and_then(|values| values.into_iter().next())
            .map(|values| values.adjclose)
    } else {
        None
    };

    let mut bars: Vec<Bar> = Vec::with_capacity(timestamps.len());
    let mut inconsistent = 0_usize;
    for (i, &ts_value) in timestamps.iter().enumerate() {
        let (Some(Some(open)), Some(Some(high)), Some(Some(low)), Some(Some(close))) = (
            quote.open.get(i),
            quote.high.get(i),
            quote.low.get(i),
            quote.close.get(i),
        ) else {
            continue;
        };

        let factor = adjclose
            .as_ref()
            .and_then(|values| values.get(i).copied().flatten())
            .filter(|adjusted| *close > 0.0 && adjusted.is_finite())
            .map_or(1.0, |adjusted| adjusted / close);
        let volume = quote
            .volume
            .get(i)
            .copied()
            .flatten()
            .map_or(0, |v| v.max(0) as u64);

        let ts = UtcDateTime::from_unix_timestamp(ts_value)
            .map_err(|e| SourceError::malformed(e.to_string()))?;
        // Rows with open or close outside high/low do occur upstream.
        let Ok(bar) = Bar::new(
            ts,
            open * factor,
            high * factor,
            low * factor,
            close * factor,
            volume,
        ) else {
            inconsistent += 1;
            continue;
        };

        // During market hours the live session is repeated with an intraday stamp.
        match bars.last_mut() {
            Some(previous) if previous.ts.date() == bar.ts.date() => *previous = bar,
            _ => bars.push(bar),
        }
    }
    if inconsistent > 0 {
        debug!(%symbol, inconsistent, "skipped yahoo rows with inconsistent OHLC");
    }

    BarSeries::new(symbol.clone(), bars).map_err(|e| SourceError::malformed(e.to_string()))
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    quote: Vec<YahooChartQuote>,
    #[serde(default)]
    adjclose: Option<Vec<YahooAdjClose>>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooAdjClose {
    adjclose: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::SourceErrorKind;
    use crate::http_client::{HttpError, HttpResponse};
    use crate::HistoryPeriod;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct RecordingHttpClient {
        response: Result<HttpResponse, HttpError>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingHttpClient {
        fn responding(response: Result<HttpResponse, HttpError>) -> Self {
            Self {
                response,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .clone()
        }
    }

    impl HttpClient for RecordingHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    fn request(symbol: &str) -> HistoryRequest {
        HistoryRequest::new(
            Symbol::parse(symbol).expect("valid symbol"),
            HistoryPeriod::OneYear,
        )
    }

    const CHART_BODY: &str = r#"{
        "chart": {
            "result": [{
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open":   [100.0, null, 102.0],
                        "high":   [101.0, 103.0, 104.0],
                        "low":    [99.0, 100.0, 101.0],
                        "close":  [100.5, 102.5, 103.0],
                        "volume": [1000, 2000, null]
                    }],
                    "adjclose": [{ "adjclose": [50.25, 51.25, 51.5] }]
                }
            }],
            "error": null
        }
    }"#;

    #[tokio::test]
    async fn requests_one_year_of_daily_bars() {
        let client = Arc::new(RecordingHttpClient::responding(Ok(HttpResponse::ok_json(
            CHART_BODY,
        ))));
        let adapter = YahooChartClient::with_http_client(client.clone())
            .with_base_url("https://chart.example.test/")
            .with_timeout_ms(2_500);

        adapter
            .fetch_history(request("aapl"))
            .await
            .expect("chart should parse");

        let requests = client.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url,
            "https://chart.example.test/v8/finance/chart/AAPL?range=1y&interval=1d&includePrePost=false&events=div%2Csplit"
        );
        assert_eq!(requests[0].timeout_ms, 2_500);
    }

    #[tokio::test]
    async fn skips_null_rows_and_applies_adjustment() {
        let client = Arc::new(RecordingHttpClient::responding(Ok(HttpResponse::ok_json(
            CHART_BODY,
        ))));
        let adapter = YahooChartClient::with_http_client(client);

        let series = adapter
            .fetch_history(request("AAPL"))
            .await
            .expect("chart should parse");

        assert_eq!(series.len(), 2, "row with null open is skipped");
        let first = &series.bars()[0];
        assert!((first.close - 50.25).abs() < 1e-9);
        assert!((first.high - 50.5).abs() < 1e-9);
        assert_eq!(first.volume, 1000);
        assert_eq!(series.bars()[1].volume, 0, "null volume becomes zero");
    }

    #[tokio::test]
    async fn unadjusted_mode_keeps_raw_prices() {
        let client = Arc::new(RecordingHttpClient::responding(Ok(HttpResponse::ok_json(
            CHART_BODY,
        ))));
        let adapter = YahooChartClient::with_http_client(client).with_auto_adjust(false);

        let series = adapter
            .fetch_history(request("AAPL"))
            .await
            .expect("chart should parse");

        assert!((series.bars()[0].close - 100.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn chart_not_found_maps_to_not_found() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let client = Arc::new(RecordingHttpClient::responding(Ok(HttpResponse::new(
            200, body,
        ))));
        let adapter = YahooChartClient::with_http_client(client);

        let error = adapter
            .fetch_history(request("DELISTED"))
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::NotFound);
    }

    #[tokio::test]
    async fn status_codes_are_classified() {
        let cases = [
            (404, SourceErrorKind::NotFound),
            (429, SourceErrorKind::RateLimited),
            (503, SourceErrorKind::Unavailable),
        ];

        for (status, expected) in cases {
            let client = Arc::new(RecordingHttpClient::responding(Ok(HttpResponse::new(
                status, "",
            ))));
            let adapter = YahooChartClient::with_http_client(client);
            let error = adapter
                .fetch_history(request("MSFT"))
                .await
                .expect_err("must fail");
            assert_eq!(error.kind(), expected, "status {status}");
        }
    }

    #[tokio::test]
    async fn transport_timeout_maps_to_timeout() {
        let client = Arc::new(RecordingHttpClient::responding(Err(HttpError::timeout(
            "operation timed out",
        ))));
        let adapter = YahooChartClient::with_http_client(client);

        let error = adapter
            .fetch_history(request("MSFT"))
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Timeout);
    }

    #[tokio::test]
    async fn garbage_body_is_malformed() {
        let client = Arc::new(RecordingHttpClient::responding(Ok(HttpResponse::ok_json(
            "<html>oops</html>",
        ))));
        let adapter = YahooChartClient::with_http_client(client);

        let error = adapter
            .fetch_history(request("MSFT"))
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Malformed);
    }

    #[tokio::test]
    async fn inconsistent_rows_are_skipped() {
        let body = r#"{"chart":{"result":[{"timestamp":[1704205800,1704292200],"indicators":{"quote":[{"open":[10.0,10.0],"high":[9.0,11.0],"low":[11.0,9.5],"close":[10.0,10.5],"volume":[5,6]}]}}],"error":null}}"#;
        let client = Arc::new(RecordingHttpClient::responding(Ok(HttpResponse::ok_json(
            body,
        ))));
        let adapter = YahooChartClient::with_http_client(client);

        let series = adapter
            .fetch_history(request("MSFT"))
            .await
            .expect("one bad row must not sink the series");

        assert_eq!(series.len(), 1);
        assert_eq!(series.bars()[0].ts.unix_timestamp(), 1_704_292_200);
    }

    #[tokio::test]
    async fn live_session_row_replaces_the_same_day_bar() {
        // 1704220000 is later on the same UTC day as the 1704205800 session open.
        let body = r#"{"chart":{"result":[{"timestamp":[1704205800,1704220000],"indicators":{"quote":[{"open":[10.0,10.0],"high":[11.0,12.0],"low":[9.0,9.0],"close":[10.5,11.5],"volume":[100,250]}]}}],"error":null}}"#;
        let client = Arc::new(RecordingHttpClient::responding(Ok(HttpResponse::ok_json(
            body,
        ))));
        let adapter = YahooChartClient::with_http_client(client);

        let series = adapter
            .fetch_history(request("MSFT"))
            .await
            .expect("chart should parse");

        assert_eq!(series.len(), 1);
        let bar = &series.bars()[0];
        assert!((bar.close - 11.5).abs() < 1e-9);
        assert_eq!(bar.volume, 250);
    }
}
