//! Contract every `MarketDataClient` implementation must honour: the
//! requested symbol comes back, bars are strictly chronological, and an
//! unknown symbol is reported as `NotFound` rather than a transport error.

#[path = "../common/mod.rs"]
mod common;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

use trendscan_core::{
    HistoryPeriod, HistoryRequest, HttpClient, HttpError, HttpRequest, HttpResponse,
    MarketDataClient, SourceErrorKind, StaticSource, Symbol, YahooChartClient,
};

const AAPL_CHART: &str = r#"{
    "chart": {
        "result": [{
            "meta": { "symbol": "AAPL" },
            "timestamp": [1704205800, 1704292200, 1704378600, 1704465000],
            "indicators": {
                "quote": [{
                    "open":   [185.0, 184.2, 182.1, 181.9],
                    "high":   [186.1, 185.9, 183.0, 182.7],
                    "low":    [183.9, 183.4, 180.9, 180.2],
                    "close":  [185.6, 184.3, 181.9, 181.2],
                    "volume": [82488700, 58414500, 71983600, 62303300]
                }]
            }
        }],
        "error": null
    }
}"#;

/// Serves the AAPL chart and 404s everything else.
struct CannedChartHttp;

impl HttpClient for CannedChartHttp {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let response = if request.url.contains("/chart/AAPL?") {
            HttpResponse::ok_json(AAPL_CHART)
        } else {
            HttpResponse::new(404, r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#)
        };
        Box::pin(async move { Ok(response) })
    }
}

struct ProviderCase {
    name: &'static str,
    source: Arc<dyn MarketDataClient>,
}

fn provider_cases() -> Vec<ProviderCase> {
    vec![
        ProviderCase {
            name: "static",
            source: Arc::new(
                StaticSource::new()
                    .with_series(common::series("AAPL", common::rising_bars(4, 180.0, 1.0))),
            ),
        },
        ProviderCase {
            name: "yahoo",
            source: Arc::new(YahooChartClient::with_http_client(Arc::new(CannedChartHttp))),
        },
    ]
}

fn request(symbol: &str) -> HistoryRequest {
    HistoryRequest::new(
        Symbol::parse(symbol).expect("valid symbol"),
        HistoryPeriod::OneYear,
    )
}

#[test]
fn history_is_returned_for_the_requested_symbol() {
    for case in provider_cases() {
        assert_eq!(case.source.name(), case.name);
        let series = block_on(case.source.fetch_history(request("AAPL")))
            .unwrap_or_else(|error| panic!("provider '{}' history failed: {error}", case.name));

        assert_eq!(series.symbol().as_str(), "AAPL", "provider '{}'", case.name);
        assert_eq!(series.len(), 4, "provider '{}': bar count", case.name);
    }
}

#[test]
fn bars_are_strictly_chronological_and_well_formed() {
    for case in provider_cases() {
        let series = block_on(case.source.fetch_history(request("AAPL")))
            .unwrap_or_else(|error| panic!("provider '{}' history failed: {error}", case.name));

        for pair in series.bars().windows(2) {
            assert!(pair[0].ts < pair[1].ts, "provider '{}': ordering", case.name);
        }
        for bar in series.bars() {
            assert!(bar.high >= bar.low, "provider '{}': range", case.name);
            assert!(bar.close > 0.0, "provider '{}': close", case.name);
        }
    }
}

#[test]
fn unknown_symbols_are_reported_as_not_found() {
    for case in provider_cases() {
        let error = block_on(case.source.fetch_history(request("ZZZZ")))
            .expect_err("unknown symbol must fail");

        assert_eq!(
            error.kind(),
            SourceErrorKind::NotFound,
            "provider '{}': error kind",
            case.name
        );
        assert_eq!(error.code(), "source.not_found");
        assert!(!error.retryable());
    }
}

fn block_on<F>(future: F) -> F::Output
where
    F: Future,
{
    let waker = noop_waker();
    let mut context = Context::from_waker(&waker);
    let mut future = std::pin::pin!(future);

    loop {
        match future.as_mut().poll(&mut context) {
            Poll::Ready(output) => return output,
            Poll::Pending => std::thread::yield_now(),
        }
    }
}

fn noop_waker() -> Waker {
    // SAFETY: the vtable functions never dereference the data pointer.
    unsafe { Waker::from_raw(noop_raw_waker()) }
}

fn noop_raw_waker() -> RawWaker {
    RawWaker::new(std::ptr::null(), &NOOP_RAW_WAKER_VTABLE)
}

unsafe fn noop_clone(_: *const ()) -> RawWaker {
    noop_raw_waker()
}

unsafe fn noop(_: *const ()) {}

static NOOP_RAW_WAKER_VTABLE: RawWakerVTable =
    RawWakerVTable::new(noop_clone, noop, noop, noop);
