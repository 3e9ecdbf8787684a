//! Behavior-driven tests for watchlist ingestion and screening.

use std::io::Write;

use trendscan_core::{ScanConfig, Symbol, Watchlist, WatchlistError};

const EXCHANGE_EXPORT: &str = "\
Symbol,Name,Last Sale,Net Change,% Change,Market Cap,Country,Volume
NVDA,NVIDIA Corporation Common Stock,\"$1,120.25\",12.10,1.09%,2760000000000,United States,45120300
PENNY,Penny Holdings,$3.15,0.05,1.61%,10000000,United States,9000000
THIN,Thin Float Inc,$48.00,0.50,1.05%,90000000,United States,150000
MSFT,Microsoft Corporation Common Stock,$410.30,-1.20,-0.29%,3050000000000,United States,21000500
,Missing Symbol Co,$20.00,0.00,0.00%,0,United States,500000
";

fn names(symbols: &[Symbol]) -> Vec<&str> {
    symbols.iter().map(Symbol::as_str).collect()
}

#[test]
fn when_an_exchange_export_is_screened_system_keeps_liquid_priced_names() {
    // Given: an exchange screener export with dollar-formatted prices
    let watchlist = Watchlist::parse(EXCHANGE_EXPORT).expect("export parses");

    // When: screened with the default floors (15.00, 200k shares)
    let candidates = watchlist.screen(&ScanConfig::default());

    // Then: cheap and illiquid names drop out, order is preserved
    assert_eq!(names(&candidates), vec!["NVDA", "MSFT"]);
    assert_eq!(watchlist.skipped(), 1);
}

#[test]
fn when_floors_are_lowered_system_admits_more_names() {
    let watchlist = Watchlist::parse(EXCHANGE_EXPORT).expect("export parses");
    let config = ScanConfig {
        min_price: 1.0,
        min_volume: 100_000,
        ..ScanConfig::default()
    };

    let candidates = watchlist.screen(&config);

    assert_eq!(names(&candidates), vec!["NVDA", "PENNY", "THIN", "MSFT"]);
}

#[test]
fn when_watchlist_is_read_from_disk_system_parses_it() {
    // Given: a watchlist file using the short column aliases
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "ticker,last,vol").expect("write header");
    writeln!(file, "amd,160.5,52000000").expect("write row");

    // When
    let watchlist = Watchlist::read_from(file.path()).expect("file parses");

    // Then
    assert_eq!(watchlist.len(), 1);
    assert_eq!(watchlist.entries()[0].symbol.as_str(), "AMD");
    assert_eq!(watchlist.entries()[0].last_price, 160.5);
}

#[test]
fn when_watchlist_file_does_not_exist_system_reports_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("absent.csv");

    let error = Watchlist::read_from(&missing).expect_err("missing file");

    assert!(matches!(error, WatchlistError::Io { .. }));
    assert!(error.to_string().contains("absent.csv"));
}

#[test]
fn when_price_column_is_missing_system_reports_detected_columns() {
    let error = Watchlist::parse("Symbol,Name,Volume\nAAPL,Apple,100\n").expect_err("no price");

    let message = error.to_string();
    assert!(message.contains("missing price column"), "{message}");
    assert!(message.contains("symbol, name, volume"), "{message}");
}
