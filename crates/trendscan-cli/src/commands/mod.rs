mod scan;
mod serve;

use std::sync::Arc;
use std::time::Duration;

use trendscan_core::{ScanOrchestrator, ScanSettings, Symbol, YahooChartClient};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    let client = YahooChartClient::default().with_timeout_ms(cli.fetch_timeout_ms);
    let orchestrator = ScanOrchestrator::new(Arc::new(client), settings(cli)?)?;

    match &cli.command {
        Command::Scan(args) => scan::run(args, &orchestrator).await,
        Command::Serve(args) => serve::run(args, orchestrator).await,
    }
}

fn settings(cli: &Cli) -> Result<ScanSettings, CliError> {
    Ok(ScanSettings::default()
        .with_concurrency(cli.concurrency)
        .with_fetch_timeout(Duration::from_millis(cli.fetch_timeout_ms))
        .with_scan_timeout(Duration::from_millis(cli.scan_timeout_ms))
        .with_benchmark(Symbol::parse(&cli.benchmark)?))
}
