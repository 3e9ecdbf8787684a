use tracing::info;
use trendscan_core::{ScanConfig, ScanOrchestrator, Symbol, Watchlist};

use crate::cli::ScanArgs;
use crate::error::CliError;
use crate::output;

pub async fn run(args: &ScanArgs, orchestrator: &ScanOrchestrator) -> Result<(), CliError> {
    let config = ScanConfig {
        min_price: args.min_price,
        min_volume: args.min_volume,
        candidate_limit: args.limit,
    };
    config.validate()?;

    let candidates = candidates(args, &config)?;
    let report = orchestrator.scan_report(&candidates, &config).await?;

    if args.report {
        output::render_report(&report, args.format, args.pretty)
    } else {
        output::render_results(&report.results, args.format, args.pretty)
    }
}

fn candidates(args: &ScanArgs, config: &ScanConfig) -> Result<Vec<Symbol>, CliError> {
    let Some(path) = &args.watchlist else {
        return args
            .symbols
            .iter()
            .map(|raw| Symbol::parse(raw).map_err(CliError::from))
            .collect();
    };

    let watchlist = Watchlist::read_from(path)?;
    let screened = watchlist.screen(config);
    info!(
        path = %path.display(),
        rows = watchlist.len(),
        skipped = watchlist.skipped(),
        candidates = screened.len(),
        "watchlist screened"
    );
    Ok(screened)
}
