use trendscan_core::ScanOrchestrator;
use trendscan_web::AppState;

use crate::cli::ServeArgs;
use crate::error::CliError;

pub async fn run(args: &ServeArgs, orchestrator: ScanOrchestrator) -> Result<(), CliError> {
    trendscan_web::serve(args.bind, AppState::new(orchestrator)).await?;
    Ok(())
}
