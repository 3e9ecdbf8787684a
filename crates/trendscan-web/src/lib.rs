//! HTTP surface for the trendscan screener.
//!
//! | Route | Description |
//! |-------|-------------|
//! | `GET /` | Liveness probe |
//! | `POST /scan` | Multipart watchlist upload, returns qualifying candidates |

pub mod error;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use trendscan_core::ScanOrchestrator;

pub use error::ApiError;
pub use routes::build_router;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ScanOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: ScanOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

/// Binds `addr` and serves until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "trendscan api listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
