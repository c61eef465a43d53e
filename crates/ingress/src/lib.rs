//! # Ingress
//!
//! HTTP adapter in front of the dispatcher.
//!
//! - `POST /ingest`: decode, validate, `submit`; 202 / 400 / 503
//! - `GET /health`: sink probe plus queue occupancy; 200 / 503

mod error;
mod routes;

pub use error::IngressError;
pub use routes::{router, HealthResponse};

use std::future::Future;
use std::time::Duration;

use dispatcher::{DispatcherHandle, SinkProbe};
use tokio::net::TcpListener;
use tracing::info;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// Producer handle into the dispatcher queue
    pub dispatcher: DispatcherHandle,
    /// Reachability check behind `/health`
    pub probe: SinkProbe,
    /// Upper bound for one probe
    pub health_timeout: Duration,
}

/// Serve until `shutdown` resolves, then finish in-flight requests
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP server stopped");
    Ok(())
}
