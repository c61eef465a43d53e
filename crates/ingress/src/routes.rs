//! `/ingest` and `/health` handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use chrono::Utc;
use contracts::EventPayload;
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use crate::error::IngressError;
use crate::AppState;

/// Build the HTTP router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ingest", post(ingest).fallback(method_not_allowed))
        .route("/health", get(health).fallback(method_not_allowed))
        .with_state(state)
}

/// Accept one event; never waits for persistence
#[instrument(name = "ingest", skip_all, fields(bytes = body.len()))]
async fn ingest(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, &'static str), IngressError> {
    let event = EventPayload::from_slice(&body)?.into_event(Utc::now())?;
    let event_id = event.id;

    state.dispatcher.submit(event)?;

    debug!(%event_id, "Event queued");
    Ok((StatusCode::ACCEPTED, "Event queued for ingestion"))
}

/// `/health` response document
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub buffer_usage: String,
    pub buffer_size: usize,
    pub buffer_cap: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Sink reachability plus queue occupancy
#[instrument(name = "health", skip_all)]
async fn health(State(state): State<AppState>) -> Response {
    let error = if state.dispatcher.is_closed() {
        Some("dispatcher is shutting down".to_string())
    } else {
        match timeout(state.health_timeout, state.probe.check()).await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some(format!(
                "sink '{}' probe timed out after {}ms",
                state.probe.name(),
                state.health_timeout.as_millis()
            )),
        }
    };

    let dispatcher = &state.dispatcher;
    let status = if let Some(e) = &error {
        warn!(error = %e, "Health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    let response = HealthResponse {
        status: if error.is_none() { "healthy" } else { "unhealthy" },
        buffer_usage: format!("{:.1}%", dispatcher.usage_percent()),
        buffer_size: dispatcher.queue_len(),
        buffer_cap: dispatcher.queue_capacity(),
        error,
    };
    (status, Json(response)).into_response()
}

async fn method_not_allowed() -> (StatusCode, &'static str) {
    (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}
