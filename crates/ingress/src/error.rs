//! Ingress error types and their HTTP mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use contracts::ContractError;
use dispatcher::SubmitError;
use thiserror::Error;
use tracing::debug;

/// Why an ingest request was not accepted
#[derive(Debug, Error)]
pub enum IngressError {
    /// Event document rejected (400)
    #[error(transparent)]
    Validation(#[from] ContractError),

    /// Dispatcher refused the event (503)
    #[error(transparent)]
    Rejected(#[from] SubmitError),
}

impl IngressError {
    pub fn status(&self) -> StatusCode {
        match self {
            IngressError::Validation(_) => StatusCode::BAD_REQUEST,
            IngressError::Rejected(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Plain-text response body
    pub fn body(&self) -> String {
        match self {
            IngressError::Validation(e) => e.to_string(),
            IngressError::Rejected(SubmitError::BufferFull { .. }) => {
                "Buffer full, try again later".to_string()
            }
            IngressError::Rejected(SubmitError::ShuttingDown) => {
                "Service shutting down".to_string()
            }
        }
    }
}

impl IntoResponse for IngressError {
    fn into_response(self) -> Response {
        if let IngressError::Validation(e) = &self {
            let field = e.field().unwrap_or("unknown");
            observability::record_invalid_event(field);
            debug!(field, error = %e, "Event rejected");
        }
        (self.status(), self.body()).into_response()
    }
}
