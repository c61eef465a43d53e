//! EventPayload - wire shape of `POST /ingest`
//!
//! Everything is optional at the serde level so that missing required
//! fields surface as `MissingField` instead of a generic decode error.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::net::IpAddr;
use uuid::Uuid;
use validator::Validate;

use crate::{AuditEvent, ContractError, EventType, Metadata, Severity};

/// Raw client-submitted event
///
/// Length limits match the column widths of the events table.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct EventPayload {
    pub id: Option<Uuid>,
    pub event_type: Option<String>,
    pub severity: Option<String>,
    #[validate(length(max = 100))]
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[validate(length(max = 255))]
    pub endpoint: Option<String>,
    #[validate(length(max = 10))]
    pub http_method: Option<String>,
    pub status_code: Option<i32>,
    pub metadata: Option<Metadata>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl EventPayload {
    /// Decode a request body
    pub fn from_slice(body: &[u8]) -> Result<Self, ContractError> {
        serde_json::from_slice(body).map_err(|source| ContractError::MalformedPayload { source })
    }

    /// Validate and default-fill into an `AuditEvent`
    ///
    /// `now` becomes `ingested_at`, and `occurred_at` when the client sent none.
    /// A missing or nil `id` is replaced with a fresh v4 UUID.
    pub fn into_event(self, now: DateTime<Utc>) -> Result<AuditEvent, ContractError> {
        let event_type: EventType = required(self.event_type.as_deref(), "event_type")?
            .parse()
            .map_err(|e| ContractError::invalid_field("event_type", e))?;
        let severity: Severity = required(self.severity.as_deref(), "severity")?
            .parse()
            .map_err(|e| ContractError::invalid_field("severity", e))?;
        let ip_address: IpAddr = required(self.ip_address.as_deref(), "ip_address")?
            .trim()
            .parse()
            .map_err(|_| ContractError::unparseable_field("ip_address"))?;

        self.validate().map_err(|errors| {
            let field = errors
                .field_errors()
                .keys()
                .next()
                .map(|k| k.to_string())
                .unwrap_or_else(|| "payload".to_string());
            ContractError::invalid_field(field, "exceeds maximum length")
        })?;

        let id = match self.id {
            Some(id) if !id.is_nil() => id,
            _ => Uuid::new_v4(),
        };

        Ok(AuditEvent {
            id,
            event_type,
            severity,
            user_id: self.user_id,
            ip_address,
            user_agent: self.user_agent,
            endpoint: self.endpoint,
            http_method: self.http_method,
            status_code: self.status_code,
            metadata: self.metadata,
            occurred_at: self.occurred_at.unwrap_or(now),
            ingested_at: now,
        })
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ContractError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ContractError::missing_field(field)),
    }
}
