//! AuditEvent - Ingress output, Dispatcher input
//!
//! One ingested security/audit record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use uuid::Uuid;

/// Free-form event metadata
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Accepted audit event
///
/// Immutable once handed to the dispatcher: the queue owns it while pending,
/// the consumer loop moves it into a batch, and sinks only ever borrow it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique identifier
    pub id: Uuid,

    /// Event category
    pub event_type: EventType,

    /// Severity
    pub severity: Severity,

    /// Actor identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Originating network address
    pub ip_address: IpAddr,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Request path the event refers to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,

    /// When the event happened at the source
    pub occurred_at: DateTime<Utc>,

    /// When the event was accepted for ingestion
    pub ingested_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Event with a fresh id and only the required fields set
    pub fn new(
        event_type: EventType,
        severity: Severity,
        ip_address: IpAddr,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            severity,
            user_id: None,
            ip_address,
            user_agent: None,
            endpoint: None,
            http_method: None,
            status_code: None,
            metadata: None,
            occurred_at: now,
            ingested_at: now,
        }
    }
}

/// Event category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    AuthAttempt,
    ApiCall,
    AdminAction,
    DataAccess,
    ConfigChange,
}

impl EventType {
    pub const ALL: [EventType; 5] = [
        EventType::AuthAttempt,
        EventType::ApiCall,
        EventType::AdminAction,
        EventType::DataAccess,
        EventType::ConfigChange,
    ];

    /// Wire / storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::AuthAttempt => "auth_attempt",
            EventType::ApiCall => "api_call",
            EventType::AdminAction => "admin_action",
            EventType::DataAccess => "data_access",
            EventType::ConfigChange => "config_change",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown event type '{s}'"))
    }
}

/// Event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    /// Wire / storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("unknown severity '{s}'"))
    }
}
