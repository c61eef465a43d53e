//! EventSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for persistence backends.

use crate::{AuditEvent, ContractError};

/// Batch persistence trait
///
/// All sink implementations must implement this trait.
/// The dispatcher owns its sink exclusively, so `write_batch` is never
/// called concurrently with itself.
#[trait_variant::make(EventSink: Send)]
pub trait LocalEventSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Durably commit a batch of events
    ///
    /// Atomic: either every event in `batch` is committed or none is.
    /// `batch` is never empty.
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write_batch(&mut self, batch: &[AuditEvent]) -> Result<(), ContractError>;

    /// Release resources; called once when the dispatcher stops
    async fn close(&mut self) -> Result<(), ContractError>;
}
