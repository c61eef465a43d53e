//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the ingestion service.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - All timestamps are UTC (`chrono::DateTime<Utc>`)
//! - `occurred_at` is client-supplied (defaults to acceptance time),
//!   `ingested_at` is stamped when the event is accepted,
//!   `created_at` is computed by the sink at write time

mod config;
mod error;
mod event;
mod payload;
mod sink;

pub use config::*;
pub use error::*;
pub use event::*;
pub use payload::*;
pub use sink::*;
