//! Batch module - one run over a record set.
//!
//! - `orchestrator` - validates, then renders and dispatches each record
//! - `summary` - per-record reports and their reduction into a summary

pub mod orchestrator;
pub mod summary;

pub use orchestrator::{employee_id_for, BatchOrchestrator};
pub use summary::{BatchSummary, ChannelCounters, RecordReport, RecordStatus};
