//! Structured logging for PriceSnap.
//!
//! Console plus daily-rolling NDJSON output, secret redaction, and record lifecycle events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{RecordEvent, RecordEventEntry, RecordEventLogger};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
