//! Shared developer log: a bounded, batched, cross-process append log.
//!
//! Every process appends to its own in-memory queue; a background flusher writes queued
//! entries to one shared text file under an advisory file lock, after a short debounce
//! window. The file is trimmed to the configured capacity after flushes.
//!
//! Logging never fails its caller: storage errors are reported on the `hl_devlog::diag`
//! tracing target and the affected batch is retried on the next flush.
mod config;
pub use config::DevLogConfig;

mod entry;
pub use entry::{LogEntry, LogLevel};

mod error;
pub use error::DevLogError;

mod file;

mod log;
pub use log::{CLEAR_MESSAGE, CLEAR_TAG, DevLog};

/// Tracing target used for the log's own diagnostics.
///
/// Layers that mirror tracing events into a [`DevLog`] must skip this target.
pub const DIAG_TARGET: &str = "hl_devlog::diag";
