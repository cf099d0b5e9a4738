//! Metrics collection abstraction for the slot table and the resource pool.
//!
//! Backends (prometheus, ...) implement [`MetricsBackend`] and are passed to
//! [`crate::SlotTable`] and [`crate::ResourcePool`] at construction.
mod backend;
pub use backend::{MetricsBackend, MetricsHandle, PoolOutcome, SlotOutcome};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
