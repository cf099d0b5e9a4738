//! Prometheus metrics backend for the launcher.
//!
//! [`PrometheusMetrics`] implements [`hl_core::metrics::MetricsBackend`]; pass it to the slot
//! table and the resource pool, then expose [`PrometheusMetrics::gather`] however the host
//! application serves metrics.
//!
//! ```rust
//! use std::sync::Arc;
//! use hl_prometheus::{Encoder, PrometheusMetrics, TextEncoder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = Arc::new(PrometheusMetrics::new()?);
//! let handle: hl_core::metrics::MetricsHandle = metrics.clone();
//! # let _ = handle;
//!
//! let mut buffer = Vec::new();
//! TextEncoder::new().encode(&metrics.gather(), &mut buffer)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `hl_slot_allocations_total{outcome}` - Counter
//! - `hl_slot_releases_total` - Counter
//! - `hl_resources_acquired_total{engine, outcome}` - Counter
//! - `hl_resources_evicted_total{engine}` - Counter
//! - `hl_resources_closed_total{engine}` - Counter
//! - `hl_materialization_failures_total{engine}` - Counter
mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
