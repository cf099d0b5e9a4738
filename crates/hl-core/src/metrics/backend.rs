use std::sync::Arc;

/// Slot allocation decision for metrics classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOutcome {
    /// Content already owned a slot.
    Hit,
    /// Content got a free slot.
    Fresh,
    /// Content took the slot of the least recently used content.
    Evicted,
}

impl SlotOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            SlotOutcome::Hit => "hit",
            SlotOutcome::Fresh => "fresh",
            SlotOutcome::Evicted => "evicted",
        }
    }
}

/// Resource acquisition result for metrics classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolOutcome {
    /// Existing resource returned without materialization.
    Hit,
    /// New resource materialized.
    Created,
    /// Existing resource re-materialized in place.
    Reloaded,
}

impl PoolOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            PoolOutcome::Hit => "hit",
            PoolOutcome::Created => "created",
            PoolOutcome::Reloaded => "reloaded",
        }
    }
}

/// Backend metrics collection interface.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record one slot allocation.
    fn record_slot_allocated(&self, outcome: SlotOutcome);
    /// Record a release that actually freed a slot.
    fn record_slot_released(&self);
    /// Record a resource handed out by the pool.
    ///
    /// # Arguments
    /// - `engine`: Engine name
    /// - `outcome`: Whether the resource was reused, created or reloaded
    fn record_resource_acquired(&self, engine: &str, outcome: PoolOutcome);
    /// Record an LRU eviction from the pool.
    fn record_resource_evicted(&self, engine: &str);
    /// Record an explicit close.
    fn record_resource_closed(&self, engine: &str);
    /// Record a failed materialization.
    ///
    /// Failed attempts never leave a resource in the pool.
    fn record_materialization_failed(&self, engine: &str);
}

/// Shared handle to metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
