use crate::metrics::backend::{MetricsBackend, PoolOutcome, SlotOutcome};

/// No-op metrics backend that compiles to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_slot_allocated(&self, _: SlotOutcome) {}

    #[inline(always)]
    fn record_slot_released(&self) {}

    #[inline(always)]
    fn record_resource_acquired(&self, _: &str, _: PoolOutcome) {}

    #[inline(always)]
    fn record_resource_evicted(&self, _: &str) {}

    #[inline(always)]
    fn record_resource_closed(&self, _: &str) {}

    #[inline(always)]
    fn record_materialization_failed(&self, _: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_metrics_is_zero_size() {
        assert_eq!(std::mem::size_of::<NoOpMetrics>(), 0);
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(SlotOutcome::Evicted.as_label(), "evicted");
        assert_eq!(PoolOutcome::Reloaded.as_label(), "reloaded");
    }

    #[test]
    fn noop_can_be_called_repeatedly() {
        let metrics = NoOpMetrics;
        for _ in 0..1000 {
            metrics.record_slot_allocated(SlotOutcome::Hit);
            metrics.record_slot_released();
            metrics.record_resource_acquired("test", PoolOutcome::Created);
            metrics.record_resource_evicted("test");
            metrics.record_resource_closed("test");
            metrics.record_materialization_failed("test");
        }
    }
}
