use std::sync::Arc;

use hl_core::metrics::{MetricsBackend, PoolOutcome, SlotOutcome};
use prometheus::{IntCounter, IntCounterVec, Opts, Registry, proto::MetricFamily};

const NAMESPACE: &str = "hl";

/// Prometheus metrics backend.
///
/// Label values are bounded: `outcome` comes from [`SlotOutcome`] / [`PoolOutcome`] and
/// `engine` from [`hl_core::Engine::name`].
#[derive(Clone)]
pub struct PrometheusMetrics {
    slot_allocations: IntCounterVec,
    slot_releases: IntCounter,
    resources_acquired: IntCounterVec,
    resources_evicted: IntCounterVec,
    resources_closed: IntCounterVec,
    materialization_failures: IntCounterVec,
    registry: Arc<Registry>,
}

fn counter_vec(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<IntCounterVec, prometheus::Error> {
    let counter = IntCounterVec::new(Opts::new(name, help).namespace(NAMESPACE), labels)?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

impl PrometheusMetrics {
    /// Register the launcher metrics in `registry`.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let slot_allocations = counter_vec(
            &registry,
            "slot_allocations_total",
            "Slot allocations by decision",
            &["outcome"],
        )?;

        let slot_releases = IntCounter::with_opts(
            Opts::new("slot_releases_total", "Slot bindings released").namespace(NAMESPACE),
        )?;
        registry.register(Box::new(slot_releases.clone()))?;

        let resources_acquired = counter_vec(
            &registry,
            "resources_acquired_total",
            "Resources handed out by the pool",
            &["engine", "outcome"],
        )?;
        let resources_evicted = counter_vec(
            &registry,
            "resources_evicted_total",
            "Resources destroyed by LRU eviction",
            &["engine"],
        )?;
        let resources_closed = counter_vec(
            &registry,
            "resources_closed_total",
            "Resources destroyed by explicit close",
            &["engine"],
        )?;
        let materialization_failures = counter_vec(
            &registry,
            "materialization_failures_total",
            "Content that failed to load into a resource",
            &["engine"],
        )?;

        Ok(Self {
            slot_allocations,
            slot_releases,
            resources_acquired,
            resources_evicted,
            resources_closed,
            materialization_failures,
            registry,
        })
    }

    /// Register the launcher metrics in a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    /// Gather all metric families for exposition.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_slot_allocated(&self, outcome: SlotOutcome) {
        self.slot_allocations
            .with_label_values(&[outcome.as_label()])
            .inc();
    }

    fn record_slot_released(&self) {
        self.slot_releases.inc();
    }

    fn record_resource_acquired(&self, engine: &str, outcome: PoolOutcome) {
        self.resources_acquired
            .with_label_values(&[engine, outcome.as_label()])
            .inc();
    }

    fn record_resource_evicted(&self, engine: &str) {
        self.resources_evicted.with_label_values(&[engine]).inc();
    }

    fn record_resource_closed(&self, engine: &str) {
        self.resources_closed.with_label_values(&[engine]).inc();
    }

    fn record_materialization_failed(&self, engine: &str) {
        self.materialization_failures
            .with_label_values(&[engine])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hl_core::{ResourcePool, SlotTable, metrics::MetricsHandle};
    use hl_model::{ContentId, LoadSpec, ViewId};
    use hl_store::MemoryKvStore;

    use super::*;

    fn family<'a>(families: &'a [MetricFamily], name: &str) -> &'a MetricFamily {
        families
            .iter()
            .find(|f| f.name() == name)
            .unwrap_or_else(|| panic!("metric {name} not found"))
    }

    #[test]
    fn metric_names_carry_the_namespace() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.record_slot_allocated(SlotOutcome::Fresh);
        metrics.record_slot_released();
        metrics.record_resource_acquired("headless", PoolOutcome::Created);
        metrics.record_resource_evicted("headless");
        metrics.record_resource_closed("headless");
        metrics.record_materialization_failed("headless");

        let families = metrics.gather();
        for name in [
            "hl_slot_allocations_total",
            "hl_slot_releases_total",
            "hl_resources_acquired_total",
            "hl_resources_evicted_total",
            "hl_resources_closed_total",
            "hl_materialization_failures_total",
        ] {
            family(&families, name);
        }
    }

    #[test]
    fn allocation_outcomes_are_separate_series() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.record_slot_allocated(SlotOutcome::Hit);
        metrics.record_slot_allocated(SlotOutcome::Hit);
        metrics.record_slot_allocated(SlotOutcome::Evicted);

        let families = metrics.gather();
        assert_eq!(family(&families, "hl_slot_allocations_total").get_metric().len(), 2);
        assert_eq!(metrics.slot_allocations.with_label_values(&["hit"]).get(), 2);
        assert_eq!(metrics.slot_allocations.with_label_values(&["evicted"]).get(), 1);
    }

    #[test]
    fn slot_table_reports_its_decisions() {
        let metrics = Arc::new(PrometheusMetrics::new().unwrap());
        let handle: MetricsHandle = metrics.clone();
        let table = SlotTable::new(Arc::new(MemoryKvStore::new()), 1)
            .unwrap()
            .with_metrics(handle);

        table.allocate(ContentId::new(1)).unwrap();
        table.allocate(ContentId::new(1)).unwrap();
        table.allocate(ContentId::new(2)).unwrap();
        table.release(ContentId::new(2)).unwrap();
        table.release(ContentId::new(2)).unwrap();

        let by = |outcome: &str| metrics.slot_allocations.with_label_values(&[outcome]).get();
        assert_eq!((by("fresh"), by("hit"), by("evicted")), (1, 1, 1));
        assert_eq!(metrics.slot_releases.get(), 1);
    }

    struct NullEngine;

    impl hl_core::Engine for NullEngine {
        type Handle = ();

        fn name(&self) -> &'static str {
            "null"
        }

        fn materialize(&self, spec: &LoadSpec) -> Result<(), hl_core::EngineError> {
            if spec.payload.is_empty() {
                return Err(hl_core::EngineError::Load("empty document".into()));
            }
            Ok(())
        }

        fn attach(&self, _: &mut (), _: ViewId) -> Result<(), hl_core::EngineError> {
            Ok(())
        }

        fn detach(&self, _: &mut (), _: ViewId) {}

        fn destroy(&self, _: ()) {}
    }

    #[test]
    fn pool_reports_lifecycle_events() {
        let metrics = Arc::new(PrometheusMetrics::new().unwrap());
        let handle: MetricsHandle = metrics.clone();
        let pool = ResourcePool::new(NullEngine, 1).unwrap().with_metrics(handle);
        let spec = |id: u64, body: &str| LoadSpec::for_content(ContentId::new(id), "x", body);

        pool.acquire(ContentId::new(1), &spec(1, "a")).unwrap();
        pool.acquire(ContentId::new(1), &spec(1, "a")).unwrap();
        pool.acquire(ContentId::new(2), &spec(2, "b")).unwrap();
        pool.reload(ContentId::new(2), &spec(2, "c")).unwrap();
        assert!(pool.acquire(ContentId::new(3), &spec(3, "")).is_err());
        pool.close_all();

        let acquired = |outcome: &str| {
            metrics
                .resources_acquired
                .with_label_values(&["null", outcome])
                .get()
        };
        assert_eq!(acquired("created"), 2);
        assert_eq!(acquired("hit"), 1);
        assert_eq!(acquired("reloaded"), 1);
        assert_eq!(metrics.resources_evicted.with_label_values(&["null"]).get(), 2);
        assert_eq!(metrics.materialization_failures.with_label_values(&["null"]).get(), 1);
        assert_eq!(metrics.resources_closed.with_label_values(&["null"]).get(), 0);
    }

    #[test]
    fn custom_registry_is_used() {
        let registry = Arc::new(Registry::new());
        let metrics = PrometheusMetrics::new_with_registry(registry.clone()).unwrap();
        metrics.record_slot_released();
        assert!(!registry.gather().is_empty());

        assert!(PrometheusMetrics::new_with_registry(registry).is_err());
    }
}
