use std::sync::Arc;

use hl_devlog::{DevLog, LogEntry, LogLevel};
use hl_model::{ContentId, ContentSummary, LoadSpec, ViewId};
use hl_store::{FileKvStore, StoreHandle};
use tracing::{info, instrument, warn};

use crate::{
    config::LauncherConfig,
    error::CoreError,
    launcher::{ContainerHost, ContentRepository},
    metrics::MetricsHandle,
    pool::{Engine, HandleRef, ResourcePool},
    slot::{Allocation, AllocationKind, SlotError, SlotTable},
};

/// Dev log tag of launcher events.
const TAG: &str = "Launcher";

/// Launcher facade over the slot table, the resource pool and the dev log.
///
/// This type is responsible for:
/// - resolving content through the [`ContentRepository`];
/// - binding content to container slots and telling the [`ContainerHost`] about it;
/// - keeping live engine instances in the [`ResourcePool`];
/// - recording every decision in the shared [`DevLog`].
pub struct LauncherApi<E: Engine> {
    slots: SlotTable,
    pool: ResourcePool<E>,
    devlog: DevLog,
    repository: Arc<dyn ContentRepository>,
    host: Arc<dyn ContainerHost>,
}

impl<E: Engine> LauncherApi<E> {
    pub fn new(
        slots: SlotTable,
        pool: ResourcePool<E>,
        devlog: DevLog,
        repository: Arc<dyn ContentRepository>,
        host: Arc<dyn ContainerHost>,
    ) -> Self {
        Self {
            slots,
            pool,
            devlog,
            repository,
            host,
        }
    }

    /// Build a launcher from configuration, with the slot table in a [`FileKvStore`].
    ///
    /// `devlog` is usually opened from `cfg.devlog` before the process logger is installed,
    /// so that the logger can mirror into it.
    pub fn open(
        cfg: &LauncherConfig,
        engine: E,
        devlog: DevLog,
        repository: Arc<dyn ContentRepository>,
        host: Arc<dyn ContainerHost>,
        metrics: MetricsHandle,
    ) -> Result<Self, CoreError> {
        cfg.validate()?;
        let store: StoreHandle = Arc::new(FileKvStore::open(&cfg.store_dir)?);
        let slots = SlotTable::new(store, cfg.slots)?
            .with_key(cfg.state_key.clone())
            .with_metrics(Arc::clone(&metrics));
        let pool = ResourcePool::new(engine, cfg.pool_capacity)?.with_metrics(metrics);

        info!(
            slots = cfg.slots,
            pool_capacity = cfg.pool_capacity,
            store = %cfg.store_dir.display(),
            "launcher ready"
        );
        Ok(Self::new(slots, pool, devlog, repository, host))
    }

    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    pub fn pool(&self) -> &ResourcePool<E> {
        &self.pool
    }

    pub fn devlog(&self) -> &DevLog {
        &self.devlog
    }

    /// Bind `id` to a container slot.
    ///
    /// A slot store that cannot be read or written is reset once before giving up, so
    /// launching degrades to a fresh table instead of failing.
    #[instrument(level = "debug", skip(self), fields(content_id = %id))]
    pub fn allocate_slot(&self, id: ContentId) -> Result<Allocation, CoreError> {
        self.devlog
            .debug(TAG, &format!("allocate_slot_start: contentId={id}"));

        let allocation = match self.slots.allocate(id) {
            Ok(allocation) => allocation,
            Err(SlotError::Store(e)) => {
                warn!(error = %e, "slot store failed; resetting slot table");
                self.devlog
                    .error(TAG, &format!("slot_error: {e}; resetting table"));
                self.slots.reset()?;
                self.slots.allocate(id)?
            }
            Err(e) => return Err(e.into()),
        };

        let slot = allocation.slot;
        match allocation.kind {
            AllocationKind::Hit => self
                .devlog
                .info(TAG, &format!("slot_hit_existing: slotIndex={slot}")),
            AllocationKind::Fresh => self
                .devlog
                .info(TAG, &format!("slot_allocated_free: slotIndex={slot}")),
            AllocationKind::Evicted { evicted } => self.devlog.warn(
                TAG,
                &format!("slot_evict_lru: evictedContentId={evicted}, reusedSlot={slot}"),
            ),
        }
        Ok(allocation)
    }

    /// Forget the slot binding of `id`. Returns `false` when it had none.
    pub fn release_slot(&self, id: ContentId) -> Result<bool, CoreError> {
        let released = self.slots.release(id)?;
        if released {
            self.devlog
                .info(TAG, &format!("slot_released: contentId={id}"));
        }
        Ok(released)
    }

    /// Show `id` in a container: fetch it, bind a slot, reset the container it was taken
    /// from (if any) and activate it.
    #[instrument(level = "debug", skip(self), fields(content_id = %id))]
    pub fn launch(&self, id: ContentId) -> Result<Allocation, CoreError> {
        let content = self
            .repository
            .get_content(id)?
            .ok_or(CoreError::NotFound(id))?;
        self.devlog.info(
            TAG,
            &format!(
                "launch_start: contentId={id}, name={}, contentLen={}",
                content.name,
                content.payload.len()
            ),
        );

        let allocation = self.allocate_slot(id)?;
        if let Some(evicted) = allocation.evicted() {
            self.host.reset(allocation.slot, evicted)?;
        }
        self.host.activate(allocation.slot, &content)?;

        self.devlog.info(
            TAG,
            &format!("launch_end: contentId={id}, slotIndex={}", allocation.slot),
        );
        info!(slot = %allocation.slot, "content launched");
        Ok(allocation)
    }

    /// Live instance for `id`, created from `spec` when not pooled.
    pub fn acquire_resource(&self, id: ContentId, spec: &LoadSpec) -> Result<HandleRef, CoreError> {
        let handle = self.pool.acquire(id, spec).inspect_err(|e| {
            self.devlog
                .error(TAG, &format!("acquire_failed: contentId={id}, error={e}"))
        })?;
        Ok(handle)
    }

    /// Live instance for `id`, built from the repository's current content when not pooled.
    pub fn acquire_content(&self, id: ContentId) -> Result<HandleRef, CoreError> {
        if let Some(handle) = self.pool.acquire_existing(id) {
            return Ok(handle);
        }
        let content = self
            .repository
            .get_content(id)?
            .ok_or(CoreError::NotFound(id))?;
        self.acquire_resource(id, &content.load_spec())
    }

    pub fn attach_resource(&self, id: ContentId, view: ViewId, force: bool) -> Result<(), CoreError> {
        self.pool.attach(id, view, force)?;
        self.devlog
            .debug(TAG, &format!("resource_attached: contentId={id}, view={view}"));
        Ok(())
    }

    pub fn detach_resource(&self, id: ContentId) -> bool {
        self.pool.detach(id)
    }

    pub fn close_resource(&self, id: ContentId) -> bool {
        let closed = self.pool.close(id);
        if closed {
            self.devlog
                .info(TAG, &format!("resource_closed: contentId={id}"));
        }
        closed
    }

    pub fn close_all_resources(&self) -> usize {
        let closed = self.pool.close_all();
        self.devlog
            .info(TAG, &format!("resources_closed_all: count={closed}"));
        closed
    }

    /// Re-materialize `id` from the repository's current content.
    pub fn reload_resource(&self, id: ContentId) -> Result<HandleRef, CoreError> {
        let content = self
            .repository
            .get_content(id)?
            .ok_or(CoreError::NotFound(id))?;
        let handle = self.pool.reload(id, &content.load_spec())?;
        self.devlog.info(
            TAG,
            &format!("resource_reloaded: contentId={id}, generation={}", handle.generation),
        );
        Ok(handle)
    }

    pub fn list_content(&self) -> Result<Vec<ContentSummary>, CoreError> {
        self.repository.list_content()
    }

    pub fn append_log(&self, level: LogLevel, tag: &str, message: &str) {
        self.devlog.append(level, tag, message);
    }

    pub fn read_logs(&self) -> Vec<LogEntry> {
        self.devlog.read()
    }

    pub fn clear_logs(&self) {
        self.devlog.clear();
    }
}
