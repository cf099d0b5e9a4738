use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use hl_model::{ContentId, LoadSpec, ViewId};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::{
    metrics::{MetricsHandle, PoolOutcome, noop_metrics},
    pool::{
        Engine, EngineError, HandleRef, PoolError, ResourceInfo, resource::PooledResource,
    },
};

struct PoolState<H> {
    entries: HashMap<ContentId, PooledResource<H>>,
    /// Recency order: smallest tick is the least recently used entry.
    recency: BTreeMap<u64, ContentId>,
    next_tick: u64,
    next_generation: u64,
}

impl<H> PoolState<H> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            next_tick: 0,
            next_generation: 1,
        }
    }

    fn tick(&mut self) -> u64 {
        self.next_tick += 1;
        self.next_tick
    }

    fn generation(&mut self) -> u64 {
        let g = self.next_generation;
        self.next_generation += 1;
        g
    }

    /// Mark `id` most recently used.
    fn bump(&mut self, id: ContentId) {
        let tick = self.tick();
        if let Some(entry) = self.entries.get_mut(&id) {
            self.recency.remove(&entry.tick);
            entry.tick = tick;
            self.recency.insert(tick, id);
        }
    }

    fn insert(&mut self, id: ContentId, handle: H, spec: &LoadSpec) -> HandleRef {
        let generation = self.generation();
        let tick = self.tick();
        self.entries
            .insert(id, PooledResource::new(handle, spec, generation, tick));
        self.recency.insert(tick, id);
        HandleRef {
            content_id: id,
            generation,
        }
    }

    fn remove(&mut self, id: ContentId) -> Option<PooledResource<H>> {
        let entry = self.entries.remove(&id)?;
        self.recency.remove(&entry.tick);
        Some(entry)
    }

    fn lru(&self) -> Option<ContentId> {
        self.recency.values().next().copied()
    }

    fn live_ref(&self, id: ContentId) -> Option<HandleRef> {
        self.entries.get(&id).map(|e| HandleRef {
            content_id: id,
            generation: e.generation,
        })
    }

    fn occupant_of(&self, view: ViewId) -> Option<ContentId> {
        self.entries
            .iter()
            .find(|(_, e)| e.attached_to == Some(view))
            .map(|(id, _)| *id)
    }
}

/// LRU pool of at most `capacity` live engine instances, keyed by content.
///
/// The pool is the only owner of the handles. Callers keep [`HandleRef`]s and go through
/// [`ResourcePool::with_handle`], which rejects references to destroyed instances.
pub struct ResourcePool<E: Engine> {
    engine: Arc<E>,
    capacity: usize,
    state: Mutex<PoolState<E::Handle>>,
    metrics: MetricsHandle,
}

impl<E: Engine> ResourcePool<E> {
    pub fn new(engine: E, capacity: usize) -> Result<Self, PoolError> {
        Self::with_shared_engine(Arc::new(engine), capacity)
    }

    /// Pool over an engine that is shared with other owners.
    pub fn with_shared_engine(engine: Arc<E>, capacity: usize) -> Result<Self, PoolError> {
        if capacity == 0 {
            return Err(PoolError::InvalidCapacity);
        }
        Ok(Self {
            engine,
            capacity,
            state: Mutex::new(PoolState::new()),
            metrics: noop_metrics(),
        })
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: ContentId) -> bool {
        self.state.lock().entries.contains_key(&id)
    }

    /// Pooled contents, least recently used first.
    pub fn content_ids(&self) -> Vec<ContentId> {
        self.state.lock().recency.values().copied().collect()
    }

    /// Return the live instance for `id`, materializing it from `spec` if needed.
    ///
    /// An existing instance is returned as is, keeping its in-page state. When the pool is
    /// full, the least recently used instance is destroyed before the new one is created.
    #[instrument(level = "debug", skip(self, spec), fields(content_id = %id, engine = self.engine.name()))]
    pub fn acquire(&self, id: ContentId, spec: &LoadSpec) -> Result<HandleRef, PoolError> {
        let mut state = self.state.lock();
        if let Some(hit) = self.reuse(&mut state, id) {
            return Ok(hit);
        }

        self.make_room(&mut state)?;
        let handle = self.materialize(id, spec)?;
        let handle_ref = state.insert(id, handle, spec);
        self.metrics
            .record_resource_acquired(self.engine.name(), PoolOutcome::Created);
        info!(generation = handle_ref.generation, pooled = state.entries.len(), "resource created");
        Ok(handle_ref)
    }

    /// Return the live instance for `id` if pooled, marking it most recently used.
    pub fn acquire_existing(&self, id: ContentId) -> Option<HandleRef> {
        let mut state = self.state.lock();
        self.reuse(&mut state, id)
    }

    /// Like [`ResourcePool::acquire`], but materializes on a blocking worker thread.
    ///
    /// The pool lock is not held while the content loads. If another caller publishes the
    /// same content in the meantime, its instance wins and the one built here is destroyed.
    #[instrument(level = "debug", skip(self, spec), fields(content_id = %id, engine = self.engine.name()))]
    pub async fn acquire_async(&self, id: ContentId, spec: LoadSpec) -> Result<HandleRef, PoolError> {
        let hit = {
            let mut state = self.state.lock();
            self.reuse(&mut state, id)
        };
        if let Some(hit) = hit {
            return Ok(hit);
        }

        let engine = Arc::clone(&self.engine);
        let built = tokio::task::spawn_blocking(move || {
            let handle = engine.materialize(&spec);
            (handle, spec)
        })
        .await
        .map_err(|e| PoolError::Materialization {
            content_id: id,
            reason: e.to_string(),
        })?;

        let (handle, spec) = built;
        let handle = handle.map_err(|e| self.materialization_failed(id, e))?;

        let mut state = self.state.lock();
        if state.entries.contains_key(&id) {
            debug!("concurrent acquire won; dropping duplicate instance");
            self.engine.destroy(handle);
            return self
                .reuse(&mut state, id)
                .ok_or(PoolError::NotFound(id));
        }

        if let Err(e) = self.make_room(&mut state) {
            self.engine.destroy(handle);
            return Err(e);
        }
        let handle_ref = state.insert(id, handle, &spec);
        self.metrics
            .record_resource_acquired(self.engine.name(), PoolOutcome::Created);
        info!(generation = handle_ref.generation, pooled = state.entries.len(), "resource created");
        Ok(handle_ref)
    }

    /// Show the instance of `id` inside `view`.
    ///
    /// An instance attached to another view is only moved when `force` is set; otherwise
    /// [`PoolError::AlreadyAttached`] is returned and nothing changes. Whatever else `view`
    /// was showing is detached once the new attachment succeeded. When the engine refuses
    /// the attachment, the instance goes back to its previous view and the occupant of
    /// `view` keeps it.
    #[instrument(level = "debug", skip(self), fields(content_id = %id, %view))]
    pub fn attach(&self, id: ContentId, view: ViewId, force: bool) -> Result<(), PoolError> {
        let mut state = self.state.lock();
        let current = state
            .entries
            .get(&id)
            .ok_or(PoolError::NotFound(id))?
            .attached_to;

        match current {
            Some(v) if v == view => return Ok(()),
            Some(other) if !force => {
                return Err(PoolError::AlreadyAttached {
                    content_id: id,
                    view: other,
                });
            }
            _ => {}
        }

        let occupant = state.occupant_of(view);
        if current.is_some() {
            self.detach_entry(&mut state, id);
        }

        let entry = state.entries.get_mut(&id).ok_or(PoolError::NotFound(id))?;
        if let Err(e) = self.engine.attach(&mut entry.handle, view) {
            if let Some(previous) = current {
                self.reattach(entry, id, previous);
            }
            return Err(PoolError::Attach {
                content_id: id,
                reason: e.to_string(),
            });
        }
        entry.attached_to = Some(view);

        if let Some(occupant) = occupant {
            debug!(occupant = %occupant, "view showed another resource; detaching it");
            self.detach_entry(&mut state, occupant);
        }
        debug!("resource attached");
        Ok(())
    }

    /// Remove the instance of `id` from its view, keeping it alive and pooled.
    ///
    /// Returns `false` when there was nothing to detach.
    pub fn detach(&self, id: ContentId) -> bool {
        let mut state = self.state.lock();
        self.detach_entry(&mut state, id)
    }

    /// View currently showing `id`.
    pub fn attached_view(&self, id: ContentId) -> Option<ViewId> {
        self.state.lock().entries.get(&id).and_then(|e| e.attached_to)
    }

    /// Destroy the instance of `id`. Returns `false` when `id` was not pooled.
    #[instrument(level = "debug", skip(self), fields(content_id = %id))]
    pub fn close(&self, id: ContentId) -> bool {
        let mut state = self.state.lock();
        let Some(entry) = state.remove(id) else {
            return false;
        };
        self.destroy_entry(entry);
        self.metrics.record_resource_closed(self.engine.name());
        info!("resource closed");
        true
    }

    /// Destroy every instance. Returns how many were destroyed.
    pub fn close_all(&self) -> usize {
        let mut state = self.state.lock();
        let ids: Vec<ContentId> = state.recency.values().copied().collect();
        for id in &ids {
            if let Some(entry) = state.remove(*id) {
                self.destroy_entry(entry);
                self.metrics.record_resource_closed(self.engine.name());
            }
        }
        if !ids.is_empty() {
            info!(closed = ids.len(), "all resources closed");
        }
        ids.len()
    }

    /// Replace the instance of `id` with one built from `spec`.
    ///
    /// Recency is kept and the new instance goes into the view that showed the old one.
    /// If the new instance cannot be built or attached, the old one stays untouched.
    #[instrument(level = "debug", skip(self, spec), fields(content_id = %id))]
    pub fn reload(&self, id: ContentId, spec: &LoadSpec) -> Result<HandleRef, PoolError> {
        let mut state = self.state.lock();
        let view = state
            .entries
            .get(&id)
            .ok_or(PoolError::NotFound(id))?
            .attached_to;

        let mut fresh = self.materialize(id, spec)?;
        if let Some(view) = view {
            if let Err(e) = self.engine.attach(&mut fresh, view) {
                self.engine.destroy(fresh);
                warn!(%view, error = %e, "reloaded instance refused by view; keeping the old one");
                return Err(PoolError::Attach {
                    content_id: id,
                    reason: e.to_string(),
                });
            }
        }

        let generation = state.generation();
        let entry = state.entries.get_mut(&id).ok_or(PoolError::NotFound(id))?;
        let mut old = std::mem::replace(&mut entry.handle, fresh);
        if let Some(view) = view {
            self.engine.detach(&mut old, view);
        }
        self.engine.destroy(old);

        entry.generation = generation;
        entry.display_name = spec.display_name.clone();
        entry.origin = spec.origin.clone();
        entry.page_title = None;

        self.metrics
            .record_resource_acquired(self.engine.name(), PoolOutcome::Reloaded);
        info!(generation, "resource reloaded");
        Ok(HandleRef {
            content_id: id,
            generation,
        })
    }

    /// Run `f` on the live instance `handle` refers to.
    pub fn with_handle<R>(
        &self,
        handle: HandleRef,
        f: impl FnOnce(&mut E::Handle) -> R,
    ) -> Result<R, PoolError> {
        let mut state = self.state.lock();
        match state.entries.get_mut(&handle.content_id) {
            Some(entry) if entry.generation == handle.generation => Ok(f(&mut entry.handle)),
            _ => Err(PoolError::StaleHandle {
                content_id: handle.content_id,
                generation: handle.generation,
            }),
        }
    }

    /// Whether `handle` still refers to a pooled instance.
    pub fn is_live(&self, handle: HandleRef) -> bool {
        self.state
            .lock()
            .entries
            .get(&handle.content_id)
            .is_some_and(|e| e.generation == handle.generation)
    }

    /// Record the title reported by the page. Returns `false` when `id` is not pooled.
    pub fn set_page_title(&self, id: ContentId, title: impl Into<String>) -> bool {
        match self.state.lock().entries.get_mut(&id) {
            Some(entry) => {
                entry.page_title = Some(title.into());
                true
            }
            None => false,
        }
    }

    pub fn page_title(&self, id: ContentId) -> Option<String> {
        self.state
            .lock()
            .entries
            .get(&id)
            .and_then(|e| e.page_title.clone())
    }

    /// Pooled resources, least recently used first.
    pub fn snapshot(&self) -> Vec<ResourceInfo> {
        let state = self.state.lock();
        state
            .recency
            .values()
            .filter_map(|id| state.entries.get(id).map(|e| e.info(*id)))
            .collect()
    }

    fn reuse(&self, state: &mut PoolState<E::Handle>, id: ContentId) -> Option<HandleRef> {
        let hit = state.live_ref(id)?;
        state.bump(id);
        self.metrics
            .record_resource_acquired(self.engine.name(), PoolOutcome::Hit);
        debug!(content_id = %id, generation = hit.generation, "resource reused");
        Some(hit)
    }

    fn make_room(&self, state: &mut PoolState<E::Handle>) -> Result<(), PoolError> {
        while state.entries.len() >= self.capacity {
            let Some(victim) = state.lru() else { break };
            if let Some(entry) = state.remove(victim) {
                warn!(evicted = %victim, generation = entry.generation, "evicting least recently used resource");
                self.destroy_entry(entry);
                self.metrics.record_resource_evicted(self.engine.name());
            }
        }
        if state.entries.len() >= self.capacity {
            return Err(PoolError::Exhausted {
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    fn materialize(&self, id: ContentId, spec: &LoadSpec) -> Result<E::Handle, PoolError> {
        self.engine
            .materialize(spec)
            .map_err(|e| self.materialization_failed(id, e))
    }

    fn materialization_failed(&self, id: ContentId, e: EngineError) -> PoolError {
        self.metrics
            .record_materialization_failed(self.engine.name());
        warn!(content_id = %id, error = %e, "materialization failed");
        PoolError::Materialization {
            content_id: id,
            reason: e.to_string(),
        }
    }

    fn detach_entry(&self, state: &mut PoolState<E::Handle>, id: ContentId) -> bool {
        let Some(entry) = state.entries.get_mut(&id) else {
            return false;
        };
        let Some(view) = entry.attached_to.take() else {
            return false;
        };
        self.engine.detach(&mut entry.handle, view);
        debug!(content_id = %id, %view, "resource detached");
        true
    }

    /// Put `entry` back into `view` after a failed move.
    fn reattach(&self, entry: &mut PooledResource<E::Handle>, id: ContentId, view: ViewId) {
        match self.engine.attach(&mut entry.handle, view) {
            Ok(()) => entry.attached_to = Some(view),
            Err(e) => {
                warn!(content_id = %id, %view, error = %e, "could not restore previous view")
            }
        }
    }

    fn destroy_entry(&self, mut entry: PooledResource<E::Handle>) {
        if let Some(view) = entry.attached_to.take() {
            self.engine.detach(&mut entry.handle, view);
        }
        self.engine.destroy(entry.handle);
    }
}

impl<E: Engine> Drop for ResourcePool<E> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        let ids: Vec<ContentId> = state.recency.values().copied().collect();
        for id in ids {
            if let Some(mut entry) = state.remove(id) {
                if let Some(view) = entry.attached_to.take() {
                    self.engine.detach(&mut entry.handle, view);
                }
                self.engine.destroy(entry.handle);
            }
        }
    }
}
