use hl_model::{AllocationEntry, AllocationTable, ContentId, SlotIndex};
use hl_store::StoreHandle;
use tracing::{debug, info, instrument, warn};

use crate::{
    metrics::{MetricsHandle, SlotOutcome, noop_metrics},
    slot::SlotError,
};

/// Store-scoped lock guarding every read-modify-write of the table.
pub const SLOT_TABLE_LOCK: &str = "slot-table";

/// Store key the table is persisted under unless configured otherwise.
pub const DEFAULT_STATE_KEY: &str = "pool_state";

/// How [`SlotTable::allocate`] satisfied a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationKind {
    /// The content already owned the slot.
    Hit,
    /// The slot was free.
    Fresh,
    /// The slot was taken from `evicted`, whose container must drop its content.
    Evicted { evicted: ContentId },
}

/// Result of a slot allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub slot: SlotIndex,
    pub kind: AllocationKind,
}

impl Allocation {
    /// Content that lost its slot to this allocation.
    pub fn evicted(&self) -> Option<ContentId> {
        match self.kind {
            AllocationKind::Evicted { evicted } => Some(evicted),
            _ => None,
        }
    }

    pub fn outcome(&self) -> SlotOutcome {
        match self.kind {
            AllocationKind::Hit => SlotOutcome::Hit,
            AllocationKind::Fresh => SlotOutcome::Fresh,
            AllocationKind::Evicted { .. } => SlotOutcome::Evicted,
        }
    }
}

/// LRU allocation of `capacity` container slots, persisted in a [`hl_store::KvStore`].
///
/// The table itself is never cached: each call reloads it under the lock, so changes made
/// by other processes are always observed.
pub struct SlotTable {
    store: StoreHandle,
    key: String,
    capacity: usize,
    metrics: MetricsHandle,
}

impl SlotTable {
    /// Create a table with `capacity` slots stored under [`DEFAULT_STATE_KEY`].
    pub fn new(store: StoreHandle, capacity: usize) -> Result<Self, SlotError> {
        if capacity == 0 {
            return Err(SlotError::InvalidCapacity);
        }
        Ok(Self {
            store,
            key: DEFAULT_STATE_KEY.to_string(),
            capacity,
            metrics: noop_metrics(),
        })
    }

    /// Persist under `key` instead of the default key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Return the slot for `id`, binding one if needed.
    ///
    /// Order of preference: the slot `id` already owns, the lowest free slot, the slot of
    /// the least recently used content. The chosen entry always ends up most recently used.
    #[instrument(level = "debug", skip(self), fields(content_id = %id))]
    pub fn allocate(&self, id: ContentId) -> Result<Allocation, SlotError> {
        let _lock = self.store.lock(SLOT_TABLE_LOCK)?;
        let mut table = self.load()?;

        let allocation = if let Some(slot) = table.touch(id) {
            info!(%slot, "slot hit");
            Allocation {
                slot,
                kind: AllocationKind::Hit,
            }
        } else if let Some(slot) = table.lowest_free(self.capacity) {
            table.push(AllocationEntry::new(id, slot));
            info!(%slot, "slot allocated from free list");
            Allocation {
                slot,
                kind: AllocationKind::Fresh,
            }
        } else {
            // A valid full table always has a head.
            let victim = table
                .evict_lru()
                .ok_or_else(|| SlotError::Corrupted("full table without entries".into()))?;
            table.push(AllocationEntry::new(id, victim.slot));
            warn!(
                slot = %victim.slot,
                evicted = %victim.content_id,
                "slot reused from least recently used content"
            );
            Allocation {
                slot: victim.slot,
                kind: AllocationKind::Evicted {
                    evicted: victim.content_id,
                },
            }
        };

        self.save(&table)?;
        self.metrics.record_slot_allocated(allocation.outcome());
        Ok(allocation)
    }

    /// Forget `id` and free its slot. Returns `false` when `id` held no slot.
    #[instrument(level = "debug", skip(self), fields(content_id = %id))]
    pub fn release(&self, id: ContentId) -> Result<bool, SlotError> {
        let _lock = self.store.lock(SLOT_TABLE_LOCK)?;
        let mut table = self.load()?;

        match table.remove(id) {
            Some(entry) => {
                self.save(&table)?;
                self.metrics.record_slot_released();
                info!(slot = %entry.slot, "slot released");
                Ok(true)
            }
            None => {
                debug!("release of unallocated content ignored");
                Ok(false)
            }
        }
    }

    /// Current table in recency order (LRU first).
    pub fn snapshot(&self) -> Result<AllocationTable, SlotError> {
        let _lock = self.store.lock(SLOT_TABLE_LOCK)?;
        self.load()
    }

    /// Slot currently bound to `id`, without touching its recency.
    pub fn slot_of(&self, id: ContentId) -> Result<Option<SlotIndex>, SlotError> {
        Ok(self.snapshot()?.slot_of(id))
    }

    /// Drop every binding.
    pub fn reset(&self) -> Result<(), SlotError> {
        let _lock = self.store.lock(SLOT_TABLE_LOCK)?;
        self.save(&AllocationTable::new())?;
        info!(key = %self.key, "slot table reset");
        Ok(())
    }

    /// Load the persisted table; must be called with the lock held.
    fn load(&self) -> Result<AllocationTable, SlotError> {
        let Some(bytes) = self.store.get(&self.key)? else {
            return Ok(AllocationTable::new());
        };
        match self.decode(&bytes) {
            Ok(table) => Ok(table),
            Err(e) => {
                warn!(key = %self.key, error = %e, "discarding unusable slot table");
                Ok(AllocationTable::new())
            }
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<AllocationTable, SlotError> {
        let table =
            AllocationTable::from_json(bytes).map_err(|e| SlotError::Corrupted(e.to_string()))?;
        table
            .validate(self.capacity)
            .map_err(|e| SlotError::Corrupted(e.to_string()))?;
        Ok(table)
    }

    fn save(&self, table: &AllocationTable) -> Result<(), SlotError> {
        let bytes = table
            .to_json()
            .map_err(|e| SlotError::Corrupted(e.to_string()))?;
        self.store.set(&self.key, &bytes)?;
        Ok(())
    }
}
