use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    ContentId, SlotIndex,
    error::{ModelError, ModelResult},
};

/// One `(content, slot)` binding of the allocation table.
///
/// Older persisted tables use the short keys `f` / `s`; both spellings are accepted on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationEntry {
    /// Content bound to the slot.
    #[serde(alias = "f")]
    pub content_id: ContentId,
    /// Container slot hosting the content.
    #[serde(rename = "slotIndex", alias = "s")]
    pub slot: SlotIndex,
}

impl AllocationEntry {
    pub fn new(content_id: ContentId, slot: SlotIndex) -> Self {
        Self { content_id, slot }
    }
}

/// Recency-ordered slot ledger.
///
/// The first entry is the least recently used one, the last entry the most recently used one.
/// A well-formed table has pairwise distinct contents, pairwise distinct slots and
/// never more entries than there are slots; see [`AllocationTable::validate`].
///
/// The table stays a plain vector: it is reloaded from the store on every operation and the
/// slot count is small, so a linear scan is cheaper than maintaining an index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocationTable(Vec<AllocationEntry>);

impl AllocationTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in recency order (LRU first).
    pub fn entries(&self) -> &[AllocationEntry] {
        &self.0
    }

    /// Position of `id` in recency order.
    pub fn position(&self, id: ContentId) -> Option<usize> {
        self.0.iter().position(|e| e.content_id == id)
    }

    /// Slot currently bound to `id`.
    pub fn slot_of(&self, id: ContentId) -> Option<SlotIndex> {
        self.0.iter().find(|e| e.content_id == id).map(|e| e.slot)
    }

    /// Move `id` to the MRU position and return its slot.
    pub fn touch(&mut self, id: ContentId) -> Option<SlotIndex> {
        let idx = self.position(id)?;
        let entry = self.0.remove(idx);
        self.0.push(entry);
        Some(entry.slot)
    }

    /// Lowest slot in `[0, capacity)` not bound to any content.
    pub fn lowest_free(&self, capacity: usize) -> Option<SlotIndex> {
        let used: HashSet<SlotIndex> = self.0.iter().map(|e| e.slot).collect();
        (0..capacity).map(SlotIndex::new).find(|s| !used.contains(s))
    }

    /// Append an entry at the MRU position.
    pub fn push(&mut self, entry: AllocationEntry) {
        self.0.push(entry);
    }

    /// Remove and return the LRU entry.
    pub fn evict_lru(&mut self) -> Option<AllocationEntry> {
        if self.0.is_empty() {
            return None;
        }
        Some(self.0.remove(0))
    }

    /// Remove the entry for `id`, if any.
    pub fn remove(&mut self, id: ContentId) -> Option<AllocationEntry> {
        let idx = self.position(id)?;
        Some(self.0.remove(idx))
    }

    /// Check the table invariants against the given slot count.
    pub fn validate(&self, capacity: usize) -> ModelResult<()> {
        if self.0.len() > capacity {
            return Err(ModelError::Overfull {
                len: self.0.len(),
                capacity,
            });
        }

        let mut contents = HashSet::with_capacity(self.0.len());
        let mut slots = HashSet::with_capacity(self.0.len());
        for entry in &self.0 {
            if entry.slot.get() >= capacity {
                return Err(ModelError::SlotOutOfRange {
                    slot: entry.slot,
                    capacity,
                });
            }
            if !contents.insert(entry.content_id) {
                return Err(ModelError::DuplicateContent(entry.content_id));
            }
            if !slots.insert(entry.slot) {
                return Err(ModelError::DuplicateSlot(entry.slot));
            }
        }
        Ok(())
    }

    /// Decode a persisted table. Structural validation is left to [`AllocationTable::validate`].
    pub fn from_json(bytes: &[u8]) -> ModelResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| ModelError::Decode(e.to_string()))
    }

    /// Encode the table for persistence.
    pub fn to_json(&self) -> ModelResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ModelError::Invalid(e.to_string()))
    }
}

impl FromIterator<AllocationEntry> for AllocationTable {
    fn from_iter<I: IntoIterator<Item = AllocationEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, slot: usize) -> AllocationEntry {
        AllocationEntry::new(ContentId::new(id), SlotIndex::new(slot))
    }

    #[test]
    fn touch_moves_entry_to_mru() {
        let mut table: AllocationTable = [entry(1, 0), entry(2, 1), entry(3, 2)].into_iter().collect();

        assert_eq!(table.touch(ContentId::new(1)), Some(SlotIndex::new(0)));
        let order: Vec<u64> = table.entries().iter().map(|e| e.content_id.get()).collect();
        assert_eq!(order, vec![2, 3, 1]);

        assert_eq!(table.touch(ContentId::new(9)), None);
    }

    #[test]
    fn lowest_free_skips_used_slots() {
        let table: AllocationTable = [entry(1, 0), entry(2, 2)].into_iter().collect();
        assert_eq!(table.lowest_free(5), Some(SlotIndex::new(1)));

        let full: AllocationTable = [entry(1, 0), entry(2, 1)].into_iter().collect();
        assert_eq!(full.lowest_free(2), None);
    }

    #[test]
    fn evict_lru_takes_the_head() {
        let mut table: AllocationTable = [entry(1, 3), entry(2, 0)].into_iter().collect();
        assert_eq!(table.evict_lru(), Some(entry(1, 3)));
        assert_eq!(table.len(), 1);

        let mut empty = AllocationTable::new();
        assert_eq!(empty.evict_lru(), None);
    }

    #[test]
    fn validate_rejects_broken_tables() {
        let dup_content: AllocationTable = [entry(1, 0), entry(1, 1)].into_iter().collect();
        assert!(matches!(
            dup_content.validate(5),
            Err(ModelError::DuplicateContent(_))
        ));

        let dup_slot: AllocationTable = [entry(1, 0), entry(2, 0)].into_iter().collect();
        assert!(matches!(dup_slot.validate(5), Err(ModelError::DuplicateSlot(_))));

        let out_of_range: AllocationTable = [entry(1, 7)].into_iter().collect();
        assert!(matches!(
            out_of_range.validate(5),
            Err(ModelError::SlotOutOfRange { .. })
        ));

        let overfull: AllocationTable = [entry(1, 0), entry(2, 1)].into_iter().collect();
        assert!(matches!(overfull.validate(1), Err(ModelError::Overfull { .. })));

        let ok: AllocationTable = [entry(1, 4), entry(2, 0)].into_iter().collect();
        assert!(ok.validate(5).is_ok());
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let table: AllocationTable = [entry(10, 2)].into_iter().collect();
        let json = String::from_utf8(table.to_json().unwrap()).unwrap();
        assert_eq!(json, r#"[{"contentId":10,"slotIndex":2}]"#);
    }

    #[test]
    fn json_accepts_short_legacy_keys() {
        let table = AllocationTable::from_json(br#"[{"f":5,"s":1},{"f":6,"s":0}]"#).unwrap();
        assert_eq!(table.entries(), &[entry(5, 1), entry(6, 0)]);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            AllocationTable::from_json(b"{not json"),
            Err(ModelError::Decode(_))
        ));
    }
}
