use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of one piece of user content.
///
/// Assigned once by the content repository and never reused for another content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(u64);

impl ContentId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ContentId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of one of the fixed container slots, always in `[0, capacity)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotIndex(usize);

impl SlotIndex {
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    pub const fn get(&self) -> usize {
        self.0
    }
}

impl From<usize> for SlotIndex {
    fn from(raw: usize) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of a consuming view that can host a live resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(u64);

impl ViewId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_numbers() {
        assert_eq!(serde_json::to_string(&ContentId::new(42)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&SlotIndex::new(3)).unwrap(), "3");

        let id: ContentId = serde_json::from_str("7").unwrap();
        assert_eq!(id.get(), 7);
    }

    #[test]
    fn display_is_stable() {
        assert_eq!(ContentId::new(12).to_string(), "12");
        assert_eq!(SlotIndex::new(0).to_string(), "0");
        assert_eq!(ViewId::new(5).to_string(), "view-5");
    }
}
