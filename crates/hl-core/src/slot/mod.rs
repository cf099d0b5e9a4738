//! Persisted, cross-process LRU mapping from content to container slot.
//!
//! Every operation is one atomic `lock -> load -> decide -> persist` sequence under the
//! store-scoped lock [`SLOT_TABLE_LOCK`], so any number of processes may share one table.
mod error;
pub use error::SlotError;

mod table;
pub use table::{Allocation, AllocationKind, DEFAULT_STATE_KEY, SLOT_TABLE_LOCK, SlotTable};
