mod ids;
pub use ids::{ContentId, SlotIndex, ViewId};

mod constants;
pub use constants::{DEFAULT_POOL_CAPACITY, DEFAULT_SLOT_COUNT, ISOLATION_ORIGIN_SUFFIX};
