mod domain;
pub use domain::{ContentId, SlotIndex, ViewId};
pub use domain::{DEFAULT_POOL_CAPACITY, DEFAULT_SLOT_COUNT, ISOLATION_ORIGIN_SUFFIX};

mod error;
pub use error::{ModelError, ModelResult};

mod table;
pub use table::{AllocationEntry, AllocationTable};

mod content;
pub use content::{Content, ContentSummary, LoadSpec};
