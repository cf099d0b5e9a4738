use thiserror::Error;

use crate::{ContentId, SlotIndex};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("allocation table is not valid json: {0}")]
    Decode(String),

    #[error("content {0} appears more than once in the allocation table")]
    DuplicateContent(ContentId),

    #[error("slot {0} is bound to more than one content")]
    DuplicateSlot(SlotIndex),

    #[error("slot {slot} is out of range for capacity {capacity}")]
    SlotOutOfRange { slot: SlotIndex, capacity: usize },

    #[error("allocation table holds {len} entries, capacity is {capacity}")]
    Overfull { len: usize, capacity: usize },

    #[error("invalid model: {0}")]
    Invalid(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
