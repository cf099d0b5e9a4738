use hl_model::{Content, ContentId, ContentSummary, SlotIndex};

use crate::error::CoreError;

/// Source of user content.
pub trait ContentRepository: Send + Sync {
    /// Full content for `id`, or `None` when it does not exist.
    fn get_content(&self, id: ContentId) -> Result<Option<Content>, CoreError>;

    fn list_content(&self) -> Result<Vec<ContentSummary>, CoreError>;
}

/// The fixed set of isolation containers that display content.
pub trait ContainerHost: Send + Sync {
    /// Bring the container of `slot` to the front showing `content`.
    fn activate(&self, slot: SlotIndex, content: &Content) -> Result<(), CoreError>;

    /// Drop whatever the container of `slot` shows; `evicted` just lost the slot.
    fn reset(&self, slot: SlotIndex, evicted: ContentId) -> Result<(), CoreError>;
}
