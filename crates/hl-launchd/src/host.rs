use hl_core::{ContainerHost, CoreError};
use hl_model::{Content, ContentId, SlotIndex};
use parking_lot::Mutex;
use tracing::info;

/// Container host that records what each slot shows and logs every change.
#[derive(Debug)]
pub struct LoggingHost {
    shown: Mutex<Vec<Option<ContentId>>>,
}

impl LoggingHost {
    pub fn new(slots: usize) -> Self {
        Self {
            shown: Mutex::new(vec![None; slots]),
        }
    }

    /// Content currently shown by `slot`.
    pub fn shown(&self, slot: SlotIndex) -> Option<ContentId> {
        self.shown.lock().get(slot.get()).copied().flatten()
    }

    fn set(&self, slot: SlotIndex, value: Option<ContentId>) -> Result<(), CoreError> {
        let mut shown = self.shown.lock();
        let cell = shown
            .get_mut(slot.get())
            .ok_or_else(|| CoreError::Host(format!("no container for slot {slot}")))?;
        *cell = value;
        Ok(())
    }
}

impl ContainerHost for LoggingHost {
    fn activate(&self, slot: SlotIndex, content: &Content) -> Result<(), CoreError> {
        self.set(slot, Some(content.id))?;
        info!(%slot, content_id = %content.id, name = %content.name, "container activated");
        Ok(())
    }

    fn reset(&self, slot: SlotIndex, evicted: ContentId) -> Result<(), CoreError> {
        self.set(slot, None)?;
        info!(%slot, evicted = %evicted, "container reset");
        Ok(())
    }
}
