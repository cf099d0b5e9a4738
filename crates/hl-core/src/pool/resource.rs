use std::time::{SystemTime, UNIX_EPOCH};

use hl_model::{ContentId, LoadSpec, ViewId};
use serde::Serialize;

/// Caller-facing reference to a pooled resource.
///
/// The generation changes every time the content is (re)materialized, so a reference taken
/// before an eviction, close or reload never reaches the new instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleRef {
    pub content_id: ContentId,
    pub generation: u64,
}

/// Pool entry owning one live engine handle.
pub(crate) struct PooledResource<H> {
    pub(crate) handle: H,
    pub(crate) generation: u64,
    pub(crate) display_name: String,
    pub(crate) origin: String,
    pub(crate) page_title: Option<String>,
    pub(crate) created_at: SystemTime,
    pub(crate) attached_to: Option<ViewId>,
    /// Recency key in the pool's ordering map.
    pub(crate) tick: u64,
}

impl<H> PooledResource<H> {
    pub(crate) fn new(handle: H, spec: &LoadSpec, generation: u64, tick: u64) -> Self {
        Self {
            handle,
            generation,
            display_name: spec.display_name.clone(),
            origin: spec.origin.clone(),
            page_title: None,
            created_at: SystemTime::now(),
            attached_to: None,
            tick,
        }
    }

    pub(crate) fn info(&self, content_id: ContentId) -> ResourceInfo {
        ResourceInfo {
            content_id,
            generation: self.generation,
            display_name: self.display_name.clone(),
            origin: self.origin.clone(),
            page_title: self.page_title.clone(),
            created_at_ms: self
                .created_at
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or_default(),
            attached_to: self.attached_to,
        }
    }
}

/// Read-only view of one pooled resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    pub content_id: ContentId,
    pub generation: u64,
    pub display_name: String,
    pub origin: String,
    /// Title reported by the page, if any.
    pub page_title: Option<String>,
    pub created_at_ms: u64,
    pub attached_to: Option<ViewId>,
}

impl ResourceInfo {
    /// Label shown for the resource: the page title, falling back to the display name.
    pub fn label(&self) -> &str {
        self.page_title.as_deref().unwrap_or(&self.display_name)
    }
}
