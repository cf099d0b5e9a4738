use hl_model::{ContentId, ViewId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("pool capacity must be at least 1")]
    InvalidCapacity,

    /// No room left after eviction; indicates a bug in the pool, not a runtime condition.
    #[error("pool exhausted at capacity {capacity}")]
    Exhausted { capacity: usize },

    #[error("content {content_id} is already attached to {view}")]
    AlreadyAttached { content_id: ContentId, view: ViewId },

    #[error("content {content_id} failed to materialize: {reason}")]
    Materialization { content_id: ContentId, reason: String },

    #[error("content {content_id} failed to attach: {reason}")]
    Attach { content_id: ContentId, reason: String },

    /// The referenced instance was destroyed (evicted, closed or reloaded).
    #[error("stale handle for content {content_id} (generation {generation})")]
    StaleHandle { content_id: ContentId, generation: u64 },

    #[error("content {0} is not in the pool")]
    NotFound(ContentId),
}
