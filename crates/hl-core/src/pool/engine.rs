use hl_model::{LoadSpec, ViewId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("content failed to load: {0}")]
    Load(String),

    #[error("view rejected the resource: {0}")]
    Attach(String),
}

/// Rendering engine that turns a [`LoadSpec`] into a live, heavyweight handle.
///
/// Handles are owned by [`crate::ResourcePool`]; the engine only creates them, moves them
/// between views and destroys them. A handle is never copied, and `destroy` consumes it.
pub trait Engine: Send + Sync + 'static {
    /// Live engine instance.
    type Handle: Send + 'static;

    /// Engine name used in logs and metrics labels.
    fn name(&self) -> &'static str;

    /// Load `spec` into a new instance.
    ///
    /// Called without the pool lock from [`crate::ResourcePool::acquire_async`], so it may
    /// run on a blocking worker thread.
    fn materialize(&self, spec: &LoadSpec) -> Result<Self::Handle, EngineError>;

    /// Show `handle` inside `view`. The handle is not attached anywhere when this is called.
    fn attach(&self, handle: &mut Self::Handle, view: ViewId) -> Result<(), EngineError>;

    /// Remove `handle` from `view`.
    fn detach(&self, handle: &mut Self::Handle, view: ViewId);

    /// Stop all activity and release the instance.
    fn destroy(&self, handle: Self::Handle);
}
