//! Entry point used by the UI layer: content lookup, slot allocation, resource pooling and
//! the shared dev log behind one API.
mod host;
pub use host::{ContainerHost, ContentRepository};

mod api;
pub use api::LauncherApi;
