//! Slot allocation, resource pooling and the launcher facade.
pub mod config;
pub mod error;
pub mod launcher;
pub mod metrics;
pub mod pool;
pub mod slot;

pub use config::LauncherConfig;
pub use error::CoreError;
pub use launcher::{ContainerHost, ContentRepository, LauncherApi};
pub use pool::{Engine, EngineError, HandleRef, PoolError, ResourceInfo, ResourcePool};
pub use slot::{Allocation, AllocationKind, SlotError, SlotTable};

pub mod prelude {
    pub use crate::config::LauncherConfig;
    pub use crate::error::CoreError;
    pub use crate::launcher::{ContainerHost, ContentRepository, LauncherApi};
    pub use crate::metrics::{MetricsBackend, MetricsHandle, noop_metrics};
    pub use crate::pool::{Engine, EngineError, HandleRef, PoolError, ResourcePool};
    pub use crate::slot::{Allocation, AllocationKind, SlotError, SlotTable};
}
