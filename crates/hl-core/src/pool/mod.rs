//! In-process LRU pool of live rendering-engine instances.
//!
//! At most `capacity` instances are alive at any time. Reusing an instance keeps its
//! in-page state; the least recently used instance is destroyed to make room for a new one.
mod engine;
pub use engine::{Engine, EngineError};

mod error;
pub use error::PoolError;

mod resource;
pub use resource::{HandleRef, ResourceInfo};

mod resource_pool;
pub use resource_pool::ResourcePool;

#[cfg(test)]
pub(crate) mod testing;
