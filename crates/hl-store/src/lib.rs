//! Persisted key-value store used to share small state blobs between launcher processes.
//!
//! The store exposes single-key get/set plus a named, store-scoped exclusive lock.
//! Callers that need a read-modify-write over one key take the lock first, so that
//! concurrent writers never lose each other's updates.
mod error;
pub use error::{StoreError, StoreResult};

mod lock;
pub use lock::StoreLock;

mod file;
pub use file::FileKvStore;

mod memory;
pub use memory::MemoryKvStore;

use std::sync::Arc;

/// Durable blob storage with last-writer-wins semantics per key.
pub trait KvStore: Send + Sync {
    /// Backend name used in logs.
    fn name(&self) -> &'static str;

    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// Block until the exclusive lock `name` is held by the caller.
    ///
    /// The lock is released when the returned [`StoreLock`] is dropped.
    fn lock(&self, name: &str) -> StoreResult<StoreLock>;
}

/// Shared handle to a store backend.
pub type StoreHandle = Arc<dyn KvStore>;

/// Validate a key or lock name: non-empty, `[A-Za-z0-9._-]` only, not starting with a dot.
pub(crate) fn check_key(key: &str) -> StoreResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}
