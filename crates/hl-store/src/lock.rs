use std::fmt;

/// Guard of a store-scoped exclusive lock.
///
/// Backends wrap whatever keeps their lock alive (an open locked file, a gate token);
/// dropping the guard drops that value and thereby releases the lock.
pub struct StoreLock {
    name: String,
    _held: Box<dyn Send>,
}

impl StoreLock {
    /// Wrap a backend-specific lock holder.
    pub fn new(name: impl Into<String>, held: impl Send + 'static) -> Self {
        Self {
            name: name.into(),
            _held: Box::new(held),
        }
    }

    /// Name of the held lock.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for StoreLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreLock").field("name", &self.name).finish()
    }
}
