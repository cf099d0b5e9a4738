use std::{collections::HashMap, sync::Arc};

use parking_lot::{Condvar, Mutex};

use crate::{KvStore, StoreLock, StoreResult, check_key};

/// Binary gate backing one named lock.
#[derive(Default)]
struct Gate {
    held: Mutex<bool>,
    released: Condvar,
}

/// Token returned to the lock holder; reopens the gate on drop.
struct GateToken(Arc<Gate>);

impl Drop for GateToken {
    fn drop(&mut self) {
        let mut held = self.0.held.lock();
        *held = false;
        self.0.released.notify_one();
    }
}

/// In-process store for tests and single-process deployments.
///
/// Honours the same lock contract as [`crate::FileKvStore`]: a named lock is held by at
/// most one caller at a time and other callers block until it is released.
#[derive(Default)]
pub struct MemoryKvStore {
    values: Mutex<HashMap<String, Vec<u8>>>,
    gates: Mutex<HashMap<String, Arc<Gate>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }

    fn gate(&self, name: &str) -> Arc<Gate> {
        let mut gates = self.gates.lock();
        Arc::clone(gates.entry(name.to_string()).or_default())
    }
}

impl KvStore for MemoryKvStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        check_key(key)?;
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        check_key(key)?;
        self.values.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        check_key(key)?;
        self.values.lock().remove(key);
        Ok(())
    }

    fn lock(&self, name: &str) -> StoreResult<StoreLock> {
        check_key(name)?;
        let gate = self.gate(name);
        {
            let mut held = gate.held.lock();
            while *held {
                gate.released.wait(&mut held);
            }
            *held = true;
        }
        Ok(StoreLock::new(name, GateToken(gate)))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
    };

    use super::*;

    #[test]
    fn get_set_remove() {
        let store = MemoryKvStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", b"one").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some(&b"one"[..]));
        assert_eq!(store.len(), 1);

        store.remove("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn lock_is_released_on_drop() {
        let store = MemoryKvStore::new();
        let first = store.lock("slot-table").unwrap();
        assert_eq!(first.name(), "slot-table");
        drop(first);

        // Would block forever if the first guard leaked.
        let _second = store.lock("slot-table").unwrap();
    }

    #[test]
    fn different_names_do_not_contend() {
        let store = MemoryKvStore::new();
        let _a = store.lock("a").unwrap();
        let _b = store.lock("b").unwrap();
    }

    #[test]
    fn lock_serializes_read_modify_write() {
        let store = Arc::new(MemoryKvStore::new());
        store.set("counter", b"0").unwrap();
        let rounds = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let rounds = Arc::clone(&rounds);
                thread::spawn(move || {
                    for _ in 0..50 {
                        let _guard = store.lock("counter").unwrap();
                        let raw = store.get("counter").unwrap().unwrap();
                        let n: u64 = String::from_utf8(raw).unwrap().parse().unwrap();
                        store.set("counter", (n + 1).to_string().as_bytes()).unwrap();
                        rounds.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();

        for w in workers {
            w.join().unwrap();
        }

        let raw = store.get("counter").unwrap().unwrap();
        assert_eq!(String::from_utf8(raw).unwrap(), "400");
        assert_eq!(rounds.load(Ordering::Relaxed), 400);
    }
}
