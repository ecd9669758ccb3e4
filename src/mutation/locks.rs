use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

/// One mutex per key, created on demand and dropped once nobody holds or
/// waits on it.
pub struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock for `key`. Calls on distinct keys run
    /// concurrently; calls on the same key run one at a time.
    pub fn with<T, F>(&self, key: &K, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(key.clone()).or_default())
        };

        let out = {
            let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
            f()
        };

        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // The map and this call hold the only references: nobody is waiting.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }

        out
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
