//! Coarse-grained baseline map
//!
//! One reader/writer lock covers the key set and every payload. No per-key
//! locks, no placeholders and no transaction protocol. It exists as a
//! reference for [`ConcurrentMap`](crate::ConcurrentMap): same observable
//! single-key results, none of the concurrency.

use parking_lot::RwLock;
use raftkv_core::{Error, MapConfig, Result};
use rustc_hash::FxHashMap;
use std::collections::HashMap;
use std::fmt;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Key-value map behind a single lock.
pub struct NaiveMap<V> {
    entries: RwLock<FxHashMap<String, V>>,
    timeout: Duration,
}

impl<V> NaiveMap<V> {
    /// Create an empty map with the given lock timeout.
    pub fn new(lock_timeout: Duration) -> Self {
        Self::with_config(MapConfig::from(lock_timeout))
    }

    /// Create an empty map from a config.
    pub fn with_config(config: MapConfig) -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
            timeout: config.lock_timeout,
        }
    }

    /// The configured lock timeout.
    pub fn lock_timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of keys.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<parking_lot::RwLockReadGuard<'_, FxHashMap<String, V>>> {
        self.entries.try_read_for(self.timeout).ok_or_else(|| {
            debug!(timeout = ?self.timeout, "baseline lock (shared) timed out");
            Error::GloballyLocked
        })
    }

    fn write(&self) -> Result<parking_lot::RwLockWriteGuard<'_, FxHashMap<String, V>>> {
        self.entries.try_write_for(self.timeout).ok_or_else(|| {
            debug!(timeout = ?self.timeout, "baseline lock (exclusive) timed out");
            Error::GloballyLocked
        })
    }
}

impl<V: Clone + PartialEq> NaiveMap<V> {
    /// Read a key. Absent keys return `Ok(None)`.
    pub fn get(&self, key: &str) -> Result<Option<V>> {
        Ok(self.read()?.get(key).cloned())
    }

    /// Write a key unconditionally.
    pub fn set(&self, key: &str, value: V) -> Result<()> {
        self.set_with_delay(key, value, Duration::ZERO)
    }

    /// Write a key, pausing for `delay` while the whole map is held.
    pub fn set_with_delay(&self, key: &str, value: V, delay: Duration) -> Result<()> {
        let mut entries = self.write()?;
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        entries.insert(key.to_owned(), value);
        Ok(())
    }

    /// Write a key only if its current payload equals `expected`. An absent
    /// key is inserted unconditionally.
    pub fn set_cond(&self, key: &str, value: V, expected: &V) -> Result<()> {
        let mut entries = self.write()?;
        match entries.get_mut(key) {
            None => {
                entries.insert(key.to_owned(), value);
                Ok(())
            }
            Some(current) if current == expected => {
                *current = value;
                Ok(())
            }
            Some(_) => Err(Error::condition_failed(key)),
        }
    }

    /// Remove a key. Removing an absent key succeeds.
    pub fn del(&self, key: &str) -> Result<()> {
        self.write()?.remove(key);
        Ok(())
    }

    /// Copy every key and payload. Atomic, since one lock covers everything.
    pub fn snapshot(&self) -> Result<HashMap<String, V>> {
        let entries = self.read()?;
        Ok(entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

impl<V> fmt::Debug for NaiveMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NaiveMap")
            .field("lock_timeout", &self.timeout)
            .finish()
    }
}
