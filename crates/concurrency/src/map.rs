//! Fine-grained concurrent map
//!
//! Two lock levels guard the map:
//! - the structure lock, around the key set (insert, remove, lookup, enumerate)
//! - one lock per [`Value`], around that key's payload
//!
//! Every acquisition waits at most `lock_timeout`. A timeout is reported to
//! the caller as [`Error::GloballyLocked`] or [`Error::KeyLocked`] and leaves
//! no lock behind; retrying is the caller's decision.
//!
//! # Lock Discipline
//!
//! - Inserting or removing a key requires the structure lock exclusively.
//! - Reading or writing a payload requires that key's cell lock.
//! - Single-key operations drop the structure lock as soon as the cell lock
//!   is held, so payload mutations of different keys never serialize
//!   behind each other.
//!
//! The multi-key transaction protocol lives in [`crate::transaction`].

use crate::value::Value;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use raftkv_core::{Error, MapConfig, Result};
use rustc_hash::FxHashMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;
use tracing::debug;

static NEXT_MAP_ID: AtomicU64 = AtomicU64::new(1);

/// Concurrent key-value map with per-key locking and a two-phase
/// transaction protocol.
///
/// # Example
///
/// ```
/// use raftkv_concurrency::ConcurrentMap;
/// use std::time::Duration;
///
/// let map = ConcurrentMap::new(Duration::from_millis(50));
/// map.set("a", 1).unwrap();
/// assert_eq!(map.get("a").unwrap(), Some(1));
/// map.set_cond("a", 2, &1).unwrap();
/// assert!(map.set_cond("a", 3, &1).is_err());
/// map.del("a").unwrap();
/// assert_eq!(map.get("a").unwrap(), None);
/// ```
pub struct ConcurrentMap<V> {
    /// Key set, guarded by the structure lock
    pub(crate) entries: RwLock<FxHashMap<String, Value<V>>>,
    /// Bound on every lock acquisition
    pub(crate) timeout: Duration,
    /// Identifies lock sets taken on this map
    pub(crate) id: u64,
}

impl<V> ConcurrentMap<V> {
    /// Create an empty map with the given lock timeout.
    pub fn new(lock_timeout: Duration) -> Self {
        Self::with_config(MapConfig::from(lock_timeout))
    }

    /// Create an empty map from a config.
    pub fn with_config(config: MapConfig) -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
            timeout: config.lock_timeout,
            id: NEXT_MAP_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Create a map seeded with committed values.
    pub fn from_map<I>(contents: I, config: MapConfig) -> Self
    where
        I: IntoIterator<Item = (String, V)>,
    {
        let map = Self::with_config(config);
        {
            let mut entries = map.entries.write();
            entries.extend(contents.into_iter().map(|(k, v)| (k, Value::new(v))));
        }
        map
    }

    /// The configured lock timeout.
    pub fn lock_timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of committed keys. Placeholders of in-flight transactions are
    /// not counted.
    pub fn len(&self) -> Result<usize> {
        let entries = self.read_structure()?;
        Ok(entries.values().filter(|v| !v.is_temporary()).count())
    }

    /// Whether the map holds no committed keys.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether `key` is present as a committed value.
    pub fn contains_key(&self, key: &str) -> Result<bool> {
        let entries = self.read_structure()?;
        Ok(entries.get(key).map_or(false, |v| !v.is_temporary()))
    }

    pub(crate) fn read_structure(
        &self,
    ) -> Result<RwLockReadGuard<'_, FxHashMap<String, Value<V>>>> {
        self.entries.try_read_for(self.timeout).ok_or_else(|| {
            debug!(timeout = ?self.timeout, "structure lock (shared) timed out");
            Error::GloballyLocked
        })
    }

    pub(crate) fn write_structure(
        &self,
    ) -> Result<RwLockWriteGuard<'_, FxHashMap<String, Value<V>>>> {
        self.entries.try_write_for(self.timeout).ok_or_else(|| {
            debug!(timeout = ?self.timeout, "structure lock (exclusive) timed out");
            Error::GloballyLocked
        })
    }
}

impl<V: Clone + PartialEq> ConcurrentMap<V> {
    /// Read a key.
    ///
    /// Returns `Ok(None)` for an absent key; that is not an error.
    pub fn get(&self, key: &str) -> Result<Option<V>> {
        let entries = self.read_structure()?;
        let Some(cell) = entries.get(key) else {
            return Ok(None);
        };
        let Some(guard) = cell.try_read_for(self.timeout) else {
            drop(entries);
            debug!(key = %key, "read lock timed out");
            return Err(Error::key_locked(key));
        };
        // Map shape no longer needed once the cell is held.
        drop(entries);
        // An unresolved placeholder reads as absent.
        Ok((*guard).clone())
    }

    /// Write a key unconditionally.
    pub fn set(&self, key: &str, value: V) -> Result<()> {
        self.write(key, value, None, Duration::ZERO)
    }

    /// Write a key only if its current payload equals `expected`.
    ///
    /// An absent key has nothing to compare against and is inserted
    /// unconditionally, the same as [`set`](Self::set).
    pub fn set_cond(&self, key: &str, value: V, expected: &V) -> Result<()> {
        self.write(key, value, Some(expected), Duration::ZERO)
    }

    /// [`set`](Self::set) with an artificial pause between taking the cell
    /// lock and mutating it. Used to provoke contention in tests and benches.
    pub fn set_with_delay(&self, key: &str, value: V, delay: Duration) -> Result<()> {
        self.write(key, value, None, delay)
    }

    pub(crate) fn write(
        &self,
        key: &str,
        value: V,
        expected: Option<&V>,
        delay: Duration,
    ) -> Result<()> {
        let mut entries = self.write_structure()?;
        let Some(cell) = entries.get_mut(key) else {
            // Nobody could have observed the key yet, so no cell lock is needed.
            entries.insert(key.to_owned(), Value::new(value));
            return Ok(());
        };

        let Some(mut guard) = cell.try_write_for(self.timeout) else {
            drop(entries);
            debug!(key = %key, "write lock timed out");
            return Err(Error::key_locked(key));
        };

        if cell.is_temporary() {
            // Placeholder left behind by an unresolved lock set: the key does
            // not exist yet, so resolve it while the structure is still held.
            *guard = Some(value);
            cell.mark_committed();
            return Ok(());
        }

        drop(entries);

        if !delay.is_zero() {
            thread::sleep(delay);
        }
        if let Some(expected) = expected {
            if (*guard).as_ref() != Some(expected) {
                debug!(key = %key, "condition not satisfied");
                return Err(Error::condition_failed(key));
            }
        }
        *guard = Some(value);
        Ok(())
    }

    /// Remove a key. Removing an absent key succeeds.
    ///
    /// A key whose cell lock is held elsewhere is never removed.
    pub fn del(&self, key: &str) -> Result<()> {
        let mut entries = self.write_structure()?;
        let Some(cell) = entries.get(key) else {
            return Ok(());
        };
        let Some(guard) = cell.try_write_for(self.timeout) else {
            drop(entries);
            debug!(key = %key, "delete lock timed out");
            return Err(Error::key_locked(key));
        };
        entries.remove(key);
        drop(entries);
        drop(guard);
        Ok(())
    }

    /// Copy every committed key and payload.
    ///
    /// The shared structure lock is held for the whole enumeration, so the
    /// key set is a point-in-time view. Placeholders are skipped; a committed
    /// key whose cell lock cannot be taken within the timeout fails the whole
    /// snapshot with [`Error::KeyLocked`].
    ///
    /// A key locked by a batch stays locked until that batch is committed or
    /// aborted, so while batches are in flight callers should expect
    /// `KeyLocked` and retry once the batch resolves.
    pub fn snapshot(&self) -> Result<HashMap<String, V>> {
        let entries = self.read_structure()?;
        let mut out = HashMap::with_capacity(entries.len());
        for (key, cell) in entries.iter() {
            if cell.is_temporary() {
                continue;
            }
            let Some(guard) = cell.try_read_for(self.timeout) else {
                debug!(key = %key, "snapshot read lock timed out");
                return Err(Error::key_locked(key.as_str()));
            };
            if let Some(payload) = (*guard).as_ref() {
                out.insert(key.clone(), payload.clone());
            }
        }
        Ok(out)
    }
}

impl<V> fmt::Debug for ConcurrentMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentMap")
            .field("id", &self.id)
            .field("lock_timeout", &self.timeout)
            .finish()
    }
}
