//! Capability shared by both map implementations.
//!
//! The state-machine layer is generic over [`KvMap`], so the fine-grained
//! [`ConcurrentMap`] and the coarse [`NaiveMap`] can be swapped for
//! correctness and performance comparisons.

use crate::map::ConcurrentMap;
use crate::naive::NaiveMap;
use raftkv_core::Result;
use std::time::Duration;

/// Single-key read/write access.
pub trait KvMap<V>: Send + Sync {
    /// Read a key. Absent keys return `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<V>>;

    /// Write a key unconditionally.
    fn set(&self, key: &str, value: V) -> Result<()>;

    /// Write a key with an artificial pause while its lock is held.
    fn set_with_delay(&self, key: &str, value: V, delay: Duration) -> Result<()>;
}

impl<V> KvMap<V> for ConcurrentMap<V>
where
    V: Clone + PartialEq + Send + Sync,
{
    fn get(&self, key: &str) -> Result<Option<V>> {
        ConcurrentMap::get(self, key)
    }

    fn set(&self, key: &str, value: V) -> Result<()> {
        ConcurrentMap::set(self, key, value)
    }

    fn set_with_delay(&self, key: &str, value: V, delay: Duration) -> Result<()> {
        ConcurrentMap::set_with_delay(self, key, value, delay)
    }
}

impl<V> KvMap<V> for NaiveMap<V>
where
    V: Clone + PartialEq + Send + Sync,
{
    fn get(&self, key: &str) -> Result<Option<V>> {
        NaiveMap::get(self, key)
    }

    fn set(&self, key: &str, value: V) -> Result<()> {
        NaiveMap::set(self, key, value)
    }

    fn set_with_delay(&self, key: &str, value: V, delay: Duration) -> Result<()> {
        NaiveMap::set_with_delay(self, key, value, delay)
    }
}
