//! Per-key value cell.
//!
//! Each key owns one [`Value`]: a payload slot behind its own reader/writer
//! lock plus a `temporary` tag. Guards are owned (`Arc`-backed) so a lock can
//! outlive the call that took it; the transaction protocol relies on this to
//! hold keys between the acquire phase and commit/abort.

use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::{RawRwLock, RwLock};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Owned shared guard over a cell's payload.
pub type ValueReadGuard<V> = ArcRwLockReadGuard<RawRwLock, Option<V>>;

/// Owned exclusive guard over a cell's payload.
pub type ValueWriteGuard<V> = ArcRwLockWriteGuard<RawRwLock, Option<V>>;

/// A single mutable slot in the map.
///
/// The payload is `None` only for a temporary placeholder that no commit has
/// written yet. The `temporary` flag itself is not behind the cell lock; the
/// owning map only changes it while holding its structure lock exclusively.
pub struct Value<V> {
    payload: Arc<RwLock<Option<V>>>,
    temporary: bool,
}

impl<V> Value<V> {
    /// Create a committed cell holding `payload`.
    pub fn new(payload: V) -> Self {
        Self {
            payload: Arc::new(RwLock::new(Some(payload))),
            temporary: false,
        }
    }

    /// Create an empty placeholder reserving a key that does not exist yet.
    pub fn placeholder() -> Self {
        Self {
            payload: Arc::new(RwLock::new(None)),
            temporary: true,
        }
    }

    /// Whether this cell is an uncommitted placeholder.
    #[inline]
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// Turn a placeholder into a real value.
    #[inline]
    pub(crate) fn mark_committed(&mut self) {
        self.temporary = false;
    }

    /// Try to take the cell lock shared, waiting at most `timeout`.
    #[inline]
    pub fn try_read_for(&self, timeout: Duration) -> Option<ValueReadGuard<V>> {
        self.payload.try_read_arc_for(timeout)
    }

    /// Try to take the cell lock exclusively, waiting at most `timeout`.
    #[inline]
    pub fn try_write_for(&self, timeout: Duration) -> Option<ValueWriteGuard<V>> {
        self.payload.try_write_arc_for(timeout)
    }

    /// Whether any reader or writer currently holds the cell lock.
    pub fn is_locked(&self) -> bool {
        self.payload.is_locked()
    }
}

impl<V> fmt::Debug for Value<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("temporary", &self.temporary)
            .field("locked", &self.is_locked())
            .finish()
    }
}
