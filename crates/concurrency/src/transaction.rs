//! Two-phase locking for multi-key batches
//!
//! A batch is applied in three steps, driven by the log-apply layer:
//!
//! ```text
//! 1. try_locks(batch)            -> LockSet   every key held exclusively
//!    ... upstream decides whether the batch is durable ...
//! 2a. write_with_locks(batch, locks)          apply, unlock
//! 2b. abort_with_locks(batch, locks)          discard placeholders, unlock
//! ```
//!
//! The acquire phase is the only point where a batch can lose against
//! concurrent operations on the same keys. Keys that do not exist yet are
//! reserved with temporary placeholders that are linked into the map only if
//! every key was locked. On any failure everything taken so far is released
//! before the error is returned.
//!
//! Commit and abort only touch keys the [`LockSet`] already holds, so they
//! cannot fail at runtime. A batch that does not line up with its lock set,
//! or a `GET` reaching commit, is a caller bug and panics.

use crate::map::ConcurrentMap;
use crate::value::{Value, ValueWriteGuard};
use raftkv_core::{Command, Error, Result};
use rustc_hash::FxHashMap;
use std::fmt;
use tracing::{error, trace, warn};

/// Per-key locks held between the acquire phase and commit/abort.
///
/// Returned by [`ConcurrentMap::try_locks`] and consumed by
/// [`ConcurrentMap::write_with_locks`] or [`ConcurrentMap::abort_with_locks`].
/// Dropping it unresolved releases the locks but leaves any placeholders
/// linked; they read as absent until a later write or delete resolves them.
#[must_use = "a lock set must be committed or aborted"]
pub struct LockSet<V> {
    map_id: u64,
    guards: FxHashMap<String, ValueWriteGuard<V>>,
}

impl<V> LockSet<V> {
    /// Number of keys held.
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// Whether no keys are held.
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    fn take(&mut self, cmd: &Command<V>) -> ValueWriteGuard<V> {
        match self.guards.remove(cmd.key()) {
            Some(guard) => guard,
            None => protocol_violation(cmd, "key is not held by the lock set"),
        }
    }

    fn ensure_drained(&self) {
        if let Some(key) = self.guards.keys().next() {
            error!(key = %key, "lock set holds a key missing from the batch");
            panic!("protocol violation: lock set holds key={key} missing from the batch");
        }
    }
}

impl<V> Drop for LockSet<V> {
    fn drop(&mut self) {
        if !self.guards.is_empty() {
            warn!(
                keys = self.guards.len(),
                "lock set dropped without commit or abort"
            );
        }
    }
}

impl<V> fmt::Debug for LockSet<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockSet")
            .field("map_id", &self.map_id)
            .field("keys", &self.guards.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn protocol_violation<V>(cmd: &Command<V>, reason: &'static str) -> ! {
    let err = Error::Protocol {
        method: cmd.method(),
        key: cmd.key().to_owned(),
        reason,
    };
    error!(error = %err, "fatal transaction protocol error");
    panic!("{err}");
}

impl<V: Clone + PartialEq> ConcurrentMap<V> {
    /// Acquire phase: lock every key of `batch` exclusively, in batch order.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyBatch`] if `batch` is empty
    /// - [`Error::GloballyLocked`] if the structure lock timed out
    /// - [`Error::KeyLocked`] if a key's lock timed out, or a key appears
    ///   twice in the batch
    /// - [`Error::ConditionFailed`] if a conditional write's expectation
    ///   does not hold
    ///
    /// On error no lock is held and the map is unchanged.
    pub fn try_locks(&self, batch: &[Command<V>]) -> Result<LockSet<V>> {
        if batch.is_empty() {
            return Err(Error::EmptyBatch);
        }
        let mut entries = self.write_structure()?;

        let mut guards: FxHashMap<String, ValueWriteGuard<V>> = FxHashMap::default();
        // Placeholders for absent keys, linked only if the whole batch locks.
        let mut staged: Vec<(String, Value<V>)> = Vec::new();
        let mut failure = None;

        for cmd in batch {
            let key = cmd.key();
            if guards.contains_key(key) {
                // Locks are not reentrant; waiting on ourselves would only time out.
                failure = Some(Error::key_locked(key));
                break;
            }
            let acquired = match entries.get(key) {
                Some(cell) => cell.try_write_for(self.timeout),
                None => {
                    let cell = Value::placeholder();
                    let guard = cell.try_write_for(self.timeout);
                    staged.push((key.to_owned(), cell));
                    guard
                }
            };
            let Some(guard) = acquired else {
                failure = Some(Error::key_locked(key));
                break;
            };
            let satisfied = match cmd.expected() {
                Some(expected) => (*guard).as_ref() == Some(expected),
                None => true,
            };
            guards.insert(key.to_owned(), guard);
            if !satisfied {
                failure = Some(Error::condition_failed(key));
                break;
            }
        }

        match failure {
            None => {
                entries.extend(staged);
                drop(entries);
                trace!(
                    batch_len = batch.len(),
                    conditional = batch.iter().filter(|c| c.is_conditional()).count(),
                    "batch locked"
                );
                Ok(LockSet {
                    map_id: self.id,
                    guards,
                })
            }
            Some(err) => {
                drop(entries);
                let held = guards.len();
                drop(guards);
                drop(staged);
                warn!(error = %err, released = held, "acquire phase reverted");
                Err(err)
            }
        }
    }

    /// Commit phase: apply every write and delete of `batch`, releasing its
    /// locks.
    ///
    /// # Panics
    ///
    /// If `locks` was taken on another map or does not match `batch`, or if
    /// `batch` contains a `GET`.
    pub fn write_with_locks(&self, batch: &[Command<V>], mut locks: LockSet<V>) {
        self.check_owner(&locks);
        let mut entries = self.entries.write();
        for cmd in batch {
            match cmd {
                Command::Set { key, value, .. } => {
                    let mut guard = locks.take(cmd);
                    let Some(cell) = entries.get_mut(key.as_str()) else {
                        protocol_violation(cmd, "locked key vanished from the map")
                    };
                    *guard = Some(value.clone());
                    cell.mark_committed();
                }
                Command::Del { key } => {
                    let guard = locks.take(cmd);
                    entries.remove(key.as_str());
                    drop(guard);
                }
                Command::Get { .. } => {
                    protocol_violation(cmd, "only SET and DEL can be committed")
                }
            }
        }
        locks.ensure_drained();
        drop(entries);
        trace!(batch_len = batch.len(), "batch committed");
    }

    /// Abort phase: drop placeholders created by the acquire phase and
    /// release every lock, leaving prior payloads untouched.
    ///
    /// # Panics
    ///
    /// If `locks` was taken on another map or does not match `batch`.
    pub fn abort_with_locks(&self, batch: &[Command<V>], mut locks: LockSet<V>) {
        self.check_owner(&locks);
        let mut entries = self.entries.write();
        for cmd in batch {
            let key = cmd.key();
            let guard = locks.take(cmd);
            if entries.get(key).map_or(false, Value::is_temporary) {
                entries.remove(key);
            }
            drop(guard);
        }
        locks.ensure_drained();
        drop(entries);
        trace!(batch_len = batch.len(), "batch aborted");
    }

    /// Run the whole protocol: acquire, ask `durable` whether the batch made
    /// it into the log, then commit or abort.
    ///
    /// Returns `Ok(true)` if the batch was committed, `Ok(false)` if it was
    /// aborted, and the acquire-phase error otherwise.
    pub fn apply_batch<F>(&self, batch: &[Command<V>], durable: F) -> Result<bool>
    where
        F: FnOnce() -> bool,
    {
        let locks = self.try_locks(batch)?;
        if durable() {
            self.write_with_locks(batch, locks);
            Ok(true)
        } else {
            self.abort_with_locks(batch, locks);
            Ok(false)
        }
    }

    fn check_owner(&self, locks: &LockSet<V>) {
        if locks.map_id != self.id {
            error!(
                lock_set_map = locks.map_id,
                map = self.id,
                "lock set resolved against the wrong map"
            );
            panic!(
                "protocol violation: lock set from map {} resolved on map {}",
                locks.map_id, self.id
            );
        }
    }
}
