//! # raftkv
//!
//! Concurrent key-value state machine for a replicated log.
//!
//! The consensus layer decides ordering and durability; this crate is the
//! map it applies committed entries against. Single-key operations run
//! against per-key locks, and multi-key batches go through a two-phase
//! protocol so the durability decision can sit between "every key is held"
//! and "apply or discard".
//!
//! ## Quick Start
//!
//! ```
//! use raftkv::prelude::*;
//! use std::time::Duration;
//!
//! let map = ConcurrentMap::new(Duration::from_millis(50));
//!
//! // Single-key operations
//! map.set("user:1", "alice".to_string())?;
//! assert_eq!(map.get("user:1")?, Some("alice".to_string()));
//!
//! // A batch: lock, wait for the log, then commit
//! let batch = vec![
//!     Command::set("user:2", "bob".to_string()),
//!     Command::set_cond("user:1", "carol".to_string(), "alice".to_string()),
//! ];
//! let locks = map.try_locks(&batch)?;
//! map.write_with_locks(&batch, locks);
//! assert_eq!(map.get("user:1")?, Some("carol".to_string()));
//! # Ok::<(), raftkv::Error>(())
//! ```
//!
//! ## Crates
//!
//! - [`raftkv_core`]: commands, errors and configuration
//! - [`raftkv_concurrency`]: the map implementations

#![warn(missing_docs)]

pub mod prelude;

pub use raftkv_concurrency::{ConcurrentMap, KvMap, LockSet, NaiveMap, Value};
pub use raftkv_core::{Command, Error, MapConfig, Method, Result, DEFAULT_LOCK_TIMEOUT};
