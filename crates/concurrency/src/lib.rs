//! Concurrency layer for raftkv
//!
//! This crate implements the state machine a consensus log applies against:
//! - [`Value`]: per-key payload cell with its own try-lock
//! - [`ConcurrentMap`]: structure lock + per-key locks, single-key CRUD,
//!   snapshot and the acquire / commit / abort transaction protocol
//! - [`NaiveMap`]: single-lock baseline with the same single-key behavior
//! - [`KvMap`]: the capability both implementations share
//!
//! Every lock acquisition is bounded by the configured timeout. Contention
//! surfaces as an error and never as a blocked caller.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod map;
pub mod naive;
pub mod traits;
pub mod transaction;
pub mod value;

pub use map::ConcurrentMap;
pub use naive::NaiveMap;
pub use traits::KvMap;
pub use transaction::LockSet;
pub use value::{Value, ValueReadGuard, ValueWriteGuard};
