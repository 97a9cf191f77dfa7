//! Convenient imports for raftkv.
//!
//! ```
//! use raftkv::prelude::*;
//!
//! let map: ConcurrentMap<u64> = ConcurrentMap::with_config(MapConfig::default());
//! map.set("k", 1)?;
//! # Ok::<(), Error>(())
//! ```

// Map implementations
pub use raftkv_concurrency::{ConcurrentMap, KvMap, LockSet, NaiveMap};

// Commands
pub use raftkv_core::{Command, Method};

// Configuration
pub use raftkv_core::MapConfig;

// Error handling
pub use raftkv_core::{Error, Result};
