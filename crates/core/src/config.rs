//! Lock timeout policy.
//!
//! One duration bounds every lock acquisition in a map: the structure lock
//! and every per-key lock alike. There is no separate policy per operation.
//!
//! ```toml
//! lock_timeout_ms = 250
//! ```

use crate::error::Result;
use serde::Deserialize;
use std::time::Duration;

/// Default bound on a single lock acquisition.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(100);

/// Configuration shared by both map implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "RawMapConfig")]
pub struct MapConfig {
    /// Maximum wait for any single lock. Zero means a pure try-lock.
    pub lock_timeout: Duration,
}

impl MapConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the lock timeout.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Parse a config from TOML. Missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

impl From<Duration> for MapConfig {
    fn from(lock_timeout: Duration) -> Self {
        Self { lock_timeout }
    }
}

/// On-disk shape; durations are spelled in milliseconds.
#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawMapConfig {
    lock_timeout_ms: u64,
}

impl Default for RawMapConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT.as_millis() as u64,
        }
    }
}

impl From<RawMapConfig> for MapConfig {
    fn from(raw: RawMapConfig) -> Self {
        Self {
            lock_timeout: Duration::from_millis(raw.lock_timeout_ms),
        }
    }
}
