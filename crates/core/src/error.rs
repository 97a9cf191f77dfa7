//! Error types for map operations.
//!
//! Every lock in the system is acquired with a bounded wait, so contention
//! surfaces as an error rather than a blocked caller. Callers decide whether
//! to retry; nothing in the map retries internally.

use crate::command::Method;
use thiserror::Error;

/// All raftkv errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The structure lock could not be acquired within the timeout.
    ///
    /// No state was changed.
    #[error("map is locked globally")]
    GloballyLocked,

    /// A key's own lock could not be acquired within the timeout.
    ///
    /// No state was changed for the operation or batch.
    #[error("map is locked on key={key}")]
    KeyLocked {
        /// The contended key
        key: String,
    },

    /// A conditional write found a payload other than the expected one.
    #[error("condition not satisfied on key={key}")]
    ConditionFailed {
        /// The key whose condition failed
        key: String,
    },

    /// A transaction was submitted with no operations.
    #[error("no key given")]
    EmptyBatch,

    /// The commit or abort phase was driven with a batch it cannot apply.
    ///
    /// This is a caller bug, not a runtime condition. The map raises it as a
    /// panic; the variant exists so the message is formatted consistently.
    #[error("protocol violation: {method} on key={key}: {reason}")]
    Protocol {
        /// Method of the offending command
        method: Method,
        /// Key of the offending command
        key: String,
        /// What was wrong with it
        reason: &'static str,
    },

    /// The configuration could not be parsed.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type for raftkv operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error may succeed when the operation is resubmitted.
    ///
    /// Lock timeouts and failed conditions depend on concurrent state and can
    /// clear up; empty batches and protocol violations never will.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::GloballyLocked | Error::KeyLocked { .. } | Error::ConditionFailed { .. }
        )
    }

    /// Check if this error was caused by a lock timeout.
    pub fn is_lock_contention(&self) -> bool {
        matches!(self, Error::GloballyLocked | Error::KeyLocked { .. })
    }

    /// Check if this is a failed conditional write.
    pub fn is_condition_failed(&self) -> bool {
        matches!(self, Error::ConditionFailed { .. })
    }

    /// The key this error refers to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Error::KeyLocked { key }
            | Error::ConditionFailed { key }
            | Error::Protocol { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Shorthand for [`Error::KeyLocked`].
    pub fn key_locked(key: impl Into<String>) -> Self {
        Error::KeyLocked { key: key.into() }
    }

    /// Shorthand for [`Error::ConditionFailed`].
    pub fn condition_failed(key: impl Into<String>) -> Self {
        Error::ConditionFailed { key: key.into() }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}
