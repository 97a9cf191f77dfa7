//! Batch elements applied against the map.
//!
//! A [`Command`] is what the consensus layer hands over once a log entry is
//! committed. Transactions are slices of commands; single-key operations use
//! the map API directly.
//!
//! ## Wire shape
//!
//! Commands are serde-tagged by method so they can travel inside log entries:
//!
//! ```text
//! {"method":"SET","key":"a","value":1}
//! {"method":"SET","key":"a","value":2,"cond":1}
//! {"method":"DEL","key":"a"}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a [`Command`], used for logging and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// Read a key
    Get,
    /// Write a key, optionally conditioned on its current payload
    Set,
    /// Remove a key
    Del,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Set => "SET",
            Method::Del => "DEL",
        };
        f.write_str(s)
    }
}

/// A single operation addressed by key.
///
/// A conditional write is a `Set` with `cond: Some(expected)`; `cond: None`
/// always matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "UPPERCASE")]
pub enum Command<V> {
    /// Read `key`. Reserves the key in the acquire phase; cannot be committed.
    Get {
        /// Target key
        key: String,
    },
    /// Write `value` to `key`
    Set {
        /// Target key
        key: String,
        /// New payload
        value: V,
        /// Expected prior payload for a conditional write
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cond: Option<V>,
    },
    /// Remove `key`
    Del {
        /// Target key
        key: String,
    },
}

impl<V> Command<V> {
    /// Unconditional write.
    pub fn set(key: impl Into<String>, value: V) -> Self {
        Command::Set {
            key: key.into(),
            value,
            cond: None,
        }
    }

    /// Write that only applies if the current payload equals `expected`.
    pub fn set_cond(key: impl Into<String>, value: V, expected: V) -> Self {
        Command::Set {
            key: key.into(),
            value,
            cond: Some(expected),
        }
    }

    /// Delete.
    pub fn del(key: impl Into<String>) -> Self {
        Command::Del { key: key.into() }
    }

    /// Read.
    pub fn get(key: impl Into<String>) -> Self {
        Command::Get { key: key.into() }
    }

    /// The key this command addresses.
    pub fn key(&self) -> &str {
        match self {
            Command::Get { key } | Command::Set { key, .. } | Command::Del { key } => key,
        }
    }

    /// The command's method.
    pub fn method(&self) -> Method {
        match self {
            Command::Get { .. } => Method::Get,
            Command::Set { .. } => Method::Set,
            Command::Del { .. } => Method::Del,
        }
    }

    /// Expected prior payload, for conditional writes only.
    pub fn expected(&self) -> Option<&V> {
        match self {
            Command::Set { cond, .. } => cond.as_ref(),
            _ => None,
        }
    }

    /// Whether this is a conditional write.
    pub fn is_conditional(&self) -> bool {
        self.expected().is_some()
    }
}
