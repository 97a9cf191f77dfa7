//! Core types for raftkv
//!
//! This crate defines the vocabulary shared by every map implementation:
//! - [`Command`]: a single batch element as carried by the replicated log
//! - [`Error`] / [`Result`]: lock contention and protocol failures
//! - [`MapConfig`]: the lock timeout policy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod command;
pub mod config;
pub mod error;

pub use command::{Command, Method};
pub use config::{MapConfig, DEFAULT_LOCK_TIMEOUT};
pub use error::{Error, Result};
