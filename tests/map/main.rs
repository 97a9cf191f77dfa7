//! Map Integration Tests
//!
//! Tests for raftkv maps: single-key semantics, the transaction protocol,
//! contention behavior and baseline equivalence.

#[path = "../common/mod.rs"]
mod common;

mod contention;
mod single_key;
