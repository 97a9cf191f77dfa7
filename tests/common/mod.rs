//! Shared helpers for integration tests.

#![allow(dead_code)]

use raftkv::prelude::*;
use std::sync::Once;
use std::time::Duration;

/// Lock timeout for tests that expect contention to resolve quickly.
pub const SHORT_TIMEOUT: Duration = Duration::from_millis(20);

/// Lock timeout for tests where contention must wait its turn, not fail.
pub const LONG_TIMEOUT: Duration = Duration::from_secs(2);

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness (shown on failure only).
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
            .try_init();
    });
}

pub fn concurrent(timeout: Duration) -> ConcurrentMap<i64> {
    init_tracing();
    ConcurrentMap::with_config(MapConfig::new().lock_timeout(timeout))
}

pub fn naive(timeout: Duration) -> NaiveMap<i64> {
    init_tracing();
    NaiveMap::with_config(MapConfig::new().lock_timeout(timeout))
}

/// Key name used by the generated workloads.
pub fn key(i: usize) -> String {
    format!("key_{:04}", i)
}
