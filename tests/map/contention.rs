//! Contention Tests
//!
//! Tests for bounded waiting:
//! - Writes to different keys do not serialize behind each other
//! - The baseline serializes everything
//! - Timeouts surface as retryable errors and never leak locks

use crate::common::*;
use raftkv::prelude::*;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

const DELAY: Duration = Duration::from_millis(40);
const WRITERS: usize = 8;

/// Run one delayed write per key from `WRITERS` threads and time the lot.
fn timed_parallel_writes(map: Arc<dyn KvMap<i64>>) -> Duration {
    let barrier = Arc::new(Barrier::new(WRITERS + 1));
    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let map = Arc::clone(&map);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                map.set_with_delay(&key(i), i as i64, DELAY).unwrap();
            })
        })
        .collect();

    barrier.wait();
    let start = Instant::now();
    for h in handles {
        h.join().unwrap();
    }
    start.elapsed()
}

#[test]
fn test_disjoint_writes_overlap() {
    let map = concurrent(LONG_TIMEOUT);
    // Keys must exist so writes take the per-key path.
    for i in 0..WRITERS {
        map.set(&key(i), 0).unwrap();
    }
    let elapsed = timed_parallel_writes(Arc::new(map));
    assert!(
        elapsed < DELAY * (WRITERS as u32) / 2,
        "per-key writes serialized: {:?}",
        elapsed
    );
}

#[test]
fn test_baseline_serializes_writes() {
    let map = naive(LONG_TIMEOUT);
    let elapsed = timed_parallel_writes(Arc::new(map));
    assert!(elapsed >= DELAY * (WRITERS as u32));
}

#[test]
fn test_same_key_writer_times_out() {
    let map = Arc::new(concurrent(Duration::from_millis(10)));
    map.set("hot", 0).unwrap();

    let slow = {
        let map = Arc::clone(&map);
        thread::spawn(move || map.set_with_delay("hot", 1, Duration::from_millis(200)))
    };
    thread::sleep(Duration::from_millis(50));

    let err = map.set("hot", 2).unwrap_err();
    assert!(err.is_lock_contention());
    assert_eq!(err.key(), Some("hot"));

    slow.join().unwrap().unwrap();
    // The timed-out writer left nothing held.
    map.set("hot", 3).unwrap();
    assert_eq!(map.get("hot").unwrap(), Some(3));
}

#[test]
fn test_readers_share_keys() {
    let map = Arc::new(concurrent(LONG_TIMEOUT));
    map.set("shared", 42).unwrap();

    const READERS: usize = 10;
    let barrier = Arc::new(Barrier::new(READERS));
    let handles: Vec<_> = (0..READERS)
        .map(|_| {
            let map = Arc::clone(&map);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..200 {
                    assert_eq!(map.get("shared").unwrap(), Some(42));
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn test_mixed_workload_settles() {
    let map = Arc::new(concurrent(Duration::from_millis(50)));
    const THREADS: usize = 8;
    const OPS: usize = 200;
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let map = Arc::clone(&map);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..OPS {
                    let k = key(i % 16);
                    let res = match (t + i) % 4 {
                        0 => map.set(&k, i as i64),
                        1 => map.get(&k).map(|_| ()),
                        2 => map.del(&k),
                        _ => {
                            let batch = [Command::set(k.clone(), 1), Command::set(key(99), 1)];
                            map.apply_batch(&batch, || i % 2 == 0).map(|_| ())
                        }
                    };
                    if let Err(e) = res {
                        assert!(e.is_retryable(), "unexpected error: {e}");
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    // Every lock was released: a full snapshot and writes to every key succeed.
    let snap = map.snapshot().unwrap();
    assert!(snap.len() <= 17);
    for i in 0..16 {
        map.set(&key(i), -1).unwrap();
    }
    map.set(&key(99), -1).unwrap();
}
