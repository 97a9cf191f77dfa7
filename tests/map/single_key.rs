//! Single-key operation tests
//!
//! - Absent keys read as not-found
//! - Set/Get/Del round trips
//! - Conditional writes never partially apply
//! - Config-driven construction

use crate::common::*;
use raftkv::prelude::*;
use std::collections::HashMap;

#[test]
fn test_never_written_key_not_found() {
    let map = concurrent(SHORT_TIMEOUT);
    for i in 0..100 {
        assert_eq!(map.get(&key(i)).unwrap(), None);
    }
}

#[test]
fn test_set_get_del() {
    let map = concurrent(SHORT_TIMEOUT);
    map.set("a", 1).unwrap();
    assert_eq!(map.get("a").unwrap(), Some(1));
    map.del("a").unwrap();
    assert_eq!(map.get("a").unwrap(), None);
}

#[test]
fn test_set_cond_chain() {
    let map = concurrent(SHORT_TIMEOUT);
    map.set("counter", 0).unwrap();
    for i in 0..10 {
        map.set_cond("counter", i + 1, &i).unwrap();
    }
    assert_eq!(map.get("counter").unwrap(), Some(10));

    let err = map.set_cond("counter", 100, &3).unwrap_err();
    assert_eq!(err, Error::ConditionFailed { key: "counter".into() });
    assert!(err.is_retryable());
    assert_eq!(map.get("counter").unwrap(), Some(10));
}

#[test]
fn test_set_cond_on_absent_key_inserts_on_both_maps() {
    let fine = concurrent(SHORT_TIMEOUT);
    let coarse = naive(SHORT_TIMEOUT);

    fine.set_cond("fresh", 1, &0).unwrap();
    coarse.set_cond("fresh", 1, &0).unwrap();
    assert_eq!(fine.get("fresh").unwrap(), Some(1));
    assert_eq!(coarse.get("fresh").unwrap(), Some(1));

    // The stored value is now what later expectations compare against.
    assert!(fine.set_cond("fresh", 2, &0).unwrap_err().is_condition_failed());
    assert!(coarse.set_cond("fresh", 2, &0).unwrap_err().is_condition_failed());
    fine.set_cond("fresh", 2, &1).unwrap();
    coarse.set_cond("fresh", 2, &1).unwrap();
    assert_eq!(fine.snapshot().unwrap(), coarse.snapshot().unwrap());
}

#[test]
fn test_string_payloads() {
    let map: ConcurrentMap<String> = ConcurrentMap::with_config(MapConfig::default());
    map.set("greeting", "hello".to_string()).unwrap();
    map.set_cond("greeting", "bye".to_string(), &"hello".to_string())
        .unwrap();
    assert_eq!(map.get("greeting").unwrap().as_deref(), Some("bye"));
}

#[test]
fn test_config_from_toml() {
    let config = MapConfig::from_toml_str("lock_timeout_ms = 7").unwrap();
    let map: ConcurrentMap<i64> = ConcurrentMap::with_config(config);
    assert_eq!(map.lock_timeout().as_millis(), 7);
    let baseline: NaiveMap<i64> = NaiveMap::with_config(config);
    assert_eq!(baseline.lock_timeout().as_millis(), 7);
}

#[test]
fn test_seeded_map() {
    let seed: HashMap<String, i64> = (0..5).map(|i| (key(i), i as i64)).collect();
    let map = ConcurrentMap::from_map(seed.clone(), MapConfig::default());
    assert_eq!(map.len().unwrap(), 5);
    assert_eq!(map.snapshot().unwrap(), seed);
    map.del(&key(0)).unwrap();
    assert_eq!(map.len().unwrap(), 4);
}
