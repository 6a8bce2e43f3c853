//! Merging Iterator Tests
//!
//! Tests verify:
//! - Ascending order across levels
//! - Duplicate suppression (newest version wins)
//! - Tombstone skipping, including tombstones that shadow cascaded records
//! - iter_from positioning
//! - Agreement with the operation history

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use stratakv::{Config, StrataMap};

fn small_config() -> Config {
    Config::builder()
        .min_level(2)
        .min_indexed_level(18)
        .max_fully_allocated_level(5)
        .init_levels(5)
        .build()
        .expect("valid config")
}

// =============================================================================
// Basic Iteration Tests
// =============================================================================

#[test]
fn test_iter_empty_map() {
    let map: StrataMap<u64, u64> = StrataMap::new();
    assert_eq!(map.iter().next(), None);
}

#[test]
fn test_iter_sorted_order() {
    let mut map: StrataMap<u64, &str> = StrataMap::new();

    // Insert in scrambled order
    map.insert(30, "c");
    map.insert(10, "a");
    map.insert(20, "b");

    let entries: Vec<_> = map.iter().collect();
    assert_eq!(entries, vec![(&10, &"a"), (&20, &"b"), (&30, &"c")]);
}

#[test]
fn test_iter_across_cascaded_levels() {
    let mut map: StrataMap<u64, u64> = StrataMap::with_config(small_config()).expect("valid");

    // Spread records across several levels; interleave key ranges so every
    // level contributes to every prefix of the scan
    for key in (0..60).step_by(3) {
        map.insert(key, key);
    }
    for key in (1..60).step_by(3) {
        map.insert(key, key);
    }
    for key in (2..60).step_by(3) {
        map.insert(key, key);
    }

    let keys: Vec<u64> = map.iter().map(|(k, _)| *k).collect();
    let expected: Vec<u64> = (0..60).collect();
    assert_eq!(keys, expected);
}

#[test]
fn test_iter_yields_newest_value() {
    let mut map: StrataMap<u64, u64> = StrataMap::new();

    for key in 1..=128 {
        map.insert(key, key);
    }
    // Keys 1..=128 now live above the bottom level; rewrite one of them
    map.insert(60, 999);

    let entries: Vec<_> = map.iter().filter(|(k, _)| **k == 60).collect();
    assert_eq!(entries, vec![(&60, &999)]);
    assert_eq!(map.iter().count(), 128);
}

#[test]
fn test_iter_skips_tombstones() {
    let mut map: StrataMap<u64, u64> = StrataMap::new();

    for key in 0..10 {
        map.insert(key, key);
    }
    map.erase(3);
    map.erase(7);

    let keys: Vec<u64> = map.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, vec![0, 1, 2, 4, 5, 6, 8, 9]);
}

#[test]
fn test_iter_skips_tombstone_shadowing_higher_level() {
    let mut map: StrataMap<u64, u64> = StrataMap::new();

    // Cascade keys 1..=128 upward, then delete one from the bottom
    for key in 1..=128 {
        map.insert(key, key);
    }
    map.erase(1);

    let first = map.iter().next();
    assert_eq!(first, Some((&2, &2)));
    assert_eq!(map.iter().count(), 127);
}

#[test]
fn test_iter_all_records_deleted() {
    let mut map: StrataMap<u64, u64> = StrataMap::new();

    for key in 0..5 {
        map.insert(key, key);
    }
    for key in 0..5 {
        map.erase(key);
    }

    assert_eq!(map.iter().next(), None);
}

#[test]
fn test_into_iterator_for_reference() {
    let mut map: StrataMap<u64, u64> = StrataMap::new();
    map.insert(1, 2);
    map.insert(3, 4);

    let mut collected = Vec::new();
    for (key, value) in &map {
        collected.push((*key, *value));
    }
    assert_eq!(collected, vec![(1, 2), (3, 4)]);
}

// =============================================================================
// iter_from Tests
// =============================================================================

#[test]
fn test_iter_from_positions_at_lower_bound() {
    let mut map: StrataMap<u64, u64> = StrataMap::new();

    for key in [10, 20, 30, 40] {
        map.insert(key, key * 2);
    }

    let from_exact: Vec<u64> = map.iter_from(&20).map(|(k, _)| *k).collect();
    assert_eq!(from_exact, vec![20, 30, 40]);

    let from_between: Vec<u64> = map.iter_from(&21).map(|(k, _)| *k).collect();
    assert_eq!(from_between, vec![30, 40]);
}

#[test]
fn test_iter_from_past_end() {
    let mut map: StrataMap<u64, u64> = StrataMap::new();
    map.insert(5, 5);

    assert_eq!(map.iter_from(&6).next(), None);
}

#[test]
fn test_iter_from_before_begin() {
    let mut map: StrataMap<u64, u64> = StrataMap::new();
    map.insert(5, 5);
    map.insert(8, 8);

    let keys: Vec<u64> = map.iter_from(&0).map(|(k, _)| *k).collect();
    assert_eq!(keys, vec![5, 8]);
}

#[test]
fn test_iter_from_skips_deleted_start() {
    let mut map: StrataMap<u64, u64> = StrataMap::new();

    for key in 1..=128 {
        map.insert(key, key);
    }
    map.erase(100);

    let keys: Vec<u64> = map.iter_from(&100).take(2).map(|(k, _)| *k).collect();
    assert_eq!(keys, vec![101, 102]);
}

// =============================================================================
// History Agreement Tests
// =============================================================================

#[test]
fn test_iter_equals_sorted_dedup_of_operations() {
    let mut map: StrataMap<u64, u64> = StrataMap::with_config(small_config()).expect("valid");
    let mut history: BTreeMap<u64, u64> = BTreeMap::new();
    let mut rng = StdRng::seed_from_u64(0x5EED);

    for _ in 0..2000 {
        let key = rng.gen_range(0..400);
        if rng.gen_bool(0.25) {
            map.erase(key);
            history.remove(&key);
        } else {
            let value = rng.gen::<u32>() as u64;
            map.insert(key, value);
            history.insert(key, value);
        }
    }

    // The scan is exactly the sorted dedup of the surviving operations
    let scanned: Vec<(u64, u64)> = map.iter().map(|(k, v)| (*k, *v)).collect();
    let expected: Vec<(u64, u64)> = history.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(scanned, expected);

    // And iter_from agrees with a range scan of the history at every cut
    for probe in (0..400).step_by(13) {
        let scanned: Vec<u64> = map.iter_from(&probe).map(|(k, _)| *k).collect();
        let expected: Vec<u64> = history.range(probe..).map(|(k, _)| *k).collect();
        assert_eq!(scanned, expected, "iter_from({probe}) diverged");
    }
}
