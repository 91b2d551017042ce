// BucketedPerfectTable integration suite.
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Two-level placement: the outer function picks a bucket, the bucket
//   decides membership; keys never straddle buckets.
// - Outer bound: capacity >= len after every operation; the outer level
//   doubles and redistributes when full.
// - Aggregation: len equals the number of keys yielded by iter();
//   statistics sum over the materialized buckets.
use perfect_hashset::{BucketedPerfectTable, CapacityError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;

fn seeded(capacity: usize, seed: u64) -> BucketedPerfectTable {
    BucketedPerfectTable::with_capacity_and_rng(capacity, StdRng::seed_from_u64(seed))
        .expect("nonzero capacity")
}

// Test: load sixteen keys, delete half.
// Assumes: deletes hit exactly the bucket the outer function names.
// Verifies: the undeleted half remains searchable, the deleted half
// does not, and len tracks both phases.
#[test]
fn insert_sixteen_delete_eight() {
    let mut t = seeded(4, 401);
    let keys: Vec<String> = (0..16).map(|i| format!("entry-{i:02}")).collect();
    for key in &keys {
        assert!(t.insert(key.clone()));
    }
    assert_eq!(t.len(), 16);

    for key in &keys[..8] {
        assert!(t.delete(key));
    }
    assert_eq!(t.len(), 8);
    for key in &keys[..8] {
        assert!(!t.search(key));
    }
    for key in &keys[8..] {
        assert!(t.search(key), "lost {key}");
    }
}

// Test: outer growth under sustained inserts.
// Assumes: the outer level doubles when len reaches the bucket count
// and redistributes every key under a fresh outer function.
// Verifies: capacity() grows, stays >= len, and no key is lost.
#[test]
fn outer_doubling_preserves_keys() {
    let mut t = seeded(1, 402);
    let initial = t.capacity();
    let keys: Vec<String> = (0..40).map(|i| format!("key-{i:02}")).collect();
    for key in &keys {
        assert!(t.insert(key.clone()));
        assert!(t.capacity() >= t.len());
    }
    assert!(t.capacity() > initial);
    assert_eq!(t.iter().count(), 40);
    for key in &keys {
        assert!(t.search(key), "lost {key}");
    }
}

// Test: drain to empty and reuse.
// Assumes: buckets stay materialized after their last key is deleted.
// Verifies: an emptied table reports empty, rejects repeat deletes, and
// accepts the same keys again.
#[test]
fn drain_then_reuse() {
    let mut t = seeded(4, 403);
    let keys: Vec<String> = (0..30).map(|i| format!("tmp-{i:02}")).collect();
    for key in &keys {
        assert!(t.insert(key.clone()));
    }
    for key in &keys {
        assert!(t.delete(key));
    }
    assert!(t.is_empty());
    assert!(!t.delete(&keys[0]));
    assert!(!t.search(&keys[0]));

    assert!(t.insert(keys[0].clone()));
    assert_eq!(t.len(), 1);
    assert!(t.search(&keys[0]));
}

// Test: bulk load.
// Assumes: from_keys sizes the outer level for the key count and
// inserts in order.
// Verifies: distinct keys all load, duplicates collapse, iter() agrees.
#[test]
fn bulk_load_collapses_duplicates() {
    let input = ["apple", "banana", "apple", "cherry", "date", "banana"];
    let t = BucketedPerfectTable::from_keys_with_rng(input, StdRng::seed_from_u64(404));
    assert_eq!(t.len(), 4);
    let keys: BTreeSet<&str> = t.iter().collect();
    assert_eq!(keys, BTreeSet::from(["apple", "banana", "cherry", "date"]));
}

// Test: aggregate statistics.
// Assumes: counters and capacities sum over materialized buckets.
// Verifies: stats() is internally consistent and reproducible under a
// fixed seed; the usage ratio never exceeds the quadratic bucket cap.
#[test]
fn aggregate_stats_are_reproducible() {
    let run = || {
        let mut t = seeded(2, 405);
        for i in 0..50 {
            t.insert(format!("stat-{i:02}"));
        }
        t.stats()
    };
    let a = run();
    let b = run();
    assert_eq!(a, b);
    assert_eq!(a.len, 50);
    assert!(a.capacity >= a.len);
    assert!(a.usage_ratio > 0.0);
    // Each bucket keeps cap >= 4 * len^2, so occupancy tops out at 25%.
    assert!(a.usage_ratio <= 25.0);
}

// Test: entropy-seeded construction with an explicit bucket count.
// Assumes: capacity is the outer slot count and doubling only triggers
// once len reaches it.
// Verifies: with_capacity(8) yields a usable table reporting exactly
// 8 outer slots through an insert/search round trip.
#[test]
fn explicit_capacity_is_honored() {
    let mut t = BucketedPerfectTable::with_capacity(8).unwrap();
    assert_eq!(t.capacity(), 8);
    assert!(t.is_empty());

    assert!(t.insert("mango"));
    assert!(t.insert("papaya"));
    assert!(t.search("mango"));
    assert!(t.search("papaya"));
    assert!(!t.search("guava"));
    assert_eq!(t.len(), 2);
    assert_eq!(t.capacity(), 8);
}

// Test: rejected construction.
// Assumes: a zero-bucket table cannot exist.
// Verifies: with_capacity(0) returns CapacityError::Zero.
#[test]
fn zero_capacity_rejected() {
    assert_eq!(
        BucketedPerfectTable::with_capacity(0).err(),
        Some(CapacityError::Zero)
    );
}
