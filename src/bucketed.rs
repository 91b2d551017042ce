//! BucketedPerfectTable: two-level perfect table with linear expected space.

use crate::bit_matrix::BitMatrixHasher;
use crate::quadratic::{CapacityError, QuadraticPerfectTable, TableStats};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Bucket-slot count of a default-constructed table.
const DEFAULT_CAPACITY: usize = 5;

/// Slot capacity a bucket is born with. Buckets grow on their own, so
/// starting tiny is what keeps aggregate space linear in the key count
/// rather than quadratic per bucket.
const BUCKET_INITIAL_CAPACITY: usize = 4;

/// A two-level perfect hash table over string keys.
///
/// An outer hash function spreads keys across buckets; each materialized
/// bucket is a [`QuadraticPerfectTable`] handling its own collisions
/// independently. The outer level keeps `capacity >= len` by doubling
/// (resampling the outer function and redistributing every key), and
/// each bucket keeps its quadratic bound over its own small population,
/// so lookups stay two probes while total space stays linear in
/// expectation. Buckets are created on first placement and seeded from
/// the table's own generator, so a fixed outer seed fixes the entire
/// structure.
pub struct BucketedPerfectTable<R = StdRng> {
    buckets: Vec<Option<QuadraticPerfectTable<R>>>,
    len: usize,
    capacity: usize,
    outer: BitMatrixHasher,
    rng: R,
}

impl BucketedPerfectTable<StdRng> {
    /// Creates an empty table with the default bucket-slot count,
    /// seeded from OS entropy.
    pub fn new() -> Self {
        Self::new_inner(DEFAULT_CAPACITY, StdRng::from_entropy())
    }

    /// Creates an empty table with an explicit bucket-slot count.
    pub fn with_capacity(capacity: usize) -> Result<Self, CapacityError> {
        Self::with_capacity_and_rng(capacity, StdRng::from_entropy())
    }

    /// Bulk-loads a table from `keys`, inserting each in order. The
    /// outer level is sized for the key count up front.
    pub fn from_keys<I>(keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::from_keys_with_rng(keys, StdRng::from_entropy())
    }
}

impl Default for BucketedPerfectTable<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng + SeedableRng> BucketedPerfectTable<R> {
    /// Creates an empty table with the default bucket-slot count and an
    /// owned random generator, the customization point for
    /// deterministic construction in tests.
    pub fn with_rng(rng: R) -> Self {
        Self::new_inner(DEFAULT_CAPACITY, rng)
    }

    /// Creates an empty table with an explicit bucket-slot count and an
    /// owned random generator.
    pub fn with_capacity_and_rng(capacity: usize, rng: R) -> Result<Self, CapacityError> {
        if capacity == 0 {
            return Err(CapacityError::Zero);
        }
        Ok(Self::new_inner(capacity, rng))
    }

    /// Bulk-load with an owned random generator.
    pub fn from_keys_with_rng<I>(keys: I, rng: R) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let capacity = keys.len().max(DEFAULT_CAPACITY);
        let mut table = Self::new_inner(capacity, rng);
        for key in keys {
            table.insert(key);
        }
        table
    }

    fn new_inner(capacity: usize, mut rng: R) -> Self {
        let outer = BitMatrixHasher::sample(capacity, &mut rng);
        Self {
            buckets: (0..capacity).map(|_| None).collect(),
            len: 0,
            capacity,
            outer,
            rng,
        }
    }

    /// Inserts `key`; returns `true` if it was newly added. Outer
    /// doubling happens before placement, so the target bucket is
    /// always the one the committed outer function maps `key` to.
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        let key = key.into();
        if self.len >= self.capacity {
            self.grow();
        }
        let index = self.outer.index_of(&key);
        let bucket = Self::materialize(&mut self.buckets[index], &mut self.rng);
        if bucket.insert(key) {
            self.len += 1;
            true
        } else {
            false
        }
    }

    /// Removes `key`; returns `true` if it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        let index = self.outer.index_of(key);
        let deleted = self.buckets[index]
            .as_mut()
            .map_or(false, |bucket| bucket.delete(key));
        if deleted {
            self.len -= 1;
        }
        deleted
    }

    /// Returns `true` if `key` is present. An unmaterialized bucket
    /// means the key was never placed there.
    pub fn search(&self, key: &str) -> bool {
        self.buckets[self.outer.index_of(key)]
            .as_ref()
            .map_or(false, |bucket| bucket.search(key))
    }

    /// Doubles the outer level and redistributes every key under a
    /// freshly sampled outer function. Buckets restart small and grow
    /// back on their own; `len` is untouched because redistribution
    /// conserves keys.
    fn grow(&mut self) {
        self.capacity = self.len * 2;
        self.outer = BitMatrixHasher::sample(self.capacity, &mut self.rng);
        let old = std::mem::replace(
            &mut self.buckets,
            (0..self.capacity).map(|_| None).collect(),
        );
        for key in old.into_iter().flatten().flat_map(|bucket| bucket.into_keys()) {
            let index = self.outer.index_of(&key);
            let bucket = Self::materialize(&mut self.buckets[index], &mut self.rng);
            bucket.insert(key);
        }
    }

    fn materialize<'a>(
        slot: &'a mut Option<QuadraticPerfectTable<R>>,
        rng: &mut R,
    ) -> &'a mut QuadraticPerfectTable<R> {
        slot.get_or_insert_with(|| {
            QuadraticPerfectTable::bucket_with_rng(
                BUCKET_INITIAL_CAPACITY,
                R::seed_from_u64(rng.gen()),
            )
        })
    }

    /// Number of stored keys across all buckets.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Outer bucket-slot count.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Aggregate slot capacity of the materialized buckets.
    pub fn inner_capacity(&self) -> usize {
        self.buckets.iter().flatten().map(|b| b.capacity()).sum()
    }

    /// Collisions summed over all buckets.
    pub fn total_collisions(&self) -> u64 {
        self.buckets.iter().flatten().map(|b| b.collisions()).sum()
    }

    /// Rehash trials summed over all buckets.
    pub fn total_rehash_trials(&self) -> u64 {
        self.buckets.iter().flatten().map(|b| b.rehash_trials()).sum()
    }

    /// Occupancy percentage out of the aggregate bucket capacity.
    /// Zero while no bucket has been materialized.
    pub fn usage_ratio(&self) -> f64 {
        let inner = self.inner_capacity();
        if inner == 0 {
            0.0
        } else {
            self.len as f64 / inner as f64 * 100.0
        }
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            len: self.len,
            capacity: self.inner_capacity(),
            collisions: self.total_collisions(),
            rehash_trials: self.total_rehash_trials(),
            usage_ratio: self.usage_ratio(),
        }
    }

    /// Iterates over the stored keys, bucket by bucket.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().flatten().flat_map(|bucket| bucket.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn seeded(capacity: usize, seed: u64) -> BucketedPerfectTable {
        BucketedPerfectTable::with_capacity_and_rng(capacity, StdRng::seed_from_u64(seed)).unwrap()
    }

    fn bucket_len_sum(t: &BucketedPerfectTable) -> usize {
        t.buckets.iter().flatten().map(|b| b.len()).sum()
    }

    /// Invariant: the outer count always equals the sum of bucket
    /// counts, through inserts, duplicates, deletes and growth.
    #[test]
    fn len_equals_sum_of_bucket_lens() {
        let mut t = seeded(2, 10);
        for i in 0..20 {
            t.insert(format!("key-{i}"));
            assert_eq!(t.len(), bucket_len_sum(&t));
        }
        t.insert("key-0");
        assert_eq!(t.len(), bucket_len_sum(&t));
        for i in 0..10 {
            t.delete(&format!("key-{i}"));
            assert_eq!(t.len(), bucket_len_sum(&t));
        }
        assert_eq!(t.len(), 10);
    }

    /// Invariant: a duplicate insert returns false and leaves `len`
    /// unchanged, even when it triggers an outer resize first.
    #[test]
    fn duplicate_insert_rejected() {
        let mut t = seeded(1, 11);
        assert!(t.insert("apple"));
        // len == capacity here, so this duplicate resizes before it is
        // recognized as a duplicate.
        assert!(!t.insert("apple"));
        assert!(t.capacity() > 1);
        assert_eq!(t.len(), 1);
        assert!(t.search("apple"));
    }

    /// Invariant: delete of an absent key returns false, including when
    /// the key maps to a bucket that was never materialized.
    #[test]
    fn delete_absent_is_a_noop() {
        let mut t = seeded(8, 12);
        assert!(!t.delete("ghost"));
        t.insert("apple");
        assert!(!t.delete("ghost"));
        assert_eq!(t.len(), 1);
    }

    /// Invariant: filling past the bucket-slot count doubles the outer
    /// level and preserves every key, with `capacity >= len` after
    /// every insert.
    #[test]
    fn outer_growth_preserves_keys() {
        let mut t = seeded(2, 13);
        let initial = t.capacity();
        let keys: Vec<String> = (0..12).map(|i| format!("key-{i:02}")).collect();
        for key in &keys {
            assert!(t.insert(key.clone()));
            assert!(t.capacity() >= t.len());
        }
        assert!(t.capacity() > initial);
        for key in &keys {
            assert!(t.search(key), "lost {key}");
        }
    }

    /// Invariant: sixteen inserts followed by eight deletes leave
    /// exactly the undeleted half searchable.
    #[test]
    fn half_deleted_table_reports_the_other_half() {
        let mut t = seeded(4, 14);
        let keys: Vec<String> = (0..16).map(|i| format!("entry-{i:02}")).collect();
        for key in &keys {
            assert!(t.insert(key.clone()));
        }
        for key in &keys[..8] {
            assert!(t.delete(key));
        }
        assert_eq!(t.len(), 8);
        for key in &keys[..8] {
            assert!(!t.search(key));
        }
        for key in &keys[8..] {
            assert!(t.search(key));
        }
    }

    /// Invariant: zero bucket-slot count is rejected with a typed error.
    #[test]
    fn zero_capacity_is_invalid() {
        assert_eq!(
            BucketedPerfectTable::with_capacity(0).err(),
            Some(CapacityError::Zero)
        );
    }

    /// Invariant: construction and operation are deterministic under a
    /// fixed seed, down to the aggregated counters.
    #[test]
    fn seeded_runs_are_reproducible() {
        let run = || {
            let mut t = seeded(2, 99);
            for i in 0..30 {
                t.insert(format!("k{i}"));
            }
            for i in 0..10 {
                t.delete(&format!("k{i}"));
            }
            (
                t.len(),
                t.capacity(),
                t.inner_capacity(),
                t.total_collisions(),
                t.total_rehash_trials(),
            )
        };
        assert_eq!(run(), run());
    }

    /// Invariant: bulk load sizes the outer level for the key count and
    /// ends with every distinct key present.
    #[test]
    fn from_keys_loads_every_distinct_key() {
        let input = ["apple", "banana", "apple", "cherry", "date"];
        let t = BucketedPerfectTable::from_keys_with_rng(input, StdRng::seed_from_u64(15));
        assert_eq!(t.len(), 4);
        let keys: BTreeSet<&str> = t.iter().collect();
        assert_eq!(keys, BTreeSet::from(["apple", "banana", "cherry", "date"]));
    }

    /// Invariant: the usage ratio divides by the aggregate bucket
    /// capacity and reports zero for a table with no buckets yet.
    #[test]
    fn usage_ratio_uses_inner_capacity() {
        let mut t = seeded(8, 16);
        assert_eq!(t.usage_ratio(), 0.0);
        t.insert("a");
        let s = t.stats();
        assert_eq!(s.len, 1);
        assert_eq!(s.capacity, t.inner_capacity());
        assert!(s.capacity >= 1);
        assert_eq!(s.usage_ratio, 1.0 / s.capacity as f64 * 100.0);
    }
}
