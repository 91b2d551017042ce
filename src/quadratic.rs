//! QuadraticPerfectTable: single-level perfect table with online rehash repair.

use crate::bit_matrix::BitMatrixHasher;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Space factor `c` in the maintained bound `capacity >= c * len^2`.
pub(crate) const SPACE_FACTOR: usize = 4;

/// Slot count of a default-constructed table; room for 16 keys before
/// the first growth.
const DEFAULT_CAPACITY: usize = SPACE_FACTOR * 16 * 16;

/// Rejected table construction parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CapacityError {
    #[error("table capacity must be at least 1")]
    Zero,
}

/// Point-in-time statistics snapshot of a table.
///
/// `capacity` is the slot capacity the usage ratio divides by: the slot
/// array length for a quadratic table, the aggregate bucket capacity
/// for a bucketed table. Reporting only; none of these values feed back
/// into the table's behavior.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableStats {
    pub len: usize,
    pub capacity: usize,
    pub collisions: u64,
    pub rehash_trials: u64,
    pub usage_ratio: f64,
}

/// Slot capacity that keeps `capacity >= SPACE_FACTOR * len^2` for `len` keys.
fn required_capacity(len: usize) -> usize {
    len.saturating_mul(len).saturating_mul(SPACE_FACTOR)
}

/// A single-level perfect hash table over string keys.
///
/// Every stored key sits at exactly the slot its current hash function
/// maps it to, so `search` and `delete` touch one slot and never probe.
/// A clash on insert is repaired by resampling the hash function and
/// re-placing all keys (plus the pending one) until a collision-free
/// placement is found; the slot array is kept quadratically larger than
/// the key count so a fresh function succeeds after O(1) expected
/// trials. The quadratic space is the cost of the single level; see
/// [`BucketedPerfectTable`](crate::BucketedPerfectTable) for the
/// linear-expected-space variant built out of these tables.
pub struct QuadraticPerfectTable<R = StdRng> {
    slots: Vec<Option<String>>,
    len: usize,
    capacity: usize,
    collisions: u64,
    rehash_trials: u64,
    hasher: BitMatrixHasher,
    rng: R,
}

impl QuadraticPerfectTable<StdRng> {
    /// Creates an empty table with the default capacity, seeded from
    /// OS entropy.
    pub fn new() -> Self {
        Self::new_inner(DEFAULT_CAPACITY, StdRng::from_entropy())
    }

    /// Creates an empty table with an explicit slot capacity.
    pub fn with_capacity(capacity: usize) -> Result<Self, CapacityError> {
        Self::with_capacity_and_rng(capacity, StdRng::from_entropy())
    }

    /// Bulk-loads a table from `keys`, inserting each in order.
    /// Duplicates in the input are skipped like any duplicate insert.
    pub fn from_keys<I>(keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::from_keys_with_rng(keys, StdRng::from_entropy())
    }
}

impl Default for QuadraticPerfectTable<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> QuadraticPerfectTable<R> {
    /// Creates an empty table with the default capacity and an owned
    /// random generator, the customization point for deterministic
    /// construction in tests.
    pub fn with_rng(rng: R) -> Self {
        Self::new_inner(DEFAULT_CAPACITY, rng)
    }

    /// Creates an empty table with an explicit slot capacity and an
    /// owned random generator.
    pub fn with_capacity_and_rng(capacity: usize, rng: R) -> Result<Self, CapacityError> {
        if capacity == 0 {
            return Err(CapacityError::Zero);
        }
        Ok(Self::new_inner(capacity, rng))
    }

    /// Bulk-load with an owned random generator; the table is sized for
    /// the key count up front so loading does not grow slot by slot.
    pub fn from_keys_with_rng<I>(keys: I, rng: R) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let capacity = required_capacity(keys.len()).max(DEFAULT_CAPACITY);
        let mut table = Self::new_inner(capacity, rng);
        for key in keys {
            table.insert(key);
        }
        table
    }

    /// Infallible constructor for callers that already validated capacity.
    pub(crate) fn bucket_with_rng(capacity: usize, rng: R) -> Self {
        debug_assert!(capacity >= 1);
        Self::new_inner(capacity, rng)
    }

    fn new_inner(capacity: usize, mut rng: R) -> Self {
        let hasher = BitMatrixHasher::sample(capacity, &mut rng);
        Self {
            slots: vec![None; capacity],
            len: 0,
            capacity,
            collisions: 0,
            rehash_trials: 0,
            hasher,
            rng,
        }
    }

    /// Inserts `key`; returns `true` if it was newly added, `false` if
    /// already present. Growing and collision repair both happen inside
    /// this call, so the table is back in a consistent state when it
    /// returns.
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        let key = key.into();

        // Grow before placement so the incoming key never breaks the
        // space bound; this rehash re-places existing keys only.
        let needed = required_capacity(self.len + 1);
        if needed > self.capacity {
            self.capacity = needed;
            self.rehash(None);
        }

        let index = self.hasher.index_of(&key);
        let clash = match self.slots[index].as_deref() {
            Some(occupant) if occupant == key.as_str() => return false,
            Some(_) => true,
            None => false,
        };

        if clash {
            self.collisions += 1;
            self.rehash(Some(key));
        } else {
            self.slots[index] = Some(key);
        }
        self.len += 1;
        true
    }

    /// Removes `key`; returns `true` if it was present. Only the mapped
    /// slot is consulted: the placement invariant guarantees a live key
    /// is never anywhere else.
    pub fn delete(&mut self, key: &str) -> bool {
        let index = self.hasher.index_of(key);
        if self.slots[index].as_deref() == Some(key) {
            self.slots[index] = None;
            self.len -= 1;
            true
        } else {
            false
        }
    }

    /// Returns `true` if `key` is present. One slot probe, no scan.
    pub fn search(&self, key: &str) -> bool {
        self.slots[self.hasher.index_of(key)].as_deref() == Some(key)
    }

    /// Resamples hash functions until all retained keys, plus the
    /// pending insertion if any, land in distinct slots. Each attempt
    /// bumps `rehash_trials` whether or not it succeeds; the new slot
    /// array and hash function are committed only on a fully successful
    /// trial. The loop is unbounded: termination is probabilistic (a
    /// constant expected number of trials under the space bound), not
    /// structurally guaranteed.
    fn rehash(&mut self, pending: Option<String>) {
        let mut keys: Vec<String> = self.slots.iter_mut().filter_map(Option::take).collect();
        keys.extend(pending); // pending key participates last in each trial
        let mut placements = vec![0usize; keys.len()];
        let mut failed = 0u64;

        loop {
            self.rehash_trials += 1;
            let hasher = BitMatrixHasher::sample(self.capacity, &mut self.rng);
            let mut taken = vec![false; self.capacity];
            let mut ok = true;
            for (i, key) in keys.iter().enumerate() {
                let index = hasher.index_of(key);
                if taken[index] {
                    ok = false;
                    break;
                }
                taken[index] = true;
                placements[i] = index;
            }

            if ok {
                let mut slots = vec![None; self.capacity];
                for (i, key) in keys.drain(..).enumerate() {
                    slots[placements[i]] = Some(key);
                }
                self.slots = slots;
                self.hasher = hasher;
                return;
            }

            failed += 1;
            log::debug!(
                "rehash trial {} failed (capacity {}, keys {})",
                failed,
                self.capacity,
                keys.len()
            );
            if failed % 32 == 0 {
                log::warn!(
                    "no collision-free hash function after {} trials (capacity {}, keys {})",
                    failed,
                    self.capacity,
                    keys.len()
                );
            }
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current slot array length.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Inserts that found their slot occupied by a different key.
    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    /// Hash-function sampling attempts across all rehashes, successful
    /// and failed.
    pub fn rehash_trials(&self) -> u64 {
        self.rehash_trials
    }

    /// Occupancy percentage, `len / capacity * 100`.
    pub fn usage_ratio(&self) -> f64 {
        self.len as f64 / self.capacity as f64 * 100.0
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            len: self.len,
            capacity: self.capacity,
            collisions: self.collisions,
            rehash_trials: self.rehash_trials,
            usage_ratio: self.usage_ratio(),
        }
    }

    /// Iterates over the stored keys in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().filter_map(|slot| slot.as_deref())
    }

    /// Consumes the table, yielding the stored keys in slot order.
    pub fn into_keys(self) -> impl Iterator<Item = String> {
        self.slots.into_iter().flatten()
    }
}
