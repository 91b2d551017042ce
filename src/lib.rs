//! perfect-hashset: a dynamic perfect hash set for string keys with
//! collision-free, worst-case O(1) membership checks.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep an injective mapping from the live key set into a slot
//!   array while keys come and go, repairing the mapping by resampling
//!   hash functions whenever an insert breaks it.
//! - Layers:
//!   - BitMatrixHasher: one sampled member of a universal hash family,
//!     a random b-by-64 bit matrix over GF(2) applied to a 64-bit key
//!     fingerprint (`mix_key`). Resampling draws a whole fresh matrix;
//!     matrices are never mutated in place.
//!   - QuadraticPerfectTable: single-level table that keeps
//!     `capacity >= 4 * len^2`. At that density a freshly sampled
//!     function is collision-free with probability at least 1/2, so
//!     repair takes O(1) expected trials; search and delete touch
//!     exactly one slot.
//!   - BucketedPerfectTable: two-level table in the FKS style. An
//!     outer function spreads keys across buckets, each bucket is a
//!     small QuadraticPerfectTable handling its own collisions, and
//!     the outer level doubles when `len` reaches the bucket count.
//!     Two probes per lookup, linear expected total space.
//!   - Dictionary: facade that picks one of the two tables by
//!     configuration tag and adds newline-delimited batch file
//!     loaders with outcome reports.
//!
//! Constraints
//! - Keys are strings; membership only (no associated values).
//! - A stored key sits at exactly the slot its current hash function
//!   maps it to. Lookups never probe, scan, or chain, in any state.
//! - Rehash loops are unbounded: termination is probabilistic, with a
//!   constant expected trial count under the space bounds. Retries are
//!   logged so a pathological run is observable.
//! - `collisions` and `rehash_trials` counters only ever grow; a fresh
//!   table is the only reset.
//! - 100% safe Rust; no interior mutability, mutation needs `&mut`.
//!
//! Why this split?
//! - Localize invariants: the hasher knows nothing about tables, the
//!   quadratic table owns the one nontrivial loop (rehash), and the
//!   bucketed table composes finished quadratic tables instead of
//!   reimplementing their repair logic.
//! - The facade stays mechanical: backend choice and file I/O, no
//!   hashing decisions of its own.
//!
//! Randomness and determinism
//! - Each table owns its random generator (`StdRng` by default, any
//!   `Rng` via the `with_rng` constructors) and threads it through
//!   every resample. No process-global RNG.
//! - A bucketed table seeds each new bucket from its own generator, so
//!   one outer seed pins the entire structure. Tests and
//!   `Dictionary::with_seed` rely on this for reproducibility.
//!
//! Notes and non-goals
//! - Iteration order is slot order, which changes across rehashes;
//!   treat it as unspecified.
//! - Batch file operations are not transactional: lines applied before
//!   an I/O failure stay applied.
//! - The hash family is statistical, not cryptographic; an adversary
//!   who can query timing can force rehashes.
//! - No persistence and no concurrent mutation.
//! - "Not found" and "duplicate" are `bool` outcomes, not errors; the
//!   error types cover construction parameters and batch file I/O.

mod bit_matrix;
mod bucketed;
mod dictionary;
mod quadratic;
mod set_proptest;

// Public surface
pub use bit_matrix::{mix_key, BitMatrixHasher};
pub use bucketed::BucketedPerfectTable;
pub use dictionary::{BackendKind, BatchError, DeleteReport, Dictionary, InsertReport};
pub use quadratic::{CapacityError, QuadraticPerfectTable, TableStats};
