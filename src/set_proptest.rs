#![cfg(test)]

// Property tests for the two table backends, kept inside the crate next
// to the invariants they exercise.

use crate::bucketed::BucketedPerfectTable;
use crate::quadratic::QuadraticPerfectTable;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeSet, HashSet};

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, the pool shrinks, and op lists shrink in length. Pool entries may
// repeat and may be empty, so duplicate and empty-string keys come up on
// their own.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize),
    Delete(usize),
    Search(usize),
    SearchForeign(String),
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>, u64)> {
    proptest::collection::vec("[a-z]{0,6}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            idx.clone().prop_map(OpI::Insert),
            idx.clone().prop_map(OpI::Delete),
            idx.clone().prop_map(OpI::Search),
            "[a-z]{0,6}".prop_map(OpI::SearchForeign),
            Just(OpI::Iterate),
        ];
        (proptest::collection::vec(op, 1..80), any::<u64>())
            .prop_map(move |(ops, seed)| (pool.clone(), ops, seed))
    })
}

// Property: State-machine equivalence against std::collections::HashSet.
// Invariants exercised across random operation sequences:
// - insert/delete/search return parity with the model after any interleaving.
// - `len` parity and `iter` yielding each live key exactly once.
// - `capacity >= 4 * len^2` after every operation.
// - No silently lost keys: every model key still searches true.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_quadratic_matches_hashset((pool, ops, seed) in arb_scenario()) {
        let mut sut =
            QuadraticPerfectTable::with_capacity_and_rng(4, StdRng::seed_from_u64(seed)).unwrap();
        let mut model: HashSet<String> = HashSet::new();

        for op in ops {
            match op {
                OpI::Insert(i) => {
                    let k = pool[i].clone();
                    let added = sut.insert(k.clone());
                    prop_assert_eq!(added, model.insert(k));
                }
                OpI::Delete(i) => {
                    let k = &pool[i];
                    prop_assert_eq!(sut.delete(k), model.remove(k.as_str()));
                }
                OpI::Search(i) => {
                    let k = &pool[i];
                    prop_assert_eq!(sut.search(k), model.contains(k.as_str()));
                }
                OpI::SearchForeign(s) => {
                    prop_assert_eq!(sut.search(&s), model.contains(&s));
                }
                OpI::Iterate => {
                    let s_keys: BTreeSet<&str> = sut.iter().collect();
                    let m_keys: BTreeSet<&str> = model.iter().map(String::as_str).collect();
                    prop_assert_eq!(s_keys, m_keys);
                }
            }

            // Post-conditions after each op
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.iter().count(), sut.len());
            prop_assert!(sut.capacity() >= 4 * sut.len() * sut.len());
            for k in &model {
                prop_assert!(sut.search(k), "model key {:?} lost", k);
            }
        }
    }
}

// Property: Same state-machine invariants for the two-level table, with
// its own bounds: `capacity >= len` at the outer level, and the key
// count conserved across outer redistributions.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_bucketed_matches_hashset((pool, ops, seed) in arb_scenario()) {
        let mut sut =
            BucketedPerfectTable::with_capacity_and_rng(1, StdRng::seed_from_u64(seed)).unwrap();
        let mut model: HashSet<String> = HashSet::new();

        for op in ops {
            match op {
                OpI::Insert(i) => {
                    let k = pool[i].clone();
                    let added = sut.insert(k.clone());
                    prop_assert_eq!(added, model.insert(k));
                }
                OpI::Delete(i) => {
                    let k = &pool[i];
                    prop_assert_eq!(sut.delete(k), model.remove(k.as_str()));
                }
                OpI::Search(i) => {
                    let k = &pool[i];
                    prop_assert_eq!(sut.search(k), model.contains(k.as_str()));
                }
                OpI::SearchForeign(s) => {
                    prop_assert_eq!(sut.search(&s), model.contains(&s));
                }
                OpI::Iterate => {
                    let s_keys: BTreeSet<&str> = sut.iter().collect();
                    let m_keys: BTreeSet<&str> = model.iter().map(String::as_str).collect();
                    prop_assert_eq!(s_keys, m_keys);
                }
            }

            // Post-conditions after each op
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.iter().count(), sut.len());
            prop_assert!(sut.capacity() >= sut.len());
            for k in &model {
                prop_assert!(sut.search(k), "model key {:?} lost", k);
            }
        }
    }
}
