//! Property test strategies for groupclock types
//!
//! Counter values stay well below `u64::MAX` so increments in tests never
//! saturate.

use proptest::prelude::*;

/// Upper bound for generated counter values
pub const MAX_COUNTER: u64 = 1_000_000;

/// Largest generated group
pub const MAX_MEMBERS: usize = 12;

/// A counter vector with `1..=MAX_MEMBERS` members.
pub fn arb_clocks() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0..MAX_COUNTER, 1..=MAX_MEMBERS)
}

/// Two counter vectors of the same length.
pub fn arb_clock_pair() -> impl Strategy<Value = (Vec<u64>, Vec<u64>)> {
    (1..=MAX_MEMBERS).prop_flat_map(|len| {
        (
            prop::collection::vec(0..MAX_COUNTER, len),
            prop::collection::vec(0..MAX_COUNTER, len),
        )
    })
}

/// A vector and a copy with exactly one element strictly larger.
pub fn arb_single_bump() -> impl Strategy<Value = (Vec<u64>, Vec<u64>)> {
    arb_clocks().prop_flat_map(|base| {
        let len = base.len();
        (Just(base), 0..len, 1..MAX_COUNTER).prop_map(|(base, at, by)| {
            let mut bumped = base.clone();
            bumped[at] += by;
            (base, bumped)
        })
    })
}

/// Starting values plus a valid local index.
pub fn arb_engine_setup() -> impl Strategy<Value = (usize, Vec<u64>)> {
    arb_clocks().prop_flat_map(|values| {
        let len = values.len();
        (0..len, Just(values))
    })
}

/// Engine setup plus a remote vector of matching length.
pub fn arb_engine_and_remote() -> impl Strategy<Value = (usize, Vec<u64>, Vec<u64>)> {
    arb_engine_setup().prop_flat_map(|(local, values)| {
        let len = values.len();
        (
            Just(local),
            Just(values),
            prop::collection::vec(0..MAX_COUNTER, len),
        )
    })
}

/// Engine setup plus an insertion index in `0..=len`.
pub fn arb_insert_setup() -> impl Strategy<Value = (usize, Vec<u64>, usize)> {
    arb_engine_setup().prop_flat_map(|(local, values)| {
        let len = values.len();
        (Just(local), Just(values), 0..=len)
    })
}
