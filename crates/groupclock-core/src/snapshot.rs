//! Frozen copies of the clock vector.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::causal::{self, CausalRelation};
use crate::errors::Result;

/// Clock values captured at one instant, plus which slot was ours.
///
/// A plain value: it shares nothing with the engine that produced it.
///
/// Equality is structural (same slot, same counters). There is no
/// `PartialOrd`: causal order treats concurrent snapshots as `Equal`, which
/// would disagree with `Eq`. Use [`causal_cmp`](Self::causal_cmp) or
/// [`relation`](Self::relation) for ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventClocks {
    member_id: usize,
    clocks: Vec<u64>,
}

impl EventClocks {
    /// Create a snapshot. `member_id` is the index of the local slot.
    pub fn new(member_id: usize, clocks: Vec<u64>) -> Self {
        Self { member_id, clocks }
    }

    /// Index of the slot owned by the member that took the snapshot
    pub fn member_id(&self) -> usize {
        self.member_id
    }

    /// All counters
    pub fn clocks(&self) -> &[u64] {
        &self.clocks
    }

    /// The snapshotting member's own counter.
    ///
    /// Zero if `member_id` is outside the vector, which only happens for
    /// hand-built or deserialized snapshots.
    pub fn local_clock(&self) -> u64 {
        self.clocks.get(self.member_id).copied().unwrap_or(0)
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.clocks.len()
    }

    /// True for a snapshot of an empty group
    pub fn is_empty(&self) -> bool {
        self.clocks.is_empty()
    }

    /// Causal comparison; `Equal` means identical or concurrent.
    pub fn causal_cmp(&self, other: &Self) -> Result<Ordering> {
        causal::compare(&self.clocks, &other.clocks)
    }

    /// Precise partial-order relation.
    pub fn relation(&self, other: &Self) -> Result<CausalRelation> {
        causal::relation(&self.clocks, &other.clocks)
    }

    /// Give up the snapshot and keep the counters.
    pub fn into_clocks(self) -> Vec<u64> {
        self.clocks
    }
}

impl AsRef<[u64]> for EventClocks {
    fn as_ref(&self) -> &[u64] {
        &self.clocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_clock() {
        let snapshot = EventClocks::new(1, vec![5, 9, 2]);
        assert_eq!(snapshot.local_clock(), 9);
        assert_eq!(snapshot.len(), 3);
    }

    #[test]
    fn test_local_clock_out_of_range() {
        let snapshot = EventClocks::new(4, vec![5]);
        assert_eq!(snapshot.local_clock(), 0);
    }

    #[test]
    fn test_causal_cmp() {
        let earlier = EventClocks::new(0, vec![1, 1]);
        let later = EventClocks::new(1, vec![1, 2]);
        assert_eq!(earlier.causal_cmp(&later).unwrap(), Ordering::Less);
        assert_eq!(later.causal_cmp(&earlier).unwrap(), Ordering::Greater);
        assert_eq!(earlier.relation(&earlier).unwrap(), CausalRelation::Identical);
    }

    #[test]
    fn test_equality_is_structural() {
        // same clocks, different owner: causally equal but distinct values
        let a = EventClocks::new(0, vec![3, 3]);
        let b = EventClocks::new(1, vec![3, 3]);
        assert_ne!(a, b);
        assert_eq!(a.causal_cmp(&b).unwrap(), Ordering::Equal);
    }
}
