//! Membership Disagreement Policy Tests
//!
//! A proposal that has the wrong length or is causally behind the candidate
//! vector can be read two ways: as a silent no-op, or as an explicit
//! rejection. `MembershipPolicy` selects between them; both readings are
//! exercised here so the choice stays visible.

use assert_matches::assert_matches;
use groupclock_core::{ClockError, MembershipOutcome, MembershipPolicy, Rejection, RejectionKind};
use groupclock_testkit::{init_test_tracing, ClockBuilder};

// ============================================================================
// Strict (default): explicit rejection
// ============================================================================

#[test]
fn strict_is_the_default() {
    let engine = ClockBuilder::new(&[1]).build();
    assert_eq!(engine.policy(), MembershipPolicy::Strict);
}

#[test]
fn strict_rejects_wrong_length_permanently() {
    init_test_tracing();
    let engine = ClockBuilder::new(&[3, 3]).build();

    let err = engine.add_member(1, &[3u64, 3]).unwrap_err();
    assert_eq!(err.rejection_kind(), Some(RejectionKind::Permanent));
    assert!(!err.is_retryable());
    assert_eq!(engine.values(), vec![3, 3]);
    assert_eq!(engine.generation(), 0);
}

#[test]
fn strict_rejects_duplicate_insertion() {
    // replaying an insertion that already happened: the proposal now has
    // the old length of the grown vector, so it no longer fits
    let engine = ClockBuilder::new(&[2, 2]).build();
    let proposed = engine.propose_insert_values(1).unwrap();
    engine.add_member(1, &proposed).unwrap();

    let err = engine.add_member(1, &proposed).unwrap_err();
    assert_matches!(err, ClockError::Rejected(Rejection::Permanent { .. }));
    assert_eq!(engine.len(), 3);
}

#[test]
fn strict_rejects_stale_proposal_as_retryable() {
    let engine = ClockBuilder::new(&[4, 8]).build();

    let err = engine.add_member(2, &[4u64, 7, 0]).unwrap_err();
    assert_matches!(err, ClockError::Rejected(Rejection::Retryable { .. }));
    assert!(err.is_retryable());
    assert!(!err.is_ignorable());
    assert_eq!(engine.len(), 2);
}

#[test]
fn strict_retire_rejects_stale_proposal() {
    let engine = ClockBuilder::new(&[4, 8, 1]).build();

    let err = engine.retire_member(2, &[3u64, 8]).unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(engine.values(), vec![4, 8, 1]);
}

#[test]
fn stale_proposal_succeeds_after_refresh() {
    let engine = ClockBuilder::new(&[4, 8]).build();
    assert!(engine.add_member(2, &[4u64, 7, 0]).is_err());

    let fresh = engine.propose_insert_values(2).unwrap();
    assert!(engine.add_member(2, &fresh).unwrap().is_committed());
}

// ============================================================================
// Lenient: silent no-op
// ============================================================================

#[test]
fn lenient_ignores_wrong_length() {
    let engine = ClockBuilder::new(&[3, 3])
        .policy(MembershipPolicy::Lenient)
        .build();

    let outcome = engine.add_member(1, &[3u64, 3]).unwrap();
    assert_matches!(outcome, MembershipOutcome::Ignored(Rejection::Permanent { .. }));
    assert!(!outcome.is_committed());
    assert_eq!(engine.values(), vec![3, 3]);
}

#[test]
fn lenient_ignores_stale_proposal() {
    let engine = ClockBuilder::new(&[4, 8, 1])
        .policy(MembershipPolicy::Lenient)
        .build();

    let outcome = engine.retire_member(1, &[0u64, 0]).unwrap();
    assert_matches!(outcome, MembershipOutcome::Ignored(Rejection::Retryable { .. }));
    assert_eq!(engine.len(), 3);
    assert_eq!(engine.generation(), 0);
}

// ============================================================================
// Policy-independent failures
// ============================================================================

#[test]
fn out_of_range_index_fails_under_both_policies() {
    for policy in [MembershipPolicy::Strict, MembershipPolicy::Lenient] {
        let engine = ClockBuilder::new(&[0, 0]).policy(policy).build();

        let add = engine.add_member(5, &[0u64, 0, 0]).unwrap_err();
        assert_eq!(add.rejection_kind(), Some(RejectionKind::Permanent));

        let retire = engine.retire_member(2, &[0u64]).unwrap_err();
        assert_eq!(retire.rejection_kind(), Some(RejectionKind::Permanent));

        assert!(engine.propose_insert_values(3).is_err());
        assert!(engine.propose_delete_values(2).is_err());
    }
}

#[test]
fn retiring_self_is_fatal_under_both_policies() {
    for policy in [MembershipPolicy::Strict, MembershipPolicy::Lenient] {
        let engine = ClockBuilder::new(&[0, 0]).local(1).policy(policy).build();

        let err = engine.retire_member(1, &[0u64]).unwrap_err();
        assert_eq!(err, ClockError::CannotRetireSelf { index: 1 });
    }
}
