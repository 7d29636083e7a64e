//! Vector clock engine
//!
//! [`GroupClock`] owns the live vector of member slots and the index of the
//! slot that belongs to this member.
//!
//! ## Lock Usage
//!
//! Uses `parking_lot::Mutex` for `state` because:
//! - every transition is an in-memory vector manipulation, never held
//!   across I/O or await points
//! - all multi-slot operations must observe and produce one coherent
//!   generation
//!
//! Structural changes never edit the vector in place. They build the next
//! generation and swap it in whole, then publish it through `published`
//! so single-counter reads (`counter`, `local_counter`, `values`) can skip
//! the operation lock. Those reads are "last known" only; use
//! [`GroupClock::clock_data`] for a coherent view.
//!
//! The published pointer sits behind a `parking_lot::RwLock`. Readers never
//! wait on the operation mutex or on a merge in progress, but a reader can
//! briefly wait while a membership commit swaps the pointer.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};
use url::Url;

use crate::causal::{self, ClockValue};
use crate::collector::ErrorCollector;
use crate::config::{parse_location, GroupConfig, KnownMember, MembershipPolicy};
use crate::errors::{ClockError, Rejection, Result};
use crate::slot::MemberSlot;
use crate::snapshot::EventClocks;

/// One immutable shape of the vector. Counters inside still advance.
#[derive(Debug)]
struct Generation {
    number: u64,
    local_index: usize,
    slots: Box<[MemberSlot]>,
}

impl Generation {
    fn local_slot(&self) -> &MemberSlot {
        &self.slots[self.local_index]
    }

    fn values(&self) -> Vec<u64> {
        self.slots.iter().map(MemberSlot::value).collect()
    }

    fn snapshot(&self) -> EventClocks {
        EventClocks::new(self.local_index, self.values())
    }
}

/// Result of a membership change that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipOutcome {
    /// The new vector is live
    Committed {
        /// Generation number of the new vector
        generation: u64,
        /// Our slot index in the new vector
        local_index: usize,
    },
    /// Nothing changed (lenient policy only)
    Ignored(Rejection),
}

impl MembershipOutcome {
    /// True when the change took effect
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// Vector clock for one member of a dynamically sized group.
pub struct GroupClock {
    policy: MembershipPolicy,
    /// Serializes every transition; holds the authoritative generation.
    state: Mutex<Arc<Generation>>,
    /// Latest committed generation, read without `state`.
    published: RwLock<Arc<Generation>>,
}

impl GroupClock {
    /// Create an engine from starting counter values.
    ///
    /// # Errors
    ///
    /// [`ClockError::LocalIndexOutOfRange`] if `local_index` does not address
    /// one of `initial`.
    pub fn new<T: ClockValue>(local_index: usize, initial: &[T]) -> Result<Self> {
        if local_index >= initial.len() {
            return Err(ClockError::local_index_out_of_range(
                local_index,
                initial.len(),
            ));
        }

        let slots = causal::to_counters(initial)
            .into_iter()
            .map(|value| MemberSlot::new(value, None))
            .collect();
        Ok(Self::from_slots(local_index, slots))
    }

    /// Create an engine from member records.
    ///
    /// Records are placed by their `index()`, which must cover `0..n` exactly
    /// once. Every record is attempted; all location and index problems are
    /// returned together as [`ClockError::Batch`], first failure primary.
    pub fn from_members<M: KnownMember>(local_index: usize, members: &[M]) -> Result<Self> {
        let n = members.len();
        if local_index >= n {
            return Err(ClockError::local_index_out_of_range(local_index, n));
        }

        let mut errors = ErrorCollector::new();
        let mut placed: Vec<Option<MemberSlot>> = (0..n).map(|_| None).collect();
        let mut claimed = vec![false; n];
        for member in members {
            let index = member.index();
            let location = errors.collect(parse_location(index, member.location()));
            if index >= n {
                errors.push(ClockError::invalid_config(format!(
                    "member index {index} outside 0..{n}"
                )));
            } else if claimed[index] {
                errors.push(ClockError::invalid_config(format!(
                    "member index {index} listed more than once"
                )));
            } else {
                claimed[index] = true;
                placed[index] = location.map(|url| MemberSlot::new(member.start(), Some(url)));
            }
        }

        let slots = errors.finish_with(placed)?;
        let slots: Option<Box<[MemberSlot]>> = slots.into_iter().collect();
        let slots = slots.ok_or_else(|| {
            ClockError::invalid_config("member records leave a slot unassigned")
        })?;

        tracing::debug!(local_index, members = n, "group clock built from member records");
        Ok(Self::from_slots(local_index, slots))
    }

    /// Create an engine from a validated group configuration.
    pub fn from_config(config: &GroupConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_members(config.local_index, &config.members)?.with_policy(config.policy))
    }

    /// Replace the membership disagreement policy.
    pub fn with_policy(mut self, policy: MembershipPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn from_slots(local_index: usize, slots: Box<[MemberSlot]>) -> Self {
        let generation = Arc::new(Generation {
            number: 0,
            local_index,
            slots,
        });
        Self {
            policy: MembershipPolicy::default(),
            state: Mutex::new(Arc::clone(&generation)),
            published: RwLock::new(generation),
        }
    }

    // ------------------------------------------------------------------
    // Lock-free reads
    // ------------------------------------------------------------------

    // Skips the operation mutex; only a commit's pointer swap can hold it up.
    fn current(&self) -> Arc<Generation> {
        Arc::clone(&self.published.read())
    }

    /// Membership disagreement policy
    pub fn policy(&self) -> MembershipPolicy {
        self.policy
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.current().slots.len()
    }

    /// Never true; construction requires at least the local slot.
    pub fn is_empty(&self) -> bool {
        self.current().slots.is_empty()
    }

    /// Index of our own slot
    pub fn local_index(&self) -> usize {
        self.current().local_index
    }

    /// Number of committed structural changes
    pub fn generation(&self) -> u64 {
        self.current().number
    }

    /// Counter of one slot. No consistency guarantee beyond "last known".
    pub fn counter(&self, index: usize) -> Option<u64> {
        self.current().slots.get(index).map(MemberSlot::value)
    }

    /// Our own counter
    pub fn local_counter(&self) -> u64 {
        self.current().local_slot().value()
    }

    /// Location of one slot, if the member record supplied one
    pub fn location(&self, index: usize) -> Option<Url> {
        self.current()
            .slots
            .get(index)
            .and_then(|slot| slot.location().cloned())
    }

    /// Per-slot reads, not a coherent snapshot.
    pub fn values(&self) -> Vec<u64> {
        self.current().values()
    }

    // ------------------------------------------------------------------
    // Events and messages
    // ------------------------------------------------------------------

    /// Record a local event and return our new counter.
    pub fn local_event(&self) -> u64 {
        let state = self.state.lock();
        let value = state.local_slot().increment();
        tracing::trace!(local_index = state.local_index, value, "local event");
        value
    }

    /// Merge clocks carried by an incoming message.
    ///
    /// The arrival is itself a local event, so our counter advances before
    /// the element-wise maximum is taken.
    ///
    /// # Errors
    ///
    /// An ignorable [`Rejection`] if `remote` has a different length; no
    /// state changes in that case.
    pub fn message_received<T: ClockValue>(&self, remote: &[T]) -> Result<EventClocks> {
        let state = self.state.lock();
        if remote.len() != state.slots.len() {
            tracing::warn!(
                local = state.slots.len(),
                remote = remote.len(),
                "discarding clocks with mismatched size"
            );
            return Err(Rejection::ignorable("vector size disagreement").into());
        }

        state.local_slot().increment();
        let mut raised = 0usize;
        for (slot, value) in state.slots.iter().zip(remote) {
            let value = value.clock_value();
            if slot.raise_to(value) < value {
                raised += 1;
            }
        }

        let snapshot = state.snapshot();
        tracing::trace!(raised, local = snapshot.local_clock(), "merged remote clocks");
        Ok(snapshot)
    }

    /// Clocks to attach to an outgoing message.
    ///
    /// Preparing to send counts as a local event.
    pub fn message_clocks(&self) -> EventClocks {
        self.advance_and_snapshot()
    }

    /// Coherent copy of the current clocks, without side effects.
    pub fn clock_data(&self) -> EventClocks {
        self.state.lock().snapshot()
    }

    /// Record a local event, then run `f`.
    pub fn locally<R>(&self, f: impl FnOnce() -> R) -> R {
        self.local_event();
        f()
    }

    /// Record a local event, then run `f` with the clocks taken at that point.
    ///
    /// `f` runs outside the engine lock. Other events may land before or
    /// while it runs, so clocks it reads from the engine need not match the
    /// snapshot it was handed.
    pub fn locally_with<R>(&self, f: impl FnOnce(&EventClocks) -> R) -> R {
        let snapshot = self.advance_and_snapshot();
        f(&snapshot)
    }

    // Shared by message_clocks and locally_with; only the former is a send.
    fn advance_and_snapshot(&self) -> EventClocks {
        let state = self.state.lock();
        state.local_slot().increment();
        state.snapshot()
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    /// Clocks as they would look with a zeroed slot inserted at `new_index`.
    ///
    /// Read-only. Valid range is `0..=len`.
    pub fn propose_insert_values(&self, new_index: usize) -> Result<Vec<u64>> {
        let state = self.state.lock();
        insert_candidate(&state, new_index)
    }

    /// Clocks as they would look with slot `old_index` removed.
    ///
    /// Read-only. Valid range is `0..len`.
    pub fn propose_delete_values(&self, old_index: usize) -> Result<Vec<u64>> {
        let state = self.state.lock();
        delete_candidate(&state, old_index)
    }

    /// Insert a zeroed slot at `new_index`, merging `proposed` onto it.
    ///
    /// The proposal must have the new length and must not be causally
    /// behind the candidate vector. Our slot index moves up by one when
    /// `new_index <= local_index`.
    ///
    /// # Errors
    ///
    /// - permanent [`Rejection`] if `new_index > len`
    /// - under [`MembershipPolicy::Strict`], a permanent rejection for a
    ///   length mismatch and a retryable one for a stale proposal; the
    ///   lenient policy reports those as [`MembershipOutcome::Ignored`]
    pub fn add_member<T: ClockValue>(
        &self,
        new_index: usize,
        proposed: &[T],
    ) -> Result<MembershipOutcome> {
        let mut state = self.state.lock();
        let candidate = insert_candidate(&state, new_index)?;
        if let Some(rejection) = review_proposal(&candidate, proposed)? {
            return self.disagreement("add", new_index, rejection);
        }

        let mut slots: Vec<MemberSlot> = state.slots.iter().map(MemberSlot::duplicate).collect();
        slots.insert(new_index, MemberSlot::empty());
        let local_index = if state.local_index >= new_index {
            state.local_index + 1
        } else {
            state.local_index
        };

        Ok(self.commit(&mut state, local_index, slots, proposed, "member added"))
    }

    /// Remove slot `old_index`, merging `proposed` onto the remainder.
    ///
    /// Mirrors [`add_member`](Self::add_member). Our slot index moves down by
    /// one when `old_index < local_index`.
    ///
    /// # Errors
    ///
    /// [`ClockError::CannotRetireSelf`] if `old_index` is our own slot, under
    /// any policy. Otherwise as for `add_member`.
    pub fn retire_member<T: ClockValue>(
        &self,
        old_index: usize,
        proposed: &[T],
    ) -> Result<MembershipOutcome> {
        let mut state = self.state.lock();
        if old_index == state.local_index {
            return Err(ClockError::CannotRetireSelf { index: old_index });
        }
        let candidate = delete_candidate(&state, old_index)?;
        if let Some(rejection) = review_proposal(&candidate, proposed)? {
            return self.disagreement("retire", old_index, rejection);
        }

        let mut slots: Vec<MemberSlot> = state.slots.iter().map(MemberSlot::duplicate).collect();
        slots.remove(old_index);
        let local_index = if state.local_index > old_index {
            state.local_index - 1
        } else {
            state.local_index
        };

        Ok(self.commit(&mut state, local_index, slots, proposed, "member retired"))
    }

    fn commit<T: ClockValue>(
        &self,
        state: &mut MutexGuard<'_, Arc<Generation>>,
        local_index: usize,
        slots: Vec<MemberSlot>,
        proposed: &[T],
        what: &'static str,
    ) -> MembershipOutcome {
        for (slot, value) in slots.iter().zip(proposed) {
            slot.raise_to(value.clock_value());
        }

        let next = Arc::new(Generation {
            number: state.number + 1,
            local_index,
            slots: slots.into_boxed_slice(),
        });
        **state = Arc::clone(&next);
        *self.published.write() = Arc::clone(&next);

        tracing::debug!(
            generation = next.number,
            local_index,
            members = next.slots.len(),
            "{what}"
        );
        MembershipOutcome::Committed {
            generation: next.number,
            local_index,
        }
    }

    fn disagreement(
        &self,
        op: &'static str,
        index: usize,
        rejection: Rejection,
    ) -> Result<MembershipOutcome> {
        tracing::warn!(
            op,
            index,
            kind = %rejection.kind(),
            reason = rejection.reason(),
            policy = ?self.policy,
            "membership proposal not applied"
        );
        match self.policy {
            MembershipPolicy::Strict => Err(rejection.into()),
            MembershipPolicy::Lenient => Ok(MembershipOutcome::Ignored(rejection)),
        }
    }
}

fn insert_candidate(generation: &Generation, new_index: usize) -> Result<Vec<u64>> {
    let len = generation.slots.len();
    if new_index > len {
        return Err(Rejection::permanent(format!(
            "insert index {new_index} outside 0..={len}"
        ))
        .into());
    }
    let mut values = generation.values();
    values.insert(new_index, 0);
    Ok(values)
}

fn delete_candidate(generation: &Generation, old_index: usize) -> Result<Vec<u64>> {
    let len = generation.slots.len();
    if old_index >= len {
        return Err(Rejection::permanent(format!(
            "retire index {old_index} outside 0..{len}"
        ))
        .into());
    }
    let mut values = generation.values();
    values.remove(old_index);
    Ok(values)
}

/// Why `proposed` cannot be applied on top of `candidate`, if it cannot.
fn review_proposal<T: ClockValue>(candidate: &[u64], proposed: &[T]) -> Result<Option<Rejection>> {
    if proposed.len() != candidate.len() {
        return Ok(Some(Rejection::permanent(format!(
            "proposal has {} clocks, expected {}",
            proposed.len(),
            candidate.len()
        ))));
    }
    if causal::compare(proposed, candidate)?.is_lt() {
        return Ok(Some(Rejection::retryable(
            "proposal is causally behind local clocks",
        )));
    }
    Ok(None)
}

impl fmt::Debug for GroupClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let generation = self.current();
        f.debug_struct("GroupClock")
            .field("policy", &self.policy)
            .field("generation", &generation.number)
            .field("local_index", &generation.local_index)
            .field("clocks", &generation.values())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn clock(local_index: usize, values: &[u64]) -> GroupClock {
        GroupClock::new(local_index, values).unwrap()
    }

    #[test]
    fn test_local_index_validated() {
        assert_matches!(
            GroupClock::new::<u64>(3, &[1, 2, 3]),
            Err(ClockError::LocalIndexOutOfRange { index: 3, len: 3 })
        );
        assert_matches!(
            GroupClock::new::<u64>(0, &[]),
            Err(ClockError::LocalIndexOutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn test_local_event_increments_local_slot() {
        let engine = clock(1, &[5, 7, 2]);
        assert_eq!(engine.local_event(), 8);
        assert_eq!(engine.values(), vec![5, 8, 2]);
    }

    #[test]
    fn test_message_received_scenario() {
        let engine = clock(1, &[5, 7, 2]);
        assert_eq!(engine.local_event(), 8);

        let snapshot = engine.message_received(&[5u64, 9, 2]).unwrap();
        assert_eq!(snapshot.clocks(), &[5, 9, 2]);
        assert!(snapshot.local_clock() > 8);
        assert_eq!(snapshot.local_clock(), 9);
        assert_eq!(snapshot.member_id(), 1);
    }

    #[test]
    fn test_message_received_size_mismatch_is_ignorable() {
        let engine = clock(0, &[1, 1]);
        let err = engine.message_received(&[4u64, 4, 4]).unwrap_err();
        assert!(err.is_ignorable());
        assert_eq!(engine.values(), vec![1, 1]);
    }

    #[test]
    fn test_message_clocks_advances() {
        let engine = clock(0, &[0, 3]);
        let snapshot = engine.message_clocks();
        assert_eq!(snapshot.clocks(), &[1, 3]);
        assert_eq!(engine.clock_data(), snapshot);
    }

    #[test]
    fn test_clock_data_has_no_side_effect() {
        let engine = clock(0, &[4]);
        assert_eq!(engine.clock_data().clocks(), &[4]);
        assert_eq!(engine.clock_data().clocks(), &[4]);
    }

    #[test]
    fn test_locally_variants() {
        let engine = clock(0, &[0]);
        assert_eq!(engine.locally(|| "done"), "done");
        assert_eq!(engine.local_counter(), 1);

        let seen = engine.locally_with(|snapshot| snapshot.local_clock());
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_add_member_below_local_shifts_index() {
        let engine = clock(1, &[5, 7, 2]);
        let proposed = engine.propose_insert_values(1).unwrap();
        assert_eq!(proposed, vec![5, 0, 7, 2]);

        let outcome = engine.add_member(1, &proposed).unwrap();
        assert_eq!(
            outcome,
            MembershipOutcome::Committed {
                generation: 1,
                local_index: 2
            }
        );
        assert_eq!(engine.local_index(), 2);
        assert_eq!(engine.local_counter(), 7);
        assert_eq!(engine.values(), vec![5, 0, 7, 2]);
    }

    #[test]
    fn test_add_member_above_local_keeps_index() {
        let engine = clock(0, &[1, 1]);
        engine.add_member(2, &[1u64, 1, 4]).unwrap();
        assert_eq!(engine.local_index(), 0);
        assert_eq!(engine.values(), vec![1, 1, 4]);
    }

    #[test]
    fn test_add_member_out_of_range_is_permanent() {
        let engine = clock(0, &[1, 1]).with_policy(MembershipPolicy::Lenient);
        let err = engine.add_member(3, &[0u64, 0, 0]).unwrap_err();
        assert_eq!(err.rejection_kind(), Some(crate::RejectionKind::Permanent));
    }

    #[test]
    fn test_retire_self_is_fatal() {
        let engine = clock(1, &[1, 2, 3]);
        let err = engine.retire_member(1, &[1u64, 3]).unwrap_err();
        assert_eq!(err, ClockError::CannotRetireSelf { index: 1 });
        assert!(err.is_fatal());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retire_below_local_shifts_index() {
        let engine = clock(2, &[1, 2, 3]);
        let proposed = engine.propose_delete_values(0).unwrap();
        engine.retire_member(0, &proposed).unwrap();
        assert_eq!(engine.local_index(), 1);
        assert_eq!(engine.values(), vec![2, 3]);
        assert_eq!(engine.generation(), 1);
    }

    #[test]
    fn test_local_counter_holds_at_max() {
        let engine = clock(0, &[u64::MAX - 1, 0]);
        assert_eq!(engine.local_event(), u64::MAX);
        assert_eq!(engine.local_event(), u64::MAX);
        assert_eq!(engine.local_counter(), u64::MAX);

        let snapshot = engine.message_received(&[0u64, 0]).unwrap();
        assert_eq!(snapshot.clocks(), &[u64::MAX, 0]);
    }

    #[test]
    fn test_remote_max_is_not_wrapped_by_next_event() {
        let engine = clock(0, &[3, 0]);
        engine.message_received(&[u64::MAX, 0]).unwrap();
        assert_eq!(engine.local_event(), u64::MAX);
        assert_eq!(engine.local_counter(), u64::MAX);
        assert_eq!(engine.message_clocks().local_clock(), u64::MAX);
    }

    #[test]
    fn test_location_reads() {
        let members = [
            crate::MemberConfig::new(0, "tcp://a:1", 0),
            crate::MemberConfig::new(1, "tcp://b:1", 0),
        ];
        let engine = GroupClock::from_members(0, &members).unwrap();
        assert_eq!(engine.location(1).map(|u| u.to_string()), Some("tcp://b:1".to_string()));
        assert_eq!(engine.location(5), None);

        engine.add_member(1, &[0u64, 0, 0]).unwrap();
        assert_eq!(engine.location(1), None);
        assert_eq!(engine.location(2).map(|u| u.to_string()), Some("tcp://b:1".to_string()));
    }
}
