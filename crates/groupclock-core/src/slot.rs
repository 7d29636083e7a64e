//! Member slot: one counter plus the location of the member that owns it.

use std::sync::atomic::{AtomicU64, Ordering};

use url::Url;

/// One entry of the vector clock.
///
/// The counter is atomic so it can be read without the engine lock. Writes
/// only ever raise it; cross-slot invariants live in the engine.
#[derive(Debug)]
pub struct MemberSlot {
    counter: AtomicU64,
    location: Option<Url>,
}

impl MemberSlot {
    /// Create a slot with a starting counter
    pub fn new(start: u64, location: Option<Url>) -> Self {
        Self {
            counter: AtomicU64::new(start),
            location,
        }
    }

    /// Fresh slot for a newly inserted member.
    pub fn empty() -> Self {
        Self::new(0, None)
    }

    /// Current counter value.
    ///
    /// Wait-free. May race with a concurrent increment; no further
    /// consistency guarantee.
    #[inline]
    pub fn value(&self) -> u64 {
        self.counter.load(Ordering::Acquire)
    }

    /// Raise the counter to `value` if it is larger.
    ///
    /// Returns the value held before the call. Concurrent raises converge on
    /// the largest value.
    #[inline]
    pub fn raise_to(&self, value: u64) -> u64 {
        self.counter.fetch_max(value, Ordering::AcqRel)
    }

    /// Increment and return the new value.
    ///
    /// Saturates at `u64::MAX`; the counter never wraps back to zero.
    #[inline]
    pub fn increment(&self) -> u64 {
        self.counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| {
                Some(v.saturating_add(1))
            })
            .unwrap_or_else(|previous| previous)
            .saturating_add(1)
    }

    /// Network location of the member, when known
    pub fn location(&self) -> Option<&Url> {
        self.location.as_ref()
    }

    /// Copy of this slot with the same counter and location.
    ///
    /// Used when a membership change rebuilds the vector.
    pub fn duplicate(&self) -> Self {
        Self::new(self.value(), self.location.clone())
    }
}
