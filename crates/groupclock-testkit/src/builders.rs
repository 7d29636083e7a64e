//! Member fixtures and engine builders
//!
//! Locations are derived from the member index so fixtures are stable
//! across runs.

use groupclock_core::{GroupClock, GroupConfig, MemberConfig, MembershipPolicy};

/// Deterministic location for member `index`.
pub fn member_location(index: usize) -> String {
    format!("tcp://member-{index}.group.test:7000")
}

/// One member record per starting value, indexed in order.
pub fn member_fixtures(values: &[u64]) -> Vec<MemberConfig> {
    values
        .iter()
        .enumerate()
        .map(|(index, &start)| MemberConfig::new(index, member_location(index), start))
        .collect()
}

/// Builder for engines used in tests.
///
/// # Example
///
/// ```rust
/// use groupclock_testkit::ClockBuilder;
///
/// let clock = ClockBuilder::new(&[5, 7, 2]).local(1).build();
/// assert_eq!(clock.local_counter(), 7);
/// ```
#[derive(Debug, Clone)]
pub struct ClockBuilder {
    local_index: usize,
    values: Vec<u64>,
    policy: MembershipPolicy,
    with_locations: bool,
}

impl ClockBuilder {
    /// Start from the given counter values; local slot 0.
    pub fn new(values: &[u64]) -> Self {
        Self {
            local_index: 0,
            values: values.to_vec(),
            policy: MembershipPolicy::default(),
            with_locations: false,
        }
    }

    /// A group of `n` members, all counters zero.
    pub fn zeroed(n: usize) -> Self {
        Self::new(&vec![0; n])
    }

    /// Set the local slot index
    pub fn local(mut self, local_index: usize) -> Self {
        self.local_index = local_index;
        self
    }

    /// Set the membership policy
    pub fn policy(mut self, policy: MembershipPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build through member records so every slot has a location
    pub fn with_locations(mut self) -> Self {
        self.with_locations = true;
        self
    }

    /// Equivalent group configuration.
    pub fn config(&self) -> GroupConfig {
        let mut config = GroupConfig::new(self.local_index, member_fixtures(&self.values));
        config.policy = self.policy;
        config
    }

    /// Build the engine, panicking on invalid input.
    pub fn build(self) -> GroupClock {
        if self.with_locations {
            GroupClock::from_config(&self.config()).expect("valid test group config")
        } else {
            GroupClock::new(self.local_index, &self.values)
                .expect("valid test clock values")
                .with_policy(self.policy)
        }
    }
}
