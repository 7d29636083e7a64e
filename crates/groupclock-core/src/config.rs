//! Member records and group configuration
//!
//! A group is described by one record per member: its slot index, the
//! network location it advertises, and the counter value it starts from.
//! Records may come from any source implementing [`KnownMember`]; the
//! bundled [`GroupConfig`] reads them from TOML.
//!
//! ```toml
//! local_index = 1
//! policy = "lenient"
//!
//! [[members]]
//! index = 0
//! location = "tcp://10.0.0.1:7000"
//! start = 5
//!
//! [[members]]
//! index = 1
//! location = "tcp://10.0.0.2:7000"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::collector::ErrorCollector;
use crate::errors::{ClockError, Result};
use crate::scatter::ScatterConfig;

/// What the engine needs to know about a member at construction time.
pub trait KnownMember {
    /// Slot index of the member
    fn index(&self) -> usize;
    /// Advertised location, unparsed
    fn location(&self) -> &str;
    /// Starting counter value
    fn start(&self) -> u64;
}

/// Parse a member location into a URI.
pub fn parse_location(index: usize, location: &str) -> Result<Url> {
    Url::parse(location).map_err(|e| ClockError::invalid_location(index, location, e))
}

/// One member record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberConfig {
    /// Slot index
    pub index: usize,
    /// Advertised location, e.g. `tcp://10.0.0.1:7000`
    pub location: String,
    /// Starting counter value
    #[serde(default)]
    pub start: u64,
}

impl MemberConfig {
    /// Create a member record
    pub fn new(index: usize, location: impl Into<String>, start: u64) -> Self {
        Self {
            index,
            location: location.into(),
            start,
        }
    }
}

impl KnownMember for MemberConfig {
    fn index(&self) -> usize {
        self.index
    }

    fn location(&self) -> &str {
        &self.location
    }

    fn start(&self) -> u64 {
        self.start
    }
}

impl<M: KnownMember + ?Sized> KnownMember for &M {
    fn index(&self) -> usize {
        (**self).index()
    }

    fn location(&self) -> &str {
        (**self).location()
    }

    fn start(&self) -> u64 {
        (**self).start()
    }
}

/// How membership proposals that disagree with local state are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipPolicy {
    /// Disagreements are returned as rejection errors
    #[default]
    Strict,
    /// Disagreements are reported as an ignored outcome with no state change
    Lenient,
}

/// Full description of a group from one member's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Index of our own slot
    pub local_index: usize,
    /// Membership disagreement policy
    #[serde(default)]
    pub policy: MembershipPolicy,
    /// Scattered-index settings
    #[serde(default)]
    pub scatter: ScatterConfig,
    /// One record per member
    #[serde(default)]
    pub members: Vec<MemberConfig>,
}

impl GroupConfig {
    /// Create a config with the default policy
    pub fn new(local_index: usize, members: Vec<MemberConfig>) -> Self {
        Self {
            local_index,
            policy: MembershipPolicy::default(),
            scatter: ScatterConfig::default(),
            members,
        }
    }

    /// Parse from TOML.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input)
            .map_err(|e| ClockError::invalid_config(format!("Invalid TOML: {e}")))
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| ClockError::invalid_config(e.to_string()))
    }

    /// Check every record and report all problems together.
    ///
    /// Indices must cover `0..n` exactly once, `local_index` must be one of
    /// them, and every location must parse.
    pub fn validate(&self) -> Result<()> {
        let mut errors = ErrorCollector::new();
        let n = self.members.len();

        if n == 0 {
            errors.push(ClockError::invalid_config("group has no members"));
        } else if self.local_index >= n {
            errors.push(ClockError::local_index_out_of_range(self.local_index, n));
        }

        let mut seen: BTreeMap<usize, usize> = BTreeMap::new();
        for member in &self.members {
            *seen.entry(member.index).or_default() += 1;
            if member.index >= n {
                errors.push(ClockError::invalid_config(format!(
                    "member index {} outside 0..{n}",
                    member.index
                )));
            }
            errors.collect(parse_location(member.index, &member.location));
        }
        for (index, count) in seen.into_iter().filter(|(_, count)| *count > 1) {
            errors.push(ClockError::invalid_config(format!(
                "member index {index} listed {count} times"
            )));
        }

        errors.collect(self.scatter.validate());
        errors.finish().map_err(ClockError::from)
    }

    /// Members ordered by slot index.
    pub fn sorted_members(&self) -> Vec<&MemberConfig> {
        let mut members: Vec<&MemberConfig> = self.members.iter().collect();
        members.sort_by_key(|member| member.index);
        members
    }
}
