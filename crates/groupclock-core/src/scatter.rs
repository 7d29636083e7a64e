//! Scattered member indices
//!
//! Maps sequentially assigned insertion numbers onto values whose order
//! follows a top-down walk of a binary tree (0, 1/2, 1/4, 3/4, 1/8, ...).
//! Slots inserted over time can then keep a stable relative order without
//! dense renumbering. Not yet used for slot placement by the engine.
//!
//! The transform is a bit reversal. When the largest practical group size is
//! known, the reversal is confined to the narrowest bit width covering it, so
//! keys stay small and remain unique within `0..max_members`.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::errors::{ClockError, Result};

/// Largest member count the bounded scatter accepts.
pub const MAX_SCATTERED_MEMBERS: u32 = 1 << 16;

/// Full-width scattered key for an insertion sequence number.
#[inline]
pub fn scatter(seq: u32) -> u32 {
    seq.reverse_bits()
}

/// Bounded scatter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterConfig {
    /// Declared maximum number of members
    pub max_members: u32,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            max_members: MAX_SCATTERED_MEMBERS,
        }
    }
}

impl ScatterConfig {
    /// Create a configuration for at most `max_members` slots.
    ///
    /// # Errors
    ///
    /// [`ClockError::InvalidConfig`] unless `1 <= max_members <= MAX_SCATTERED_MEMBERS`.
    pub fn new(max_members: u32) -> Result<Self> {
        let config = Self { max_members };
        config.validate()?;
        Ok(config)
    }

    /// Check the declared maximum.
    pub fn validate(&self) -> Result<()> {
        if self.max_members == 0 || self.max_members > MAX_SCATTERED_MEMBERS {
            return Err(ClockError::invalid_config(format!(
                "scatter max_members must be in 1..={MAX_SCATTERED_MEMBERS}, got {}",
                self.max_members
            )));
        }
        Ok(())
    }

    /// Number of bits the reversal works in.
    pub fn width(&self) -> u32 {
        u32::BITS - self.max_members.saturating_sub(1).leading_zeros()
    }

    /// Scattered key for `seq`.
    ///
    /// # Errors
    ///
    /// [`ClockError::ScatterOutOfRange`] if `seq >= max_members`.
    pub fn scatter(&self, seq: u32) -> Result<u32> {
        if seq >= self.max_members {
            return Err(ClockError::ScatterOutOfRange {
                seq,
                max: self.max_members,
            });
        }
        let width = self.width();
        if width == 0 {
            return Ok(0);
        }
        Ok(scatter(seq) >> (u32::BITS - width))
    }

    /// Compare two insertion numbers by their scattered keys.
    pub fn compare(&self, a: u32, b: u32) -> Result<Ordering> {
        Ok(self.scatter(a)?.cmp(&self.scatter(b)?))
    }

    /// Sort insertion numbers into scattered order.
    ///
    /// Leaves `seqs` untouched if any element is out of range.
    pub fn sort(&self, seqs: &mut [u32]) -> Result<()> {
        for &seq in seqs.iter() {
            self.scatter(seq)?;
        }
        let width = self.width();
        seqs.sort_unstable_by_key(|&seq| match width {
            0 => 0,
            _ => scatter(seq) >> (u32::BITS - width),
        });
        Ok(())
    }
}
