//! Causal-order algebra over counter vectors
//!
//! Pure functions over same-length numeric vectors. The central one is
//! [`compare`], which folds the vector-clock partial order into a
//! three-valued ordering:
//!
//! - `Less` (-1): every element of `a` is `<=` its counterpart in `b` and at
//!   least one is strictly smaller. `a` causally precedes `b`.
//! - `Greater` (1): the symmetric case.
//! - `Equal` (0): anything else, i.e. identical **or** concurrent.
//!
//! `Equal` deliberately covers both identical and concurrent vectors. Callers
//! that need to tell them apart use [`relation`].

use std::cmp::Ordering;
use std::sync::Arc;

use crate::errors::{ClockError, Result};

/// Numeric representations accepted by the algebra.
///
/// Everything reduces to `u64`. Signed negatives saturate to zero, since a
/// counter never goes below its starting value.
pub trait ClockValue {
    /// The value as an unsigned counter
    fn clock_value(&self) -> u64;
}

macro_rules! unsigned_clock_value {
    ($($ty:ty),*) => {
        $(impl ClockValue for $ty {
            #[inline]
            fn clock_value(&self) -> u64 {
                u64::from(*self)
            }
        })*
    };
}

macro_rules! signed_clock_value {
    ($($ty:ty),*) => {
        $(impl ClockValue for $ty {
            #[inline]
            fn clock_value(&self) -> u64 {
                u64::try_from(*self).unwrap_or(0)
            }
        })*
    };
}

unsigned_clock_value!(u8, u16, u32, u64);
signed_clock_value!(i8, i16, i32, i64, isize);

impl ClockValue for usize {
    #[inline]
    fn clock_value(&self) -> u64 {
        u64::try_from(*self).unwrap_or(u64::MAX)
    }
}

impl<T: ClockValue + ?Sized> ClockValue for &T {
    #[inline]
    fn clock_value(&self) -> u64 {
        (**self).clock_value()
    }
}

impl<T: ClockValue + ?Sized> ClockValue for Box<T> {
    #[inline]
    fn clock_value(&self) -> u64 {
        (**self).clock_value()
    }
}

impl<T: ClockValue + ?Sized> ClockValue for Arc<T> {
    #[inline]
    fn clock_value(&self) -> u64 {
        (**self).clock_value()
    }
}

/// Full partial-order relation between two vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CausalRelation {
    /// Element-wise equal
    Identical,
    /// First happened before second
    Before,
    /// First happened after second
    After,
    /// Neither dominates
    Concurrent,
}

impl CausalRelation {
    /// Collapse into the three-valued ordering used by [`compare`].
    pub fn ordering(self) -> Ordering {
        match self {
            Self::Before => Ordering::Less,
            Self::After => Ordering::Greater,
            Self::Identical | Self::Concurrent => Ordering::Equal,
        }
    }

    /// The relation seen from the other side.
    pub fn reverse(self) -> Self {
        match self {
            Self::Before => Self::After,
            Self::After => Self::Before,
            other => other,
        }
    }
}

/// Classify two vectors precisely.
///
/// # Errors
///
/// [`ClockError::LengthMismatch`] if the vectors differ in length.
pub fn relation<A, B>(a: &[A], b: &[B]) -> Result<CausalRelation>
where
    A: ClockValue,
    B: ClockValue,
{
    if a.len() != b.len() {
        return Err(ClockError::length_mismatch(a.len(), b.len()));
    }

    let mut some_less = false;
    let mut some_greater = false;
    for (x, y) in a.iter().zip(b) {
        match x.clock_value().cmp(&y.clock_value()) {
            Ordering::Less => some_less = true,
            Ordering::Greater => some_greater = true,
            Ordering::Equal => {}
        }
        if some_less && some_greater {
            return Ok(CausalRelation::Concurrent);
        }
    }

    Ok(match (some_less, some_greater) {
        (false, false) => CausalRelation::Identical,
        (true, false) => CausalRelation::Before,
        (false, true) => CausalRelation::After,
        (true, true) => CausalRelation::Concurrent,
    })
}

/// Three-valued causal comparison.
///
/// # Errors
///
/// [`ClockError::LengthMismatch`] if the vectors differ in length.
pub fn compare<A, B>(a: &[A], b: &[B]) -> Result<Ordering>
where
    A: ClockValue,
    B: ClockValue,
{
    relation(a, b).map(CausalRelation::ordering)
}

/// [`compare`] as the literal `-1`, `0` or `1`.
pub fn compare_signum<A, B>(a: &[A], b: &[B]) -> Result<i8>
where
    A: ClockValue,
    B: ClockValue,
{
    compare(a, b).map(|ordering| ordering as i8)
}

/// Element-wise maximum of `source` into `target`.
///
/// Returns how many elements of `target` were raised.
pub fn merge_max<B: ClockValue>(target: &mut [u64], source: &[B]) -> Result<usize> {
    if target.len() != source.len() {
        return Err(ClockError::length_mismatch(target.len(), source.len()));
    }

    let mut raised = 0;
    for (mine, theirs) in target.iter_mut().zip(source) {
        let theirs = theirs.clock_value();
        if theirs > *mine {
            *mine = theirs;
            raised += 1;
        }
    }
    Ok(raised)
}

/// Collect any accepted representation into plain counters.
pub fn to_counters<T: ClockValue>(values: &[T]) -> Vec<u64> {
    values.iter().map(ClockValue::clock_value).collect()
}
