//! Error and rejection types for groupclock
//!
//! Two layers live here:
//!
//! - [`Rejection`]: "this operation did not happen" signals. They carry only a
//!   reason and are classified by how the caller should react
//!   ([`RejectionKind`]).
//! - [`ClockError`]: everything a fallible engine call can return, including
//!   fatal state-invariant violations and batched configuration failures.
//!
//! ```text
//! ClockError
//! ├── LocalIndexOutOfRange / CannotRetireSelf   fatal, never retried
//! ├── Rejected(Rejection)
//! │   ├── Ignorable   discard, let the transport resync
//! │   ├── Retryable   try again with fresher data
//! │   └── Permanent   request is structurally wrong
//! ├── LengthMismatch / ScatterOutOfRange        caller bugs in pure helpers
//! └── InvalidLocation / InvalidConfig / Batch   configuration problems
//! ```

use std::borrow::Cow;
use std::fmt;

use crate::collector::CollectedErrors;

/// Reason text carried by a rejection.
///
/// Static reasons borrow, so raising an ignorable rejection with a literal
/// reason does not allocate.
pub type Reason = Cow<'static, str>;

// ============================================================================
// Rejections
// ============================================================================

/// How the caller is expected to handle a [`Rejection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionKind {
    /// Control-flow signal; drop the input and recover locally.
    Ignorable,
    /// The same or similar input may succeed later.
    Retryable,
    /// Never retry the same input.
    Permanent,
}

impl RejectionKind {
    /// Whether a caller may try the operation again.
    pub fn allows_retry(&self) -> bool {
        matches!(self, Self::Ignorable | Self::Retryable)
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ignorable => "ignorable",
            Self::Retryable => "retryable",
            Self::Permanent => "permanent",
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An operation that was not performed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// Cheap signal used purely for control flow
    #[error("ignored: {reason}")]
    Ignorable {
        /// Why the input was ignored
        reason: Reason,
    },

    /// Failed now, may succeed later
    #[error("rejected, retry later: {reason}")]
    Retryable {
        /// Why the operation was rejected
        reason: Reason,
    },

    /// Must never be retried unchanged
    #[error("rejected permanently: {reason}")]
    Permanent {
        /// Why the operation was rejected
        reason: Reason,
    },
}

impl Rejection {
    /// Build a rejection of the given kind.
    pub fn new(kind: RejectionKind, reason: impl Into<Reason>) -> Self {
        let reason = reason.into();
        match kind {
            RejectionKind::Ignorable => Self::Ignorable { reason },
            RejectionKind::Retryable => Self::Retryable { reason },
            RejectionKind::Permanent => Self::Permanent { reason },
        }
    }

    /// Create an ignorable rejection
    pub fn ignorable(reason: impl Into<Reason>) -> Self {
        Self::new(RejectionKind::Ignorable, reason)
    }

    /// Create a retryable rejection
    pub fn retryable(reason: impl Into<Reason>) -> Self {
        Self::new(RejectionKind::Retryable, reason)
    }

    /// Create a permanent rejection
    pub fn permanent(reason: impl Into<Reason>) -> Self {
        Self::new(RejectionKind::Permanent, reason)
    }

    /// Bind a reason now and build the rejection later.
    pub fn deferred(kind: RejectionKind, reason: impl Into<Reason>) -> DeferredRejection {
        DeferredRejection {
            kind,
            reason: reason.into(),
        }
    }

    /// The handling class of this rejection.
    pub fn kind(&self) -> RejectionKind {
        match self {
            Self::Ignorable { .. } => RejectionKind::Ignorable,
            Self::Retryable { .. } => RejectionKind::Retryable,
            Self::Permanent { .. } => RejectionKind::Permanent,
        }
    }

    /// Human-readable reason.
    pub fn reason(&self) -> &str {
        match self {
            Self::Ignorable { reason } | Self::Retryable { reason } | Self::Permanent { reason } => {
                reason
            }
        }
    }
}

/// A rejection whose reason is fixed but which has not been built yet.
///
/// Plugs into `ok_or_else` / `map_err` chains:
///
/// ```
/// use groupclock_core::{Rejection, RejectionKind};
///
/// let missing = Rejection::deferred(RejectionKind::Retryable, "peer not known yet");
/// let found: Option<u64> = None;
/// let err = found.ok_or_else(missing.into_fn()).unwrap_err();
/// assert_eq!(err.kind(), RejectionKind::Retryable);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredRejection {
    kind: RejectionKind,
    reason: Reason,
}

impl DeferredRejection {
    /// Kind of the rejection this will produce
    pub fn kind(&self) -> RejectionKind {
        self.kind
    }

    /// Produce the rejection.
    pub fn build(self) -> Rejection {
        Rejection::new(self.kind, self.reason)
    }

    /// Produce a [`ClockError`] wrapping the rejection.
    pub fn into_error(self) -> ClockError {
        ClockError::Rejected(self.build())
    }

    /// Turn into a factory closure.
    pub fn into_fn(self) -> impl FnOnce() -> Rejection {
        move || self.build()
    }
}

impl From<DeferredRejection> for Rejection {
    fn from(deferred: DeferredRejection) -> Self {
        deferred.build()
    }
}

// ============================================================================
// Clock errors
// ============================================================================

/// Error type for all groupclock operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// The local index does not address a slot of the vector
    #[error("local index {index} out of range for {len} members")]
    LocalIndexOutOfRange {
        /// Requested local index
        index: usize,
        /// Number of members
        len: usize,
    },

    /// A member tried to retire its own slot
    #[error("cannot retire myself (slot {index})")]
    CannotRetireSelf {
        /// The local slot index
        index: usize,
    },

    /// Two clock vectors of different lengths were compared
    #[error("clock length mismatch: {left} vs {right}")]
    LengthMismatch {
        /// Length of the first vector
        left: usize,
        /// Length of the second vector
        right: usize,
    },

    /// The operation did not happen
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// A member location could not be parsed
    #[error("member {index}: invalid location {location:?}: {reason}")]
    InvalidLocation {
        /// Index of the offending member record
        index: usize,
        /// Raw location text
        location: String,
        /// Parser message
        reason: String,
    },

    /// Configuration is malformed
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// What is wrong
        message: String,
    },

    /// Sequence number outside the scatter range
    #[error("scatter sequence {seq} exceeds declared maximum {max}")]
    ScatterOutOfRange {
        /// Requested sequence number
        seq: u32,
        /// Declared maximum member count
        max: u32,
    },

    /// Several failures raised together
    #[error(transparent)]
    Batch(CollectedErrors<ClockError>),
}

impl ClockError {
    /// Create a local-index range error
    pub fn local_index_out_of_range(index: usize, len: usize) -> Self {
        Self::LocalIndexOutOfRange { index, len }
    }

    /// Create a length mismatch error
    pub fn length_mismatch(left: usize, right: usize) -> Self {
        Self::LengthMismatch { left, right }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid location error
    pub fn invalid_location(
        index: usize,
        location: impl Into<String>,
        reason: impl fmt::Display,
    ) -> Self {
        Self::InvalidLocation {
            index,
            location: location.into(),
            reason: reason.to_string(),
        }
    }

    /// Stable numeric code for automated handling.
    pub fn code(&self) -> u16 {
        match self {
            Self::LocalIndexOutOfRange { .. } => 1001,
            Self::CannotRetireSelf { .. } => 1002,
            Self::LengthMismatch { .. } => 2001,
            Self::ScatterOutOfRange { .. } => 2002,
            Self::Rejected(rejection) => match rejection.kind() {
                RejectionKind::Ignorable => 3001,
                RejectionKind::Retryable => 3002,
                RejectionKind::Permanent => 3003,
            },
            Self::InvalidLocation { .. } => 4001,
            Self::InvalidConfig { .. } => 4002,
            Self::Batch(_) => 4003,
        }
    }

    /// State-invariant violations. Never retried, never recovered locally.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::LocalIndexOutOfRange { .. } | Self::CannotRetireSelf { .. }
        )
    }

    /// Ignorable or retryable rejections; the caller may try again.
    pub fn is_retryable(&self) -> bool {
        self.rejection_kind()
            .map(|kind| kind.allows_retry())
            .unwrap_or(false)
    }

    /// Cheap control-flow rejection.
    pub fn is_ignorable(&self) -> bool {
        self.rejection_kind() == Some(RejectionKind::Ignorable)
    }

    /// Kind of the wrapped rejection, if this is one.
    pub fn rejection_kind(&self) -> Option<RejectionKind> {
        match self {
            Self::Rejected(rejection) => Some(rejection.kind()),
            _ => None,
        }
    }
}

impl From<CollectedErrors<ClockError>> for ClockError {
    fn from(errors: CollectedErrors<ClockError>) -> Self {
        Self::Batch(errors)
    }
}

/// Standard Result type for groupclock operations
pub type Result<T> = std::result::Result<T, ClockError>;
