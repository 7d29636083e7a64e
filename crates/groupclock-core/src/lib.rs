#![deny(clippy::dbg_macro)]
#![deny(clippy::todo)]
//! # groupclock core - vector clocks for a changing member group
//!
//! Each member of a group keeps a counter per member, itself included, and
//! uses it to stamp local events, merge clocks carried by messages from
//! peers, and decide whether two observed states are causally ordered.
//!
//! ## Components
//!
//! - [`causal`]: three-valued causal comparison and element-wise merge over
//!   plain counter vectors
//! - [`slot`]: one atomic counter plus the member's network location
//! - [`engine`]: [`GroupClock`], the live vector and its transitions,
//!   including inserting and retiring members
//! - [`snapshot`]: [`EventClocks`], frozen copies handed to callers
//! - [`errors`] / [`collector`]: the rejection taxonomy and batched errors
//! - [`config`]: member records and TOML group configuration
//! - [`scatter`]: bit-reversed insertion keys (not yet used by the engine)
//!
//! ## Example
//!
//! ```
//! use groupclock_core::GroupClock;
//!
//! let clock = GroupClock::new(1, &[5u64, 7, 2])?;
//! assert_eq!(clock.local_event(), 8);
//!
//! let merged = clock.message_received(&[5u64, 9, 2])?;
//! assert_eq!(merged.clocks(), &[5, 9, 2]);
//! # Ok::<(), groupclock_core::ClockError>(())
//! ```
//!
//! Network transport, serialization of messages and the join/leave
//! handshake belong to the caller. The engine only validates and commits
//! one agreed membership change at a time.

pub mod causal;
pub mod collector;
pub mod config;
pub mod engine;
pub mod errors;
pub mod scatter;
pub mod slot;
pub mod snapshot;

pub use causal::{compare, compare_signum, merge_max, relation, CausalRelation, ClockValue};
pub use collector::{CollectedErrors, ErrorCollector};
pub use config::{GroupConfig, KnownMember, MemberConfig, MembershipPolicy};
pub use engine::{GroupClock, MembershipOutcome};
pub use errors::{ClockError, DeferredRejection, Reason, Rejection, RejectionKind, Result};
pub use scatter::{scatter, ScatterConfig, MAX_SCATTERED_MEMBERS};
pub use slot::MemberSlot;
pub use snapshot::EventClocks;
