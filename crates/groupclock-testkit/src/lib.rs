//! # groupclock testkit
//!
//! Shared helpers for groupclock tests:
//!
//! - [`builders`]: deterministic member fixtures and a [`ClockBuilder`]
//! - [`strategies`]: proptest strategies for counter vectors and engines
//! - [`logging`]: one-time tracing setup for test binaries

#![allow(clippy::expect_used, clippy::unwrap_used)]

pub mod builders;
pub mod logging;
pub mod strategies;

pub use builders::{member_fixtures, member_location, ClockBuilder};
pub use logging::init_test_tracing;

// Re-export proptest for convenience
pub use proptest;
