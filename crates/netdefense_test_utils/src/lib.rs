//! # NetDefense Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Fixture players with developed land and placed devices
//! - Scripted player actions
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
