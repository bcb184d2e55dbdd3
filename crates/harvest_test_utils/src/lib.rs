//! # Harvest Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Board fixtures and turn-input builders
//! - Scripted tie-break policies
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod selection;

/// Re-export proptest for convenience.
pub use proptest;
