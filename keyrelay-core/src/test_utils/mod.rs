//! Test utilities and helpers for keyrelay
//!
//! Fake transport sinks, background hosts, timeout helpers and log/metric
//! capture shared by the unit tests and the crate-level integration tests.
//! Compiled for this crate's tests and behind the `test-utils` feature.

pub mod async_helpers;
pub mod capture;
pub mod fixtures;

pub use async_helpers::*;
pub use capture::*;
pub use fixtures::*;
