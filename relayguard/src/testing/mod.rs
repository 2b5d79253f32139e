//! Testing utilities for relayguard.
//!
//! This module provides:
//! - A scripted producer that counts its invocations
//! - Assertions for the caller-facing event contract
//! - Policy and collection fixtures

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_ends_with_error, assert_kinds, assert_no_error, assert_well_formed};
pub use fixtures::{collect_events, fast_policy};
pub use mocks::{ScriptStep, ScriptedProducer};
