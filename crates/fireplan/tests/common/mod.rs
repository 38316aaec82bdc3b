//! Shared test utilities for fireplan integration tests.
//!
//! This module provides:
//! - `TestHarness` for temp files and a scripted compute backend
//! - Builder patterns for requests and presets

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{ScriptedProvider, TestHarness};
