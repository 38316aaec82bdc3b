//! Named multi-run configurations reproducing published analyses.

pub mod definition;
pub mod registry;
pub mod runner;

pub use definition::{PresetDefinition, PresetMode, PresetRun};
pub use registry::PresetRegistry;
pub use runner::{PresetReport, PresetRunner, StudyAreaResults, StudyAreaSummary};
