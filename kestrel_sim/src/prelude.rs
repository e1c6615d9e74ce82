// kestrel_sim/src/prelude.rs

// Re-export the entire kestrel_core prelude so binaries can reach the pure
// types (`Measurement`, `State`, models) from one place.
pub use kestrel_core::prelude::*;

// Re-export common simulation-specific types for easy access.
pub use crate::cli::Cli;
pub use crate::config::{ScenarioConfig, SensorConfig, SensorSettings};
pub use crate::error::SimError;
pub use crate::simulation::runner::{RunSummary, Simulation};
