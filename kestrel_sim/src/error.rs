// kestrel_sim/src/error.rs

use std::path::PathBuf;
use thiserror::Error;

use kestrel_core::error::{FilterError, MeasurementError, ParameterError};

/// Everything that can stop a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("scenario file not found: {}", .0.display())]
    ScenarioNotFound(PathBuf),

    #[error("failed to load scenario: {0}")]
    Config(#[from] figment::Error),

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("sensor '{name}' has an invalid parameter: {source}")]
    Parameter {
        name: String,
        #[source]
        source: ParameterError,
    },

    #[error(transparent)]
    Measurement(#[from] MeasurementError),

    #[error("prediction step failed: {0}")]
    Prediction(#[from] FilterError),

    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}
