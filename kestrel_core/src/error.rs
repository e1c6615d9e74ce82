// kestrel_core/src/error.rs

use thiserror::Error;

use crate::state::StateVariable;

/// Raised by a `SensorModel` that cannot work with the estimator it is bound to.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("model '{model}' requires state variable {variable:?}, which is not part of the state layout")]
    MissingStateVariable {
        model: &'static str,
        variable: StateVariable,
    },

    #[error("noise covariance must be {expected}x{expected}, got {rows}x{cols}")]
    CovarianceShape {
        expected: usize,
        rows: usize,
        cols: usize,
    },

    #[error("noise covariance contains non-finite entries")]
    NonFiniteCovariance,
}

/// Raised when a state vector or covariance update would leave the `State` inconsistent.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("expected a correction of dimension {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("correction contains non-finite values")]
    NonFinite,
}

/// Raised by a `Filter` when a correction cannot be applied.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FilterError {
    #[error("{what} has shape {found:?}, expected {expected:?}")]
    DimensionMismatch {
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("innovation covariance is singular")]
    SingularInnovationCovariance,

    #[error(transparent)]
    State(#[from] StateError),
}

/// Raised when reading or writing a named tunable.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterError {
    #[error("unknown parameter '{0}'")]
    Unknown(String),

    #[error("parameter '{name}' expects a {expected} value, got {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("parameter '{name}' = {value} is out of range: {reason}")]
    OutOfRange {
        name: String,
        value: f64,
        reason: &'static str,
    },
}

/// Everything that can go wrong while a `Measurement` handles its payloads.
///
/// None of these are fatal to the estimator: they are reported per payload
/// and the tick carries on with the next one.
#[derive(Debug, Error)]
pub enum MeasurementError {
    #[error("measurement '{name}' failed to initialize: {source}")]
    Init {
        name: String,
        #[source]
        source: ModelError,
    },

    #[error("measurement '{0}' is not initialized")]
    NotInitialized(String),

    #[error("measurement '{measurement}' expects updates of type {expected}, got {found}")]
    UpdateTypeMismatch {
        measurement: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("measurement '{measurement}' rejected a malformed update: {reason}")]
    MalformedUpdate { measurement: String, reason: String },

    #[error("correction for measurement '{measurement}' failed: {source}")]
    Correction {
        measurement: String,
        #[source]
        source: FilterError,
    },

    #[error("a measurement named '{0}' already exists")]
    DuplicateName(String),

    #[error("no measurement named '{0}'")]
    UnknownMeasurement(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Parameter(#[from] ParameterError),
}
