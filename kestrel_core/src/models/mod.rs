// kestrel_core/src/models/mod.rs

use nalgebra::{DMatrix, DVector};
use std::fmt::Debug;

use crate::context::EstimatorContext;
use crate::error::{ModelError, ParameterError};
use crate::measurement::update::MeasurementUpdate;
use crate::parameters::{ParameterSet, ParameterValue};
use crate::state::State;
use crate::status::SystemStatus;

// --- SENSOR MODEL TRAIT ---
// Represents the mathematical model of a sensor. `z = h(x) + v`
/// The pluggable, sensor-specific half of a `Measurement`.
///
/// A model owns all the numerical knowledge about one kind of sensor: how
/// big its measurement vector is, how to predict it from the state, its
/// Jacobian, and its default noise. The orchestrator is generic over this
/// trait and never looks inside an update itself.
pub trait SensorModel: Debug + Send + Sync + 'static {
    /// The observation type this model consumes.
    type Update: MeasurementUpdate + Clone;

    /// Short identifier used in logs and errors.
    fn kind(&self) -> &'static str;

    /// Length of the measurement vector `z`. Fixed for the lifetime of the model.
    fn dimension(&self) -> usize;

    /// Binds the model to a live state. Fails if the state lacks something the
    /// model needs. Models that estimate their own quantities (biases, offsets)
    /// register them here.
    fn init(&mut self, context: &EstimatorContext, state: &mut State) -> Result<(), ModelError> {
        let _ = (context, state);
        Ok(())
    }

    /// Clears any quantities derived from past updates.
    fn reset(&mut self, state: &State) {
        let _ = state;
    }

    fn cleanup(&mut self) {}

    /// Whether this sensor may correct the filter under the given system status.
    fn applies_to_status(&self, status: SystemStatus) -> bool {
        let _ = status;
        true
    }

    /// The subsystems this sensor provides information for while it is active.
    fn status_flags(&self) -> SystemStatus {
        SystemStatus::NONE
    }

    /// Returns the measurement noise covariance matrix `R`.
    fn noise_covariance(&self) -> &DMatrix<f64>;

    /// Replaces the default `R` used by every later update without its own override.
    fn set_noise_covariance(&mut self, covariance: DMatrix<f64>);

    /// Extracts the measurement vector `z` from an update.
    fn measurement(&self, update: &Self::Update) -> DVector<f64>;

    /// Predicts the ideal measurement `z_pred = h(x)` from the filter state.
    fn predict(&self, state: &State) -> DVector<f64>;

    /// Calculates the measurement Jacobian `H = ∂h/∂x`.
    fn jacobian(&self, state: &State) -> DMatrix<f64>;

    /// `y = z - z_pred`. Override for quantities that wrap around.
    fn innovation(&self, z: &DVector<f64>, z_pred: &DVector<f64>) -> DVector<f64> {
        z - z_pred
    }

    /// Last chance to veto an update (e.g. outlier rejection). Returning `false`
    /// drops the update without touching the state.
    fn before_update(&mut self, state: &State, update: &Self::Update) -> bool {
        let _ = (state, update);
        true
    }

    /// Bookkeeping after a successful correction.
    fn after_update(&mut self, state: &State) {
        let _ = state;
    }

    /// Model-specific tunables.
    fn parameters(&self) -> ParameterSet {
        ParameterSet::new()
    }

    fn set_parameter(&mut self, name: &str, value: &ParameterValue) -> Result<(), ParameterError> {
        let _ = value;
        Err(ParameterError::Unknown(name.to_string()))
    }
}

/// Checks that `covariance` is a finite `dim x dim` matrix.
pub fn check_covariance(dim: usize, covariance: &DMatrix<f64>) -> Result<(), ModelError> {
    if covariance.nrows() != dim || covariance.ncols() != dim {
        return Err(ModelError::CovarianceShape {
            expected: dim,
            rows: covariance.nrows(),
            cols: covariance.ncols(),
        });
    }
    if covariance.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::NonFiniteCovariance);
    }
    Ok(())
}

/// Builds a diagonal covariance from per-axis standard deviations.
pub fn diagonal_covariance(stddev: &[f64]) -> DMatrix<f64> {
    DMatrix::from_diagonal(&DVector::from_iterator(
        stddev.len(),
        stddev.iter().map(|s| s * s),
    ))
}

/// Reads the standard deviations back off a diagonal covariance.
pub(crate) fn diagonal_stddev(covariance: &DMatrix<f64>) -> Vec<f64> {
    covariance.diagonal().iter().map(|v| v.sqrt()).collect()
}

/// Shared handling of the `stddev` parameter: a scalar applies to every axis,
/// a vector must match the model dimension.
pub(crate) fn stddev_from_parameter(
    name: &str,
    dim: usize,
    value: &ParameterValue,
) -> Result<DMatrix<f64>, ParameterError> {
    let stddev = match value {
        ParameterValue::Number(_) => vec![crate::parameters::non_negative(name, value)?; dim],
        ParameterValue::Vector(v) if v.len() == dim => {
            for s in v {
                crate::parameters::non_negative(name, &ParameterValue::Number(*s))?;
            }
            v.clone()
        }
        ParameterValue::Vector(v) => {
            return Err(ParameterError::OutOfRange {
                name: name.to_string(),
                value: v.len() as f64,
                reason: "vector length must match the measurement dimension",
            })
        }
        other => return Err(crate::parameters::type_mismatch(name, "number or vector", other)),
    };
    Ok(diagonal_covariance(&stddev))
}

pub mod height;
pub mod magnetometer;
pub mod position;
