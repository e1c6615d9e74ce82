// kestrel_core/src/models/height.rs

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::context::EstimatorContext;
use crate::error::{ModelError, ParameterError};
use crate::measurement::update::MeasurementUpdate;
use crate::models::{diagonal_covariance, diagonal_stddev, stddev_from_parameter, SensorModel};
use crate::parameters::{non_negative, ParameterSet, ParameterValue};
use crate::state::{State, StateVariable};
use crate::status::SystemStatus;

/// A barometric altitude reading, in meters above mean sea level.
#[derive(Debug, Clone)]
pub struct HeightUpdate {
    pub altitude: f64,
    pub covariance: Option<DMatrix<f64>>,
}

impl HeightUpdate {
    pub fn new(altitude: f64) -> Self {
        Self {
            altitude,
            covariance: None,
        }
    }

    pub fn with_covariance(mut self, covariance: DMatrix<f64>) -> Self {
        self.covariance = Some(covariance);
        self
    }
}

impl MeasurementUpdate for HeightUpdate {
    fn covariance(&self) -> Option<&DMatrix<f64>> {
        self.covariance.as_ref()
    }
}

/// Barometric altitude: `z = Pz + reference_altitude + bias`.
///
/// The barometer offset drifts with the weather, so the model estimates it as
/// an extra state (`BaroBias`) that it registers on the state when initialized.
#[derive(Debug, Clone)]
pub struct HeightModel {
    noise_covariance: DMatrix<f64>,
    /// Initial standard deviation of the bias state.
    bias_stddev: f64,
    /// Squared normalized innovation above which an update is vetoed. 0 disables the gate.
    outlier_threshold: f64,
    reference_altitude: f64,
    pz_idx: usize,
    bias_idx: usize,
    consecutive_outliers: usize,
}

impl HeightModel {
    pub fn new(stddev: f64) -> Self {
        Self {
            noise_covariance: diagonal_covariance(&[stddev]),
            bias_stddev: 10.0,
            outlier_threshold: 0.0,
            reference_altitude: 0.0,
            pz_idx: 0,
            bias_idx: 0,
            consecutive_outliers: 0,
        }
    }

    pub fn with_outlier_threshold(mut self, threshold: f64) -> Self {
        self.outlier_threshold = threshold;
        self
    }

    /// Number of updates vetoed in a row since the last accepted one.
    pub fn consecutive_outliers(&self) -> usize {
        self.consecutive_outliers
    }
}

impl Default for HeightModel {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl SensorModel for HeightModel {
    type Update = HeightUpdate;

    fn kind(&self) -> &'static str {
        "height"
    }

    fn dimension(&self) -> usize {
        1
    }

    fn init(&mut self, context: &EstimatorContext, state: &mut State) -> Result<(), ModelError> {
        self.pz_idx = state
            .find_idx(&StateVariable::Pz)
            .ok_or(ModelError::MissingStateVariable {
                model: "height",
                variable: StateVariable::Pz,
            })?;
        self.bias_idx = state.register_variable(
            StateVariable::BaroBias,
            0.0,
            self.bias_stddev * self.bias_stddev,
        );
        self.reference_altitude = context.reference_altitude;
        self.consecutive_outliers = 0;
        Ok(())
    }

    fn reset(&mut self, _state: &State) {
        self.consecutive_outliers = 0;
    }

    fn applies_to_status(&self, status: SystemStatus) -> bool {
        !status.contains(SystemStatus::ALIGNMENT)
    }

    fn status_flags(&self) -> SystemStatus {
        SystemStatus::POSITION_Z
    }

    fn noise_covariance(&self) -> &DMatrix<f64> {
        &self.noise_covariance
    }

    fn set_noise_covariance(&mut self, covariance: DMatrix<f64>) {
        self.noise_covariance = covariance;
    }

    fn measurement(&self, update: &HeightUpdate) -> DVector<f64> {
        DVector::from_element(1, update.altitude)
    }

    fn predict(&self, state: &State) -> DVector<f64> {
        let x = state.vector();
        DVector::from_element(1, x[self.pz_idx] + self.reference_altitude + x[self.bias_idx])
    }

    fn jacobian(&self, state: &State) -> DMatrix<f64> {
        let mut h_jac = DMatrix::zeros(1, state.dim());
        h_jac[(0, self.pz_idx)] = 1.0;
        h_jac[(0, self.bias_idx)] = 1.0;
        h_jac
    }

    fn before_update(&mut self, state: &State, update: &HeightUpdate) -> bool {
        if self.outlier_threshold <= 0.0 {
            return true;
        }

        let y = update.altitude - self.predict(state)[0];
        let h_jac = self.jacobian(state);
        let r = update
            .covariance
            .as_ref()
            .unwrap_or(&self.noise_covariance);
        let s = (&h_jac * state.covariance() * h_jac.transpose())[(0, 0)] + r[(0, 0)];
        if s <= 0.0 {
            // No spread to normalize by; leave the decision to the filter.
            return true;
        }
        let normalized = y * y / s;

        if normalized > self.outlier_threshold {
            self.consecutive_outliers += 1;
            debug!(
                innovation = y,
                normalized,
                threshold = self.outlier_threshold,
                "height update rejected as outlier"
            );
            return false;
        }
        true
    }

    fn after_update(&mut self, _state: &State) {
        self.consecutive_outliers = 0;
    }

    fn parameters(&self) -> ParameterSet {
        ParameterSet::new()
            .with("stddev", diagonal_stddev(&self.noise_covariance))
            .with("bias_stddev", self.bias_stddev)
            .with("outlier_threshold", self.outlier_threshold)
    }

    fn set_parameter(&mut self, name: &str, value: &ParameterValue) -> Result<(), ParameterError> {
        match name {
            "stddev" => self.noise_covariance = stddev_from_parameter(name, 1, value)?,
            "bias_stddev" => self.bias_stddev = non_negative(name, value)?,
            "outlier_threshold" => self.outlier_threshold = non_negative(name, value)?,
            _ => return Err(ParameterError::Unknown(name.to_string())),
        }
        Ok(())
    }
}
