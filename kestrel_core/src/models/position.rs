// kestrel_core/src/models/position.rs

use nalgebra::{DMatrix, DVector, Vector3};

use crate::context::EstimatorContext;
use crate::error::{ModelError, ParameterError};
use crate::measurement::update::MeasurementUpdate;
use crate::models::{diagonal_covariance, diagonal_stddev, stddev_from_parameter, SensorModel};
use crate::parameters::{ParameterSet, ParameterValue};
use crate::state::{State, POSITION};
use crate::status::SystemStatus;

/// A GNSS position fix in the world (ENU) frame.
#[derive(Debug, Clone)]
pub struct PositionUpdate {
    pub position: Vector3<f64>,
    pub covariance: Option<DMatrix<f64>>,
}

impl PositionUpdate {
    pub fn new(position: Vector3<f64>) -> Self {
        Self {
            position,
            covariance: None,
        }
    }

    pub fn with_covariance(mut self, covariance: DMatrix<f64>) -> Self {
        self.covariance = Some(covariance);
        self
    }
}

impl MeasurementUpdate for PositionUpdate {
    fn covariance(&self) -> Option<&DMatrix<f64>> {
        self.covariance.as_ref()
    }
}

/// Direct observation of the world-frame position.
#[derive(Debug, Clone)]
pub struct PositionModel {
    // The R matrix for this sensor
    noise_covariance: DMatrix<f64>,
    indices: [usize; 3],
}

impl PositionModel {
    pub fn new(stddev: f64) -> Self {
        Self {
            noise_covariance: diagonal_covariance(&[stddev; 3]),
            indices: [0, 1, 2],
        }
    }
}

impl Default for PositionModel {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl SensorModel for PositionModel {
    type Update = PositionUpdate;

    fn kind(&self) -> &'static str {
        "position"
    }

    fn dimension(&self) -> usize {
        3
    }

    fn init(&mut self, _context: &EstimatorContext, state: &mut State) -> Result<(), ModelError> {
        for (slot, var) in self.indices.iter_mut().zip(POSITION.iter()) {
            *slot = state
                .find_idx(var)
                .ok_or(ModelError::MissingStateVariable {
                    model: "position",
                    variable: *var,
                })?;
        }
        Ok(())
    }

    fn applies_to_status(&self, status: SystemStatus) -> bool {
        !status.contains(SystemStatus::DEGRADED)
    }

    fn status_flags(&self) -> SystemStatus {
        SystemStatus::POSITION_XY | SystemStatus::POSITION_Z
    }

    fn noise_covariance(&self) -> &DMatrix<f64> {
        &self.noise_covariance
    }

    fn set_noise_covariance(&mut self, covariance: DMatrix<f64>) {
        self.noise_covariance = covariance;
    }

    fn measurement(&self, update: &PositionUpdate) -> DVector<f64> {
        DVector::from_row_slice(update.position.as_slice())
    }

    fn predict(&self, state: &State) -> DVector<f64> {
        DVector::from_iterator(3, self.indices.iter().map(|&i| state.vector()[i]))
    }

    fn jacobian(&self, state: &State) -> DMatrix<f64> {
        // The Jacobian H must be size (measurement_dims x state_dims) -> 3xN
        let mut h_jac = DMatrix::zeros(3, state.dim());
        for (row, &col) in self.indices.iter().enumerate() {
            h_jac[(row, col)] = 1.0;
        }
        h_jac
    }

    fn parameters(&self) -> ParameterSet {
        ParameterSet::new().with("stddev", diagonal_stddev(&self.noise_covariance))
    }

    fn set_parameter(&mut self, name: &str, value: &ParameterValue) -> Result<(), ParameterError> {
        match name {
            "stddev" => {
                self.noise_covariance = stddev_from_parameter(name, 3, value)?;
                Ok(())
            }
            _ => Err(ParameterError::Unknown(name.to_string())),
        }
    }
}
