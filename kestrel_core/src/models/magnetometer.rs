use nalgebra::{DMatrix, DVector, Quaternion, UnitQuaternion, Vector3};

use crate::{
    context::EstimatorContext,
    error::{ModelError, ParameterError},
    measurement::update::MeasurementUpdate,
    models::{diagonal_covariance, diagonal_stddev, stddev_from_parameter, SensorModel},
    parameters::{ParameterSet, ParameterValue},
    state::{State, ORIENTATION},
    status::SystemStatus,
};

/// A 3-axis magnetometer reading in the body frame, in Gauss.
#[derive(Debug, Clone)]
pub struct MagneticUpdate {
    pub field: Vector3<f64>,
    pub covariance: Option<DMatrix<f64>>,
}

impl MagneticUpdate {
    pub fn new(field: Vector3<f64>) -> Self {
        Self {
            field,
            covariance: None,
        }
    }

    pub fn with_covariance(mut self, covariance: DMatrix<f64>) -> Self {
        self.covariance = Some(covariance);
        self
    }
}

impl MeasurementUpdate for MagneticUpdate {
    fn covariance(&self) -> Option<&DMatrix<f64>> {
        self.covariance.as_ref()
    }
}

/// A measurement model for a 3-axis magnetometer.
///
/// This model relates a measured magnetic field vector to the filter's
/// orientation state, providing an absolute heading reference.
#[derive(Debug, Clone)]
pub struct MagnetometerModel {
    /// The 3x3 measurement noise covariance matrix, R.
    noise_covariance: DMatrix<f64>,
    /// The "true" magnetic field vector in the world (ENU) frame, taken from
    /// the estimator context at init.
    world_magnetic_field: Vector3<f64>,
    /// Indices of Qx, Qy, Qz, Qw in the state vector.
    q_indices: [usize; 4],
}

impl MagnetometerModel {
    pub fn new(stddev: f64) -> Self {
        Self {
            noise_covariance: diagonal_covariance(&[stddev; 3]),
            world_magnetic_field: EstimatorContext::default().magnetic_field(),
            q_indices: [0, 1, 2, 3],
        }
    }

    /// Rotates the world field into the body frame for the orientation stored in `x`.
    fn field_in_body(&self, x: &DVector<f64>) -> Vector3<f64> {
        let [ix, iy, iz, iw] = self.q_indices;
        let q = Quaternion::new(x[iw], x[ix], x[iy], x[iz]);
        if q.norm() < 1e-9 {
            return self.world_magnetic_field;
        }
        let orientation_body_to_world = UnitQuaternion::from_quaternion(q);
        orientation_body_to_world.inverse() * self.world_magnetic_field
    }
}

impl Default for MagnetometerModel {
    fn default() -> Self {
        Self::new(0.01)
    }
}

impl SensorModel for MagnetometerModel {
    type Update = MagneticUpdate;

    fn kind(&self) -> &'static str {
        "magnetometer"
    }

    fn dimension(&self) -> usize {
        3
    }

    fn init(&mut self, context: &EstimatorContext, state: &mut State) -> Result<(), ModelError> {
        for (slot, var) in self.q_indices.iter_mut().zip(ORIENTATION.iter()) {
            *slot = state
                .find_idx(var)
                .ok_or(ModelError::MissingStateVariable {
                    model: "magnetometer",
                    variable: *var,
                })?;
        }
        self.world_magnetic_field = context.magnetic_field();
        Ok(())
    }

    /// Heading from a magnetometer is only meaningful once roll and pitch are known.
    fn applies_to_status(&self, status: SystemStatus) -> bool {
        status.contains(SystemStatus::ROLLPITCH)
    }

    fn status_flags(&self) -> SystemStatus {
        SystemStatus::YAW
    }

    fn noise_covariance(&self) -> &DMatrix<f64> {
        &self.noise_covariance
    }

    fn set_noise_covariance(&mut self, covariance: DMatrix<f64>) {
        self.noise_covariance = covariance;
    }

    fn measurement(&self, update: &MagneticUpdate) -> DVector<f64> {
        DVector::from_row_slice(update.field.as_slice())
    }

    fn predict(&self, state: &State) -> DVector<f64> {
        // Predict what the magnetometer should see by taking the true world
        // magnetic field and rotating it into the robot's body frame.
        DVector::from_row_slice(self.field_in_body(state.vector()).as_slice())
    }

    /// Numerical Jacobian over the quaternion block; every other column is zero.
    fn jacobian(&self, state: &State) -> DMatrix<f64> {
        let mut h_jac = DMatrix::zeros(3, state.dim());
        let epsilon = 1e-8;
        let z_base = self.field_in_body(state.vector());

        for &j in &self.q_indices {
            let mut perturbed = state.vector().clone();
            perturbed[j] += epsilon;
            // `field_in_body` re-normalizes the perturbed quaternion.
            let derivative_column = (self.field_in_body(&perturbed) - z_base) / epsilon;
            h_jac.column_mut(j).copy_from(&derivative_column);
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
