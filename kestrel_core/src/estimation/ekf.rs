// kestrel_core/src/estimation/ekf.rs

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};
use tracing::trace;

use crate::error::FilterError;
use crate::estimation::{Correction, Filter};
use crate::state::{State, StateVariable};

/// A concrete implementation of an Extended Kalman Filter correction step.
///
/// Prediction is a random walk: the state vector is left as-is and the
/// covariance grows by `Q * dt`, where `Q` is diagonal and built from a
/// per-variable noise density. Variables registered later by sensor models
/// pick up the default density.
#[derive(Debug, Clone)]
pub struct ExtendedKalmanFilter {
    default_density: f64,
    densities: HashMap<StateVariable, f64>,
}

impl ExtendedKalmanFilter {
    pub fn new(default_density: f64) -> Self {
        Self {
            default_density,
            densities: HashMap::new(),
        }
    }

    /// Overrides the process noise density of one state variable.
    pub fn with_density(mut self, var: StateVariable, density: f64) -> Self {
        self.densities.insert(var, density);
        self
    }

    /// Builds the diagonal process noise matrix `Q` for the current layout.
    pub fn process_noise(&self, state: &State) -> DMatrix<f64> {
        let diagonal = DVector::from_iterator(
            state.dim(),
            state
                .layout()
                .iter()
                .map(|var| *self.densities.get(var).unwrap_or(&self.default_density)),
        );
        DMatrix::from_diagonal(&diagonal)
    }

    /// Advances the state in time: `P_k+1 = P_k + Q * dt`.
    pub fn predict(&self, state: &mut State, dt: f64) -> Result<(), FilterError> {
        if dt <= 0.0 {
            return Ok(());
        }
        let p_pred = state.covariance() + self.process_noise(state) * dt;
        state.apply_prediction(p_pred, dt)?;
        Ok(())
    }
}

impl Default for ExtendedKalmanFilter {
    fn default() -> Self {
        Self::new(1e-3)
    }
}

impl Filter for ExtendedKalmanFilter {
    fn correct(&mut self, state: &mut State, correction: &Correction<'_>) -> Result<(), FilterError> {
        let n = state.dim();
        let m = correction.dimension();
        let h_jac = &correction.jacobian;
        let r_mat = correction.covariance;

        check_shape("jacobian", (m, n), h_jac.shape())?;
        check_shape("noise covariance", (m, m), r_mat.shape())?;

        // --- Standard EKF Update Equations ---
        let p = state.covariance();
        let s = h_jac * p * h_jac.transpose() + r_mat;
        let s_inv = s
            .try_inverse()
            .ok_or(FilterError::SingularInnovationCovariance)?;

        let k_gain = p * h_jac.transpose() * s_inv;
        let dx = &k_gain * &correction.innovation;

        let i_kh = DMatrix::<f64>::identity(n, n) - &k_gain * h_jac;
        let p_new = i_kh * p;
        // Tiny numerical errors can make P slightly non-symmetric. This forces it.
        let p_new = (&p_new + p_new.transpose()) * 0.5;

        trace!(
            source = correction.source,
            innovation = ?correction.innovation.as_slice(),
            "applying EKF correction"
        );

        state.apply_correction(&dx, p_new)?;
        Ok(())
    }
}

fn check_shape(
    what: &'static str,
    expected: (usize, usize),
    found: (usize, usize),
) -> Result<(), FilterError> {
    if expected != found {
        return Err(FilterError::DimensionMismatch {
            what,
            expected,
            found,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::POSITION;
    use approx::assert_abs_diff_eq;

    fn position_correction(r: &DMatrix<f64>, y: [f64; 3]) -> Correction<'_> {
        Correction {
            source: "test",
            innovation: DVector::from_row_slice(&y),
            jacobian: DMatrix::identity(3, 3),
            covariance: r,
        }
    }

    #[test]
    fn equal_uncertainty_splits_the_innovation() {
        let mut state = State::new(POSITION.to_vec(), 1.0, 0.0);
        let r = DMatrix::identity(3, 3);
        let mut ekf = ExtendedKalmanFilter::default();

        ekf.correct(&mut state, &position_correction(&r, [2.0, -4.0, 0.0]))
            .expect("well-posed correction");

        assert_abs_diff_eq!(state.vector()[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(state.vector()[1], -2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(state.covariance()[(0, 0)], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn singular_innovation_covariance_leaves_state_untouched() {
        let mut state = State::new(POSITION.to_vec(), 0.0, 0.0);
        let r = DMatrix::zeros(3, 3);
        let mut ekf = ExtendedKalmanFilter::default();

        let result = ekf.correct(&mut state, &position_correction(&r, [1.0, 1.0, 1.0]));

        assert_eq!(result, Err(FilterError::SingularInnovationCovariance));
        assert_eq!(state.vector(), &DVector::zeros(3));
    }

    #[test]
    fn mismatched_jacobian_is_rejected() {
        let mut state = State::new(POSITION.to_vec(), 1.0, 0.0);
        let r = DMatrix::identity(1, 1);
        let correction = Correction {
            source: "test",
            innovation: DVector::from_element(1, 1.0),
            jacobian: DMatrix::zeros(1, 2),
            covariance: &r,
        };

        let result = ExtendedKalmanFilter::default().correct(&mut state, &correction);
        assert!(matches!(
            result,
            Err(FilterError::DimensionMismatch { what: "jacobian", .. })
        ));
    }

    #[test]
    fn predict_grows_covariance_and_time() {
        let mut state = State::new(POSITION.to_vec(), 1.0, 0.0);
        let ekf = ExtendedKalmanFilter::new(0.1).with_density(StateVariable::Pz, 1.0);

        ekf.predict(&mut state, 0.5).expect("prediction");

        assert_abs_diff_eq!(state.covariance()[(0, 0)], 1.05, epsilon = 1e-12);
        assert_abs_diff_eq!(state.covariance()[(2, 2)], 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(state.timestamp(), 0.5, epsilon = 1e-12);
    }
}
