// kestrel_core/src/state.rs

use nalgebra::{DMatrix, DVector, Quaternion, UnitQuaternion, Vector3};

use crate::error::StateError;

pub mod layout;

/// An enum that defines every variable that can exist in the estimator's state vector.
///
/// Positions and velocities are expressed in the world (ENU) frame, biases in the
/// body frame. The quaternion rotates body-frame vectors into the world frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateVariable {
    // --- Cartesian Position ---
    Px,
    Py,
    Pz,
    // --- Cartesian Velocity ---
    Vx,
    Vy,
    Vz,
    // --- Orientation (as a quaternion, stored x, y, z, w) ---
    Qx,
    Qy,
    Qz,
    Qw,
    // --- Accelerometer Bias ---
    AccelBiasX,
    AccelBiasY,
    AccelBiasZ,
    // --- Gyroscope Bias ---
    GyroBiasX,
    GyroBiasY,
    GyroBiasZ,
    // --- Barometric altitude offset ---
    BaroBias,
}

pub const POSITION: [StateVariable; 3] = [StateVariable::Px, StateVariable::Py, StateVariable::Pz];
pub const ORIENTATION: [StateVariable; 4] = [
    StateVariable::Qx,
    StateVariable::Qy,
    StateVariable::Qz,
    StateVariable::Qw,
];

/// The estimator state used by filters. It bundles the state vector with its
/// schema (the layout), covariance, and timestamp.
///
/// Apart from variable registration during
/// model initialization, the only way to change the numbers is through
/// [`State::apply_correction`] and [`State::apply_prediction`], which a `Filter`
/// calls from its correction and prediction entry points.
#[derive(Debug, Clone)]
pub struct State {
    layout: Vec<StateVariable>,
    vector: DVector<f64>,
    covariance: DMatrix<f64>,
    timestamp: f64,
}

impl State {
    /// Creates a new state with a given layout, initializing the vector to zero
    /// (with a valid identity quaternion) and the covariance to a scaled identity matrix.
    pub fn new(layout: Vec<StateVariable>, initial_covariance_val: f64, timestamp: f64) -> Self {
        let dim = layout.len();
        let mut vector = DVector::zeros(dim);

        // An all-zero quaternion is not a rotation; start from identity instead.
        if let Some(qw) = layout.iter().position(|v| *v == StateVariable::Qw) {
            vector[qw] = 1.0;
        }

        Self {
            layout,
            vector,
            covariance: DMatrix::identity(dim, dim) * initial_covariance_val,
            timestamp,
        }
    }

    /// Replaces the state vector, keeping the layout. Used when seeding a filter
    /// from a known initial condition.
    pub fn with_vector(mut self, vector: DVector<f64>) -> Result<Self, StateError> {
        if vector.nrows() != self.dim() {
            return Err(StateError::DimensionMismatch {
                expected: self.dim(),
                found: vector.nrows(),
            });
        }
        self.vector = vector;
        Ok(self)
    }

    /// Returns the dimension (number of rows) of the state vector.
    pub fn dim(&self) -> usize {
        self.layout.len()
    }

    pub fn layout(&self) -> &[StateVariable] {
        &self.layout
    }

    pub fn vector(&self) -> &DVector<f64> {
        &self.vector
    }

    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Finds the index of a specific `StateVariable` in the layout.
    pub fn find_idx(&self, var: &StateVariable) -> Option<usize> {
        self.layout.iter().position(|v| v == var)
    }

    pub fn contains(&self, var: &StateVariable) -> bool {
        self.find_idx(var).is_some()
    }

    pub fn get(&self, var: &StateVariable) -> Option<f64> {
        self.find_idx(var).map(|i| self.vector[i])
    }

    /// Reads three variables as a vector, in the order given.
    pub fn get_vector3(&self, vars: &[StateVariable; 3]) -> Option<Vector3<f64>> {
        Some(Vector3::new(
            self.get(&vars[0])?,
            self.get(&vars[1])?,
            self.get(&vars[2])?,
        ))
    }

    pub fn position(&self) -> Option<Vector3<f64>> {
        self.get_vector3(&POSITION)
    }

    /// The body-to-world orientation, if the layout carries a quaternion.
    pub fn orientation(&self) -> Option<UnitQuaternion<f64>> {
        let x = self.get(&StateVariable::Qx)?;
        let y = self.get(&StateVariable::Qy)?;
        let z = self.get(&StateVariable::Qz)?;
        let w = self.get(&StateVariable::Qw)?;
        Some(UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z)))
    }

    /// Appends `var` to the layout if it is not there yet and returns its index.
    ///
    /// The new row/column of the covariance is zero except for `variance` on the
    /// diagonal, so existing correlations are preserved.
    pub fn register_variable(&mut self, var: StateVariable, value: f64, variance: f64) -> usize {
        if let Some(idx) = self.find_idx(&var) {
            return idx;
        }

        let idx = self.dim();
        self.layout.push(var);
        self.vector = self.vector.clone().insert_row(idx, value);
        self.covariance = self
            .covariance
            .clone()
            .insert_row(idx, 0.0)
            .insert_column(idx, 0.0);
        self.covariance[(idx, idx)] = variance;
        idx
    }

    /// Adds `dx` to the state vector and replaces the covariance.
    ///
    /// Nothing is written unless both inputs have the right shape and are finite.
    /// The quaternion block, if present, is re-normalized afterwards.
    pub fn apply_correction(
        &mut self,
        dx: &DVector<f64>,
        covariance: DMatrix<f64>,
    ) -> Result<(), StateError> {
        self.check_covariance(&covariance)?;
        if dx.nrows() != self.dim() {
            return Err(StateError::DimensionMismatch {
                expected: self.dim(),
                found: dx.nrows(),
            });
        }
        if dx.iter().any(|v| !v.is_finite()) {
            return Err(StateError::NonFinite);
        }

        self.vector += dx;
        self.covariance = covariance;
        self.normalize_orientation();
        Ok(())
    }

    /// Replaces the covariance and advances the timestamp by `dt`.
    pub fn apply_prediction(&mut self, covariance: DMatrix<f64>, dt: f64) -> Result<(), StateError> {
        self.check_covariance(&covariance)?;
        self.covariance = covariance;
        self.timestamp += dt;
        Ok(())
    }

    fn check_covariance(&self, covariance: &DMatrix<f64>) -> Result<(), StateError> {
        if covariance.nrows() != self.dim() || covariance.ncols() != self.dim() {
            return Err(StateError::DimensionMismatch {
                expected: self.dim(),
                found: covariance.nrows().max(covariance.ncols()),
            });
        }
        if covariance.iter().any(|v| !v.is_finite()) {
            return Err(StateError::NonFinite);
        }
        Ok(())
    }

    fn normalize_orientation(&mut self) {
        let indices: Option<Vec<usize>> = ORIENTATION.iter().map(|v| self.find_idx(v)).collect();
        let Some(indices) = indices else {
            return;
        };

        let norm = indices
            .iter()
            .map(|&i| self.vector[i] * self.vector[i])
            .sum::<f64>()
            .sqrt();
        if norm > 1e-9 {
            for &i in &indices {
                self.vector[i] /= norm;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn position_state() -> State {
        State::new(POSITION.to_vec(), 1.0, 0.0)
    }

    #[test]
    fn new_state_starts_from_identity_orientation() {
        let state = State::new(layout::standard_ins_state_layout(), 1.0, 0.0);
        let q = state.orientation().expect("layout has a quaternion");
        assert_abs_diff_eq!(q.angle(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn register_variable_grows_state_once() {
        let mut state = position_state();
        let idx = state.register_variable(StateVariable::BaroBias, 0.5, 4.0);
        assert_eq!(idx, 3);
        assert_eq!(state.dim(), 4);
        assert_eq!(state.covariance().shape(), (4, 4));
        assert_abs_diff_eq!(state.covariance()[(3, 3)], 4.0);
        assert_abs_diff_eq!(state.covariance()[(0, 3)], 0.0);
        assert_abs_diff_eq!(state.get(&StateVariable::BaroBias).unwrap_or_default(), 0.5);

        assert_eq!(state.register_variable(StateVariable::BaroBias, 9.0, 9.0), 3);
        assert_eq!(state.dim(), 4);
    }

    #[test]
    fn apply_correction_rejects_bad_shapes_without_writing() {
        let mut state = position_state();
        let before = state.clone();

        let result = state.apply_correction(&DVector::zeros(2), DMatrix::identity(3, 3));
        assert!(matches!(result, Err(StateError::DimensionMismatch { .. })));

        let nan = DVector::from_vec(vec![f64::NAN, 0.0, 0.0]);
        assert_eq!(
            state.apply_correction(&nan, DMatrix::identity(3, 3)),
            Err(StateError::NonFinite)
        );

        assert_eq!(state.vector(), before.vector());
        assert_eq!(state.covariance(), before.covariance());
    }

    #[test]
    fn apply_correction_renormalizes_quaternion() {
        let mut state = State::new(ORIENTATION.to_vec(), 1.0, 0.0);
        let dx = DVector::from_vec(vec![0.0, 0.0, 1.0, 0.0]);
        state
            .apply_correction(&dx, DMatrix::identity(4, 4))
            .expect("shapes match");
        let norm = state.vector().norm();
        assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-12);
    }
}
