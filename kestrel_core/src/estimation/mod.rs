// kestrel_core/src/estimation/mod.rs

use nalgebra::{DMatrix, DVector};

use crate::error::FilterError;
use crate::state::State;

/// Everything a filter needs to fuse one observation.
///
/// Built by a `Measurement` from its sensor model and the payload being processed.
#[derive(Debug, Clone)]
pub struct Correction<'a> {
    /// Name of the measurement that produced this correction (for diagnostics).
    pub source: &'a str,
    /// The innovation `y = z - h(x)`.
    pub innovation: DVector<f64>,
    /// The measurement Jacobian `H = ∂h/∂x`, `m x n`.
    pub jacobian: DMatrix<f64>,
    /// The measurement noise covariance `R`, `m x m`.
    pub covariance: &'a DMatrix<f64>,
}

impl Correction<'_> {
    pub fn dimension(&self) -> usize {
        self.innovation.nrows()
    }
}

/// The contract for the arithmetic half of the estimator.
///
/// The correction step is the only place where the shared `State` is mutated by
/// the measurement pipeline. A failed correction must leave the state untouched.
pub trait Filter: Send {
    fn correct(&mut self, state: &mut State, correction: &Correction<'_>) -> Result<(), FilterError>;
}

pub mod ekf;
