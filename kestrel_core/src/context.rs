// kestrel_core/src/context.rs

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Estimator-wide constants that sensor models may need when they bind to the filter.
///
/// The context is created once by whoever wires the estimator together and is
/// passed to every `Measurement::init`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EstimatorContext {
    /// Altitude above mean sea level of the world frame origin, in meters.
    pub reference_altitude: f64,
    /// The reference magnetic field in the world (ENU) frame, in Gauss.
    pub magnetic_field: [f64; 3],
}

impl EstimatorContext {
    pub fn magnetic_field(&self) -> Vector3<f64> {
        Vector3::from(self.magnetic_field)
    }
}

impl Default for EstimatorContext {
    fn default() -> Self {
        Self {
            reference_altitude: 0.0,
            // Roughly central Europe, in Gauss: pointing north and down.
            magnetic_field: [0.0, 0.21, -0.43],
        }
    }
}
