// kestrel_sim/src/simulation/truth.rs

use nalgebra::{UnitQuaternion, Vector3};
use std::f64::consts::FRAC_PI_2;

use crate::config::TrajectoryConfig;

/// Where the vehicle really is at one instant.
#[derive(Debug, Clone, Copy)]
pub struct TruthSample {
    pub time: f64,
    /// World (ENU) position in meters.
    pub position: Vector3<f64>,
    /// Body-to-world rotation.
    pub orientation: UnitQuaternion<f64>,
}

/// The ground-truth motion the simulated sensors observe.
#[derive(Debug, Clone)]
pub struct Trajectory {
    config: TrajectoryConfig,
}

impl Trajectory {
    pub fn new(config: TrajectoryConfig) -> Self {
        Self { config }
    }

    pub fn sample(&self, time: f64) -> TruthSample {
        let c = &self.config;
        let theta = c.angular_rate * time;
        let position = Vector3::new(
            c.radius * theta.cos(),
            c.radius * theta.sin(),
            c.altitude + c.climb_rate * time,
        );

        // Tangent to the circle, in the direction of travel.
        let heading = if c.angular_rate >= 0.0 {
            theta + FRAC_PI_2
        } else {
            theta - FRAC_PI_2
        };

        TruthSample {
            time,
            position,
            orientation: UnitQuaternion::from_euler_angles(0.0, 0.0, heading),
        }
    }
}
