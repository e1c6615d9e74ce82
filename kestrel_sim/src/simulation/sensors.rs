// kestrel_sim/src/simulation/sensors.rs

use nalgebra::Vector3;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use tracing::trace;

use kestrel_core::prelude::{
    EstimatorContext, HeightUpdate, MagneticUpdate, PositionUpdate, UpdateSender,
};

use crate::config::{SensorSettings, Window};
use crate::error::SimError;
use crate::simulation::truth::TruthSample;

/// Where a simulated sensor delivers its readings: the producer handle of the
/// matching `Measurement`.
pub enum SensorFeed {
    Position(UpdateSender<PositionUpdate>),
    Height(UpdateSender<HeightUpdate>),
    Magnetometer(UpdateSender<MagneticUpdate>),
}

/// Samples the ground truth at a fixed rate and adds Gaussian noise.
pub struct SimulatedSensor {
    name: String,
    period: f64,
    next_sample: f64,
    bias: f64,
    dropouts: Vec<Window>,
    // Store the noise distribution for efficiency
    noise_dist: Normal<f64>,
    rng: ChaCha8Rng,
    feed: SensorFeed,
}

impl SimulatedSensor {
    pub fn new(settings: &SensorSettings, feed: SensorFeed, rng: ChaCha8Rng) -> Result<Self, SimError> {
        let noise_dist = Normal::new(0.0, settings.noise_stddev).map_err(|e| {
            SimError::InvalidScenario(format!("sensor '{}': {}", settings.name, e))
        })?;
        let period = 1.0 / settings.rate;
        Ok(Self {
            name: settings.name.clone(),
            period,
            next_sample: period,
            bias: settings.bias,
            dropouts: settings.dropouts.clone(),
            noise_dist,
            rng,
            feed,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Emits every reading that fell due up to `truth.time` and returns how
    /// many were sent. A sensor faster than the tick rate sends several
    /// readings per tick, all taken from the same truth sample.
    pub fn tick(&mut self, truth: &TruthSample, context: &EstimatorContext) -> usize {
        let mut emitted = 0;
        while self.next_sample <= truth.time + 1e-9 {
            let due = self.next_sample;
            self.next_sample += self.period;

            if self.dropouts.iter().any(|w| w.contains(due)) {
                trace!(sensor = %self.name, time = due, "sensor in dropout");
                continue;
            }
            self.emit(truth, context);
            emitted += 1;
        }
        emitted
    }

    fn emit(&mut self, truth: &TruthSample, context: &EstimatorContext) {
        let noise = self.noise_vector();
        match &self.feed {
            SensorFeed::Position(tx) => {
                let reading = truth.position + noise.add_scalar(self.bias);
                tx.send(PositionUpdate::new(reading));
            }
            SensorFeed::Height(tx) => {
                let altitude = truth.position.z + context.reference_altitude + self.bias + noise.x;
                tx.send(HeightUpdate::new(altitude));
            }
            SensorFeed::Magnetometer(tx) => {
                // The true world field, seen from the body frame.
                let field = truth.orientation.inverse() * context.magnetic_field();
                tx.send(MagneticUpdate::new(field + noise.add_scalar(self.bias)));
            }
        }
    }

    fn noise_vector(&mut self) -> Vector3<f64> {
        Vector3::from_fn(|_, _| self.noise_dist.sample(&mut self.rng))
    }
}
