// kestrel_sim/src/simulation/runner.rs

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::{debug, info, warn};

use kestrel_core::prelude::*;
use kestrel_core::state::layout::standard_ins_state_layout;
use kestrel_core::state::{ORIENTATION, POSITION};

use crate::config::{ScenarioConfig, SensorConfig, SensorSettings};
use crate::error::SimError;
use crate::simulation::prng::SimulationRng;
use crate::simulation::sensors::{SensorFeed, SimulatedSensor};
use crate::simulation::truth::Trajectory;

/// Running totals for one sensor over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorTotals {
    pub emitted: usize,
    pub applied: usize,
    pub rejected: usize,
    pub failed: usize,
    pub dropped: u64,
}

/// What a finished run reports.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub seed: u64,
    pub ticks: usize,
    pub duration: f64,
    pub state_dim: usize,
    pub sensors: BTreeMap<String, SensorTotals>,
    /// Sensors whose measurement failed to initialize.
    pub excluded: Vec<String>,
    /// Distance between the estimated and true position at the end of the run, in meters.
    pub position_error: f64,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "seed {}: {} ticks over {:.1} s, state dimension {}",
            self.seed, self.ticks, self.duration, self.state_dim
        )?;
        writeln!(
            f,
            "{:<16} {:>8} {:>8} {:>8} {:>8} {:>8}",
            "sensor", "emitted", "applied", "rejected", "failed", "dropped"
        )?;
        for (name, t) in &self.sensors {
            writeln!(
                f,
                "{:<16} {:>8} {:>8} {:>8} {:>8} {:>8}",
                name, t.emitted, t.applied, t.rejected, t.failed, t.dropped
            )?;
        }
        for name in &self.excluded {
            writeln!(f, "{name:<16} excluded (failed to initialize)")?;
        }
        write!(f, "final position error: {:.3} m", self.position_error)
    }
}

/// Drives the estimator against a synthetic trajectory.
///
/// Each tick predicts the filter forward, lets every simulated sensor emit
/// its due readings into its measurement's queue, then processes all
/// measurements under the current system status.
pub struct Simulation {
    config: ScenarioConfig,
    seed: u64,
    trajectory: Trajectory,
    state: State,
    filter: ExtendedKalmanFilter,
    measurements: Measurements,
    sensors: Vec<SimulatedSensor>,
    excluded: Vec<String>,
    totals: BTreeMap<String, SensorTotals>,
    timed_out: BTreeSet<String>,
    time: f64,
    ticks: usize,
}

impl Simulation {
    pub fn new(config: ScenarioConfig) -> Result<Self, SimError> {
        config.validate()?;

        let mut rng = SimulationRng::new(config.simulation.seed);
        let mut state = State::new(
            standard_ins_state_layout(),
            config.filter.initial_covariance,
            0.0,
        );
        let filter = build_filter(&config);

        let mut measurements = Measurements::new();
        let mut sensors = Vec::with_capacity(config.sensors.len());
        for sensor_config in &config.sensors {
            let settings = sensor_config.settings();
            info!(
                "  -> Creating {} sensor '{}'",
                sensor_config.get_kind_str(),
                settings.name
            );
            let (measurement, feed) = build_measurement(sensor_config)?;
            measurements.insert(measurement)?;
            sensors.push(SimulatedSensor::new(settings, feed, rng.fork())?);
        }

        let excluded: Vec<String> = measurements
            .init_all(&config.context, &mut state)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        // Nothing would ever drain an excluded sensor's queue.
        sensors.retain(|s| !excluded.iter().any(|name| name == s.name()));

        let totals = sensors
            .iter()
            .map(|s| (s.name().to_string(), SensorTotals::default()))
            .collect();

        info!(
            seed = rng.seed(),
            sensors = sensors.len(),
            state_dim = state.dim(),
            "simulation ready"
        );

        Ok(Self {
            trajectory: Trajectory::new(config.trajectory.clone()),
            seed: rng.seed(),
            config,
            state,
            filter,
            measurements,
            sensors,
            excluded,
            totals,
            timed_out: BTreeSet::new(),
            time: 0.0,
            ticks: 0,
        })
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn measurements(&self) -> &Measurements {
        &self.measurements
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// The status the estimator reports before sensor contributions are added.
    ///
    /// Roll and pitch are assumed to come from an inertial unit outside the
    /// simulation, so they are available as soon as alignment ends.
    pub fn base_status(&self, time: f64) -> SystemStatus {
        let sim = &self.config.simulation;
        let mut status = if time < sim.alignment_seconds {
            SystemStatus::ALIGNMENT
        } else {
            SystemStatus::READY | SystemStatus::ROLLPITCH
        };
        if sim.degraded.iter().any(|w| w.contains(time)) {
            status |= SystemStatus::DEGRADED;
        }
        status
    }

    /// Advances the simulation by one tick.
    pub fn step(&mut self) -> Result<(), SimError> {
        let dt = 1.0 / self.config.simulation.tick_rate;
        self.time += dt;
        self.ticks += 1;

        self.filter.predict(&mut self.state, dt)?;

        let truth = self.trajectory.sample(self.time);
        for sensor in self.sensors.iter_mut() {
            let emitted = sensor.tick(&truth, &self.config.context);
            if let Some(t) = self.totals.get_mut(sensor.name()) {
                t.emitted += emitted;
            }
        }

        let base = self.base_status(self.time);
        let status = base | self.measurements.status_flags(base);
        let tick = Tick::new(dt, status);

        for (name, summary) in self
            .measurements
            .process_all(&mut self.filter, &mut self.state, tick)
        {
            if let Some(t) = self.totals.get_mut(&name) {
                t.applied += summary.applied;
                t.rejected += summary.rejected;
                t.failed += summary.failed();
            }
        }

        self.track_timeouts();
        Ok(())
    }

    fn track_timeouts(&mut self) {
        let now: BTreeSet<String> = self
            .measurements
            .timed_out()
            .into_iter()
            .map(str::to_string)
            .collect();
        for name in now.difference(&self.timed_out) {
            warn!(sensor = %name, time = self.time, "sensor timed out");
        }
        for name in self.timed_out.difference(&now) {
            info!(sensor = %name, time = self.time, "sensor recovered");
        }
        self.timed_out = now;
    }

    /// Runs to the configured duration and tears the measurements down.
    pub fn run(mut self) -> Result<RunSummary, SimError> {
        let duration = self.config.simulation.duration_seconds;
        let dt = 1.0 / self.config.simulation.tick_rate;
        info!(duration, tick_rate = self.config.simulation.tick_rate, "starting simulation");

        let mut next_report = 1.0;
        while self.time + 0.5 * dt < duration {
            self.step()?;
            if self.time >= next_report {
                next_report += 1.0;
                debug!(
                    time = self.time,
                    status = %self.base_status(self.time),
                    position = ?self.state.position().map(|p| [p.x, p.y, p.z]),
                    "progress"
                );
            }
        }

        let truth = self.trajectory.sample(self.time);
        let position_error = self
            .state
            .position()
            .map_or(f64::NAN, |p| (p - truth.position).norm());

        for (name, t) in self.totals.iter_mut() {
            t.dropped = self.measurements.get(name).map_or(0, |m| m.dropped());
        }
        self.measurements.cleanup_all();

        info!(ticks = self.ticks, position_error, "simulation finished");
        Ok(RunSummary {
            seed: self.seed,
            ticks: self.ticks,
            duration: self.time,
            state_dim: self.state.dim(),
            sensors: self.totals,
            excluded: self.excluded,
            position_error,
        })
    }
}

fn build_filter(config: &ScenarioConfig) -> ExtendedKalmanFilter {
    let f = &config.filter;
    let mut filter = ExtendedKalmanFilter::new(f.process_noise_density);
    for var in POSITION {
        filter = filter.with_density(var, f.position_noise_density);
    }
    for var in ORIENTATION {
        filter = filter.with_density(var, f.orientation_noise_density);
    }
    filter
}

/// Creates the measurement for one configured sensor along with the feed the
/// simulated sensor writes into.
fn build_measurement(
    config: &SensorConfig,
) -> Result<(Box<dyn AnyMeasurement>, SensorFeed), SimError> {
    let settings = config.settings();
    match config {
        SensorConfig::Position(_) => {
            let m = configured(settings, PositionModel::new(settings.noise_stddev))?;
            let feed = SensorFeed::Position(m.sender());
            Ok((Box::new(m), feed))
        }
        SensorConfig::Height(_) => {
            let m = configured(settings, HeightModel::new(settings.noise_stddev))?;
            let feed = SensorFeed::Height(m.sender());
            Ok((Box::new(m), feed))
        }
        SensorConfig::Magnetometer(_) => {
            let m = configured(settings, MagnetometerModel::new(settings.noise_stddev))?;
            let feed = SensorFeed::Magnetometer(m.sender());
            Ok((Box::new(m), feed))
        }
    }
}

fn configured<M: SensorModel>(settings: &SensorSettings, model: M) -> Result<Measurement<M>, SimError> {
    let mut measurement = Measurement::new(&settings.name, model)
        .with_min_interval(settings.min_interval)
        .with_timeout(settings.timeout);
    measurement
        .configure(&settings.parameters)
        .map_err(|source| SimError::Parameter {
            name: settings.name.clone(),
            source,
        })?;
    Ok(measurement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SensorSettings, Window};

    fn sensor(name: &str, rate: f64, noise_stddev: f64) -> SensorSettings {
        SensorSettings {
            name: name.into(),
            rate,
            noise_stddev,
            bias: 0.0,
            min_interval: 0.0,
            timeout: 0.0,
            dropouts: Vec::new(),
            parameters: ParameterSet::new(),
        }
    }

    fn scenario() -> ScenarioConfig {
        let mut config = ScenarioConfig::default();
        config.simulation.seed = Some(3);
        config.simulation.duration_seconds = 10.0;
        config.simulation.tick_rate = 20.0;
        config.simulation.alignment_seconds = 1.0;
        config.sensors = vec![
            SensorConfig::Position(sensor("gps", 5.0, 0.5)),
            SensorConfig::Height(sensor("baro", 10.0, 0.2)),
            SensorConfig::Magnetometer(sensor("mag", 10.0, 0.005)),
        ];
        config
    }

    #[test]
    fn converges_on_the_trajectory() {
        let summary = Simulation::new(scenario())
            .expect("valid scenario")
            .run()
            .expect("run completes");

        assert_eq!(summary.ticks, 200);
        assert_eq!(summary.state_dim, 17);
        assert!(summary.excluded.is_empty());
        let gps = &summary.sensors["gps"];
        assert_eq!(gps.emitted, 50);
        assert_eq!(gps.applied + gps.rejected + gps.failed, gps.emitted);
        assert!(summary.position_error < 2.0, "error {}", summary.position_error);
    }

    #[test]
    fn same_seed_same_result() {
        let a = Simulation::new(scenario()).and_then(Simulation::run).expect("run a");
        let b = Simulation::new(scenario()).and_then(Simulation::run).expect("run b");
        assert_eq!(a.sensors, b.sensors);
        assert_eq!(a.position_error, b.position_error);
    }

    #[test]
    fn degraded_window_holds_back_position_fixes() {
        let mut config = scenario();
        config.simulation.degraded = vec![Window { start: 0.0, end: 100.0 }];
        let summary = Simulation::new(config)
            .and_then(Simulation::run)
            .expect("run completes");

        let gps = &summary.sensors["gps"];
        assert_eq!(gps.applied, 0);
        assert_eq!(gps.rejected, gps.emitted);
        assert!(summary.sensors["baro"].applied > 0);
    }

    #[test]
    fn status_during_alignment() {
        let sim = Simulation::new(scenario()).expect("valid scenario");
        assert_eq!(sim.base_status(0.5), SystemStatus::ALIGNMENT);
        assert!(sim.base_status(1.5).contains(SystemStatus::ROLLPITCH));
    }

    #[test]
    fn bad_parameter_names_the_sensor() {
        let mut config = scenario();
        let mut gps = sensor("gps", 5.0, 0.5);
        gps.parameters.insert("bogus", 1.0);
        config.sensors = vec![SensorConfig::Position(gps)];

        let err = Simulation::new(config).err().expect("unknown parameter");
        assert!(matches!(err, SimError::Parameter { ref name, .. } if name == "gps"));
    }
}
