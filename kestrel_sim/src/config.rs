// kestrel_sim/src/config.rs

//! Loading and validating scenario configuration.
//!
//! A scenario is a TOML file layered with `KESTREL_`-prefixed environment
//! variables (nested keys separated by `__`, e.g.
//! `KESTREL_SIMULATION__DURATION_SECONDS=30`), then with command-line overrides.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use kestrel_core::prelude::{EstimatorContext, ParameterSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use crate::error::SimError;

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// The root of the data parsed from a `scenario.toml` file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct ScenarioConfig {
    #[serde(default)] // Use default if the [simulation] section is missing
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub context: EstimatorContext,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub trajectory: TrajectoryConfig,

    // The TOML has `[[sensors]]`, which becomes a Vec of SensorConfig.
    #[serde(default)]
    pub sensors: Vec<SensorConfig>,
}

impl ScenarioConfig {
    /// Reads `path` and merges the environment on top. Does not validate.
    pub fn load(path: &Path) -> Result<Self, SimError> {
        // `Toml::file` treats a missing file as empty, which would silently
        // run the defaults.
        if !path.is_file() {
            return Err(SimError::ScenarioNotFound(path.to_path_buf()));
        }
        info!("Loading scenario from: {}", path.display());

        let config = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("KESTREL_").split("__"))
            .extract()?;
        Ok(config)
    }

    /// Applies command-line overrides.
    pub fn with_overrides(mut self, duration: Option<f64>, seed: Option<u64>) -> Self {
        if let Some(duration) = duration {
            self.simulation.duration_seconds = duration;
        }
        if seed.is_some() {
            self.simulation.seed = seed;
        }
        self
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let sim = &self.simulation;
        ensure(sim.duration_seconds > 0.0, "simulation.duration_seconds must be positive")?;
        ensure(sim.tick_rate > 0.0, "simulation.tick_rate must be positive")?;
        ensure(
            sim.alignment_seconds >= 0.0,
            "simulation.alignment_seconds must not be negative",
        )?;
        for window in &sim.degraded {
            window.validate("simulation.degraded")?;
        }

        ensure(
            self.filter.initial_covariance > 0.0,
            "filter.initial_covariance must be positive",
        )?;
        let f = &self.filter;
        ensure(
            f.process_noise_density >= 0.0
                && f.position_noise_density >= 0.0
                && f.orientation_noise_density >= 0.0,
            "filter noise densities must not be negative",
        )?;

        let mut names = HashSet::new();
        for sensor in &self.sensors {
            let settings = sensor.settings();
            if !names.insert(settings.name.as_str()) {
                return Err(SimError::InvalidScenario(format!(
                    "sensor name '{}' is used more than once",
                    settings.name
                )));
            }
            settings.validate()?;
        }
        Ok(())
    }
}

fn ensure(condition: bool, message: &str) -> Result<(), SimError> {
    if condition {
        Ok(())
    } else {
        Err(SimError::InvalidScenario(message.to_string()))
    }
}

// =========================================================================
// == Configuration Sub-Structs ==
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Optional seed for the pseudo-random number generator for determinism.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Duration of the simulation in seconds.
    pub duration_seconds: f64,
    /// Estimator ticks per second.
    pub tick_rate: f64,
    /// The estimator reports `ALIGNMENT` for this long after start.
    #[serde(default)]
    pub alignment_seconds: f64,
    /// Periods during which the estimator reports `DEGRADED`.
    #[serde(default)]
    pub degraded: Vec<Window>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            duration_seconds: 60.0,
            tick_rate: 50.0,
            alignment_seconds: 2.0,
            degraded: Vec::new(),
        }
    }
}

/// A closed time interval, in seconds since the start of the run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Window {
    pub start: f64,
    pub end: f64,
}

impl Window {
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }

    fn validate(&self, what: &str) -> Result<(), SimError> {
        ensure(
            self.start >= 0.0 && self.end >= self.start,
            &format!("{what}: window [{}, {}] is not a valid interval", self.start, self.end),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Initial variance on every state variable.
    pub initial_covariance: f64,
    /// Default random-walk noise density for the prediction step.
    pub process_noise_density: f64,
    /// Density for the position states. The filter has no motion model, so
    /// this must cover the vehicle's own movement.
    #[serde(default = "default_position_noise_density")]
    pub position_noise_density: f64,
    /// Density for the quaternion states.
    #[serde(default = "default_orientation_noise_density")]
    pub orientation_noise_density: f64,
}

fn default_position_noise_density() -> f64 {
    4.0
}

fn default_orientation_noise_density() -> f64 {
    0.01
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            initial_covariance: 10.0,
            process_noise_density: 1e-3,
            position_noise_density: default_position_noise_density(),
            orientation_noise_density: default_orientation_noise_density(),
        }
    }
}

/// The ground-truth path: a horizontal circle around the origin with an
/// optional constant climb. The body x-axis points along the direction of travel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrajectoryConfig {
    /// Circle radius in meters.
    pub radius: f64,
    /// Rate of travel around the circle in rad/s. Positive is counter-clockwise.
    pub angular_rate: f64,
    /// Height above the world origin at t = 0, in meters.
    #[serde(default)]
    pub altitude: f64,
    /// Vertical speed in m/s.
    #[serde(default)]
    pub climb_rate: f64,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            radius: 20.0,
            angular_rate: 0.1,
            altitude: 0.0,
            climb_rate: 0.0,
        }
    }
}

// =========================================================================
// == Sensors ==
// =========================================================================

// The `tag = "kind"` tells Serde to look for a `kind = "..."` field in the TOML
// to decide which variant to parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
#[serde(rename_all = "PascalCase")] // "Position" in TOML maps to Position variant
pub enum SensorConfig {
    Position(SensorSettings),
    Height(SensorSettings),
    Magnetometer(SensorSettings),
}

impl SensorConfig {
    pub fn settings(&self) -> &SensorSettings {
        match self {
            SensorConfig::Position(s) | SensorConfig::Height(s) | SensorConfig::Magnetometer(s) => s,
        }
    }

    pub fn get_kind_str(&self) -> &'static str {
        match self {
            SensorConfig::Position(_) => "Position",
            SensorConfig::Height(_) => "Height",
            SensorConfig::Magnetometer(_) => "Magnetometer",
        }
    }
}

/// Configuration shared by every simulated sensor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorSettings {
    /// A unique name for this sensor instance (e.g., "primary_gps").
    pub name: String,

    /// The rate at which the sensor produces measurements, in Hz.
    pub rate: f64,

    /// Standard deviation of the noise added to every axis, in sensor units.
    pub noise_stddev: f64,

    /// A constant offset added to every reading (e.g. a barometer's weather offset).
    #[serde(default)]
    pub bias: f64,

    #[serde(default)]
    pub min_interval: f64,

    /// Seconds without a correction before the sensor is reported as timed out. 0 disables.
    #[serde(default)]
    pub timeout: f64,

    /// Periods during which the sensor produces nothing.
    #[serde(default)]
    pub dropouts: Vec<Window>,

    /// Extra tunables forwarded to `Measurement::configure`.
    #[serde(default)]
    pub parameters: ParameterSet,
}

impl SensorSettings {
    fn validate(&self) -> Result<(), SimError> {
        let invalid = |reason: &str| {
            SimError::InvalidScenario(format!("sensor '{}': {}", self.name, reason))
        };
        if self.name.is_empty() {
            return Err(SimError::InvalidScenario("sensor name must not be empty".into()));
        }
        if self.rate.is_nan() || self.rate <= 0.0 {
            return Err(invalid("rate must be positive"));
        }
        if self.noise_stddev.is_nan() || self.noise_stddev < 0.0 {
            return Err(invalid("noise_stddev must not be negative"));
        }
        if self.min_interval < 0.0 || self.timeout < 0.0 {
            return Err(invalid("min_interval and timeout must not be negative"));
        }
        for window in &self.dropouts {
            window.validate(&format!("sensor '{}' dropouts", self.name))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    const SCENARIO: &str = r#"
        [simulation]
        seed = 7
        duration_seconds = 12.0
        tick_rate = 20.0

        [[simulation.degraded]]
        start = 4.0
        end = 5.0

        [context]
        reference_altitude = 150.0

        [[sensors]]
        kind = "Position"
        name = "gps"
        rate = 5.0
        noise_stddev = 1.5
        min_interval = 0.5
        timeout = 2.0

        [[sensors]]
        kind = "Height"
        name = "baro"
        rate = 10.0
        noise_stddev = 0.3
        bias = 2.0
        parameters = { outlier_threshold = 16.0 }
    "#;

    #[test]
    fn loads_scenario_file() {
        Jail::expect_with(|jail| {
            jail.create_file("scenario.toml", SCENARIO)?;
            let config =
                ScenarioConfig::load(Path::new("scenario.toml")).map_err(|e| e.to_string())?;

            assert_eq!(config.simulation.seed, Some(7));
            assert_eq!(config.simulation.degraded, vec![Window { start: 4.0, end: 5.0 }]);
            assert_eq!(config.context.reference_altitude, 150.0);
            assert_eq!(config.sensors.len(), 2);
            assert_eq!(config.sensors[1].get_kind_str(), "Height");
            assert_eq!(
                config.sensors[1].settings().parameters.get_number("outlier_threshold"),
                Ok(16.0)
            );
            // Sections missing from the file fall back to defaults.
            assert_eq!(config.filter.initial_covariance, 10.0);
            config.validate().map_err(|e| e.to_string())?;
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("scenario.toml", SCENARIO)?;
            jail.set_env("KESTREL_SIMULATION__DURATION_SECONDS", "3.5");
            let config =
                ScenarioConfig::load(Path::new("scenario.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.simulation.duration_seconds, 3.5);
            Ok(())
        });
    }

    #[test]
    fn unknown_fields_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("scenario.toml", "[simulation]\nduration_seconds = 1.0\ntick_rate = 10.0\nspeed = 2.0\n")?;
            let result = ScenarioConfig::load(Path::new("scenario.toml"));
            assert!(matches!(result, Err(SimError::Config(_))));
            Ok(())
        });
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = ScenarioConfig::load(Path::new("does/not/exist.toml"));
        assert!(matches!(result, Err(SimError::ScenarioNotFound(_))));
    }

    #[test]
    fn validation_catches_duplicates_and_bad_rates() {
        let gps = SensorSettings {
            name: "gps".into(),
            rate: 1.0,
            noise_stddev: 1.0,
            bias: 0.0,
            min_interval: 0.0,
            timeout: 0.0,
            dropouts: Vec::new(),
            parameters: ParameterSet::new(),
        };
        let mut config = ScenarioConfig {
            sensors: vec![
                SensorConfig::Position(gps.clone()),
                SensorConfig::Height(gps.clone()),
            ],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SimError::InvalidScenario(_))));

        config.sensors = vec![SensorConfig::Position(SensorSettings { rate: 0.0, ..gps })];
        assert!(matches!(config.validate(), Err(SimError::InvalidScenario(_))));
    }

    #[test]
    fn cli_overrides_win() {
        let config = ScenarioConfig::default().with_overrides(Some(5.0), Some(99));
        assert_eq!(config.simulation.duration_seconds, 5.0);
        assert_eq!(config.simulation.seed, Some(99));

        let config = config.with_overrides(None, None);
        assert_eq!(config.simulation.seed, Some(99));
    }
}
