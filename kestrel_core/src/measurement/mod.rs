// kestrel_core/src/measurement/mod.rs

//! The measurement-update pipeline.
//!
//! A [`Measurement`] binds one [`SensorModel`] to a pending queue and the gating
//! policy (enabled flag, minimum interval, status mask). Once per estimator tick
//! [`AnyMeasurement::process`] drains the queue and turns every eligible update
//! into a [`Correction`] for the [`Filter`].

use downcast_rs::{impl_downcast, Downcast};
use nalgebra::{DMatrix, DVector};
use std::fmt::Debug;
use tracing::{debug, trace, warn};

use crate::context::EstimatorContext;
use crate::error::{MeasurementError, ParameterError};
use crate::estimation::{Correction, Filter};
use crate::models::{check_covariance, SensorModel};
use crate::parameters::{non_negative, number_as, type_mismatch, ParameterSet, ParameterValue};
use crate::state::State;
use crate::status::SystemStatus;

pub mod collection;
pub mod queue;
pub mod update;

use queue::{PendingQueue, UpdateSender, DEFAULT_QUEUE_CAPACITY};
use update::MeasurementUpdate;

/// The per-tick input shared by every measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Seconds elapsed since the previous tick.
    pub dt: f64,
    /// Which estimator subsystems are currently active.
    pub status: SystemStatus,
}

impl Tick {
    pub fn new(dt: f64, status: SystemStatus) -> Self {
        Self { dt, status }
    }
}

/// What happened to the updates drained during one tick.
#[derive(Debug, Default)]
pub struct ProcessSummary {
    /// Updates that reached the filter and were applied.
    pub applied: usize,
    /// Updates dropped by gating (disabled, rate limit, status mask, model veto).
    pub rejected: usize,
    /// Updates that failed validation or whose correction failed.
    pub errors: Vec<MeasurementError>,
}

impl ProcessSummary {
    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    pub fn total(&self) -> usize {
        self.applied + self.rejected + self.failed()
    }
}

/// The object-safe face of a [`Measurement`], so differently-typed
/// measurements can live in one collection.
pub trait AnyMeasurement: Downcast + Debug + Send {
    fn name(&self) -> &str;

    /// Binds the measurement to the live state. A measurement whose init
    /// failed must not be ticked.
    fn init(&mut self, context: &EstimatorContext, state: &mut State) -> Result<(), MeasurementError>;
    fn is_initialized(&self) -> bool;
    fn cleanup(&mut self);
    fn reset(&mut self, state: &State);

    fn enabled(&self) -> bool;
    fn enable(&mut self);
    fn disable(&mut self);

    /// `enabled && model.applies_to_status(status)`.
    fn active(&self, status: SystemStatus) -> bool;
    fn status_flags(&self) -> SystemStatus;

    /// Enqueues a type-erased update, rejecting it if it was built for another model.
    fn add_boxed(&self, update: Box<dyn MeasurementUpdate>) -> Result<(), MeasurementError>;
    /// Number of updates waiting for the next tick.
    fn pending(&self) -> usize;
    /// Updates evicted from the pending queue because it was full.
    fn dropped(&self) -> u64;

    /// Advances the timer by `tick.dt`, then drains and applies the queue.
    fn process(&mut self, filter: &mut dyn Filter, state: &mut State, tick: Tick) -> ProcessSummary;

    fn increase_timer(&mut self, dt: f64);
    /// Marks a successful correction: the timer restarts from zero.
    fn updated(&mut self);
    fn timer(&self) -> f64;
    /// `timeout > 0 && timer > timeout`.
    fn timedout(&self) -> bool;

    fn parameters(&self) -> ParameterSet;
    fn set_parameter(&mut self, name: &str, value: &ParameterValue) -> Result<(), ParameterError>;

    /// Applies every entry of `params`, stopping at the first invalid one.
    fn configure(&mut self, params: &ParameterSet) -> Result<(), ParameterError> {
        for (name, value) in params.iter() {
            self.set_parameter(name, value)?;
        }
        Ok(())
    }
}

impl_downcast!(AnyMeasurement);

/// Orchestrates one sensor: queueing, gating and the filter correction.
#[derive(Debug)]
pub struct Measurement<M: SensorModel> {
    name: String,
    model: M,
    queue: PendingQueue<M::Update>,
    status_flags: SystemStatus,
    initialized: bool,

    enabled: bool,
    min_interval: f64,

    timeout: f64,
    timer: f64,
    /// Whether a correction succeeded since the last init/reset. The rate
    /// limit only applies once there is a previous correction to measure from.
    corrected: bool,
}

impl<M: SensorModel> Measurement<M> {
    pub fn new(name: &str, model: M) -> Self {
        let status_flags = model.status_flags();
        Self {
            name: name.to_string(),
            model,
            queue: PendingQueue::new(name, DEFAULT_QUEUE_CAPACITY),
            status_flags,
            initialized: false,
            enabled: true,
            min_interval: 0.0,
            timeout: 0.0,
            timer: 0.0,
            corrected: false,
        }
    }

    pub fn with_min_interval(mut self, seconds: f64) -> Self {
        self.min_interval = seconds.max(0.0);
        self
    }

    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout = seconds.max(0.0);
        self
    }

    /// 0 means unbounded.
    pub fn with_queue_capacity(self, capacity: usize) -> Self {
        self.queue.set_capacity(capacity);
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn min_interval(&self) -> f64 {
        self.min_interval
    }

    pub fn timeout(&self) -> f64 {
        self.timeout
    }

    pub fn set_status_flags(&mut self, flags: SystemStatus) {
        self.status_flags = flags;
    }

    pub fn noise_covariance(&self) -> &DMatrix<f64> {
        self.model.noise_covariance()
    }

    /// Replaces the model's default noise covariance for all later updates
    /// that do not carry their own.
    pub fn set_noise_covariance(&mut self, covariance: DMatrix<f64>) -> Result<(), MeasurementError> {
        check_covariance(self.model.dimension(), &covariance)?;
        self.model.set_noise_covariance(covariance);
        Ok(())
    }

    /// Enqueues a typed update. Always succeeds; a full queue evicts its oldest entry.
    pub fn add(&self, update: M::Update) {
        self.queue.push(update);
    }

    /// A producer handle that can be moved to the thread reading the sensor.
    pub fn sender(&self) -> UpdateSender<M::Update> {
        UpdateSender::new(self.queue.clone())
    }

    fn rate_limited(&self) -> bool {
        self.corrected && self.min_interval > 0.0 && self.timer < self.min_interval
    }

    /// Applies one update if the gating allows it.
    ///
    /// Returns `Ok(false)` without touching the state when the measurement is
    /// disabled, rate-limited, or the model vetoes the update. Returns `Ok(true)`
    /// after a successful correction. Errors leave the state untouched.
    ///
    /// The timer is not reset here; `process` does that on success.
    pub fn update(
        &mut self,
        filter: &mut dyn Filter,
        state: &mut State,
        update: &M::Update,
    ) -> Result<bool, MeasurementError> {
        if !self.enabled {
            return Ok(false);
        }
        if self.rate_limited() {
            trace!(
                measurement = %self.name,
                timer = self.timer,
                min_interval = self.min_interval,
                "update rate-limited"
            );
            return Ok(false);
        }
        if !self.initialized {
            return Err(MeasurementError::NotInitialized(self.name.clone()));
        }

        let z = self.model.measurement(update);
        self.validate(&z, update.covariance())?;

        if !self.model.before_update(state, update) {
            debug!(measurement = %self.name, "update vetoed by model");
            return Ok(false);
        }

        let z_pred = self.model.predict(state);
        let correction = Correction {
            source: &self.name,
            innovation: self.model.innovation(&z, &z_pred),
            jacobian: self.model.jacobian(state),
            covariance: update
                .covariance()
                .unwrap_or_else(|| self.model.noise_covariance()),
        };

        filter
            .correct(state, &correction)
            .map_err(|source| MeasurementError::Correction {
                measurement: self.name.clone(),
                source,
            })?;

        self.model.after_update(state);
        Ok(true)
    }

    fn validate(
        &self,
        z: &DVector<f64>,
        covariance: Option<&DMatrix<f64>>,
    ) -> Result<(), MeasurementError> {
        let dim = self.model.dimension();
        let malformed = |reason: String| MeasurementError::MalformedUpdate {
            measurement: self.name.clone(),
            reason,
        };

        if z.nrows() != dim {
            return Err(malformed(format!(
                "measurement vector has {} rows, expected {}",
                z.nrows(),
                dim
            )));
        }
        if z.iter().any(|v| !v.is_finite()) {
            return Err(malformed("measurement vector is not finite".to_string()));
        }
        if let Some(r) = covariance {
            check_covariance(dim, r).map_err(|e| malformed(e.to_string()))?;
        }
        Ok(())
    }
}

impl<M: SensorModel> AnyMeasurement for Measurement<M> {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, context: &EstimatorContext, state: &mut State) -> Result<(), MeasurementError> {
        let init_error = |source| MeasurementError::Init {
            name: self.name.clone(),
            source,
        };
        // Checked first: a model may register state variables during init.
        check_covariance(self.model.dimension(), self.model.noise_covariance())
            .map_err(init_error)?;
        self.model.init(context, state).map_err(init_error)?;

        self.initialized = true;
        debug!(
            measurement = %self.name,
            model = self.model.kind(),
            state_dim = state.dim(),
            "measurement initialized"
        );
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn cleanup(&mut self) {
        if !self.initialized {
            return;
        }
        self.model.cleanup();
        self.queue.clear();
        self.initialized = false;
    }

    fn reset(&mut self, state: &State) {
        self.model.reset(state);
        self.queue.clear();
        self.timer = 0.0;
        self.corrected = false;
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn active(&self, status: SystemStatus) -> bool {
        self.enabled && self.model.applies_to_status(status)
    }

    fn status_flags(&self) -> SystemStatus {
        self.status_flags
    }

    fn add_boxed(&self, update: Box<dyn MeasurementUpdate>) -> Result<(), MeasurementError> {
        let found = update.update_type();
        match update.downcast::<M::Update>() {
            Ok(update) => {
                self.add(*update);
                Ok(())
            }
            Err(_) => {
                let expected = std::any::type_name::<M::Update>();
                warn!(
                    measurement = %self.name,
                    expected,
                    found,
                    "rejected update of the wrong type"
                );
                Err(MeasurementError::UpdateTypeMismatch {
                    measurement: self.name.clone(),
                    expected,
                    found,
                })
            }
        }
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }

    fn dropped(&self) -> u64 {
        self.queue.dropped()
    }

    fn process(&mut self, filter: &mut dyn Filter, state: &mut State, tick: Tick) -> ProcessSummary {
        self.increase_timer(tick.dt);

        let mut summary = ProcessSummary::default();
        let pending = self.queue.drain();
        if pending.is_empty() {
            return summary;
        }

        if !self.model.applies_to_status(tick.status) {
            trace!(
                measurement = %self.name,
                status = %tick.status,
                dropped = pending.len(),
                "model does not apply to the current status"
            );
            summary.rejected = pending.len();
            return summary;
        }

        for update in &pending {
            match self.update(filter, state, update) {
                Ok(true) => {
                    self.updated();
                    summary.applied += 1;
                }
                Ok(false) => summary.rejected += 1,
                Err(err) => {
                    warn!(measurement = %self.name, error = %err, "update failed");
                    summary.errors.push(err);
                }
            }
        }
        summary
    }

    fn increase_timer(&mut self, dt: f64) {
        if dt > 0.0 {
            self.timer += dt;
        }
    }

    fn updated(&mut self) {
        self.timer = 0.0;
        self.corrected = true;
    }

    fn timer(&self) -> f64 {
        self.timer
    }

    fn timedout(&self) -> bool {
        self.timeout > 0.0 && self.timer > self.timeout
    }

    fn parameters(&self) -> ParameterSet {
        let mut params = ParameterSet::new()
            .with("enabled", self.enabled)
            .with("min_interval", self.min_interval)
            .with("timeout", self.timeout)
            .with("queue_capacity", self.queue.capacity() as f64);
        params.extend(self.model.parameters());
        params
    }

    fn set_parameter(&mut self, name: &str, value: &ParameterValue) -> Result<(), ParameterError> {
        match name {
            "enabled" => match value {
                ParameterValue::Bool(b) => self.enabled = *b,
                other => return Err(type_mismatch(name, "bool", other)),
            },
            "min_interval" => self.min_interval = non_negative(name, value)?,
            "timeout" => self.timeout = non_negative(name, value)?,
            "queue_capacity" => self.queue.set_capacity(number_as::<usize>(name, value)?),
            _ => return self.model.set_parameter(name, value),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;
    use crate::models::height::{HeightModel, HeightUpdate};
    use crate::models::position::{PositionModel, PositionUpdate};
    use crate::state::{StateVariable, POSITION};
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    /// Records every correction it is handed and applies nothing.
    #[derive(Default)]
    struct SpyFilter {
        seen: Vec<(String, DVector<f64>, DMatrix<f64>)>,
        fail: bool,
    }

    impl Filter for SpyFilter {
        fn correct(&mut self, _state: &mut State, correction: &Correction<'_>) -> Result<(), FilterError> {
            if self.fail {
                return Err(FilterError::SingularInnovationCovariance);
            }
            self.seen.push((
                correction.source.to_string(),
                correction.innovation.clone(),
                correction.covariance.clone(),
            ));
            Ok(())
        }
    }

    fn ready() -> Tick {
        Tick::new(0.1, SystemStatus::READY)
    }

    fn position_measurement() -> (Measurement<PositionModel>, State) {
        let mut state = State::new(POSITION.to_vec(), 1.0, 0.0);
        let mut gps = Measurement::new("gps", PositionModel::new(2.0));
        gps.init(&EstimatorContext::default(), &mut state)
            .expect("position layout");
        (gps, state)
    }

    #[test]
    fn processes_queued_updates_in_order() {
        let (mut gps, mut state) = position_measurement();
        let mut filter = SpyFilter::default();

        gps.add(PositionUpdate::new(Vector3::new(1.0, 0.0, 0.0)));
        gps.add(PositionUpdate::new(Vector3::new(2.0, 0.0, 0.0)));
        let summary = gps.process(&mut filter, &mut state, ready());

        assert_eq!(summary.applied, 2);
        assert_eq!(gps.pending(), 0);
        assert_eq!(filter.seen.len(), 2);
        assert_eq!(filter.seen[0].0, "gps");
        assert_abs_diff_eq!(filter.seen[0].1[0], 1.0);
        assert_abs_diff_eq!(filter.seen[1].1[0], 2.0);
        assert_eq!(gps.timer(), 0.0);
    }

    #[test]
    fn update_before_init_is_an_error() {
        let mut state = State::new(POSITION.to_vec(), 1.0, 0.0);
        let mut gps = Measurement::new("gps", PositionModel::default());
        let err = gps
            .update(&mut SpyFilter::default(), &mut state, &PositionUpdate::new(Vector3::zeros()))
            .expect_err("not initialized");
        assert!(matches!(err, MeasurementError::NotInitialized(name) if name == "gps"));
    }

    #[test]
    fn rate_limit_applies_after_first_correction() {
        let (gps, mut state) = position_measurement();
        let mut gps = gps.with_min_interval(0.5);
        let mut filter = SpyFilter::default();
        let fix = PositionUpdate::new(Vector3::zeros());

        gps.add(fix.clone());
        assert_eq!(gps.process(&mut filter, &mut state, ready()).applied, 1);

        gps.add(fix.clone());
        let summary = gps.process(&mut filter, &mut state, Tick::new(0.3, SystemStatus::READY));
        assert_eq!(summary.rejected, 1);
        assert_abs_diff_eq!(gps.timer(), 0.3);

        gps.add(fix);
        let summary = gps.process(&mut filter, &mut state, Tick::new(0.3, SystemStatus::READY));
        assert_eq!(summary.applied, 1);
        assert_eq!(gps.timer(), 0.0);
    }

    #[test]
    fn disabled_measurement_drains_without_applying() {
        let (mut gps, mut state) = position_measurement();
        let mut filter = SpyFilter::default();
        gps.disable();
        assert!(!gps.active(SystemStatus::READY));

        gps.add(PositionUpdate::new(Vector3::zeros()));
        let summary = gps.process(&mut filter, &mut state, ready());
        assert_eq!(summary.rejected, 1);
        assert_eq!(gps.pending(), 0);
        assert!(filter.seen.is_empty());
    }

    #[test]
    fn status_mask_rejects_whole_batch() {
        let (mut gps, mut state) = position_measurement();
        let mut filter = SpyFilter::default();
        gps.add(PositionUpdate::new(Vector3::zeros()));
        gps.add(PositionUpdate::new(Vector3::zeros()));

        let degraded = Tick::new(0.1, SystemStatus::READY | SystemStatus::DEGRADED);
        let summary = gps.process(&mut filter, &mut state, degraded);
        assert_eq!(summary.rejected, 2);
        assert!(filter.seen.is_empty());
    }

    #[test]
    fn per_update_covariance_overrides_default() {
        let (mut gps, mut state) = position_measurement();
        let mut filter = SpyFilter::default();
        let r = DMatrix::from_diagonal_element(3, 3, 0.25);

        gps.add(PositionUpdate::new(Vector3::zeros()).with_covariance(r.clone()));
        gps.add(PositionUpdate::new(Vector3::zeros()));
        gps.process(&mut filter, &mut state, ready());

        assert_eq!(filter.seen[0].2, r);
        assert_eq!(filter.seen[1].2, DMatrix::from_diagonal_element(3, 3, 4.0));
    }

    #[test]
    fn malformed_update_leaves_state_untouched() {
        let (mut gps, mut state) = position_measurement();
        let mut filter = SpyFilter::default();
        let before = state.vector().clone();

        gps.add(PositionUpdate::new(Vector3::new(f64::NAN, 0.0, 0.0)));
        gps.add(PositionUpdate::new(Vector3::zeros()).with_covariance(DMatrix::identity(2, 2)));
        let summary = gps.process(&mut filter, &mut state, ready());

        assert_eq!(summary.failed(), 2);
        assert!(summary
            .errors
            .iter()
            .all(|e| matches!(e, MeasurementError::MalformedUpdate { .. })));
        assert!(filter.seen.is_empty());
        assert_eq!(state.vector(), &before);
    }

    #[test]
    fn filter_failure_keeps_timer_running() {
        let (mut gps, mut state) = position_measurement();
        let mut filter = SpyFilter {
            fail: true,
            ..Default::default()
        };

        gps.add(PositionUpdate::new(Vector3::zeros()));
        let summary = gps.process(&mut filter, &mut state, Tick::new(0.4, SystemStatus::READY));
        assert_eq!(summary.failed(), 1);
        assert!(matches!(summary.errors[0], MeasurementError::Correction { .. }));
        assert_abs_diff_eq!(gps.timer(), 0.4);
    }

    #[test]
    fn boxed_update_of_wrong_type_is_rejected() {
        let (gps, _state) = position_measurement();
        let err = gps
            .add_boxed(Box::new(HeightUpdate::new(12.0)))
            .expect_err("height update on a position measurement");
        assert!(matches!(err, MeasurementError::UpdateTypeMismatch { .. }));
        assert_eq!(gps.pending(), 0);

        gps.add_boxed(Box::new(PositionUpdate::new(Vector3::zeros())))
            .expect("matching type");
        assert_eq!(gps.pending(), 1);
    }

    #[test]
    fn timeout_tracks_time_since_last_correction() {
        let (gps, mut state) = position_measurement();
        let mut gps = gps.with_timeout(1.0);
        assert!(!gps.timedout());

        gps.increase_timer(1.5);
        assert!(gps.timedout());

        gps.add(PositionUpdate::new(Vector3::zeros()));
        gps.process(&mut SpyFilter::default(), &mut state, Tick::new(0.0, SystemStatus::READY));
        assert!(!gps.timedout());
    }

    #[test]
    fn reset_clears_queue_and_rate_limit_history() {
        let (gps, mut state) = position_measurement();
        let mut gps = gps.with_min_interval(10.0);
        let mut filter = SpyFilter::default();

        gps.add(PositionUpdate::new(Vector3::zeros()));
        gps.process(&mut filter, &mut state, ready());
        gps.add(PositionUpdate::new(Vector3::zeros()));
        gps.reset(&state);

        assert_eq!(gps.pending(), 0);
        assert_eq!(gps.timer(), 0.0);
        assert!(matches!(
            gps.update(&mut filter, &mut state, &PositionUpdate::new(Vector3::zeros())),
            Ok(true)
        ));
    }

    #[test]
    fn parameters_cover_orchestrator_and_model() {
        let mut state = State::new(POSITION.to_vec(), 1.0, 0.0);
        let mut baro = Measurement::new("baro", HeightModel::default());
        baro.init(&EstimatorContext::default(), &mut state)
            .expect("layout has Pz");

        let params = ParameterSet::new()
            .with("min_interval", 0.2)
            .with("enabled", false)
            .with("outlier_threshold", 9.0);
        baro.configure(&params).expect("all known");

        let read_back = baro.parameters();
        assert_eq!(read_back.get_number("min_interval"), Ok(0.2));
        assert_eq!(read_back.get_bool("enabled"), Ok(false));
        assert_eq!(read_back.get_number("outlier_threshold"), Ok(9.0));
        assert!(state.contains(&StateVariable::BaroBias));

        assert!(matches!(
            baro.set_parameter("timeout", &ParameterValue::Number(-1.0)),
            Err(ParameterError::OutOfRange { .. })
        ));
        assert_eq!(
            baro.set_parameter("nope", &ParameterValue::Bool(true)),
            Err(ParameterError::Unknown("nope".to_string()))
        );
    }

    #[test]
    fn failed_init_leaves_state_layout_alone() {
        let mut state = State::new(POSITION.to_vec(), 1.0, 0.0);
        let mut baro = Measurement::new("baro", HeightModel::new(f64::NAN));

        let err = baro
            .init(&EstimatorContext::default(), &mut state)
            .expect_err("non-finite default covariance");
        assert!(matches!(err, MeasurementError::Init { ref name, .. } if name == "baro"));
        assert!(!baro.is_initialized());
        assert_eq!(state.dim(), 3);
        assert!(!state.contains(&StateVariable::BaroBias));
    }

    #[test]
    fn cleanup_is_idempotent_and_stops_corrections() {
        let (mut gps, mut state) = position_measurement();
        let mut filter = SpyFilter::default();
        gps.add(PositionUpdate::new(Vector3::zeros()));

        gps.cleanup();
        gps.cleanup();
        assert!(!gps.is_initialized());
        assert_eq!(gps.pending(), 0);

        gps.add(PositionUpdate::new(Vector3::zeros()));
        let summary = gps.process(&mut filter, &mut state, ready());
        assert_eq!(summary.applied, 0);
        assert!(matches!(summary.errors[..], [MeasurementError::NotInitialized(_)]));
        assert!(filter.seen.is_empty());
    }

    #[test]
    fn queue_capacity_parameter_evicts_oldest() {
        let (mut gps, mut state) = position_measurement();
        let mut filter = SpyFilter::default();
        gps.set_parameter("queue_capacity", &ParameterValue::Number(2.0))
            .expect("valid capacity");
        assert_eq!(gps.parameters().get_number("queue_capacity"), Ok(2.0));

        for x in 1..=5 {
            gps.add(PositionUpdate::new(Vector3::new(x as f64, 0.0, 0.0)));
        }
        assert_eq!(gps.pending(), 2);
        assert_eq!(gps.dropped(), 3);

        gps.process(&mut filter, &mut state, ready());
        let xs: Vec<f64> = filter.seen.iter().map(|(_, y, _)| y[0]).collect();
        assert_eq!(xs, [4.0, 5.0]);

        assert!(matches!(
            gps.set_parameter("queue_capacity", &ParameterValue::Number(-1.0)),
            Err(ParameterError::OutOfRange { .. })
        ));
        assert!(matches!(
            gps.set_parameter("queue_capacity", &ParameterValue::Bool(true)),
            Err(ParameterError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn timeout_boundary_is_exclusive() {
        let (gps, _state) = position_measurement();
        let mut gps = gps.with_timeout(1.0);

        gps.increase_timer(1.0);
        assert!(!gps.timedout());
        gps.increase_timer(0.001);
        assert!(gps.timedout());
    }

    #[test]
    fn noise_covariance_setter_checks_shape() {
        let (mut gps, _state) = position_measurement();
        assert!(gps.set_noise_covariance(DMatrix::identity(2, 2)).is_err());
        gps.set_noise_covariance(DMatrix::identity(3, 3))
            .expect("3x3 is valid");
        assert_eq!(gps.noise_covariance(), &DMatrix::identity(3, 3));
    }
}
