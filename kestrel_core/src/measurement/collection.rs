// kestrel_core/src/measurement/collection.rs

use tracing::{info, warn};

use crate::context::EstimatorContext;
use crate::error::MeasurementError;
use crate::estimation::Filter;
use crate::measurement::{AnyMeasurement, Measurement, ProcessSummary, Tick};
use crate::models::SensorModel;
use crate::state::State;
use crate::status::SystemStatus;

/// The set of measurements feeding one estimator.
///
/// Members are kept in insertion order and ticked one after another against the
/// same filter and state, so the state only ever has a single writer.
#[derive(Debug, Default)]
pub struct Measurements {
    members: Vec<Box<dyn AnyMeasurement>>,
}

impl Measurements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Adds a measurement. Names must be unique.
    pub fn insert(&mut self, measurement: Box<dyn AnyMeasurement>) -> Result<(), MeasurementError> {
        if self.get(measurement.name()).is_some() {
            return Err(MeasurementError::DuplicateName(measurement.name().to_string()));
        }
        self.members.push(measurement);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&(dyn AnyMeasurement + 'static)> {
        self.members
            .iter()
            .find(|m| m.name() == name)
            .map(|m| m.as_ref())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn AnyMeasurement + 'static)> {
        self.members
            .iter_mut()
            .find(|m| m.name() == name)
            .map(|m| m.as_mut())
    }

    /// Typed access to a member, e.g. to grab its `sender()`.
    pub fn get_as<M: SensorModel>(&self, name: &str) -> Option<&Measurement<M>> {
        self.get(name)?.downcast_ref::<Measurement<M>>()
    }

    pub fn get_as_mut<M: SensorModel>(&mut self, name: &str) -> Option<&mut Measurement<M>> {
        self.get_mut(name)?.downcast_mut::<Measurement<M>>()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn AnyMeasurement> {
        self.members.iter().map(|m| m.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name()).collect()
    }

    /// Initializes every member. A member that fails stays uninitialized and is
    /// skipped by `process_all`; its error is returned alongside its name.
    pub fn init_all(
        &mut self,
        context: &EstimatorContext,
        state: &mut State,
    ) -> Vec<(String, MeasurementError)> {
        let mut failures = Vec::new();
        for member in self.members.iter_mut() {
            if let Err(err) = member.init(context, state) {
                warn!(measurement = member.name(), error = %err, "measurement excluded");
                failures.push((member.name().to_string(), err));
            }
        }
        info!(
            initialized = self.members.len() - failures.len(),
            failed = failures.len(),
            state_dim = state.dim(),
            "measurements initialized"
        );
        failures
    }

    pub fn reset_all(&mut self, state: &State) {
        for member in self.members.iter_mut() {
            member.reset(state);
        }
    }

    pub fn cleanup_all(&mut self) {
        for member in self.members.iter_mut() {
            member.cleanup();
        }
    }

    /// Runs one tick for every initialized member, in insertion order.
    pub fn process_all(
        &mut self,
        filter: &mut dyn Filter,
        state: &mut State,
        tick: Tick,
    ) -> Vec<(String, ProcessSummary)> {
        let mut summaries = Vec::with_capacity(self.members.len());
        for member in self.members.iter_mut().filter(|m| m.is_initialized()) {
            let summary = member.process(filter, state, tick);
            summaries.push((member.name().to_string(), summary));
        }
        summaries
    }

    /// Names of the members that have gone quiet for longer than their timeout.
    pub fn timed_out(&self) -> Vec<&str> {
        self.members
            .iter()
            .filter(|m| m.timedout())
            .map(|m| m.name())
            .collect()
    }

    /// Union of the subsystems provided by every member active under `status`.
    pub fn status_flags(&self, status: SystemStatus) -> SystemStatus {
        self.members
            .iter()
            .filter(|m| m.is_initialized() && m.active(status))
            .fold(SystemStatus::NONE, |flags, m| flags | m.status_flags())
    }
}
