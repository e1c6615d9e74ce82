// kestrel_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::estimation::{Correction, Filter};
pub use crate::measurement::update::MeasurementUpdate;
pub use crate::measurement::{AnyMeasurement, Measurement, ProcessSummary, Tick};
pub use crate::models::SensorModel;

// --- Core Data Structures (The "nouns" of the library) ---
pub use crate::context::EstimatorContext;
pub use crate::measurement::collection::Measurements;
pub use crate::measurement::queue::UpdateSender;
pub use crate::parameters::{ParameterSet, ParameterValue};
pub use crate::state::{State, StateVariable};
pub use crate::status::SystemStatus;

// --- Errors ---
pub use crate::error::{FilterError, MeasurementError, ModelError, ParameterError, StateError};

// --- Estimation Algorithms ---
pub use crate::estimation::ekf::ExtendedKalmanFilter;

// --- Concrete Model Implementations (Export common ones for convenience) ---
pub use crate::models::height::{HeightModel, HeightUpdate};
pub use crate::models::magnetometer::{MagneticUpdate, MagnetometerModel};
pub use crate::models::position::{PositionModel, PositionUpdate};
