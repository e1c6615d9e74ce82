// kestrel_core/src/measurement/update.rs

use downcast_rs::{impl_downcast, Downcast};
use dyn_clone::DynClone;
use nalgebra::DMatrix;
use std::fmt::Debug;

/// One immutable observation, ready to be queued on a `Measurement`.
///
/// Every sensor model declares its own concrete update type. The trait object
/// form (`Box<dyn MeasurementUpdate>`) lets upstream code hand updates around
/// without knowing the sensor, and the orchestrator downcasts it back at the
/// queue boundary.
pub trait MeasurementUpdate: Downcast + DynClone + Debug + Send + Sync {
    /// A per-observation noise covariance replacing the model's default.
    fn covariance(&self) -> Option<&DMatrix<f64>> {
        None
    }

    /// The concrete type name, used in type-mismatch diagnostics.
    fn update_type(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl_downcast!(MeasurementUpdate);
dyn_clone::clone_trait_object!(MeasurementUpdate);
