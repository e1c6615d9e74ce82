// kestrel_core/src/state/layout.rs
use crate::state::StateVariable;

/// Returns the standard 16-dimensional state vector layout used for
/// inertial navigation filters.
///
/// The state is composed of:
/// - Position (3) in World Frame
/// - Velocity (3) in World Frame
/// - Orientation (4, Quaternion) from Body to World Frame
/// - Accelerometer Bias (3) in Body Frame
/// - Gyroscope Bias (3) in Body Frame
///
/// Sensor-specific states (e.g. a barometer offset) are appended by the
/// measurement models that need them when they are initialized.
pub fn standard_ins_state_layout() -> Vec<StateVariable> {
    vec![
        // --- Position (World Frame) --- indices 0-2
        StateVariable::Px,
        StateVariable::Py,
        StateVariable::Pz,
        // --- Velocity (World Frame) --- indices 3-5
        StateVariable::Vx,
        StateVariable::Vy,
        StateVariable::Vz,
        // --- Orientation (Quaternion, Body to World) --- indices 6-9
        StateVariable::Qx,
        StateVariable::Qy,
        StateVariable::Qz,
        StateVariable::Qw,
        // --- Accelerometer Bias (Body Frame) --- indices 10-12
        StateVariable::AccelBiasX,
        StateVariable::AccelBiasY,
        StateVariable::AccelBiasZ,
        // --- Gyroscope Bias (Body Frame) --- indices 13-15
        StateVariable::GyroBiasX,
        StateVariable::GyroBiasY,
        StateVariable::GyroBiasZ,
    ]
}
