// kestrel_sim/src/simulation/mod.rs

//! The synthetic world the estimator runs against: ground truth, noisy
//! sensors, and the tick loop tying them to the measurement pipeline.

pub mod prng;
pub mod runner;
pub mod sensors;
pub mod truth;
