// kestrel_core/src/lib.rs

// This file defines the public modules of the library.
pub mod context;
pub mod error;
pub mod estimation;
pub mod measurement;
pub mod models;
pub mod parameters;
pub mod prelude;
pub mod state;
pub mod status;
