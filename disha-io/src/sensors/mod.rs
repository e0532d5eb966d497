//! Sensor processing: bias calibration and dead-reckoning integration.

pub mod calibration;
pub mod integration;
pub mod orientation;

pub use calibration::{Bias, CalibrationEngine, CalibrationState};
pub use integration::{IntegrationEngine, OUTPUT_CADENCE};
pub use orientation::Quaternion;
