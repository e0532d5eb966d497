//! DishaIO - Serial driver for the KVH DSP-1750 fiber-optic IMU
//!
//! Reads the sensor's binary frame stream, rejects corrupt frames, calibrates
//! per-axis bias at startup, and dead-reckons orientation, velocity, and
//! position from the corrected rates.
//!
//! ```text
//! Transport ─▶ FrameSynchronizer ─▶ decoder ─▶ CalibrationEngine ─▶ IntegrationEngine ─▶ OutputSink
//! ```
//!
//! [`Session`] owns the whole pipeline for one open device.

pub mod config;
pub mod core;
pub mod devices;
pub mod error;
pub mod sensors;
pub mod session;
pub mod streaming;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use error::{CorruptData, Error, Result};
pub use session::{Session, SessionState};
pub use streaming::{ChannelSink, LogSink, OutputSample, OutputSink};
