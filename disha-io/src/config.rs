//! Configuration for DishaIO
//!
//! Loads configuration from a TOML file. Every section is optional and falls
//! back to defaults for a DSP-1750 on `/dev/ttyUSB0` mounted with its X axis
//! vertical.
//!
//! ```toml
//! [device]
//! port = "/dev/ttyUSB0"
//! byte_timeout_ms = 10
//!
//! [calibration]
//! samples = 10000
//! gravity_axis = "x"
//!
//! [output]
//! odom_frame = "/odom"
//! imu_frame = "/imu"
//! angular_units = "radians"
//! ```

use crate::core::types::{AngularUnits, Axis};
use crate::devices::dsp1750::constants::BAUD_RATE;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial link configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Serial port path
    pub port: String,
    /// Link speed (the DSP-1750 streams at 921600 8N1)
    pub baud_rate: u32,
    /// Per-byte read timeout in milliseconds
    pub byte_timeout_ms: u64,
    /// Bytes scanned for a header before declaring the link lost
    pub max_sync_bytes: usize,
    /// Bytes scanned for the built-in test reply, which arrives behind the
    /// measurement frames already in flight
    pub self_test_sync_bytes: usize,
    /// Run the extended built-in test when the daemon opens the device
    pub self_test: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: BAUD_RATE,
            byte_timeout_ms: 10,
            max_sync_bytes: 4096,
            self_test_sync_bytes: 65_536,
            self_test: true,
        }
    }
}

impl DeviceConfig {
    /// Per-byte timeout as a `Duration`
    pub fn byte_timeout(&self) -> Duration {
        Duration::from_millis(self.byte_timeout_ms)
    }
}

/// Bias calibration configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Valid samples averaged into the bias
    pub samples: usize,
    /// Accelerometer axis aligned with gravity (reads −1 g when stationary)
    pub gravity_axis: Axis,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            samples: 10_000,
            gravity_axis: Axis::X,
        }
    }
}

/// Output message configuration
///
/// Applied as a snapshot at session state transitions.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Parent frame of the pose-style message
    pub odom_frame: String,
    /// Child frame of the pose-style message
    pub imu_frame: String,
    /// Frame of the inertial-style message
    pub base_frame: String,
    /// Units of the gyro readings reported by the device
    pub angular_units: AngularUnits,
    /// Capacity of the bounded hand-off channel
    pub channel_capacity: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            odom_frame: "/odom".to_string(),
            imu_frame: "/imu".to_string(),
            base_frame: "/base_footprint".to_string(),
            angular_units: AngularUnits::Radians,
            channel_capacity: 64,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Example
    /// ```no_run
    /// use disha_io::config::Config;
    ///
    /// let config = Config::load("disha-io.toml")?;
    /// # Ok::<(), disha_io::Error>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the driver cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.device.port.is_empty() {
            return Err(Error::Config("device.port must not be empty".to_string()));
        }
        if self.device.baud_rate == 0 {
            return Err(Error::Config("device.baud_rate must be non-zero".to_string()));
        }
        if self.device.byte_timeout_ms == 0 {
            return Err(Error::Config(
                "device.byte_timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.device.self_test_sync_bytes < self.device.max_sync_bytes {
            return Err(Error::Config(
                "device.self_test_sync_bytes must not be below device.max_sync_bytes".to_string(),
            ));
        }
        if self.calibration.samples == 0 {
            return Err(Error::Config(
                "calibration.samples must be at least 1".to_string(),
            ));
        }
        if self.output.channel_capacity == 0 {
            return Err(Error::Config(
                "output.channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
