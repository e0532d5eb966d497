//! Error types for DishaIO
//!
//! Two families matter to callers:
//! - **Transport** errors (`Serial`, `Io`, `NotOpen`, `Timeout`, `SyncLost`) are fatal
//!   for the session and are never retried internally.
//! - **Corrupt** frames (`Corrupt`) are recoverable: the frame is dropped and the
//!   caller resynchronizes on the next header.

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// DishaIO error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Device handle was not open
    #[error("Device not open")]
    NotOpen,

    /// Per-byte timeout while filling a required buffer
    #[error("Communication timeout after {read} of {expected} bytes")]
    Timeout {
        /// Bytes received before the timeout
        read: usize,
        /// Bytes required
        expected: usize,
    },

    /// Header never locked within the scan budget
    #[error("No frame header found in {scanned} bytes")]
    SyncLost {
        /// Bytes scanned before giving up
        scanned: usize,
    },

    /// Frame failed validation
    #[error("Corrupt frame: {0}")]
    Corrupt(#[from] CorruptData),

    /// Measurement requested before calibration finished
    #[error("Session is not calibrated")]
    NotCalibrated,

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for link-level failures that end the session.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Serial(_)
                | Error::Io(_)
                | Error::NotOpen
                | Error::Timeout { .. }
                | Error::SyncLost { .. }
        )
    }

    /// True for a discarded frame; the stream is still usable.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Error::Corrupt(_))
    }
}

/// Reasons a synchronized frame is rejected by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CorruptData {
    /// A reserved bit that must read zero was set
    #[error("Reserved bit {field} was not zero")]
    ReservedBitSet {
        /// Name of the reserved field
        field: &'static str,
    },

    /// Additive checksum of a self-test frame did not match
    #[error("Checksum error: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch {
        /// Checksum computed over the received bytes
        expected: u8,
        /// Checksum carried by the frame
        actual: u8,
    },

    /// CRC-32 of a measurement frame did not match
    #[error("CRC error: expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch {
        /// CRC computed over the received bytes
        expected: u32,
        /// CRC carried by the frame
        actual: u32,
    },

    /// Device flagged an axis measurement as invalid
    #[error("Status reported invalid measurement from {axis}")]
    InvalidMeasurement {
        /// Axis name, e.g. `gyro_x`
        axis: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(Error::NotOpen.is_transport());
        assert!(
            Error::Timeout {
                read: 3,
                expected: 32
            }
            .is_transport()
        );
        assert!(Error::SyncLost { scanned: 4096 }.is_transport());

        let corrupt = Error::from(CorruptData::InvalidMeasurement { axis: "gyro_x" });
        assert!(corrupt.is_corrupt());
        assert!(!corrupt.is_transport());

        assert!(!Error::Config("bad".to_string()).is_transport());
    }

    #[test]
    fn test_corrupt_messages_name_the_field() {
        let err = CorruptData::ReservedBitSet {
            field: "status_bit_7",
        };
        assert_eq!(err.to_string(), "Reserved bit status_bit_7 was not zero");

        let err = CorruptData::CrcMismatch {
            expected: 0x1234_5678,
            actual: 0,
        };
        assert_eq!(
            err.to_string(),
            "CRC error: expected 0x12345678, got 0x00000000"
        );
    }
}
