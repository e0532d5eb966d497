//! KVH DSP-1750 fiber-optic IMU
//!
//! The sensor streams 36-byte measurement frames over RS-422 at 921600 8N1
//! once configuration mode is left. A `?bit` request is answered with a single
//! 11-byte built-in test frame interleaved into the stream.
//!
//! - [`FrameSynchronizer`]: header scan and frame read
//! - [`decoder`]: reserved-bit, integrity, and validity checks
//! - [`Dsp1750`]: command and read surface used by the session

pub mod checksum;
pub mod constants;
pub mod decoder;
pub mod frame;
pub mod sync;

pub use decoder::{Decoded, decode};
pub use frame::{FrameKind, MeasurementPayload, RawFrame, encode_built_in_test};
pub use sync::FrameSynchronizer;

use crate::config::DeviceConfig;
use crate::core::types::{BuiltInTestReport, DecodedSample};
use crate::error::{CorruptData, Error, Result};
use crate::transport::{SerialTransport, Transport};
use constants::{CMD_BUILT_IN_TEST, CMD_CONFIG_ENTER, CMD_CONFIG_LEAVE};

/// Frame counters for one device handle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames that passed every check
    pub decoded: u64,
    /// Frames dropped by the decoder
    pub corrupt: u64,
}

/// DSP-1750 on an owned byte channel
///
/// Dropping the device drops the transport, which closes the port.
pub struct Dsp1750<T: Transport> {
    transport: T,
    synchronizer: FrameSynchronizer,
    self_test_synchronizer: FrameSynchronizer,
    stats: FrameStats,
}

impl Dsp1750<SerialTransport> {
    /// Open the configured serial port
    pub fn open(config: &DeviceConfig) -> Result<Self> {
        let transport =
            SerialTransport::open(&config.port, config.baud_rate, config.byte_timeout())?;
        log::debug!("DSP-1750 attached on {}", config.port);
        Ok(Self::new(transport, config))
    }
}

impl<T: Transport> Dsp1750<T> {
    /// Wrap an already open channel
    pub fn new(transport: T, config: &DeviceConfig) -> Self {
        Self {
            transport,
            synchronizer: FrameSynchronizer::new(config.byte_timeout(), config.max_sync_bytes),
            self_test_synchronizer: FrameSynchronizer::new(
                config.byte_timeout(),
                config.self_test_sync_bytes,
            ),
            stats: FrameStats::default(),
        }
    }

    /// Enter (`true`) or leave (`false`) configuration mode
    ///
    /// Binary frames only stream outside configuration mode.
    pub fn set_config_mode(&mut self, enabled: bool) -> Result<()> {
        let command = if enabled {
            CMD_CONFIG_ENTER
        } else {
            CMD_CONFIG_LEAVE
        };
        self.send(command)?;
        log::debug!("Configuration mode {}", if enabled { "entered" } else { "left" });
        Ok(())
    }

    /// Synchronize on the next frame of `kind` without validating it
    pub fn read_frame(&mut self, kind: FrameKind) -> Result<RawFrame> {
        self.synchronizer.sync(&mut self.transport, kind)
    }

    /// Read and decode the next measurement frame
    ///
    /// A frame that fails validation is logged, counted, and returned as
    /// [`Error::Corrupt`]; the next call resynchronizes.
    pub fn read_measurement(&mut self) -> Result<DecodedSample> {
        let frame = self.read_frame(FrameKind::Normal)?;
        match decoder::decode_measurement(&frame) {
            Ok(sample) => {
                self.stats.decoded += 1;
                Ok(sample)
            }
            Err(e) => Err(self.reject(e)),
        }
    }

    /// Request and decode an extended built-in test
    ///
    /// Measurement frames already in flight are skipped by the header scan,
    /// bounded by `self_test_sync_bytes` rather than `max_sync_bytes`.
    pub fn self_test(&mut self) -> Result<BuiltInTestReport> {
        self.send(CMD_BUILT_IN_TEST)?;
        let frame = self
            .self_test_synchronizer
            .sync(&mut self.transport, FrameKind::BuiltInTest)?;
        match decoder::decode_built_in_test(&frame) {
            Ok(report) => {
                self.stats.decoded += 1;
                Ok(report)
            }
            Err(e) => Err(self.reject(e)),
        }
    }

    /// Discard bytes buffered by the OS
    pub fn clear_input(&mut self) -> Result<()> {
        self.transport.clear_input()
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    fn send(&mut self, command: &[u8]) -> Result<()> {
        self.transport.write_all(command)?;
        self.transport.flush()
    }

    fn reject(&mut self, reason: CorruptData) -> Error {
        self.stats.corrupt += 1;
        log::warn!("Discarding frame: {}", reason);
        Error::Corrupt(reason)
    }
}
