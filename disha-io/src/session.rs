//! Device session: the driver loop
//!
//! ```text
//! open ──▶ Open ──calibrate──▶ Calibrating ──▶ Running ──close/transport error──▶ Closed
//! ```
//!
//! One session owns the device handle, the calibration engine, and the
//! integrator. Nothing survives [`Session::close`]; a new session starts from
//! scratch. A transport error closes the session before it is returned, so
//! the port is released on every exit path.

use crate::config::{Config, OutputConfig};
use crate::core::types::BuiltInTestReport;
use crate::devices::dsp1750::{Dsp1750, FrameStats};
use crate::error::{Error, Result};
use crate::sensors::{Bias, CalibrationEngine, IntegrationEngine};
use crate::streaming::{OutputSample, OutputSink};
use crate::transport::{SerialTransport, Transport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Open,
    Calibrating,
    Running,
}

/// One open device session
pub struct Session<T: Transport> {
    device: Option<Dsp1750<T>>,
    state: SessionState,
    calibration: CalibrationEngine,
    integrator: IntegrationEngine,
    bias: Option<Bias>,
    staged_output: Option<OutputConfig>,
    epoch: Instant,
}

impl Session<SerialTransport> {
    /// Open the configured serial port and start a session
    pub fn open(config: &Config) -> Result<Self> {
        let device = Dsp1750::open(&config.device)?;
        Self::start(device, config)
    }
}

impl<T: Transport> Session<T> {
    /// Start a session over an already open channel
    pub fn with_transport(transport: T, config: &Config) -> Result<Self> {
        Self::start(Dsp1750::new(transport, &config.device), config)
    }

    fn start(mut device: Dsp1750<T>, config: &Config) -> Result<Self> {
        // Binary frames only stream outside configuration mode
        device.set_config_mode(false)?;
        device.clear_input()?;

        log::info!("Session open");
        Ok(Self {
            device: Some(device),
            state: SessionState::Open,
            calibration: CalibrationEngine::new(&config.calibration),
            integrator: IntegrationEngine::new(
                config.output.clone(),
                config.calibration.gravity_axis,
            ),
            bias: None,
            staged_output: None,
            epoch: Instant::now(),
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Bias offsets, once calibrated
    pub fn bias(&self) -> Option<Bias> {
        self.bias
    }

    /// Frame counters for the open device
    pub fn stats(&self) -> Option<FrameStats> {
        self.device.as_ref().map(Dsp1750::stats)
    }

    pub fn calibration(&self) -> &CalibrationEngine {
        &self.calibration
    }

    pub fn integrator(&self) -> &IntegrationEngine {
        &self.integrator
    }

    /// Run the extended built-in test
    pub fn self_test(&mut self) -> Result<BuiltInTestReport> {
        let device = self.device.as_mut().ok_or(Error::NotOpen)?;
        match device.self_test() {
            Ok(report) => {
                if report.all_passed() {
                    log::info!("Built-in test passed");
                } else {
                    log::warn!("Built-in test failures (byte, bit): {:?}", report.failures());
                }
                Ok(report)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Calibrate the bias, then enter `Running`
    ///
    /// Runs once per session; later calls return the stored bias.
    pub fn calibrate(&mut self) -> Result<Bias> {
        if let Some(bias) = self.bias {
            return Ok(bias);
        }
        let device = self.device.as_mut().ok_or(Error::NotOpen)?;

        self.state = SessionState::Calibrating;
        let bias = match self.calibration.run(device) {
            Ok(bias) => bias,
            Err(e) => return Err(self.fail(e)),
        };

        if let Some(output) = self.staged_output.take() {
            self.integrator.set_output_config(output);
        }
        self.integrator.reset();
        self.bias = Some(bias);
        self.state = SessionState::Running;
        log::info!("Session running");
        Ok(bias)
    }

    /// Read, decode, and integrate one frame, timestamped by the session clock
    ///
    /// A corrupt frame skips the cycle and returns `Ok(None)` without touching
    /// the integrator.
    pub fn step(&mut self) -> Result<Option<OutputSample>> {
        let epoch = self.epoch;
        self.step_with(|| saturating_micros(epoch.elapsed()))
    }

    /// As [`Session::step`], with the sample timestamp supplied by the caller
    pub fn step_at(&mut self, timestamp_us: u64) -> Result<Option<OutputSample>> {
        self.step_with(|| timestamp_us)
    }

    fn step_with(&mut self, clock: impl FnOnce() -> u64) -> Result<Option<OutputSample>> {
        let device = self.device.as_mut().ok_or(Error::NotOpen)?;
        let bias = self.bias.ok_or(Error::NotCalibrated)?;

        match device.read_measurement() {
            Ok(sample) => {
                // Staged settings swap in between cycles, never mid-output
                if let Some(output) = self.staged_output.take() {
                    log::info!("Applying staged output configuration");
                    self.integrator.set_output_config(output);
                }
                Ok(self.integrator.integrate(&sample, &bias, clock()))
            }
            Err(e) if e.is_corrupt() => Ok(None),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Loop until `running` clears, publishing every output to `sink`
    ///
    /// Returns the number of outputs published.
    pub fn run<S: OutputSink + ?Sized>(&mut self, running: &AtomicBool, sink: &mut S) -> Result<u64> {
        let mut published = 0;
        while running.load(Ordering::Relaxed) {
            if let Some(output) = self.step()? {
                sink.publish(&output)?;
                published += 1;
            }
        }
        log::info!("Driver loop stopped after {} outputs", published);
        Ok(published)
    }

    /// Apply new output settings
    ///
    /// Takes effect immediately before calibration starts. Otherwise the
    /// snapshot is staged and swapped in whole at the next boundary: entry
    /// into `Running`, or the start of the next integrated cycle.
    pub fn reconfigure(&mut self, output: OutputConfig) {
        match self.state {
            SessionState::Open | SessionState::Closed => {
                self.integrator.set_output_config(output);
            }
            SessionState::Calibrating | SessionState::Running => {
                log::info!("Output configuration staged for the next cycle");
                self.staged_output = Some(output);
            }
        }
    }

    /// Output settings waiting for the next cycle boundary
    pub fn staged_output(&self) -> Option<&OutputConfig> {
        self.staged_output.as_ref()
    }

    /// Release the device and end the session
    pub fn close(&mut self) {
        if let Some(device) = self.device.take() {
            let stats = device.stats();
            drop(device);
            log::info!(
                "Session closed ({} frames decoded, {} corrupt)",
                stats.decoded,
                stats.corrupt
            );
        }
        self.staged_output = None;
        self.state = SessionState::Closed;
    }

    fn fail(&mut self, e: Error) -> Error {
        if e.is_transport() {
            log::warn!("Transport failure, closing session: {}", e);
            self.close();
        }
        e
    }
}

/// Whole microseconds in `elapsed`, clamped to `u64::MAX`
fn saturating_micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.close();
    }
}
