//! Startup bias calibration.
//!
//! Collects a fixed number of valid samples while the sensor is stationary and
//! takes the per-axis mean as the bias. The gravity-aligned accelerometer axis
//! reads −1 g at rest, so one g is added back to its mean.
//!
//! ```text
//! Uncalibrated ──add_sample──▶ Accumulating ──(count == target)──▶ Calibrated
//! ```
//!
//! Corrupt frames are counted separately and never enter the sums.

use crate::config::CalibrationConfig;
use crate::core::types::{Axis, DecodedSample};
use crate::devices::dsp1750::Dsp1750;
use crate::error::Result;
use crate::transport::Transport;
use serde::Serialize;

/// Per-axis bias offsets, in the sensor's own units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Bias {
    /// Gyro offset per axis (angular units per second)
    pub gyro: [f64; 3],
    /// Accelerometer offset per axis (g), gravity removed on the vertical axis
    pub accel: [f64; 3],
    /// Standard deviation of the gyro samples
    pub gyro_std_dev: [f64; 3],
    /// Standard deviation of the accelerometer samples
    pub accel_std_dev: [f64; 3],
}

/// Calibration progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationState {
    Uncalibrated,
    Accumulating,
    Calibrated(Bias),
}

/// Running sums for one sensor triad
#[derive(Debug, Clone, Copy, Default)]
struct Moments {
    sum: [f64; 3],
    sum_sq: [f64; 3],
}

impl Moments {
    fn add(&mut self, values: &[f32; 3]) {
        for (i, &v) in values.iter().enumerate() {
            let v = v as f64;
            self.sum[i] += v;
            self.sum_sq[i] += v * v;
        }
    }

    /// (mean, standard deviation) per axis
    fn finish(&self, n: f64) -> ([f64; 3], [f64; 3]) {
        let mean = self.sum.map(|s| s / n);
        let std_dev = std::array::from_fn(|i| {
            let variance = self.sum_sq[i] / n - mean[i] * mean[i];
            variance.max(0.0).sqrt()
        });
        (mean, std_dev)
    }
}

/// Accumulates valid samples into a [`Bias`]
#[derive(Debug)]
pub struct CalibrationEngine {
    target_samples: usize,
    gravity_axis: Axis,
    gyro: Moments,
    accel: Moments,
    count: usize,
    rejected: u64,
    state: CalibrationState,
}

impl CalibrationEngine {
    pub fn new(config: &CalibrationConfig) -> Self {
        Self {
            target_samples: config.samples.max(1),
            gravity_axis: config.gravity_axis,
            gyro: Moments::default(),
            accel: Moments::default(),
            count: 0,
            rejected: 0,
            state: CalibrationState::Uncalibrated,
        }
    }

    /// Add one valid sample.
    ///
    /// Returns the bias on the sample that completes calibration. Samples
    /// offered after that are ignored.
    pub fn add_sample(&mut self, sample: &DecodedSample) -> Option<Bias> {
        match self.state {
            CalibrationState::Calibrated(_) => return None,
            CalibrationState::Uncalibrated => {
                log::info!("Calibrating over {} samples, keep the sensor still", self.target_samples);
                self.state = CalibrationState::Accumulating;
            }
            CalibrationState::Accumulating => {}
        }

        self.gyro.add(&sample.gyro);
        self.accel.add(&sample.accel);
        self.count += 1;

        if self.count >= self.target_samples {
            return Some(self.finalize());
        }

        let step = (self.target_samples / 10).max(1);
        if self.count % step == 0 {
            log::info!("Calibration {:.0}%", self.progress() * 100.0);
        }
        None
    }

    /// Count a frame that failed validation
    pub fn record_corrupt(&mut self) {
        self.rejected += 1;
    }

    fn finalize(&mut self) -> Bias {
        let n = self.count as f64;
        let (gyro, gyro_std_dev) = self.gyro.finish(n);
        let (mut accel, accel_std_dev) = self.accel.finish(n);
        accel[self.gravity_axis.index()] += 1.0;

        let bias = Bias {
            gyro,
            accel,
            gyro_std_dev,
            accel_std_dev,
        };

        log::info!(
            "Calibration complete: {} samples, {} frames rejected",
            self.count,
            self.rejected
        );
        log::debug!("Gyro bias: {:?} (σ {:?})", bias.gyro, bias.gyro_std_dev);
        log::debug!("Accel bias: {:?} (σ {:?})", bias.accel, bias.accel_std_dev);

        self.state = CalibrationState::Calibrated(bias);
        bias
    }

    /// Calibrate from the device, blocking until done.
    ///
    /// Corrupt frames are skipped without counting. Transport errors end the
    /// run and propagate.
    pub fn run<T: Transport>(&mut self, device: &mut Dsp1750<T>) -> Result<Bias> {
        if let CalibrationState::Calibrated(bias) = self.state {
            return Ok(bias);
        }

        loop {
            match device.read_measurement() {
                Ok(sample) => {
                    if let Some(bias) = self.add_sample(&sample) {
                        return Ok(bias);
                    }
                }
                Err(e) if e.is_corrupt() => self.record_corrupt(),
                Err(e) => return Err(e),
            }
        }
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    pub fn is_calibrated(&self) -> bool {
        matches!(self.state, CalibrationState::Calibrated(_))
    }

    /// Bias once calibrated
    pub fn bias(&self) -> Option<Bias> {
        match self.state {
            CalibrationState::Calibrated(bias) => Some(bias),
            _ => None,
        }
    }

    /// Valid samples accumulated so far
    pub fn sample_count(&self) -> usize {
        self.count
    }

    /// Frames rejected during accumulation
    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }

    /// Fraction of the target reached (0.0 to 1.0)
    pub fn progress(&self) -> f32 {
        (self.count as f32 / self.target_samples as f32).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::StatusFlags;
    use approx::assert_relative_eq;

    fn sample(gyro: [f32; 3], accel: [f32; 3]) -> DecodedSample {
        DecodedSample {
            gyro,
            accel,
            status: StatusFlags {
                gyro: [true; 3],
                accel: [true; 3],
            },
            sequence: 0,
            temperature: 25,
            crc: 0,
        }
    }

    fn engine(samples: usize, gravity_axis: Axis) -> CalibrationEngine {
        CalibrationEngine::new(&CalibrationConfig {
            samples,
            gravity_axis,
        })
    }

    #[test]
    fn test_state_transitions() {
        let mut cal = engine(3, Axis::X);
        assert_eq!(cal.state(), CalibrationState::Uncalibrated);

        assert!(cal.add_sample(&sample([0.0; 3], [-1.0, 0.0, 0.0])).is_none());
        assert_eq!(cal.state(), CalibrationState::Accumulating);
        assert!(cal.add_sample(&sample([0.0; 3], [-1.0, 0.0, 0.0])).is_none());

        let bias = cal.add_sample(&sample([0.0; 3], [-1.0, 0.0, 0.0])).unwrap();
        assert!(cal.is_calibrated());
        assert_eq!(cal.bias(), Some(bias));
        assert_relative_eq!(cal.progress(), 1.0);
    }

    #[test]
    fn test_bias_is_mean_with_gravity_removed() {
        let mut cal = engine(4, Axis::X);
        let readings = [
            ([0.01, -0.02, 0.5], [-1.01, 0.02, 0.10]),
            ([0.03, -0.02, 0.7], [-0.99, 0.04, 0.10]),
            ([0.01, -0.04, 0.5], [-1.02, 0.00, 0.20]),
            ([0.03, -0.04, 0.7], [-0.98, 0.02, 0.20]),
        ];

        let mut bias = None;
        for (gyro, accel) in readings {
            bias = cal.add_sample(&sample(gyro, accel));
        }
        let bias = bias.unwrap();

        assert_relative_eq!(bias.gyro[0], 0.02, epsilon = 1e-6);
        assert_relative_eq!(bias.gyro[1], -0.03, epsilon = 1e-6);
        assert_relative_eq!(bias.gyro[2], 0.6, epsilon = 1e-6);
        assert_relative_eq!(bias.accel[0], 0.0, epsilon = 1e-6); // mean -1.0 + 1
        assert_relative_eq!(bias.accel[1], 0.02, epsilon = 1e-6);
        assert_relative_eq!(bias.accel[2], 0.15, epsilon = 1e-6);

        assert_relative_eq!(bias.gyro_std_dev[2], 0.1, epsilon = 1e-5);
        assert_relative_eq!(bias.accel_std_dev[2], 0.05, epsilon = 1e-5);
    }

    #[test]
    fn test_gravity_axis_is_configurable() {
        let mut cal = engine(1, Axis::Z);
        let bias = cal
            .add_sample(&sample([0.0; 3], [0.0, 0.0, -1.0]))
            .unwrap();
        assert_relative_eq!(bias.accel[0], 0.0);
        assert_relative_eq!(bias.accel[2], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_corrupt_frames_do_not_count() {
        let mut cal = engine(2, Axis::X);
        cal.record_corrupt();
        cal.add_sample(&sample([1.0; 3], [0.0; 3]));
        cal.record_corrupt();
        cal.record_corrupt();

        assert_eq!(cal.sample_count(), 1);
        assert_eq!(cal.rejected_count(), 3);
        assert_relative_eq!(cal.progress(), 0.5);
        assert!(!cal.is_calibrated());
    }

    #[test]
    fn test_samples_after_calibration_ignored() {
        let mut cal = engine(1, Axis::X);
        let bias = cal.add_sample(&sample([0.5; 3], [0.0; 3])).unwrap();
        assert!(cal.add_sample(&sample([9.0; 3], [9.0; 3])).is_none());
        assert_eq!(cal.bias(), Some(bias));
        assert_eq!(cal.sample_count(), 1);
    }
}
