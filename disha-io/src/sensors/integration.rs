//! Dead-reckoning integration.
//!
//! Bias-corrected gyro rates are Euler-integrated into cumulative angles, and
//! bias-corrected accelerations are integrated twice into velocity and
//! position. Both drift without bound; nothing here corrects for it.
//!
//! The first sample after construction or [`IntegrationEngine::reset`] only
//! establishes the time baseline and is not integrated.

use super::calibration::Bias;
use super::orientation::Quaternion;
use crate::config::OutputConfig;
use crate::core::types::{Axis, DecodedSample};
use crate::devices::dsp1750::constants::STANDARD_GRAVITY;
use crate::streaming::messages::{InertialEstimate, OutputSample, PoseEstimate, diagonal};

/// Integration cycles per emitted output
pub const OUTPUT_CADENCE: u32 = 50;

/// Placeholder variance for quantities this driver does not estimate
pub const UNTRUSTED_VARIANCE: f64 = 99999.0;

/// Pose rotation variance (rx, ry, rz)
const ROTATION_VARIANCE: f64 = 0.001;

/// Inertial orientation variance; yaw is the only reported angle
const ORIENTATION_VARIANCE: [f64; 3] = [0.001, 0.001, 0.000_001];

/// Integrator for one device session
#[derive(Debug, Clone)]
pub struct IntegrationEngine {
    angles: [f64; 3],
    velocity: [f64; 3],
    position: [f64; 3],
    last_timestamp_us: Option<u64>,
    cadence: u32,
    emitted: u64,
    output: OutputConfig,
    vertical_axis: Axis,
}

impl IntegrationEngine {
    /// # Arguments
    /// * `output` - Frame ids and angular units for emitted samples
    /// * `vertical_axis` - Axis whose angle is reported as yaw
    pub fn new(output: OutputConfig, vertical_axis: Axis) -> Self {
        Self {
            angles: [0.0; 3],
            velocity: [0.0; 3],
            position: [0.0; 3],
            last_timestamp_us: None,
            cadence: 0,
            emitted: 0,
            output,
            vertical_axis,
        }
    }

    /// Return to the freshly constructed state
    pub fn reset(&mut self) {
        self.angles = [0.0; 3];
        self.velocity = [0.0; 3];
        self.position = [0.0; 3];
        self.last_timestamp_us = None;
        self.cadence = 0;
        self.emitted = 0;
    }

    /// Swap in a new output configuration
    pub fn set_output_config(&mut self, output: OutputConfig) {
        self.output = output;
    }

    /// Integrate one sample taken at `timestamp_us` (monotonic microseconds).
    ///
    /// Returns an [`OutputSample`] on every [`OUTPUT_CADENCE`]th integrated
    /// sample. A timestamp earlier than the previous one counts as no elapsed
    /// time.
    pub fn integrate(
        &mut self,
        sample: &DecodedSample,
        bias: &Bias,
        timestamp_us: u64,
    ) -> Option<OutputSample> {
        let last = self.last_timestamp_us.replace(timestamp_us)?;
        let dt = timestamp_us.saturating_sub(last) as f64 / 1_000_000.0;

        for i in 0..3 {
            self.angles[i] += (sample.gyro[i] as f64 - bias.gyro[i]) * dt;

            let accel = (sample.accel[i] as f64 - bias.accel[i]) * STANDARD_GRAVITY;
            self.velocity[i] += accel * dt;
            self.position[i] += self.velocity[i] * dt;
        }

        self.cadence += 1;
        if self.cadence < OUTPUT_CADENCE {
            return None;
        }
        self.cadence = 0;
        self.emitted += 1;

        let output = self.snapshot(timestamp_us);
        log::debug!(
            "Output {}: angles {:?}, position {:?}",
            output.sequence,
            self.angles,
            self.position
        );
        Some(output)
    }

    /// (roll, pitch, yaw) in radians from the cumulative angles
    pub fn euler(&self) -> (f64, f64, f64) {
        let units = self.output.angular_units;
        let roll_axis = self.vertical_axis.next();
        let pitch_axis = roll_axis.next();
        (
            units.to_radians(self.angles[roll_axis.index()]),
            units.to_radians(self.angles[pitch_axis.index()]),
            units.to_radians(self.angles[self.vertical_axis.index()]),
        )
    }

    fn snapshot(&self, timestamp_us: u64) -> OutputSample {
        let (roll, pitch, yaw) = self.euler();

        let mut pose_variance = [UNTRUSTED_VARIANCE; 6];
        pose_variance[3..].fill(ROTATION_VARIANCE);

        OutputSample {
            timestamp_us,
            sequence: self.emitted,
            pose: PoseEstimate {
                frame_id: self.output.odom_frame.clone(),
                child_frame_id: self.output.imu_frame.clone(),
                position: self.position,
                velocity: self.velocity,
                orientation: Quaternion::from_euler(roll, pitch, yaw),
                covariance: diagonal(pose_variance),
            },
            inertial: InertialEstimate {
                frame_id: self.output.base_frame.clone(),
                orientation: Quaternion::from_euler(0.0, 0.0, yaw),
                orientation_covariance: diagonal(ORIENTATION_VARIANCE),
                angular_velocity: [0.0; 3],
                angular_velocity_covariance: diagonal([UNTRUSTED_VARIANCE; 3]),
                linear_acceleration: [0.0; 3],
                linear_acceleration_covariance: diagonal([UNTRUSTED_VARIANCE; 3]),
            },
        }
    }

    /// Cumulative angle per axis, in the device's angular units
    pub fn angles(&self) -> [f64; 3] {
        self.angles
    }

    pub fn velocity(&self) -> [f64; 3] {
        self.velocity
    }

    pub fn position(&self) -> [f64; 3] {
        self.position
    }

    /// Integrated samples since the last output
    pub fn cadence_count(&self) -> u32 {
        self.cadence
    }

    pub fn is_initialized(&self) -> bool {
        self.last_timestamp_us.is_some()
    }
}
