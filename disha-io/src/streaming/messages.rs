//! Message types handed to output consumers.
//!
//! Two estimates are produced together every output cycle:
//! - [`PoseEstimate`]: odometry-style pose with a 6×6 covariance
//! - [`InertialEstimate`]: IMU-style orientation, yaw only, with 3×3 covariances
//!
//! Covariance tables are row-major with the variances on the diagonal. A
//! variance of 99999 marks a quantity this driver does not estimate.

use crate::sensors::orientation::Quaternion;
use serde::Serialize;

/// Periodic summary from the integration engine
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OutputSample {
    /// Timestamp of the sample that triggered the output, in microseconds
    pub timestamp_us: u64,
    /// Number of outputs emitted this session, starting at 1
    pub sequence: u64,
    pub pose: PoseEstimate,
    pub inertial: InertialEstimate,
}

/// Dead-reckoning pose in the odometry frame
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PoseEstimate {
    /// Parent frame, e.g. `/odom`
    pub frame_id: String,
    /// Child frame, e.g. `/imu`
    pub child_frame_id: String,
    /// Doubly integrated position in metres (untrusted)
    pub position: [f64; 3],
    /// Integrated velocity in m/s
    pub velocity: [f64; 3],
    pub orientation: Quaternion,
    /// Row-major over (x, y, z, rx, ry, rz)
    pub covariance: [[f64; 6]; 6],
}

/// Inertial-style message for an external fusion consumer
///
/// Only yaw is reported in `orientation`; roll and pitch are zero.
/// Angular velocity and linear acceleration are not produced and stay zero.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct InertialEstimate {
    pub frame_id: String,
    pub orientation: Quaternion,
    pub orientation_covariance: [[f64; 3]; 3],
    pub angular_velocity: [f64; 3],
    pub angular_velocity_covariance: [[f64; 3]; 3],
    pub linear_acceleration: [f64; 3],
    pub linear_acceleration_covariance: [[f64; 3]; 3],
}

/// Square matrix with `values` on the diagonal and zeros elsewhere
pub fn diagonal<const N: usize>(values: [f64; N]) -> [[f64; N]; N] {
    let mut matrix = [[0.0; N]; N];
    for (i, value) in values.into_iter().enumerate() {
        matrix[i][i] = value;
    }
    matrix
}
