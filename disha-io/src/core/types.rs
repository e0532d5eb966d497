//! Core data types shared by the decoder, calibration, and integration stages.
//!
//! - [`DecodedSample`]: One validated measurement frame in host order
//! - [`StatusFlags`]: Per-axis validity bits from the status byte
//! - [`BuiltInTestReport`]: Result of an extended built-in test (`?bit`)
//! - [`Axis`], [`AngularUnits`]: Mounting and unit conventions from config

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Sensor axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in wire order
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Array index of this axis
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Next axis in cyclic order (X → Y → Z → X)
    #[inline]
    pub const fn next(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::Z,
            Axis::Z => Axis::X,
        }
    }
}

/// Units the device reports angular rate in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngularUnits {
    Radians,
    Degrees,
}

impl AngularUnits {
    /// Convert an angle in these units to radians
    #[inline]
    pub fn to_radians(self, value: f64) -> f64 {
        match self {
            AngularUnits::Radians => value,
            AngularUnits::Degrees => value * PI / 180.0,
        }
    }
}

/// Per-axis validity bits from the measurement status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusFlags {
    pub gyro: [bool; 3],
    pub accel: [bool; 3],
}

impl StatusFlags {
    /// All six sensor elements reported a trustworthy reading
    pub fn all_valid(&self) -> bool {
        self.gyro.iter().chain(self.accel.iter()).all(|&v| v)
    }
}

/// Validated measurement frame
///
/// Only produced when every reserved bit was zero, the CRC matched, and all
/// six validity flags were set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecodedSample {
    /// Angular rate [x, y, z] in the device's configured units per second
    pub gyro: [f32; 3],
    /// Linear acceleration [x, y, z] in g
    pub accel: [f32; 3],
    /// Validity flags (always all set on a decoded sample)
    pub status: StatusFlags,
    /// Rolling sequence number
    pub sequence: u8,
    /// Sensor temperature in °C
    pub temperature: i16,
    /// CRC carried by the frame
    pub crc: u32,
}

/// Extended built-in test result
///
/// Each result byte carries seven pass bits (bits 0-6); bit 7 is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuiltInTestReport {
    pub results: [u8; 6],
    pub checksum: u8,
}

impl BuiltInTestReport {
    /// Pass-bit mask within each result byte
    pub const PASS_MASK: u8 = 0x7F;

    /// Every test bit reported pass
    pub fn all_passed(&self) -> bool {
        self.results
            .iter()
            .all(|&b| b & Self::PASS_MASK == Self::PASS_MASK)
    }

    /// Failing tests as (byte index, bit index) pairs
    pub fn failures(&self) -> Vec<(usize, u8)> {
        self.results
            .iter()
            .enumerate()
            .flat_map(|(byte, &value)| {
                (0..7u8)
                    .filter(move |bit| value & (1 << bit) == 0)
                    .map(move |bit| (byte, bit))
            })
            .collect()
    }
}
