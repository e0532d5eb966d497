//! Fixed-size frame buffers and the frame encoder
//!
//! ```text
//! Normal (36 bytes):
//! ┌──────────┬────────────┬─────────────┬────────┬─────┬──────┬────────┐
//! │ FE81FF55 │ gyro x,y,z │ accel x,y,z │ status │ seq │ temp │ CRC-32 │
//! │    4     │  3 × f32   │   3 × f32   │   1    │  1  │ i16  │   4    │
//! └──────────┴────────────┴─────────────┴────────┴─────┴──────┴────────┘
//!
//! BIT (11 bytes):
//! ┌──────────┬──────────────────┬──────────┐
//! │ FE8100AA │ 6 result bytes   │ checksum │
//! └──────────┴──────────────────┴──────────┘
//! ```
//!
//! All multi-byte fields are big-endian on the wire. The encoder exists for
//! simulation and tests; the live device only ever sends these frames.

use super::checksum::{additive_checksum, crc32};
use super::constants::*;
use crate::core::types::DecodedSample;

/// Frame kind, selected by header pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Streaming measurement frame
    Normal,
    /// Extended built-in test response
    BuiltInTest,
}

impl FrameKind {
    /// Header bytes that open this kind of frame
    pub const fn header(self) -> &'static [u8; HEADER_SIZE] {
        match self {
            FrameKind::Normal => &NORMAL_DATA_HEADER,
            FrameKind::BuiltInTest => &BIT_DATA_HEADER,
        }
    }

    /// Total frame size including header and trailer
    pub const fn size(self) -> usize {
        match self {
            FrameKind::Normal => NORMAL_FRAME_SIZE,
            FrameKind::BuiltInTest => BIT_FRAME_SIZE,
        }
    }

    /// Trailer size (CRC-32 or 1-byte checksum)
    pub const fn trailer_size(self) -> usize {
        match self {
            FrameKind::Normal => 4,
            FrameKind::BuiltInTest => 1,
        }
    }
}

/// One complete frame as received, header included
///
/// Invariant: exactly `kind.size()` bytes, starting with `kind.header()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame {
    kind: FrameKind,
    data: [u8; MAX_FRAME_SIZE],
}

impl RawFrame {
    /// Empty frame with the header pre-filled
    pub(crate) fn with_header(kind: FrameKind) -> Self {
        let mut data = [0u8; MAX_FRAME_SIZE];
        data[..HEADER_SIZE].copy_from_slice(kind.header());
        Self { kind, data }
    }

    /// Wrap received bytes, checking length and header
    pub fn from_bytes(kind: FrameKind, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != kind.size() || !bytes.starts_with(kind.header()) {
            return None;
        }
        let mut data = [0u8; MAX_FRAME_SIZE];
        data[..bytes.len()].copy_from_slice(bytes);
        Some(Self { kind, data })
    }

    #[inline]
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Frame bytes on the wire
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.kind.size()]
    }

    /// Everything after the header; filled by the synchronizer
    #[inline]
    pub(crate) fn body_mut(&mut self) -> &mut [u8] {
        &mut self.data[HEADER_SIZE..self.kind.size()]
    }

    /// Bytes covered by the integrity value
    #[inline]
    pub(crate) fn covered(&self) -> &[u8] {
        &self.data[..self.kind.size() - self.kind.trailer_size()]
    }

    #[inline]
    pub(crate) fn byte(&self, offset: usize) -> u8 {
        self.data[offset]
    }

    #[inline]
    pub(crate) fn be_u32(&self, offset: usize) -> u32 {
        u32::from_be_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }

    #[inline]
    pub(crate) fn be_i16(&self, offset: usize) -> i16 {
        i16::from_be_bytes([self.data[offset], self.data[offset + 1]])
    }
}

/// Field values for a normal frame, before encoding
///
/// `status` is the raw byte so invalid or reserved bits can be produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementPayload {
    pub gyro: [f32; 3],
    pub accel: [f32; 3],
    pub status: u8,
    pub sequence: u8,
    pub temperature: i16,
}

impl Default for MeasurementPayload {
    fn default() -> Self {
        Self {
            gyro: [0.0; 3],
            accel: [0.0; 3],
            status: STATUS_ALL_VALID,
            sequence: 0,
            temperature: 0,
        }
    }
}

impl MeasurementPayload {
    /// Encode into a normal frame with a correct CRC
    pub fn encode(&self) -> RawFrame {
        let mut frame = RawFrame::with_header(FrameKind::Normal);

        for (i, value) in self.gyro.iter().chain(self.accel.iter()).enumerate() {
            let offset = OFFSET_GYRO_X + 4 * i;
            frame.data[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
        }
        frame.data[OFFSET_STATUS] = self.status;
        frame.data[OFFSET_SEQUENCE] = self.sequence;
        frame.data[OFFSET_TEMPERATURE..OFFSET_TEMPERATURE + 2]
            .copy_from_slice(&self.temperature.to_be_bytes());

        let crc = crc32(frame.covered());
        frame.data[OFFSET_CRC..OFFSET_CRC + 4].copy_from_slice(&crc.to_be_bytes());
        frame
    }
}

impl From<&DecodedSample> for MeasurementPayload {
    fn from(sample: &DecodedSample) -> Self {
        let mut status = 0u8;
        let gyro_bits = [STATUS_GYRO_X, STATUS_GYRO_Y, STATUS_GYRO_Z];
        let accel_bits = [STATUS_ACCEL_X, STATUS_ACCEL_Y, STATUS_ACCEL_Z];
        for i in 0..3 {
            if sample.status.gyro[i] {
                status |= gyro_bits[i];
            }
            if sample.status.accel[i] {
                status |= accel_bits[i];
            }
        }

        Self {
            gyro: sample.gyro,
            accel: sample.accel,
            status,
            sequence: sample.sequence,
            temperature: sample.temperature,
        }
    }
}

/// Encode a BIT response frame with a correct checksum
pub fn encode_built_in_test(results: [u8; BIT_RESULT_COUNT]) -> RawFrame {
    let mut frame = RawFrame::with_header(FrameKind::BuiltInTest);
    frame.data[OFFSET_BIT_RESULTS..OFFSET_BIT_RESULTS + BIT_RESULT_COUNT]
        .copy_from_slice(&results);
    frame.data[OFFSET_BIT_CHECKSUM] = additive_checksum(frame.covered());
    frame
}
