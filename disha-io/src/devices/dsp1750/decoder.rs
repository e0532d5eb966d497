//! Frame validation and decoding
//!
//! Checks run in a fixed order and the first failure wins:
//! 1. Reserved-zero bits
//! 2. Additive checksum (BIT) or CRC-32 (normal)
//! 3. Big-endian to host conversion
//! 4. Per-axis validity flags (normal frames only)
//!
//! A failed frame is dropped whole; nothing from it reaches the caller.

use super::checksum::{additive_checksum, crc32};
use super::constants::*;
use super::frame::{FrameKind, RawFrame};
use crate::core::types::{BuiltInTestReport, DecodedSample, StatusFlags};
use crate::error::CorruptData;

/// Reserved status bits and their field names
const STATUS_RESERVED: [(u8, &str); 2] = [
    (STATUS_RESERVED_3, "status_bit_3"),
    (STATUS_RESERVED_7, "status_bit_7"),
];

/// Validity bits in wire order
const GYRO_VALID: [(u8, &str); 3] = [
    (STATUS_GYRO_X, "gyro_x"),
    (STATUS_GYRO_Y, "gyro_y"),
    (STATUS_GYRO_Z, "gyro_z"),
];
const ACCEL_VALID: [(u8, &str); 3] = [
    (STATUS_ACCEL_X, "accel_x"),
    (STATUS_ACCEL_Y, "accel_y"),
    (STATUS_ACCEL_Z, "accel_z"),
];

const BIT_RESERVED_FIELDS: [&str; BIT_RESULT_COUNT] = [
    "bit_byte_0",
    "bit_byte_1",
    "bit_byte_2",
    "bit_byte_3",
    "bit_byte_4",
    "bit_byte_5",
];

/// Successfully decoded frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decoded {
    Sample(DecodedSample),
    SelfTest(BuiltInTestReport),
}

/// Decode a synchronized frame according to its kind
pub fn decode(frame: &RawFrame) -> Result<Decoded, CorruptData> {
    match frame.kind() {
        FrameKind::Normal => decode_measurement(frame).map(Decoded::Sample),
        FrameKind::BuiltInTest => decode_built_in_test(frame).map(Decoded::SelfTest),
    }
}

/// Decode a normal measurement frame
pub(crate) fn decode_measurement(frame: &RawFrame) -> Result<DecodedSample, CorruptData> {
    debug_assert_eq!(frame.kind(), FrameKind::Normal);

    let status = frame.byte(OFFSET_STATUS);
    for (mask, field) in STATUS_RESERVED {
        if status & mask != 0 {
            return Err(CorruptData::ReservedBitSet { field });
        }
    }

    let expected = crc32(frame.covered());
    let actual = frame.be_u32(OFFSET_CRC);
    if expected != actual {
        return Err(CorruptData::CrcMismatch { expected, actual });
    }

    let gyro = std::array::from_fn(|i| f32::from_bits(frame.be_u32(OFFSET_GYRO_X + 4 * i)));
    let accel = std::array::from_fn(|i| f32::from_bits(frame.be_u32(OFFSET_ACCEL_X + 4 * i)));

    for (mask, axis) in GYRO_VALID.into_iter().chain(ACCEL_VALID) {
        if status & mask == 0 {
            return Err(CorruptData::InvalidMeasurement { axis });
        }
    }

    Ok(DecodedSample {
        gyro,
        accel,
        status: StatusFlags {
            gyro: GYRO_VALID.map(|(mask, _)| status & mask != 0),
            accel: ACCEL_VALID.map(|(mask, _)| status & mask != 0),
        },
        sequence: frame.byte(OFFSET_SEQUENCE),
        temperature: frame.be_i16(OFFSET_TEMPERATURE),
        crc: actual,
    })
}

/// Decode an extended built-in test response
pub(crate) fn decode_built_in_test(frame: &RawFrame) -> Result<BuiltInTestReport, CorruptData> {
    debug_assert_eq!(frame.kind(), FrameKind::BuiltInTest);

    let mut results = [0u8; BIT_RESULT_COUNT];
    for (i, result) in results.iter_mut().enumerate() {
        *result = frame.byte(OFFSET_BIT_RESULTS + i);
        if *result & BIT_RESERVED != 0 {
            return Err(CorruptData::ReservedBitSet {
                field: BIT_RESERVED_FIELDS[i],
            });
        }
    }

    let expected = additive_checksum(frame.covered());
    let actual = frame.byte(OFFSET_BIT_CHECKSUM);
    if expected != actual {
        return Err(CorruptData::ChecksumMismatch { expected, actual });
    }

    Ok(BuiltInTestReport {
        results,
        checksum: actual,
    })
}
