//! Frame integrity values
//!
//! - BIT frames: 8-bit additive checksum (byte sum, wrapping)
//! - Normal frames: CRC-32, poly `0x04C11DB7`, init `0xFFFFFFFF`, MSB-first,
//!   no input/output reflection, no final XOR
//!
//! The CRC is bitwise rather than table driven; a 36-byte frame at ~1 kHz is
//! well within budget.

use super::constants::{CRC_INIT, CRC_POLY};

/// 8-bit additive checksum over `data`
#[inline]
pub fn additive_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

/// CRC-32 over `data` as computed by the DSP-1750
pub fn crc32(data: &[u8]) -> u32 {
    let mut remainder = CRC_INIT;

    for &byte in data {
        remainder ^= (byte as u32) << 24;
        for _ in 0..8 {
            if remainder & 0x8000_0000 != 0 {
                remainder = (remainder << 1) ^ CRC_POLY;
            } else {
                remainder <<= 1;
            }
        }
    }

    remainder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_additive_checksum_wraps() {
        assert_eq!(additive_checksum(&[]), 0);
        assert_eq!(additive_checksum(&[0x01, 0x02, 0x03]), 0x06);
        assert_eq!(additive_checksum(&[0xFF, 0x02]), 0x01);
        // BIT header alone: FE + 81 + 00 + AA = 0x229
        assert_eq!(additive_checksum(&[0xFE, 0x81, 0x00, 0xAA]), 0x29);
    }

    #[test]
    fn test_crc32_empty_is_init() {
        assert_eq!(crc32(&[]), 0xFFFF_FFFF);
    }

    #[test]
    fn test_crc32_reference_vector() {
        // CRC-32/MPEG-2 check value: same poly, init, and no reflection or XOR-out
        assert_eq!(crc32(b"123456789"), 0x0376_E6E7);
    }

    #[test]
    fn test_crc32_short_inputs() {
        assert_eq!(crc32(&[0x00]), 0x4E08_BFB4);
        assert_eq!(crc32(&[0xFE, 0x81, 0xFF, 0x55]), 0x586A_EC15);
    }

    #[test]
    fn test_crc32_detects_every_single_bit_flip() {
        let frame: Vec<u8> = (0u8..32).map(|i| i.wrapping_mul(37)).collect();
        let reference = crc32(&frame);

        for byte in 0..frame.len() {
            for bit in 0..8 {
                let mut tampered = frame.clone();
                tampered[byte] ^= 1 << bit;
                assert_ne!(crc32(&tampered), reference, "byte {byte} bit {bit}");
            }
        }
    }
}
