//! Header synchronization
//!
//! Scans the byte stream for a frame header one byte at a time, then reads the
//! rest of the frame.
//!
//! # Restriction
//!
//! The scan is a naive non-overlapping match: a mismatching byte resets the
//! match index to zero and is *not* re-tested against `header[0]`. This is only
//! correct because neither DSP-1750 header has a proper prefix that is also a
//! suffix. Stream `FE 81 FE 81 FF 55` therefore misses the frame starting at the
//! second `FE`. A future header that overlaps itself would need a partial-match
//! table here.

use super::constants::HEADER_SIZE;
use super::frame::{FrameKind, RawFrame};
use crate::error::{Error, Result};
use crate::transport::Transport;
use std::time::Duration;

/// Locks onto frame headers in a byte stream
#[derive(Debug, Clone, Copy)]
pub struct FrameSynchronizer {
    byte_timeout: Duration,
    max_scan: usize,
}

impl FrameSynchronizer {
    /// # Arguments
    /// * `byte_timeout` - Wait bound for every single byte
    /// * `max_scan` - Bytes examined for a header before giving up
    pub fn new(byte_timeout: Duration, max_scan: usize) -> Self {
        Self {
            byte_timeout,
            max_scan: max_scan.max(HEADER_SIZE),
        }
    }

    pub fn byte_timeout(&self) -> Duration {
        self.byte_timeout
    }

    /// Read the next complete frame of `kind`
    ///
    /// Bytes before the header are discarded. Any per-byte timeout, or a scan
    /// longer than `max_scan`, is a transport error.
    pub fn sync<T: Transport + ?Sized>(&self, channel: &mut T, kind: FrameKind) -> Result<RawFrame> {
        let header = kind.header();
        let mut index = 0;
        let mut scanned = 0;

        while index < header.len() {
            if scanned >= self.max_scan {
                return Err(Error::SyncLost { scanned });
            }
            let byte = channel
                .read_byte(self.byte_timeout)?
                .ok_or(Error::Timeout {
                    read: index,
                    expected: kind.size(),
                })?;
            scanned += 1;

            if byte == header[index] {
                index += 1;
            } else {
                index = 0;
            }
        }

        if scanned > header.len() {
            log::trace!("Skipped {} bytes before {:?} header", scanned - header.len(), kind);
        }

        let mut frame = RawFrame::with_header(kind);
        for (read, slot) in frame.body_mut().iter_mut().enumerate() {
            *slot = channel
                .read_byte(self.byte_timeout)?
                .ok_or(Error::Timeout {
                    read: HEADER_SIZE + read,
                    expected: kind.size(),
                })?;
        }

        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::dsp1750::frame::{MeasurementPayload, encode_built_in_test};
    use crate::transport::MockTransport;

    fn synchronizer() -> FrameSynchronizer {
        FrameSynchronizer::new(Duration::from_millis(10), 4096)
    }

    fn sample_frame(sequence: u8) -> RawFrame {
        MeasurementPayload {
            gyro: [0.25, -0.5, 1.0],
            accel: [-1.0, 0.01, 0.02],
            sequence,
            temperature: 31,
            ..Default::default()
        }
        .encode()
    }

    #[test]
    fn test_sync_skips_leading_noise() {
        let frame = sample_frame(7);
        let mut port = MockTransport::new();
        port.inject_read(&[0x00, 0x13, 0xFE, 0x37, 0x55, 0xFF, 0x81]);
        port.inject_read(frame.as_bytes());

        let synced = synchronizer().sync(&mut port, FrameKind::Normal).unwrap();
        assert_eq!(synced, frame);
        assert_eq!(port.pending_read(), 0);
    }

    #[test]
    fn test_partial_header_restarts_match() {
        let frame = sample_frame(1);
        let mut port = MockTransport::new();
        // FE 81 FF then a non-matching byte: must not lock early
        port.inject_read(&[0xFE, 0x81, 0xFF, 0x00]);
        port.inject_read(frame.as_bytes());

        let synced = synchronizer().sync(&mut port, FrameKind::Normal).unwrap();
        assert_eq!(synced, frame);
    }

    #[test]
    fn test_mismatching_byte_is_not_reused() {
        let first = sample_frame(1);
        let second = sample_frame(2);
        let mut port = MockTransport::new();
        // The second FE breaks the match and is consumed, so the first frame is lost
        port.inject_read(&[0xFE, 0x81]);
        port.inject_read(first.as_bytes());
        port.inject_read(second.as_bytes());

        let synced = synchronizer().sync(&mut port, FrameKind::Normal).unwrap();
        assert_eq!(synced, second);
    }

    #[test]
    fn test_sync_selects_frame_kind() {
        let normal = sample_frame(3);
        let bit = encode_built_in_test([0x7F; 6]);
        let mut port = MockTransport::new();
        port.inject_read(normal.as_bytes());
        port.inject_read(bit.as_bytes());

        let synced = synchronizer().sync(&mut port, FrameKind::BuiltInTest).unwrap();
        assert_eq!(synced, bit);
    }

    #[test]
    fn test_truncated_frame_is_transport_error() {
        let frame = sample_frame(4);
        let mut port = MockTransport::new();
        port.inject_read(&frame.as_bytes()[..20]);

        let err = synchronizer().sync(&mut port, FrameKind::Normal).unwrap_err();
        assert!(matches!(
            err,
            Error::Timeout {
                read: 20,
                expected: 36
            }
        ));
        assert!(err.is_transport());
    }

    #[test]
    fn test_silent_link_times_out() {
        let mut port = MockTransport::new();
        let err = synchronizer().sync(&mut port, FrameKind::Normal).unwrap_err();
        assert!(matches!(err, Error::Timeout { read: 0, .. }));
    }

    #[test]
    fn test_scan_budget_exhausted() {
        let mut port = MockTransport::new();
        port.inject_read(&[0xAB; 100]);

        let err = FrameSynchronizer::new(Duration::from_millis(10), 64)
            .sync(&mut port, FrameKind::Normal)
            .unwrap_err();
        assert!(matches!(err, Error::SyncLost { scanned: 64 }));
    }
}
