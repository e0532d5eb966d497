//! Transport layer for I/O abstraction
//!
//! The frame synchronizer consumes one byte at a time with a bounded wait, so
//! the trait is shaped around that instead of bulk reads. Implementations are
//! free to buffer underneath.

use crate::error::Result;
use std::time::Duration;

mod mock;
mod serial;
pub use mock::MockTransport;
pub use serial::SerialTransport;

/// Blocking byte channel to the device
pub trait Transport: Send {
    /// Read one byte, waiting at most `timeout`
    ///
    /// Returns `Ok(None)` when the wait expires with nothing received.
    fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>>;

    /// Write the whole buffer
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Flush any pending writes (blocking until complete)
    fn flush(&mut self) -> Result<()>;

    /// Discard anything already received but not yet read
    fn clear_input(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>> {
        (**self).read_byte(timeout)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        (**self).write_all(data)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn clear_input(&mut self) -> Result<()> {
        (**self).clear_input()
    }
}
