//! Serial transport implementation

use super::Transport;
use crate::error::Result;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::time::Duration;

/// Bytes pulled from the driver per read syscall
const RX_CHUNK: usize = 256;

/// Serial transport for UART communication
///
/// Reads are served from a small local buffer refilled in chunks; at 921600
/// baud one syscall per byte would not keep up.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    rx: [u8; RX_CHUNK],
    head: usize,
    tail: usize,
    timeout: Duration,
}

impl SerialTransport {
    /// Open a serial port at 8N1 with no flow control
    ///
    /// # Arguments
    /// * `path` - Serial port path (e.g., "/dev/ttyUSB0")
    /// * `baud_rate` - Baud rate (e.g., 921600)
    /// * `timeout` - Initial read timeout
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(timeout)
            .open()?;

        log::info!("Opened serial port: {} at {} baud", path, baud_rate);

        Ok(SerialTransport {
            port,
            rx: [0u8; RX_CHUNK],
            head: 0,
            tail: 0,
            timeout,
        })
    }

    fn refill(&mut self, timeout: Duration) -> Result<bool> {
        if timeout != self.timeout {
            self.port.set_timeout(timeout)?;
            self.timeout = timeout;
        }

        match self.port.read(&mut self.rx) {
            Ok(0) => Ok(false),
            Ok(n) => {
                self.head = 0;
                self.tail = n;
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl Transport for SerialTransport {
    fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>> {
        if self.head == self.tail && !self.refill(timeout)? {
            return Ok(None);
        }
        let byte = self.rx[self.head];
        self.head += 1;
        Ok(Some(byte))
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.port.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.port.flush()?;
        Ok(())
    }

    fn clear_input(&mut self) -> Result<()> {
        self.head = 0;
        self.tail = 0;
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }
}
