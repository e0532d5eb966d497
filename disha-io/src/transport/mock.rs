//! Mock transport for testing

use super::Transport;
use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// In-memory transport for unit and integration tests
///
/// Clones share the same buffers, so a test keeps one handle to inject bytes
/// and inspect writes while the session owns another. Reads never block: an
/// empty buffer behaves like an expired timeout.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

struct MockTransportInner {
    read_buffer: VecDeque<u8>,
    write_buffer: Vec<u8>,
    disconnected: bool,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        MockTransport {
            inner: Arc::new(Mutex::new(MockTransportInner {
                read_buffer: VecDeque::new(),
                write_buffer: Vec::new(),
                disconnected: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Inject data to be read
    pub fn inject_read(&self, data: &[u8]) {
        self.lock().read_buffer.extend(data);
    }

    /// Bytes injected but not yet consumed
    pub fn pending_read(&self) -> usize {
        self.lock().read_buffer.len()
    }

    /// Get all written data
    pub fn get_written(&self) -> Vec<u8> {
        self.lock().write_buffer.clone()
    }

    /// Clear written data
    pub fn clear_written(&self) {
        self.lock().write_buffer.clear();
    }

    /// Make every subsequent read and write fail like an unplugged adapter
    pub fn disconnect(&self) {
        self.lock().disconnected = true;
    }

    /// Number of live handles sharing this mock
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

fn unplugged() -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::BrokenPipe,
        "mock transport disconnected",
    ))
}

impl Transport for MockTransport {
    fn read_byte(&mut self, _timeout: Duration) -> Result<Option<u8>> {
        let mut inner = self.lock();
        if inner.disconnected {
            return Err(unplugged());
        }
        Ok(inner.read_buffer.pop_front())
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut inner = self.lock();
        if inner.disconnected {
            return Err(unplugged());
        }
        inner.write_buffer.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_buffers() {
        let link = MockTransport::new();
        let mut port = link.clone();
        assert_eq!(link.handle_count(), 2);

        link.inject_read(&[0xFE, 0x81]);
        assert_eq!(port.read_byte(Duration::ZERO).unwrap(), Some(0xFE));
        assert_eq!(port.read_byte(Duration::ZERO).unwrap(), Some(0x81));
        assert_eq!(port.read_byte(Duration::ZERO).unwrap(), None);

        port.write_all(b"?bit\n").unwrap();
        assert_eq!(link.get_written(), b"?bit\n");

        drop(port);
        assert_eq!(link.handle_count(), 1);
    }

    #[test]
    fn test_disconnect_fails_io() {
        let link = MockTransport::new();
        let mut port = link.clone();
        link.inject_read(&[1, 2, 3]);
        link.disconnect();

        let err = port.read_byte(Duration::ZERO).unwrap_err();
        assert!(err.is_transport());
        assert!(port.write_all(b"x").is_err());
    }
}
