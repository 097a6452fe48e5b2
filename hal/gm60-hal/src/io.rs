//! `embedded-io` adapter
//!
//! Most HALs expose their UARTs through the blocking `embedded-io` traits.
//! [`IoChannel`] turns such a port into a [`SerialChannel`] so it can be
//! handed straight to the scanner session.

use embedded_io::{Read, ReadReady, Write};

use crate::uart::SerialChannel;

/// [`SerialChannel`] over a blocking `embedded-io` port
pub struct IoChannel<T> {
    port: T,
}

impl<T> IoChannel<T> {
    /// Wrap a port
    pub fn new(port: T) -> Self {
        Self { port }
    }

    /// Borrow the wrapped port
    pub fn port(&mut self) -> &mut T {
        &mut self.port
    }

    /// Release the wrapped port
    pub fn into_inner(self) -> T {
        self.port
    }
}

impl<T> SerialChannel for IoChannel<T>
where
    T: Read + ReadReady + Write,
{
    type Error = T::Error;

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.port.write_all(data)
    }

    /// `flush` only returns once the transmitter is idle, so a successful
    /// flush is the completion signal.
    fn is_transmit_complete(&mut self) -> Result<bool, Self::Error> {
        self.port.flush()?;
        Ok(true)
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut filled = 0;
        // read() blocks on an empty port, so gate every call on read_ready()
        while filled < buf.len() && self.port.read_ready()? {
            let n = self.port.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    fn has_data_available(&mut self) -> Result<bool, Self::Error> {
        self.port.read_ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{ErrorKind, ErrorType};

    /// Loopback-style port with a fixed RX script
    struct FakePort {
        rx: [u8; 16],
        rx_len: usize,
        rx_pos: usize,
        tx: [u8; 16],
        tx_len: usize,
        flushes: usize,
        /// Max bytes handed out per read() call
        chunk: usize,
    }

    impl FakePort {
        fn with_rx(data: &[u8], chunk: usize) -> Self {
            let mut rx = [0u8; 16];
            rx[..data.len()].copy_from_slice(data);
            Self {
                rx,
                rx_len: data.len(),
                rx_pos: 0,
                tx: [0u8; 16],
                tx_len: 0,
                flushes: 0,
                chunk,
            }
        }
    }

    impl ErrorType for FakePort {
        type Error = ErrorKind;
    }

    impl Read for FakePort {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let remaining = self.rx_len - self.rx_pos;
            let n = remaining.min(buf.len()).min(self.chunk);
            buf[..n].copy_from_slice(&self.rx[self.rx_pos..self.rx_pos + n]);
            self.rx_pos += n;
            Ok(n)
        }
    }

    impl ReadReady for FakePort {
        fn read_ready(&mut self) -> Result<bool, Self::Error> {
            Ok(self.rx_pos < self.rx_len)
        }
    }

    impl Write for FakePort {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            let n = buf.len().min(self.tx.len() - self.tx_len);
            if n == 0 && !buf.is_empty() {
                return Err(ErrorKind::OutOfMemory);
            }
            self.tx[self.tx_len..self.tx_len + n].copy_from_slice(&buf[..n]);
            self.tx_len += n;
            Ok(n)
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_write_forwards_all_bytes() {
        let mut channel = IoChannel::new(FakePort::with_rx(&[], 1));
        channel.write(&[0x7E, 0x00, 0x07]).unwrap();

        let port = channel.into_inner();
        assert_eq!(&port.tx[..port.tx_len], &[0x7E, 0x00, 0x07]);
    }

    #[test]
    fn test_transmit_complete_flushes() {
        let mut channel = IoChannel::new(FakePort::with_rx(&[], 1));
        assert!(channel.is_transmit_complete().unwrap());
        assert_eq!(channel.port().flushes, 1);
    }

    #[test]
    fn test_read_available_drains_in_chunks() {
        let mut channel = IoChannel::new(FakePort::with_rx(&[1, 2, 3, 4, 5], 2));
        let mut buf = [0u8; 8];

        assert!(channel.has_data_available().unwrap());
        let n = channel.read_available(&mut buf).unwrap();

        assert_eq!(n, 5);
        assert_eq!(&buf[..n], &[1, 2, 3, 4, 5]);
        assert!(!channel.has_data_available().unwrap());
    }

    #[test]
    fn test_read_available_on_idle_port_returns_zero() {
        let mut channel = IoChannel::new(FakePort::with_rx(&[], 1));
        let mut buf = [0u8; 8];
        assert_eq!(channel.read_available(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_read_available_stops_at_buffer_end() {
        let mut channel = IoChannel::new(FakePort::with_rx(&[9, 8, 7, 6], 4));
        let mut buf = [0u8; 3];

        assert_eq!(channel.read_available(&mut buf).unwrap(), 3);
        assert_eq!(buf, [9, 8, 7]);
        // Leftover byte stays queued for the next call
        assert!(channel.has_data_available().unwrap());
    }
}
