//! UART serial channel abstractions
//!
//! The scanner protocol only needs four primitive operations on the link.
//! Everything else (baud setup, pin muxing, interrupts) stays with the
//! board crate that constructs the channel.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Byte channel to a single serial device
///
/// All operations are non-blocking apart from `write`, which may block
/// until the bytes are queued for transmission.
pub trait SerialChannel {
    /// Error type for channel operations
    type Error;

    /// Queue bytes for transmission
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Whether every queued byte has left the transmitter
    fn is_transmit_complete(&mut self) -> Result<bool, Self::Error>;

    /// Copy whatever bytes are currently received into `buf`
    ///
    /// Returns the number of bytes copied; zero means nothing was pending.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Whether at least one received byte is waiting
    fn has_data_available(&mut self) -> Result<bool, Self::Error>;
}

impl<T: SerialChannel + ?Sized> SerialChannel for &mut T {
    type Error = T::Error;

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        T::write(self, data)
    }

    fn is_transmit_complete(&mut self) -> Result<bool, Self::Error> {
        T::is_transmit_complete(self)
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        T::read_available(self, buf)
    }

    fn has_data_available(&mut self) -> Result<bool, Self::Error> {
        T::has_data_available(self)
    }
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            // GM60 factory setting
            baudrate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// GPIO assignment for the two UART lines
///
/// Named from the host's side: `tx` drives the scanner's RX input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UartPins {
    /// Host TX GPIO number
    pub tx: u8,
    /// Host RX GPIO number
    pub rx: u8,
}

impl Default for UartPins {
    fn default() -> Self {
        Self { tx: 8, rx: 9 }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StopBits {
    One,
    Two,
}
