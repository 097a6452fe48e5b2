//! GM60 register API
//!
//! High-level operations on top of a [`Session`]: version query, register
//! dumps and writes, factory reset and passive scan listening.

use core::fmt::Write as _;

use embedded_hal::delay::DelayNs;
use heapless::{String, Vec};

use gm60_hal::SerialChannel;
use gm60_protocol::frame::{CRC_SIZE, RESPONSE_HEADER_SIZE};
use gm60_protocol::{CommandFrame, FrameError};

use crate::config::{RegisterWrite, TimingConfig};
use crate::error::{Error, Exchange};
use crate::session::Session;
use crate::version::{VersionInfo, VERSION_REGISTER_COUNT};

/// Register addresses
pub mod reg {
    /// Main settings bitfield (LED, buzzer, scan mode)
    pub const SETTINGS: u16 = 0x0000;
    /// Writing [`FACTORY_RESET_MAGIC`] here restores factory settings
    pub const FACTORY_RESET: u16 = 0x00D9;
    pub const FACTORY_RESET_MAGIC: u8 = 0x55;
    /// Start of the five-register version block
    pub const VERSION: u16 = 0x00E1;
}

/// Largest scan collected by one [`Gm60::read_sensor`] call
pub const MAX_SCAN_LEN: usize = 256;

/// Most registers a single read can return
pub const MAX_REGISTERS: usize = u8::MAX as usize;

/// Base-2 rendering of one register, at most eight digits
pub type BinaryText = String<8>;

/// Raw scan output, passed through undecoded
///
/// The scanner sends whatever the barcode encodes: usually ASCII, but
/// GBK or other legacy encodings for CJK content.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Scan {
    bytes: Vec<u8, MAX_SCAN_LEN>,
}

impl Scan {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The scan as text, when it is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.bytes).ok()
    }

    /// Longest valid UTF-8 prefix
    ///
    /// A scan longer than [`MAX_SCAN_LEN`] can end mid-character; the
    /// remaining bytes of that character open the next scan.
    pub fn text_prefix(&self) -> &str {
        match core::str::from_utf8(&self.bytes) {
            Ok(text) => text,
            Err(e) => core::str::from_utf8(&self.bytes[..e.valid_up_to()]).unwrap_or_default(),
        }
    }

    pub fn into_bytes(self) -> Vec<u8, MAX_SCAN_LEN> {
        self.bytes
    }
}

impl AsRef<[u8]> for Scan {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// A register dump
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterSettings {
    /// First register read
    pub address: u16,
    /// One value per register
    pub values: Vec<u8, MAX_REGISTERS>,
    /// `values` rendered in base 2, no prefix or padding
    pub binary: Vec<BinaryText, MAX_REGISTERS>,
}

impl RegisterSettings {
    fn from_values(address: u16, registers: &[u8]) -> Self {
        let mut values = Vec::new();
        let mut binary = Vec::new();
        for &value in registers.iter().take(MAX_REGISTERS) {
            let mut text = BinaryText::new();
            // u8 needs at most eight binary digits
            let _ = write!(text, "{:b}", value);
            let _ = values.push(value);
            let _ = binary.push(text);
        }
        Self {
            address,
            values,
            binary,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// GM60 barcode scanner
pub struct Gm60<C, D> {
    session: Session<C, D>,
}

impl<C, D> Gm60<C, D>
where
    C: SerialChannel,
    D: DelayNs,
{
    pub fn new(channel: C, delay: D, timing: TimingConfig) -> Self {
        Self::from_session(Session::new(channel, delay, timing))
    }

    pub fn from_session(session: Session<C, D>) -> Self {
        Self { session }
    }

    /// Underlying transport, e.g. to check for a fault
    pub fn session(&self) -> &Session<C, D> {
        &self.session
    }

    /// Give back the channel and delay
    pub fn release(self) -> (C, D) {
        self.session.release()
    }

    /// Query hardware/software revision and build date
    pub fn version(&mut self) -> Result<VersionInfo, Error<C::Error>> {
        let read = self
            .session
            .read_registers(reg::VERSION, VERSION_REGISTER_COUNT)?;

        let version = VersionInfo::decode(read.raw()).ok_or_else(|| Error::Checksum {
            cause: FrameError::Truncated {
                len: read.raw().len(),
                needed: RESPONSE_HEADER_SIZE + VERSION_REGISTER_COUNT as usize + CRC_SIZE,
            },
            exchange: Exchange::new(
                CommandFrame::read(reg::VERSION, VERSION_REGISTER_COUNT),
                read.raw(),
            ),
        })?;

        debug!(
            "GM60 hw {} sw {} built {}",
            version.hardware_raw, version.software_raw, version.release_date
        );
        Ok(version)
    }

    /// Read `count` registers starting at `address`
    pub fn register_settings(
        &mut self,
        address: u16,
        count: u8,
    ) -> Result<RegisterSettings, Error<C::Error>> {
        let read = self.session.read_registers(address, count)?;
        Ok(RegisterSettings::from_values(address, read.registers()))
    }

    /// Read a single register
    pub fn register(&mut self, address: u16) -> Result<u8, Error<C::Error>> {
        let read = self.session.read_registers(address, 1)?;
        Ok(read.registers()[0])
    }

    /// Write one register
    pub fn set_register(&mut self, address: u16, value: u8) -> Result<(), Error<C::Error>> {
        debug!("set {:#x} = {:#x}", address, value);
        self.session.write_register(address, value)
    }

    /// Write configured register values in order
    ///
    /// Stops at the first failure; earlier writes stay applied.
    pub fn apply_settings(&mut self, writes: &[RegisterWrite]) -> Result<(), Error<C::Error>> {
        for write in writes {
            info!(
                "applying {} ({:#x} = {:#x})",
                write.name.as_str(),
                write.address,
                write.value
            );
            self.set_register(write.address, write.value)?;
        }
        Ok(())
    }

    /// Restore factory settings and wait for the scanner to reboot
    pub fn reset_to_factory_defaults(&mut self) -> Result<(), Error<C::Error>> {
        info!("factory reset");
        self.session
            .write_register(reg::FACTORY_RESET, reg::FACTORY_RESET_MAGIC)?;
        let settle = self.session.timing().reset_settle_ms;
        self.session.delay_ms(settle);
        Ok(())
    }

    /// Collect whatever the scanner has sent on its own
    ///
    /// No framing, CRC or decoding applies to scan output. Returns
    /// `Ok(None)` when nothing is waiting. Bytes beyond [`MAX_SCAN_LEN`]
    /// stay in the channel for the next call.
    pub fn read_sensor(&mut self) -> Result<Option<Scan>, Error<C::Error>> {
        if self.session.is_faulted() {
            return Err(Error::Faulted);
        }

        let poll_ms = self.session.timing().sensor_poll_ms;
        let mut collected: Vec<u8, MAX_SCAN_LEN> = Vec::new();
        let mut chunk = [0u8; 32];

        while !collected.is_full()
            && self
                .session
                .channel()
                .has_data_available()
                .map_err(Error::Serial)?
        {
            while !collected.is_full() {
                let room = (collected.capacity() - collected.len()).min(chunk.len());
                let n = self
                    .session
                    .channel()
                    .read_available(&mut chunk[..room])
                    .map_err(Error::Serial)?;
                if n == 0 {
                    break;
                }
                let _ = collected.extend_from_slice(&chunk[..n]);
            }
            self.session.delay_ms(poll_ms);
        }

        if collected.is_empty() {
            return Ok(None);
        }

        trace!("scan: {} bytes", collected.len());
        Ok(Some(Scan { bytes: collected }))
    }
}
