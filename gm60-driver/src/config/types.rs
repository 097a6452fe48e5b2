//! Configuration type definitions

use heapless::{String, Vec};

use gm60_hal::{UartConfig, UartPins};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum register-write label length
pub const MAX_NAME_LEN: usize = 16;

/// Maximum startup register writes per config
pub const MAX_REGISTER_WRITES: usize = 8;

/// Protocol timing
///
/// The settle and retry delays are empirical: reading sooner than
/// `settle_ms` after the transmit drains tends to return an empty or
/// partial reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimingConfig {
    /// Wait between transmit drain and the first read
    pub settle_ms: u32,
    /// Wait before the single retry read
    pub retry_ms: u32,
    /// Interval between transmit-complete polls
    pub drain_poll_ms: u32,
    /// Give up on the transmit drain after this long
    pub drain_timeout_ms: u32,
    /// Reboot time after a factory reset
    pub reset_settle_ms: u32,
    /// Interval between polls while collecting scan output
    pub sensor_poll_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_ms: 200,
            retry_ms: 500,
            drain_poll_ms: 50,
            drain_timeout_ms: 1000,
            reset_settle_ms: 1000,
            sensor_poll_ms: 10,
        }
    }
}

/// A register value to write at startup
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegisterWrite {
    /// Label from the config section name
    pub name: String<MAX_NAME_LEN>,
    /// Register address
    pub address: u16,
    /// Value to store
    pub value: u8,
}

/// Complete scanner configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScannerConfig {
    /// UART framing and baud rate
    pub uart: UartConfig,
    /// Host GPIOs wired to the scanner
    pub pins: UartPins,
    /// Protocol delays
    pub timing: TimingConfig,
    /// Register values applied in order after boot
    pub registers: Vec<RegisterWrite, MAX_REGISTER_WRITES>,
}

impl ScannerConfig {
    /// Find a startup register write by label
    pub fn find_register(&self, name: &str) -> Option<&RegisterWrite> {
        self.registers.iter().find(|r| r.name.as_str() == name)
    }
}
