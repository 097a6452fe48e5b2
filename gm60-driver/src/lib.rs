//! GM60 barcode scanner driver
//!
//! Blocking request/response driver for the GM60 scanner module. Commands
//! go out as fixed nine-byte frames; every reply is CRC-checked before its
//! contents are trusted.
//!
//! - [`session`] - one exchange at a time: write, drain, settle, read with
//!   a single retry, validate
//! - [`scanner`] - register API (version, dumps, writes, factory reset,
//!   scan listening)
//! - [`config`] - link settings, timing and startup register writes
//! - [`version`] - version block decoding
//!
//! ```ignore
//! let mut gm60 = Gm60::new(IoChannel::new(uart), Delay, TimingConfig::default());
//! let version = gm60.version()?;
//! gm60.set_register(reg::SETTINGS, 0b1000_1110)?;
//! if let Some(scan) = gm60.read_sensor()? {
//!     // ...
//! }
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to later modules
#[macro_use]
mod fmt;

pub mod config;
pub mod error;
pub mod scanner;
pub mod session;
pub mod version;

#[cfg(test)]
mod mock;

pub use config::{parse_config, ScannerConfig, TimingConfig};
pub use error::{Error, Exchange, NoResponseCause};
pub use scanner::{reg, Gm60, RegisterSettings, Scan, MAX_SCAN_LEN};
pub use session::{ReadResponse, Session};
pub use version::{ReleaseDate, VersionInfo};
