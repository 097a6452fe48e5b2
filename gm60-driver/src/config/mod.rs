//! Scanner configuration
//!
//! Link settings, protocol timing and the register values to apply at
//! startup. Parsed from a TOML subset by a no_std line parser.

pub mod toml;
pub mod types;

pub use self::toml::{parse_config, ParseError};
pub use types::{RegisterWrite, ScannerConfig, TimingConfig, MAX_NAME_LEN, MAX_REGISTER_WRITES};
