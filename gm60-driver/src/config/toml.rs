//! Simple TOML parser for scanner configuration
//!
//! Handles only the subset used by `scanner.toml`; it is NOT a general
//! TOML parser.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - Integers in decimal, `0x` hexadecimal or `0b` binary, `_` separators
//! - `[uart]`, `[timing]` and `[register.<name>]` section headers
//! - Comments (# ...)
//!
//! Unknown keys are ignored so newer configs still load on older firmware.

use heapless::String as HString;

use gm60_hal::uart::{DataBits, Parity, StopBits};

use super::types::{RegisterWrite, ScannerConfig, MAX_NAME_LEN};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid section header
    InvalidSection,
    /// Invalid value type or out of range
    InvalidValue,
    /// Too many register sections
    TooManyItems,
    /// Invalid pin string
    InvalidPin,
    /// Register section without an `address` key
    MissingAddress,
    /// Register section without a `value` key
    MissingValue,
}

/// Current parsing context
#[derive(Debug, Clone)]
enum Section {
    Root,
    Uart,
    Timing,
    Register(HString<MAX_NAME_LEN>),
}

/// Register section under construction
#[derive(Debug, Default)]
struct PendingRegister {
    address: Option<u16>,
    value: Option<u8>,
}

/// Parse TOML configuration into a [`ScannerConfig`]
///
/// Anything the input does not mention keeps its default.
pub fn parse_config(input: &str) -> Result<ScannerConfig, ParseError> {
    let mut config = ScannerConfig::default();
    let mut section = Section::Root;
    let mut pending = PendingRegister::default();

    for line in input.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            save_section(&section, &mut pending, &mut config)?;
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            apply_value(&section, key, value, &mut config, &mut pending)?;
        }
    }

    save_section(&section, &mut pending, &mut config)?;

    Ok(config)
}

/// Parse a section header like "uart" or "register.led_mode"
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    let header = header.trim();

    if let Some((kind, name)) = header.split_once('.') {
        if kind != "register" || name.is_empty() || name.contains('.') {
            return Err(ParseError::InvalidSection);
        }
        let name = HString::try_from(name).map_err(|_| ParseError::InvalidSection)?;
        return Ok(Section::Register(name));
    }

    match header {
        "uart" => Ok(Section::Uart),
        "timing" => Ok(Section::Timing),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Finish the current section
fn save_section(
    section: &Section,
    pending: &mut PendingRegister,
    config: &mut ScannerConfig,
) -> Result<(), ParseError> {
    if let Section::Register(name) = section {
        let done = core::mem::take(pending);
        let write = RegisterWrite {
            name: name.clone(),
            address: done.address.ok_or(ParseError::MissingAddress)?,
            value: done.value.ok_or(ParseError::MissingValue)?,
        };
        config
            .registers
            .push(write)
            .map_err(|_| ParseError::TooManyItems)?;
    }
    Ok(())
}

fn apply_value(
    section: &Section,
    key: &str,
    value: &str,
    config: &mut ScannerConfig,
    pending: &mut PendingRegister,
) -> Result<(), ParseError> {
    match section {
        Section::Root => {}
        Section::Uart => match key {
            "baudrate" | "baud" => config.uart.baudrate = parse_int(value)?,
            "tx_pin" => config.pins.tx = parse_pin(value)?,
            "rx_pin" => config.pins.rx = parse_pin(value)?,
            "data_bits" => {
                config.uart.data_bits = match parse_int::<u8>(value)? {
                    7 => DataBits::Seven,
                    8 => DataBits::Eight,
                    _ => return Err(ParseError::InvalidValue),
                }
            }
            "stop_bits" => {
                config.uart.stop_bits = match parse_int::<u8>(value)? {
                    1 => StopBits::One,
                    2 => StopBits::Two,
                    _ => return Err(ParseError::InvalidValue),
                }
            }
            "parity" => config.uart.parity = parse_parity(value)?,
            _ => {} // Ignore unknown keys
        },
        Section::Timing => {
            let timing = &mut config.timing;
            match key {
                "settle_ms" => timing.settle_ms = parse_int(value)?,
                "retry_ms" => timing.retry_ms = parse_int(value)?,
                "drain_poll_ms" => timing.drain_poll_ms = parse_int(value)?,
                "drain_timeout_ms" => timing.drain_timeout_ms = parse_int(value)?,
                "reset_settle_ms" => timing.reset_settle_ms = parse_int(value)?,
                "sensor_poll_ms" => timing.sensor_poll_ms = parse_int(value)?,
                _ => {}
            }
        }
        Section::Register(_) => match key {
            "address" => pending.address = Some(parse_int(value)?),
            "value" => pending.value = Some(parse_int(value)?),
            _ => {}
        },
    }
    Ok(())
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();

    // Remove inline comments
    let value = match value.find('#') {
        Some(hash_pos) if value[..hash_pos].matches('"').count() % 2 == 0 => {
            value[..hash_pos].trim()
        }
        _ => value,
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        // Allow unquoted strings for simple values
        value
    }
}

/// Parse an unsigned integer in decimal, hex or binary
///
/// Register values are usually written the way the datasheet prints them,
/// e.g. `0x63` for a brightness or `0b1000_1110` for a mode bitfield.
fn parse_int<T: TryFrom<u32>>(value: &str) -> Result<T, ParseError> {
    let mut digits: HString<40> = HString::new();
    for c in value.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ParseError::InvalidValue)?;
    }

    let (radix, body) = if let Some(rest) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, rest)
    } else if let Some(rest) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        (2, rest)
    } else {
        (10, digits.as_str())
    };

    let wide = u32::from_str_radix(body, radix).map_err(|_| ParseError::InvalidValue)?;
    T::try_from(wide).map_err(|_| ParseError::InvalidValue)
}

/// Parse a pin string like "gpio8"
fn parse_pin(value: &str) -> Result<u8, ParseError> {
    let value = parse_string(value);
    let number = value.strip_prefix("gpio").ok_or(ParseError::InvalidPin)?;
    number.parse().map_err(|_| ParseError::InvalidPin)
}

/// Parse parity mode
fn parse_parity(value: &str) -> Result<Parity, ParseError> {
    match parse_string(value) {
        "none" | "None" => Ok(Parity::None),
        "even" | "Even" => Ok(Parity::Even),
        "odd" | "Odd" => Ok(Parity::Odd),
        _ => Err(ParseError::InvalidValue),
    }
}
