//! Firmware/hardware identification block
//!
//! Five consecutive registers starting at 0x00E1:
//! hardware revision, software revision, then the software build date as
//! year-since-2000, month and day.

use core::fmt;
use core::fmt::Write as _;

use heapless::String;

use gm60_protocol::frame::RESPONSE_HEADER_SIZE;

/// Registers in the version block
pub const VERSION_REGISTER_COUNT: u8 = 5;

/// Longest rendered date ("YYYY-MMM-DDD" for out-of-range raw bytes)
pub const DATE_TEXT_LEN: usize = 12;

/// Software build date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReleaseDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl ReleaseDate {
    /// `YYYY-MM-DD`
    pub fn iso(&self) -> String<DATE_TEXT_LEN> {
        let mut out = String::new();
        // Capacity covers every u16/u8 combination
        let _ = write!(out, "{}", self);
        out
    }
}

impl fmt::Display for ReleaseDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Decoded version block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VersionInfo {
    /// Hardware revision in hundredths
    pub hardware_raw: u8,
    /// Software revision in hundredths
    pub software_raw: u8,
    pub release_date: ReleaseDate,
}

impl VersionInfo {
    /// Decode from the five version registers; extra bytes are ignored
    pub fn from_registers(registers: &[u8]) -> Option<Self> {
        match *registers {
            [hardware_raw, software_raw, year, month, day, ..] => Some(Self {
                hardware_raw,
                software_raw,
                release_date: ReleaseDate {
                    year: 2000 + year as u16,
                    month,
                    day,
                },
            }),
            _ => None,
        }
    }

    /// Decode from a complete response frame (registers start at byte 4)
    pub fn decode(response: &[u8]) -> Option<Self> {
        response
            .get(RESPONSE_HEADER_SIZE..)
            .and_then(Self::from_registers)
    }

    /// Hardware revision, e.g. 1.10
    pub fn hardware(&self) -> f32 {
        self.hardware_raw as f32 / 100.0
    }

    /// Software revision, e.g. 1.00
    pub fn software(&self) -> f32 {
        self.software_raw as f32 / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_response() {
        let response = [0x02, 0x00, 0x00, 0x05, 0x05, 0x0A, 0x16, 0x03, 0x0F];
        let version = VersionInfo::decode(&response).unwrap();

        assert_eq!(version.hardware(), 0.05);
        assert_eq!(version.software(), 0.10);
        assert_eq!(version.release_date.iso().as_str(), "2022-03-15");
    }

    #[test]
    fn test_decode_short_response() {
        assert_eq!(VersionInfo::decode(&[0x02, 0x00, 0x00, 0x05, 0x05]), None);
        assert_eq!(VersionInfo::decode(&[0x02]), None);
    }

    #[test]
    fn test_typical_revision() {
        let version = VersionInfo::from_registers(&[0x6E, 0x64, 0x15, 0x0C, 0x01]).unwrap();
        assert_eq!(version.hardware_raw, 110);
        assert_eq!(version.hardware(), 1.10);
        assert_eq!(version.software(), 1.00);
        assert_eq!(version.release_date.iso().as_str(), "2021-12-01");
    }

    #[test]
    fn test_out_of_range_date_still_renders() {
        let date = ReleaseDate {
            year: 2255,
            month: 255,
            day: 255,
        };
        assert_eq!(date.iso().as_str(), "2255-255-255");
    }
}
