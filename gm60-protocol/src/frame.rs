//! Command encoding and response decoding for the GM60 protocol.
//!
//! Command frame (always 9 bytes):
//! - HEAD (2 bytes): 0x7E 0x00
//! - OPCODE (1 byte): 0x07 read, 0x08 write
//! - LEN (1 byte): data length, always 0x01
//! - ADDRESS (2 bytes): register address, big-endian
//! - PARAM (1 byte): register count (read) or value (write)
//! - CRC (2 bytes): CRC-16/CCITT of OPCODE..PARAM, big-endian
//!
//! Response frame (variable):
//! - ACK (1 byte): 0x02 on success
//! - RESERVED (2 bytes)
//! - LEN (1 byte): payload length
//! - PAYLOAD (LEN bytes): register values in ascending address order
//! - CRC (2 bytes): CRC-16/CCITT of everything from byte 2 up to the CRC

use heapless::Vec;

use crate::crc;

/// Command header bytes
pub const FRAME_HEAD: [u8; 2] = [0x7E, 0x00];

/// First byte of a successful response
pub const ACK: u8 = 0x02;

/// Data-length field of every command frame
const COMMAND_DATA_LEN: u8 = 0x01;

/// Size of an encoded command
pub const COMMAND_FRAME_SIZE: usize = 9;

/// ACK + 2 reserved + LEN
pub const RESPONSE_HEADER_SIZE: usize = 4;

/// Trailing CRC size
pub const CRC_SIZE: usize = 2;

/// Bytes skipped at the start of a frame before the CRC region
const CRC_SKIP: usize = 2;

/// Largest response: a 255-register read
pub const MAX_RESPONSE_SIZE: usize = RESPONSE_HEADER_SIZE + u8::MAX as usize + CRC_SIZE;

/// Errors that can occur while encoding or decoding frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Response shorter than its header, CRC, or requested payload
    Truncated {
        /// Bytes actually received
        len: usize,
        /// Bytes needed
        needed: usize,
    },
    /// Trailing CRC does not match the recomputed one
    ChecksumMismatch {
        /// CRC computed over the received bytes
        expected: u16,
        /// CRC carried by the frame
        received: u16,
    },
    /// Payload does not fit in a single response
    PayloadTooLarge,
}

/// Command opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Opcode {
    /// Read one or more consecutive registers
    Read = 0x07,
    /// Write a single register
    Write = 0x08,
}

/// An encoded command, CRC included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandFrame {
    bytes: [u8; COMMAND_FRAME_SIZE],
}

impl CommandFrame {
    /// Read `count` consecutive registers starting at `address`
    pub fn read(address: u16, count: u8) -> Self {
        Self::build(Opcode::Read, address, count)
    }

    /// Write `value` into the register at `address`
    pub fn write(address: u16, value: u8) -> Self {
        Self::build(Opcode::Write, address, value)
    }

    fn build(opcode: Opcode, address: u16, param: u8) -> Self {
        let [addr_hi, addr_lo] = address.to_be_bytes();
        let mut bytes = [
            FRAME_HEAD[0],
            FRAME_HEAD[1],
            opcode as u8,
            COMMAND_DATA_LEN,
            addr_hi,
            addr_lo,
            param,
            0,
            0,
        ];
        let [crc_hi, crc_lo] = crc::checksum(&bytes[CRC_SKIP..COMMAND_FRAME_SIZE - CRC_SIZE]);
        bytes[7] = crc_hi;
        bytes[8] = crc_lo;
        Self { bytes }
    }

    /// Wire bytes
    pub fn as_bytes(&self) -> &[u8; COMMAND_FRAME_SIZE] {
        &self.bytes
    }

    pub fn opcode(&self) -> Opcode {
        if self.bytes[2] == Opcode::Write as u8 {
            Opcode::Write
        } else {
            Opcode::Read
        }
    }

    pub fn address(&self) -> u16 {
        u16::from_be_bytes([self.bytes[4], self.bytes[5]])
    }

    /// Register count for reads, value for writes
    pub fn param(&self) -> u8 {
        self.bytes[6]
    }

    pub fn crc(&self) -> u16 {
        u16::from_be_bytes([self.bytes[7], self.bytes[8]])
    }
}

impl AsRef<[u8]> for CommandFrame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// A CRC-checked response borrowed from a receive buffer
///
/// Parsing only proves integrity. Whether the scanner accepted the command
/// is a separate question answered by [`Response::is_ack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response<'a> {
    bytes: &'a [u8],
}

impl<'a> Response<'a> {
    /// Validate length and CRC of a raw response
    pub fn parse(bytes: &'a [u8]) -> Result<Self, FrameError> {
        let min = RESPONSE_HEADER_SIZE + CRC_SIZE;
        if bytes.len() < min {
            return Err(FrameError::Truncated {
                len: bytes.len(),
                needed: min,
            });
        }

        let crc_at = bytes.len() - CRC_SIZE;
        let expected = crc::crc16(&bytes[CRC_SKIP..crc_at]);
        let received = u16::from_be_bytes([bytes[crc_at], bytes[crc_at + 1]]);
        if expected != received {
            return Err(FrameError::ChecksumMismatch { expected, received });
        }

        Ok(Self { bytes })
    }

    /// Encode a successful response carrying `payload`
    ///
    /// This is the scanner's side of the exchange; the host only needs it
    /// for simulators and test doubles.
    pub fn encode_ack(payload: &[u8]) -> Result<Vec<u8, MAX_RESPONSE_SIZE>, FrameError> {
        if payload.len() > u8::MAX as usize {
            return Err(FrameError::PayloadTooLarge);
        }

        let mut out = Vec::new();
        out.extend_from_slice(&[ACK, 0x00, 0x00, payload.len() as u8])
            .map_err(|_| FrameError::PayloadTooLarge)?;
        out.extend_from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;
        let sum = crc::checksum(&out[CRC_SKIP..]);
        out.extend_from_slice(&sum)
            .map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(out)
    }

    /// First byte; [`ACK`] when the command was accepted
    pub fn ack(&self) -> u8 {
        self.bytes[0]
    }

    pub fn is_ack(&self) -> bool {
        self.ack() == ACK
    }

    /// Everything between the header and the CRC
    pub fn payload(&self) -> &'a [u8] {
        &self.bytes[RESPONSE_HEADER_SIZE..self.bytes.len() - CRC_SIZE]
    }

    /// The first `count` register values of the payload
    pub fn registers(&self, count: u8) -> Result<&'a [u8], FrameError> {
        let count = count as usize;
        let needed = RESPONSE_HEADER_SIZE + count + CRC_SIZE;
        if self.bytes.len() < needed {
            return Err(FrameError::Truncated {
                len: self.bytes.len(),
                needed,
            });
        }
        Ok(&self.bytes[RESPONSE_HEADER_SIZE..RESPONSE_HEADER_SIZE + count])
    }

    /// The whole response, CRC included
    pub fn raw(&self) -> &'a [u8] {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_read_command_layout() {
        let frame = CommandFrame::read(0x0000, 1);
        assert_eq!(
            frame.as_bytes(),
            &[0x7E, 0x00, 0x07, 0x01, 0x00, 0x00, 0x01, 0x01, 0x41]
        );
        assert_eq!(frame.opcode(), Opcode::Read);
        assert_eq!(frame.param(), 1);
    }

    #[test]
    fn test_write_command_layout() {
        let frame = CommandFrame::write(0x00D9, 0x55);
        assert_eq!(
            frame.as_bytes(),
            &[0x7E, 0x00, 0x08, 0x01, 0x00, 0xD9, 0x55, 0xD1, 0x76]
        );
        assert_eq!(frame.opcode(), Opcode::Write);
        assert_eq!(frame.address(), 0x00D9);
        assert_eq!(frame.crc(), 0xD176);
    }

    #[test]
    fn test_address_is_big_endian() {
        let frame = CommandFrame::read(0xABCD, 2);
        assert_eq!(frame.as_bytes()[4], 0xAB);
        assert_eq!(frame.as_bytes()[5], 0xCD);
        assert_eq!(frame.address(), 0xABCD);
    }

    #[test]
    fn test_crc_excludes_head() {
        let frame = CommandFrame::read(0x00E1, 5);
        let bytes = frame.as_bytes();
        assert!(crc::verify(&bytes[2..7], [bytes[7], bytes[8]]));
    }

    #[test]
    fn test_read_then_decode_three_registers() {
        let request = CommandFrame::read(0x0000, 3);
        assert_eq!(request.param(), 3);

        let raw = Response::encode_ack(&[0x11, 0x22, 0x33]).unwrap();
        let response = Response::parse(&raw).unwrap();

        assert!(response.is_ack());
        assert_eq!(response.registers(3).unwrap(), &[0x11, 0x22, 0x33]);
        assert_eq!(response.payload(), &[0x11, 0x22, 0x33]);
    }

    #[test]
    fn test_known_write_ack() {
        // Write acknowledgement as sent by the scanner
        let raw = [0x02, 0x00, 0x00, 0x01, 0x00, 0x33, 0x31];
        let response = Response::parse(&raw).unwrap();
        assert!(response.is_ack());
        assert_eq!(response.payload(), &[0x00]);
    }

    #[test]
    fn test_corrupt_crc_rejected() {
        let mut raw = Response::encode_ack(&[0x3E]).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;

        assert!(matches!(
            Response::parse(&raw),
            Err(FrameError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_short_response_is_truncated() {
        assert_eq!(
            Response::parse(&[0x02, 0x00, 0x00]),
            Err(FrameError::Truncated { len: 3, needed: 6 })
        );
    }

    #[test]
    fn test_registers_beyond_payload_is_truncated() {
        let raw = Response::encode_ack(&[0x01]).unwrap();
        let response = Response::parse(&raw).unwrap();
        assert_eq!(
            response.registers(2),
            Err(FrameError::Truncated { len: 7, needed: 8 })
        );
    }

    #[test]
    fn test_bad_ack_still_parses() {
        let mut raw = Response::encode_ack(&[0x00]).unwrap();
        // ACK byte sits outside the CRC region
        raw[0] = 0x15;
        let response = Response::parse(&raw).unwrap();
        assert!(!response.is_ack());
        assert_eq!(response.ack(), 0x15);
    }

    #[test]
    fn test_payload_too_large() {
        let payload = [0u8; 256];
        assert_eq!(
            Response::encode_ack(&payload),
            Err(FrameError::PayloadTooLarge)
        );
    }

    proptest! {
        #[test]
        fn prop_tampered_crc_always_rejected(
            payload in proptest::collection::vec(any::<u8>(), 0..32),
            which in 0usize..2,
            mask in 1u8..=255,
        ) {
            let mut raw = Response::encode_ack(&payload).unwrap();
            let at = raw.len() - CRC_SIZE + which;
            raw[at] ^= mask;
            let rejected = matches!(
                Response::parse(&raw),
                Err(FrameError::ChecksumMismatch { .. })
            );
            prop_assert!(rejected);
        }

        #[test]
        fn prop_commands_carry_valid_crc(address in any::<u16>(), param in any::<u8>()) {
            for frame in [CommandFrame::read(address, param), CommandFrame::write(address, param)] {
                let bytes = frame.as_bytes();
                prop_assert_eq!(&bytes[..2], &FRAME_HEAD[..]);
                prop_assert_eq!(frame.address(), address);
                prop_assert!(crc::verify(&bytes[2..7], [bytes[7], bytes[8]]));
            }
        }
    }
}
