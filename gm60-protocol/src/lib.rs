//! GM60 Serial Command Protocol
//!
//! This crate defines the register-access protocol spoken by the GM60
//! barcode scanner module over its UART. The host sends fixed-size command
//! frames and the scanner answers with a variable-length response.
//!
//! # Command Frame
//!
//! ```text
//! ┌──────┬──────────┬────────┬─────┬─────────┬───────┬─────────┐
//! │ HEAD │ RESERVED │ OPCODE │ LEN │ ADDRESS │ PARAM │ CRC     │
//! │ 0x7E │ 0x00     │ 1B     │0x01 │ 2B (BE) │ 1B    │ 2B (BE) │
//! └──────┴──────────┴────────┴─────┴─────────┴───────┴─────────┘
//! ```
//!
//! # Response Frame
//!
//! ```text
//! ┌──────┬──────────┬──────────┬─────┬──────────────┬─────────┐
//! │ ACK  │ RESERVED │ RESERVED │ LEN │ PAYLOAD      │ CRC     │
//! │ 0x02 │ 1B       │ 1B       │ 1B  │ LEN bytes    │ 2B (BE) │
//! └──────┴──────────┴──────────┴─────┴──────────────┴─────────┘
//! ```
//!
//! Both CRCs are CRC-16/CCITT (poly 0x1021, seed 0) over everything after
//! the first two bytes, excluding the CRC itself.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod crc;
pub mod frame;

pub use crc::{checksum, crc16, crc16_with_init, verify};
pub use frame::{
    CommandFrame, FrameError, Opcode, Response, ACK, COMMAND_FRAME_SIZE, FRAME_HEAD,
    MAX_RESPONSE_SIZE,
};
