//! GM60 Hardware Abstraction Layer
//!
//! Defines the serial channel the scanner driver talks through. The
//! driver never touches a peripheral directly; a board crate hands it
//! anything implementing [`uart::SerialChannel`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  gm60-driver (session, register API)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  gm60-hal (this crate - traits)         │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  IoChannel    │       │  board-native │
//! │ (embedded-io) │       │  impls        │
//! └───────────────┘       └───────────────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod io;
pub mod uart;

pub use io::IoChannel;
pub use uart::{SerialChannel, UartConfig, UartPins};
