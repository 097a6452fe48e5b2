//! Driver error taxonomy

use heapless::Vec;

use gm60_protocol::{CommandFrame, FrameError, MAX_RESPONSE_SIZE};

/// What was on the wire when an exchange failed
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Exchange {
    /// The command that was transmitted
    pub sent: CommandFrame,
    /// Whatever came back, possibly nothing
    pub received: Vec<u8, MAX_RESPONSE_SIZE>,
}

impl Exchange {
    pub(crate) fn new(sent: CommandFrame, received: &[u8]) -> Self {
        let mut copy = Vec::new();
        // Receive buffers share the same capacity, so this never truncates
        let take = received.len().min(MAX_RESPONSE_SIZE);
        let _ = copy.extend_from_slice(&received[..take]);
        Self {
            sent,
            received: copy,
        }
    }
}

/// Why an exchange is reported as [`Error::NoResponse`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NoResponseCause {
    /// Nothing arrived, retry included
    Silent,
    /// A frame arrived but its first byte was not the ACK marker
    BadAck(u8),
}

/// Errors returned by the session and register API
///
/// `E` is the serial channel's own error type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The scanner stayed silent or refused the command
    NoResponse {
        cause: NoResponseCause,
        exchange: Exchange,
    },
    /// The response failed CRC or length validation
    Checksum {
        cause: FrameError,
        exchange: Exchange,
    },
    /// The transmitter never reported completion; the session is now faulted
    Timeout { exchange: Exchange },
    /// A previous exchange timed out; build a new session
    Faulted,
    /// A register read must cover at least one register
    InvalidCount,
    /// Underlying channel failure
    Serial(E),
}

impl<E> Error<E> {
    /// Wire diagnostics, when the failure happened mid-exchange
    pub fn exchange(&self) -> Option<&Exchange> {
        match self {
            Error::NoResponse { exchange, .. }
            | Error::Checksum { exchange, .. }
            | Error::Timeout { exchange } => Some(exchange),
            _ => None,
        }
    }

    pub fn is_no_response(&self) -> bool {
        matches!(self, Error::NoResponse { .. })
    }

    pub fn is_checksum(&self) -> bool {
        matches!(self, Error::Checksum { .. })
    }
}
