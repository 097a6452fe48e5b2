//! Request/response transport session
//!
//! One session owns the serial channel for its whole life and runs every
//! exchange to completion before returning:
//!
//! ```text
//! Idle → Sending → AwaitingDrain → Reading(1) ─┬─────────────→ Validating → Ok | Err
//!                      │                       └→ Reading(2) ─┘
//!                      └→ Timeout (session faulted)
//! ```
//!
//! Exactly one write and at most two read attempts happen per exchange.
//! There is no pipelining; the scanner handles one command at a time.

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use gm60_hal::SerialChannel;
use gm60_protocol::frame::RESPONSE_HEADER_SIZE;
use gm60_protocol::{CommandFrame, Response, MAX_RESPONSE_SIZE};

use crate::config::TimingConfig;
use crate::error::{Error, Exchange, NoResponseCause};

/// Initial read plus one retry
const READ_ATTEMPTS: u8 = 2;

/// Per-call scratch buffer for draining the channel
const READ_CHUNK: usize = 32;

/// Raw response buffer
pub type ResponseBuf = Vec<u8, MAX_RESPONSE_SIZE>;

/// Exchange progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Phase {
    Sending,
    AwaitingDrain { waited_ms: u32 },
    Reading { attempt: u8 },
    Validating,
}

/// A validated register read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadResponse {
    raw: ResponseBuf,
    count: u8,
}

impl ReadResponse {
    /// Whole response, header and CRC included
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The requested register values
    pub fn registers(&self) -> &[u8] {
        let start = RESPONSE_HEADER_SIZE;
        &self.raw[start..start + self.count as usize]
    }
}

/// Transport session over a serial channel
pub struct Session<C, D> {
    channel: C,
    delay: D,
    timing: TimingConfig,
    faulted: bool,
}

impl<C, D> Session<C, D>
where
    C: SerialChannel,
    D: DelayNs,
{
    /// Take ownership of a channel and a delay provider
    pub fn new(channel: C, delay: D, timing: TimingConfig) -> Self {
        Self {
            channel,
            delay,
            timing,
            faulted: false,
        }
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// True once an exchange has timed out
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// Give back the channel and delay, e.g. to rebuild after a fault
    pub fn release(self) -> (C, D) {
        (self.channel, self.delay)
    }

    pub(crate) fn channel(&mut self) -> &mut C {
        &mut self.channel
    }

    pub(crate) fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// Read `count` consecutive registers starting at `address`
    ///
    /// The response is checked for CRC, ACK marker and enough payload to
    /// cover every requested register.
    pub fn read_registers(
        &mut self,
        address: u16,
        count: u8,
    ) -> Result<ReadResponse, Error<C::Error>> {
        if count == 0 {
            return Err(Error::InvalidCount);
        }

        let frame = CommandFrame::read(address, count);
        let raw = self.transact(&frame)?;

        let covered = Response::parse(&raw).and_then(|r| r.registers(count).map(|_| ()));
        if let Err(cause) = covered {
            warn!("short read at {:#x}: {} bytes", address, raw.len());
            return Err(Error::Checksum {
                cause,
                exchange: Exchange::new(frame, &raw),
            });
        }

        Ok(ReadResponse { raw, count })
    }

    /// Write one register
    pub fn write_register(&mut self, address: u16, value: u8) -> Result<(), Error<C::Error>> {
        let frame = CommandFrame::write(address, value);
        self.transact(&frame).map(|_| ())
    }

    /// Run one complete exchange and return the validated raw response
    ///
    /// Bytes already waiting in the channel are not discarded before the
    /// command goes out. An unsolicited scan that arrived earlier is read
    /// as the reply and usually fails as [`Error::Checksum`]; callers that
    /// expect scan traffic should drain it with `Gm60::read_sensor` first.
    pub fn transact(&mut self, frame: &CommandFrame) -> Result<ResponseBuf, Error<C::Error>> {
        if self.faulted {
            return Err(Error::Faulted);
        }

        let mut received = ResponseBuf::new();
        let mut phase = Phase::Sending;

        loop {
            phase = match phase {
                Phase::Sending => {
                    trace!("tx {:?} {=[u8]:x}", frame.opcode(), frame.as_bytes()[..]);
                    self.channel.write(frame.as_bytes()).map_err(Error::Serial)?;
                    Phase::AwaitingDrain { waited_ms: 0 }
                }
                Phase::AwaitingDrain { waited_ms } => {
                    if self.channel.is_transmit_complete().map_err(Error::Serial)? {
                        self.delay.delay_ms(self.timing.settle_ms);
                        Phase::Reading { attempt: 1 }
                    } else if waited_ms >= self.timing.drain_timeout_ms {
                        self.faulted = true;
                        warn!("transmit drain timed out after {} ms", waited_ms);
                        return Err(Error::Timeout {
                            exchange: Exchange::new(*frame, &received),
                        });
                    } else {
                        let step = self.timing.drain_poll_ms.max(1);
                        self.delay.delay_ms(step);
                        Phase::AwaitingDrain {
                            waited_ms: waited_ms.saturating_add(step),
                        }
                    }
                }
                Phase::Reading { attempt } => {
                    self.read_into(&mut received)?;
                    if received.is_empty() && attempt < READ_ATTEMPTS {
                        debug!("no reply on attempt {}, retrying", attempt);
                        self.delay.delay_ms(self.timing.retry_ms);
                        Phase::Reading {
                            attempt: attempt + 1,
                        }
                    } else {
                        Phase::Validating
                    }
                }
                Phase::Validating => return Self::validate(frame, received),
            };
        }
    }

    /// Drain everything currently buffered on the channel
    fn read_into(&mut self, received: &mut ResponseBuf) -> Result<(), Error<C::Error>> {
        let mut chunk = [0u8; READ_CHUNK];
        while !received.is_full() {
            let room = (received.capacity() - received.len()).min(READ_CHUNK);
            let n = self
                .channel
                .read_available(&mut chunk[..room])
                .map_err(Error::Serial)?;
            if n == 0 {
                break;
            }
            // n <= room, so this cannot overflow
            let _ = received.extend_from_slice(&chunk[..n]);
        }
        Ok(())
    }

    fn validate(
        frame: &CommandFrame,
        received: ResponseBuf,
    ) -> Result<ResponseBuf, Error<C::Error>> {
        if received.is_empty() {
            warn!("no response to {=[u8]:x}", frame.as_bytes()[..]);
            return Err(Error::NoResponse {
                cause: NoResponseCause::Silent,
                exchange: Exchange::new(*frame, &received),
            });
        }

        trace!("rx {=[u8]:x}", received[..]);

        let response = match Response::parse(&received) {
            Ok(response) => response,
            Err(cause) => {
                warn!("bad response frame: {}", cause);
                return Err(Error::Checksum {
                    cause,
                    exchange: Exchange::new(*frame, &received),
                });
            }
        };

        // A refusal is reported in the same category as silence
        if !response.is_ack() {
            let marker = response.ack();
            warn!("response marker {:#x} is not ACK", marker);
            return Err(Error::NoResponse {
                cause: NoResponseCause::BadAck(marker),
                exchange: Exchange::new(*frame, &received),
            });
        }

        Ok(received)
    }
}
