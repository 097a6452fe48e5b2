//! Scripted channel and delay doubles for host tests

use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use gm60_hal::SerialChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

/// Serial channel fed from a queue of receive batches
///
/// Each read attempt takes one batch: the first `read_available` call of an
/// attempt pulls the next batch (an empty batch models silence) and the
/// call after the batch is used up reports zero bytes, ending the attempt.
#[derive(Debug, Default)]
pub struct MockChannel {
    batches: VecDeque<Vec<u8>>,
    current: VecDeque<u8>,
    batch_drained: bool,
    /// Transmit-complete polls that report "still busy"
    busy_polls: usize,
    never_drains: bool,
    fail_writes: bool,
    pub written: Vec<Vec<u8>>,
    pub read_attempts: usize,
    pub drain_polls: usize,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the bytes returned by the next read attempt
    pub fn reply(mut self, bytes: &[u8]) -> Self {
        self.batches.push_back(bytes.to_vec());
        self
    }

    /// Queue a silent read attempt
    pub fn silence(self) -> Self {
        self.reply(&[])
    }

    pub fn busy_for(mut self, polls: usize) -> Self {
        self.busy_polls = polls;
        self
    }

    pub fn never_drains(mut self) -> Self {
        self.never_drains = true;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }
}

impl SerialChannel for MockChannel {
    type Error = MockError;

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err(MockError);
        }
        self.written.push(data.to_vec());
        Ok(())
    }

    fn is_transmit_complete(&mut self) -> Result<bool, Self::Error> {
        self.drain_polls += 1;
        if self.never_drains {
            return Ok(false);
        }
        if self.busy_polls > 0 {
            self.busy_polls -= 1;
            return Ok(false);
        }
        Ok(true)
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.current.is_empty() {
            if self.batch_drained {
                self.batch_drained = false;
                return Ok(0);
            }
            self.read_attempts += 1;
            match self.batches.pop_front() {
                Some(batch) => self.current = batch.into(),
                None => return Ok(0),
            }
            if self.current.is_empty() {
                return Ok(0);
            }
        }

        let n = buf.len().min(self.current.len());
        for slot in buf.iter_mut().take(n) {
            // n is bounded by current.len()
            *slot = self.current.pop_front().unwrap_or_default();
        }
        if self.current.is_empty() {
            self.batch_drained = true;
        }
        Ok(n)
    }

    fn has_data_available(&mut self) -> Result<bool, Self::Error> {
        if !self.current.is_empty() {
            return Ok(true);
        }
        let next_ready = self.batches.front().is_some_and(|b| !b.is_empty());
        if next_ready {
            // Bytes that arrived since the last drain start a fresh batch
            self.batch_drained = false;
        }
        Ok(next_ready)
    }
}

/// Delay that only records what was asked of it
#[derive(Debug, Default)]
pub struct MockDelay {
    pub ms_calls: Vec<u32>,
    total_ns: u64,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.ms_calls.push(ms);
        self.total_ns += ms as u64 * 1_000_000;
    }
}
