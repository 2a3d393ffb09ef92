//! Host-side SCD30 simulation.
//!
//! [`SimulatedScd30`] implements the `embedded-hal` I2C trait and answers
//! commands the way the real sensor does, so the driver and the telemetry
//! module can be exercised without hardware.  It is a cheap-to-clone handle
//! onto shared state: keep a clone to script readings or inject faults
//! after the bus has been moved into the driver.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use super::command::{ADDRESS, Command};
use super::frame;
use crate::sensors::SensorReading;

#[derive(Default)]
struct SimState {
    present: bool,
    writes: Vec<Vec<u8>>,
    transactions: usize,
    pending: Option<Command>,
    readings: VecDeque<SensorReading>,
    last_reading: Option<SensorReading>,
    measuring: bool,
    interval_secs: Option<u16>,
    pressure_mbar: Option<u16>,
    firmware: (u8, u8),
    ready_word: Option<u16>,
    write_budget: Option<usize>,
    corrupt_next: Option<usize>,
    fail_next_read: bool,
}

#[derive(Clone)]
pub struct SimulatedScd30 {
    state: Rc<RefCell<SimState>>,
}

impl Default for SimulatedScd30 {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedScd30 {
    /// A sensor that acknowledges its address.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SimState {
                present: true,
                firmware: (3, 66),
                ..SimState::default()
            })),
        }
    }

    /// An empty bus: every transaction is NACKed.
    pub fn absent() -> Self {
        let sim = Self::new();
        sim.set_present(false);
        sim
    }

    pub fn set_present(&self, present: bool) {
        self.state.borrow_mut().present = present;
    }

    /// Queue a sample; data-ready reports 1 while any sample is queued.
    pub fn push_reading(&self, reading: SensorReading) {
        self.state.borrow_mut().readings.push_back(reading);
    }

    pub fn set_firmware_version(&self, major: u8, minor: u8) {
        self.state.borrow_mut().firmware = (major, minor);
    }

    /// Answer data-ready polls with `word` instead of 0/1.  `None`
    /// restores the queue-driven answer.
    pub fn set_ready_word(&self, word: Option<u16>) {
        self.state.borrow_mut().ready_word = word;
    }

    /// Let `n` more writes succeed, then NACK every write after that.
    pub fn fail_writes_after(&self, n: usize) {
        self.state.borrow_mut().write_budget = Some(n);
    }

    /// Flip the low bit of byte `index` in the next read response.
    pub fn corrupt_next_read(&self, index: usize) {
        self.state.borrow_mut().corrupt_next = Some(index);
    }

    /// Fail the next read with a bus error.
    pub fn fail_next_read(&self) {
        self.state.borrow_mut().fail_next_read = true;
    }

    /// Every write payload seen so far, in order (probes are empty).
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.borrow().writes.clone()
    }

    /// Number of I2C transactions attempted, including NACKed ones.
    pub fn transactions(&self) -> usize {
        self.state.borrow().transactions
    }

    pub fn is_measuring(&self) -> bool {
        self.state.borrow().measuring
    }

    pub fn measurement_interval(&self) -> Option<u16> {
        self.state.borrow().interval_secs
    }

    pub fn ambient_pressure(&self) -> Option<u16> {
        self.state.borrow().pressure_mbar
    }

    pub fn queued_readings(&self) -> usize {
        self.state.borrow().readings.len()
    }
}

impl SimState {
    fn write(&mut self, bytes: &[u8]) -> Result<(), ErrorKind> {
        if let Some(budget) = self.write_budget.as_mut() {
            if *budget == 0 {
                return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
            }
            *budget -= 1;
        }
        self.writes.push(bytes.to_vec());

        if bytes.len() < 2 {
            return Ok(());
        }
        let cmd = Command::from_code(u16::from_be_bytes([bytes[0], bytes[1]]));
        let argument = match bytes {
            [_, _, a0, a1, crc] if frame::crc8(&[*a0, *a1]) == *crc => {
                Some(u16::from_be_bytes([*a0, *a1]))
            }
            _ => None,
        };

        match cmd {
            Some(Command::StopContinuousMeasurement) => self.measuring = false,
            Some(Command::StartContinuousMeasurement) => {
                self.measuring = true;
                self.pressure_mbar = argument;
            }
            Some(Command::SetMeasurementInterval) => self.interval_secs = argument,
            _ => {}
        }
        self.pending = cmd;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), ErrorKind> {
        if core::mem::take(&mut self.fail_next_read) {
            return Err(ErrorKind::Bus);
        }
        let mut response: Vec<u8> = match self.pending.take() {
            Some(Command::GetDataReady) => {
                let word = self
                    .ready_word
                    .unwrap_or(u16::from(!self.readings.is_empty()));
                frame::encode_word(word).to_vec()
            }
            Some(Command::ReadMeasurement) => {
                if let Some(next) = self.readings.pop_front() {
                    self.last_reading = Some(next);
                }
                let r = self.last_reading.unwrap_or(SensorReading::new(0.0, 0.0, 0.0));
                frame::encode_float_triple((
                    r.co2_ppm,
                    r.temperature_celsius,
                    r.relative_humidity_percent,
                ))
                .to_vec()
            }
            Some(Command::ReadFirmwareVersion) => {
                frame::encode_word(u16::from_be_bytes([self.firmware.0, self.firmware.1])).to_vec()
            }
            _ => return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)),
        };

        if let Some(index) = self.corrupt_next.take() {
            if let Some(b) = response.get_mut(index) {
                *b ^= 0x01;
            }
        }
        if response.len() < buf.len() {
            return Err(ErrorKind::Overrun);
        }
        buf.copy_from_slice(&response[..buf.len()]);
        Ok(())
    }
}

impl ErrorType for SimulatedScd30 {
    type Error = ErrorKind;
}

impl I2c for SimulatedScd30 {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        state.transactions += 1;
        if !state.present || address != ADDRESS {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => state.write(bytes)?,
                Operation::Read(buf) => state.read(buf)?,
            }
        }
        Ok(())
    }
}

/// Delay provider that returns immediately and records the requested time.
#[derive(Debug, Clone, Default)]
pub struct SimDelay {
    total_ns: u64,
}

impl SimDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }

    fn delay_us(&mut self, us: u32) {
        self.total_ns += u64::from(us) * 1_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ns += u64::from(ms) * 1_000_000;
    }
}
