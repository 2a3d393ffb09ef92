//! Sensirion SCD30 NDIR CO2 / temperature / humidity driver.
//!
//! Generic over any `embedded-hal` 1.0 I2C bus and blocking delay, so the
//! same code runs against the ESP-IDF I2C driver on target and against
//! [`sim::SimulatedScd30`] on the host.
//!
//! ## Lifecycle
//!
//! ```text
//!               probe ok                initialize
//!  NotDetected ─────────▶ Initializing ────────────▶ Ready
//!       ▲                     │                        │
//!       └──── probe fails ────┴────────────────────────┘
//!                             │ start command lost
//!                             ▼
//!                          Faulted
//! ```
//!
//! Read failures never change the state: they are transient and the
//! scheduler simply tries again on its next tick.

pub mod command;
pub mod frame;
#[cfg(not(target_os = "espidf"))]
pub mod sim;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};
use log::{debug, info, warn};

use crate::app::ports::AirQualitySensor;
use crate::error::SensorError;
use crate::sensors::{SensorReading, SensorState};
use command::{ADDRESS, AMBIENT_PRESSURE_MBAR, Command, MEASUREMENT_INTERVAL_SECS};
use frame::{MEASUREMENT_LEN, WORD_LEN};

/// Settle time after stopping continuous measurement.
const STOP_SETTLE_MS: u32 = 500;
/// Settle time after each configuration command.
const CONFIG_SETTLE_MS: u32 = 100;
/// Wait between a read command and fetching its response.
const RESPONSE_WAIT_MS: u32 = 3;

pub struct Scd30<I2C, D> {
    i2c: I2C,
    delay: D,
    state: SensorState,
}

impl<I2C, D> Scd30<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self {
            i2c,
            delay,
            state: SensorState::NotDetected,
        }
    }

    pub fn state(&self) -> SensorState {
        self.state
    }

    /// Release the bus and delay back to the caller.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    /// Address-only transaction to see whether anything acknowledges 0x61.
    pub fn probe(&mut self) -> SensorState {
        match self.i2c.write(ADDRESS, &[]) {
            Ok(()) => {
                if self.state != SensorState::Ready {
                    self.state = SensorState::Initializing;
                }
            }
            Err(e) => {
                warn!(
                    "SCD30 not found at address {:#04x} ({})",
                    ADDRESS,
                    e.kind()
                );
                self.state = SensorState::NotDetected;
            }
        }
        self.state
    }

    /// Stop → set interval → start with pressure compensation.
    ///
    /// Individual acknowledgements are not checked; only a dead start
    /// command (sensor gone since the probe) leaves the driver `Faulted`.
    pub fn initialize(&mut self) -> SensorState {
        if self.state == SensorState::NotDetected {
            warn!("SCD30 init skipped: sensor not detected");
            return self.state;
        }
        info!(
            "SCD30 init: interval={}s pressure={}mbar",
            MEASUREMENT_INTERVAL_SECS, AMBIENT_PRESSURE_MBAR
        );

        if let Err(e) = self.write_command(Command::StopContinuousMeasurement) {
            debug!("SCD30 stop command: {e}");
        }
        self.delay.delay_ms(STOP_SETTLE_MS);

        if let Err(e) =
            self.write_command_with_arg(Command::SetMeasurementInterval, MEASUREMENT_INTERVAL_SECS)
        {
            debug!("SCD30 set-interval command: {e}");
        }
        self.delay.delay_ms(CONFIG_SETTLE_MS);

        let started = self.write_command_with_arg(
            Command::StartContinuousMeasurement,
            AMBIENT_PRESSURE_MBAR,
        );
        self.delay.delay_ms(CONFIG_SETTLE_MS);

        self.state = match started {
            Ok(()) => {
                info!("SCD30 sensor initialized");
                SensorState::Ready
            }
            Err(e) => {
                warn!("SCD30 start measurement failed: {e}");
                SensorState::Faulted
            }
        };
        self.state
    }

    /// Whether a fresh sample is buffered.
    ///
    /// A corrupted status word is reported as "not ready": the sensor
    /// produces these transiently while a conversion completes.
    pub fn poll_ready(&mut self) -> bool {
        match self.read_word(Command::GetDataReady) {
            Ok(ready) => ready == 1,
            Err(SensorError::CrcMismatch { .. }) => {
                warn!("SCD30 CRC mismatch in data ready check");
                false
            }
            Err(e) => {
                debug!("SCD30 data ready poll failed: {e}");
                false
            }
        }
    }

    /// Fetch one buffered sample.  The caller must have seen
    /// [`poll_ready`](Self::poll_ready) return `true`.
    pub fn read_measurement(&mut self) -> Result<SensorReading, SensorError> {
        self.write_command(Command::ReadMeasurement)?;
        self.delay.delay_ms(RESPONSE_WAIT_MS);

        let mut buf = [0u8; MEASUREMENT_LEN];
        self.i2c
            .read(ADDRESS, &mut buf)
            .map_err(|e| SensorError::Bus(e.kind()))?;

        let (co2_ppm, temperature_celsius, relative_humidity_percent) =
            frame::decode_float_triple(&buf).map_err(|e| {
                warn!("SCD30 {e} in measurement data");
                SensorError::from(e)
            })?;

        Ok(SensorReading {
            co2_ppm,
            temperature_celsius,
            relative_humidity_percent,
        })
    }

    /// Firmware version as `(major, minor)`.
    pub fn read_firmware_version(&mut self) -> Result<(u8, u8), SensorError> {
        let [major, minor] = self.read_word(Command::ReadFirmwareVersion)?.to_be_bytes();
        Ok((major, minor))
    }

    // ── Internal ──────────────────────────────────────────────

    fn read_word(&mut self, cmd: Command) -> Result<u16, SensorError> {
        self.write_command(cmd)?;
        self.delay.delay_ms(RESPONSE_WAIT_MS);

        let mut buf = [0u8; WORD_LEN];
        self.i2c
            .read(ADDRESS, &mut buf)
            .map_err(|e| SensorError::Bus(e.kind()))?;
        Ok(frame::decode_word(&buf)?)
    }

    fn write_command(&mut self, cmd: Command) -> Result<(), SensorError> {
        self.i2c
            .write(ADDRESS, &frame::build_command(cmd.code()))
            .map_err(|e| SensorError::Bus(e.kind()))
    }

    fn write_command_with_arg(&mut self, cmd: Command, argument: u16) -> Result<(), SensorError> {
        self.i2c
            .write(ADDRESS, &frame::build_command_with_arg(cmd.code(), argument))
            .map_err(|e| SensorError::Bus(e.kind()))
    }
}

impl<I2C, D> AirQualitySensor for Scd30<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    fn probe(&mut self) -> SensorState {
        Scd30::probe(self)
    }

    fn initialize(&mut self) -> SensorState {
        Scd30::initialize(self)
    }

    fn state(&self) -> SensorState {
        self.state
    }

    fn read_metrics(&mut self) -> Result<SensorReading, SensorError> {
        if self.state != SensorState::Ready {
            return Err(SensorError::NotRunning);
        }
        if !self.poll_ready() {
            debug!("SCD30 data not ready");
            return Err(SensorError::NotReady);
        }
        let reading = self.read_measurement()?;
        debug!(
            "SCD30 - CO2: {:.1} ppm, Temp: {:.1}\u{00b0}C, Humidity: {:.1}%",
            reading.co2_ppm, reading.temperature_celsius, reading.relative_humidity_percent
        );
        Ok(reading)
    }

    fn firmware_version(&mut self) -> Option<(u8, u8)> {
        match self.read_firmware_version() {
            Ok(version) => Some(version),
            Err(e) => {
                debug!("SCD30 firmware version read failed: {e}");
                None
            }
        }
    }
}
