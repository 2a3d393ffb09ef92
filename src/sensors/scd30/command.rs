//! SCD30 command set (the subset this firmware issues).

/// Fixed 7-bit I2C address of the SCD30.
pub const ADDRESS: u8 = 0x61;

/// Measurement interval programmed at init, in seconds.
pub const MEASUREMENT_INTERVAL_SECS: u16 = 2;

/// Ambient pressure used for continuous-mode compensation, in mbar.
pub const AMBIENT_PRESSURE_MBAR: u16 = 1013;

/// 16-bit command codes, sent big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Command {
    /// Start continuous measurement. Argument: ambient pressure in mbar
    /// (0 disables compensation).
    StartContinuousMeasurement = 0x0010,
    /// Stop continuous measurement. No argument.
    StopContinuousMeasurement = 0x0104,
    /// Data-ready status; the response word is 1 when a sample is buffered.
    GetDataReady = 0x0202,
    /// Read the buffered sample (CO2, temperature, humidity as f32).
    ReadMeasurement = 0x0300,
    /// Continuous measurement interval. Argument: seconds, 2..=1800.
    SetMeasurementInterval = 0x4600,
    /// Firmware version; response word is major (MSB) / minor (LSB).
    ReadFirmwareVersion = 0xD100,
}

impl Command {
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Map a received code back to a command (used by the bus simulator).
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0x0010 => Some(Self::StartContinuousMeasurement),
            0x0104 => Some(Self::StopContinuousMeasurement),
            0x0202 => Some(Self::GetDataReady),
            0x0300 => Some(Self::ReadMeasurement),
            0x4600 => Some(Self::SetMeasurementInterval),
            0xD100 => Some(Self::ReadFirmwareVersion),
            _ => None,
        }
    }
}
