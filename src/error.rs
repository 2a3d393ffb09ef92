//! Error types for the CO2 telemetry module.
//!
//! Two classes of failure exist.  A sensor that never answers its probe is
//! permanent and ends scheduling for the module's lifetime.  Everything
//! else (bus hiccups, CRC corruption, not-ready polls, malformed inbound
//! requests) is transient: it is logged, counted, and the cycle is skipped.
//! All variants are `Copy` so they can be passed around without allocation.

use core::fmt;

use embedded_hal::i2c::ErrorKind;

use crate::sensors::scd30::frame::CrcMismatch;

// ---------------------------------------------------------------------------
// Top-level module error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The sensor never acknowledged its address.  Permanent.
    BusUnavailable,
    /// A read cycle failed.  Transient.
    Sensor(SensorError),
    /// An inbound request payload could not be decoded.  Dropped silently.
    Decode(DecodeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusUnavailable => write!(f, "sensor not responding on bus"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor read errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The sensor has not buffered a new sample yet.
    NotReady,
    /// The driver is not in the `Ready` state.
    NotRunning,
    /// An I2C transaction failed or came back short.
    Bus(ErrorKind),
    /// A response word failed its CRC check.
    CrcMismatch { word: usize },
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "data not ready"),
            Self::NotRunning => write!(f, "sensor not running"),
            Self::Bus(kind) => write!(f, "bus error: {kind}"),
            Self::CrcMismatch { word } => write!(f, "CRC mismatch at word {word}"),
        }
    }
}

impl From<CrcMismatch> for SensorError {
    fn from(e: CrcMismatch) -> Self {
        Self::CrcMismatch { word: e.word }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Payload decode errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload ended before the record was complete.
    Truncated,
    /// The payload bytes do not describe a valid record.
    Malformed,
    /// The record does not fit the outbound payload buffer.
    TooLarge,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated => write!(f, "payload truncated"),
            Self::Malformed => write!(f, "payload malformed"),
            Self::TooLarge => write!(f, "payload too large"),
        }
    }
}

impl From<postcard::Error> for DecodeError {
    fn from(e: postcard::Error) -> Self {
        match e {
            postcard::Error::DeserializeUnexpectedEnd => Self::Truncated,
            postcard::Error::SerializeBufferFull => Self::TooLarge,
            _ => Self::Malformed,
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, Error>;
