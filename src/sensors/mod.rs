//! Sensor subsystem: the SCD30 driver and the types it hands upward.

pub mod scd30;

/// Driver lifecycle.  `NotDetected` and `Faulted` both mean "schedule
/// nothing"; the split exists for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    NotDetected,
    Initializing,
    Ready,
    Faulted,
}

impl SensorState {
    pub const fn is_usable(self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// One complete SCD30 sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub co2_ppm: f32,
    pub temperature_celsius: f32,
    pub relative_humidity_percent: f32,
}

impl SensorReading {
    pub const fn new(co2_ppm: f32, temperature_celsius: f32, relative_humidity_percent: f32) -> Self {
        Self {
            co2_ppm,
            temperature_celsius,
            relative_humidity_percent,
        }
    }
}
