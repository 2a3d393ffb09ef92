//! Telemetry records exchanged between mesh nodes.
//!
//! A [`TelemetryRecord`] is a timestamp plus a tagged [`TelemetryVariant`].
//! This module only ever produces the air-quality variant, but it has to
//! recognise the others so it can ignore requests that are not for it.

pub mod envelope;
pub mod payload;

use serde::{Deserialize, Serialize};

use crate::sensors::SensorReading;

pub use envelope::{Destination, DispatchEnvelope, InboundPacket, NODENUM_BROADCAST, NodeNum, Priority};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// Wall-clock seconds since the Unix epoch (0 if the clock is unset).
    pub time: u32,
    pub variant: TelemetryVariant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryVariant {
    AirQuality(AirQualityMetrics),
    Environment(EnvironmentMetrics),
    Device(DeviceMetrics),
}

/// Discriminant of [`TelemetryVariant`], used to match requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryKind {
    AirQuality,
    Environment,
    Device,
}

impl TelemetryVariant {
    pub fn kind(&self) -> TelemetryKind {
        match self {
            Self::AirQuality(_) => TelemetryKind::AirQuality,
            Self::Environment(_) => TelemetryKind::Environment,
            Self::Device(_) => TelemetryKind::Device,
        }
    }
}

/// CO2 with the temperature and humidity measured alongside it.
///
/// Empty metrics are how a request for this kind is expressed on the wire.
/// Records built from a sensor always carry all three fields together.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AirQualityMetrics {
    /// CO2 concentration in whole ppm.
    pub co2: Option<u32>,
    pub temperature: Option<f32>,
    pub relative_humidity: Option<f32>,
}

impl AirQualityMetrics {
    pub fn from_reading(reading: &SensorReading) -> Self {
        Self {
            // Float-to-int `as` saturates and maps NaN to 0.
            co2: Some(reading.co2_ppm as u32),
            temperature: Some(reading.temperature_celsius),
            relative_humidity: Some(reading.relative_humidity_percent),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.co2.is_some() && self.temperature.is_some() && self.relative_humidity.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnvironmentMetrics {
    pub temperature: Option<f32>,
    pub relative_humidity: Option<f32>,
    pub barometric_pressure: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceMetrics {
    pub battery_level: Option<u32>,
    pub voltage: Option<f32>,
    pub uptime_seconds: Option<u32>,
}

impl TelemetryRecord {
    /// Air-quality record stamped with `time`.
    pub fn air_quality(time: u32, reading: &SensorReading) -> Self {
        Self {
            time,
            variant: TelemetryVariant::AirQuality(AirQualityMetrics::from_reading(reading)),
        }
    }

    /// An empty record of the given kind, as sent when requesting telemetry.
    pub fn request(kind: TelemetryKind) -> Self {
        let variant = match kind {
            TelemetryKind::AirQuality => TelemetryVariant::AirQuality(AirQualityMetrics::default()),
            TelemetryKind::Environment => {
                TelemetryVariant::Environment(EnvironmentMetrics::default())
            }
            TelemetryKind::Device => TelemetryVariant::Device(DeviceMetrics::default()),
        };
        Self { time: 0, variant }
    }

    pub fn kind(&self) -> TelemetryKind {
        self.variant.kind()
    }

    pub fn air_quality_metrics(&self) -> Option<&AirQualityMetrics> {
        match &self.variant {
            TelemetryVariant::AirQuality(m) => Some(m),
            _ => None,
        }
    }
}
