//! Module configuration.
//!
//! Administrative settings for the CO2 telemetry module.  The module only
//! reads these; they arrive from the node's configuration store at boot
//! and can be swapped at runtime with `ModuleCommand::UpdateConfig`.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Broadcast interval used when none is configured.
pub const DEFAULT_BROADCAST_INTERVAL_SECS: u32 = 60 * 60;

/// Delay between boot and the module's first tick.
pub const INITIAL_DELAY_MS: u32 = 10 * 1000;

/// Longest broadcast interval accepted (7 days).
const MAX_BROADCAST_INTERVAL_SECS: u32 = 7 * 24 * 60 * 60;

/// Upper bound on any computed interval; keeps wrapping-millis
/// comparisons unambiguous.
const MAX_INTERVAL_MS: u32 = i32::MAX as u32;

/// Role of this node on the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceRole {
    Client,
    ClientMute,
    Router,
    Repeater,
    Tracker,
    /// Dedicated sensing node: telemetry is its reason to exist.
    Sensor,
}

impl DeviceRole {
    /// Roles whose broadcast interval is never stretched for congestion.
    fn exempt_from_scaling(self) -> bool {
        matches!(self, Self::Router | Self::Tracker | Self::Sensor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Master switch for air-quality telemetry.
    pub air_quality_enabled: bool,
    /// Mesh broadcast interval in seconds; 0 selects the default.
    pub air_quality_interval_secs: u32,
    pub role: DeviceRole,
    /// Cadence of ticks (and opportunistic phone deliveries).
    pub send_to_phone_interval_ms: u32,
    /// Delay after a successful sensor init before the first sample.
    pub start_delay_ms: u32,
    /// Per-node interval growth once more than 40 nodes are online.
    pub congestion_throttle: f32,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            air_quality_enabled: false,
            air_quality_interval_secs: 0,
            role: DeviceRole::Client,
            send_to_phone_interval_ms: 60 * 1000,
            start_delay_ms: 1000,
            congestion_throttle: 0.075,
        }
    }
}

impl TelemetryConfig {
    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.air_quality_interval_secs > MAX_BROADCAST_INTERVAL_SECS {
            return Err(ConfigError::ValidationFailed(
                "air_quality_interval_secs must be at most 7 days",
            ));
        }
        if !(1000..=3_600_000).contains(&self.send_to_phone_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "send_to_phone_interval_ms must be 1000–3600000",
            ));
        }
        if self.start_delay_ms > 60_000 {
            return Err(ConfigError::ValidationFailed(
                "start_delay_ms must be at most 60000",
            ));
        }
        if !(0.0..=1.0).contains(&self.congestion_throttle) {
            return Err(ConfigError::ValidationFailed(
                "congestion_throttle must be 0.0–1.0",
            ));
        }
        Ok(())
    }

    /// Configured interval, or the default when unset, in milliseconds.
    pub fn configured_or_default_ms(&self) -> u32 {
        let secs = if self.air_quality_interval_secs == 0 {
            DEFAULT_BROADCAST_INTERVAL_SECS
        } else {
            self.air_quality_interval_secs
        };
        secs.saturating_mul(1000).min(MAX_INTERVAL_MS)
    }

    /// Mesh broadcast interval for the current network population.
    pub fn broadcast_interval_ms(&self, online_nodes: u32) -> u32 {
        let base = self.configured_or_default_ms();
        if self.role.exempt_from_scaling() {
            return base;
        }
        let scaled = f64::from(base) * f64::from(self.congestion_coefficient(online_nodes));
        scaled.round().min(f64::from(MAX_INTERVAL_MS)) as u32
    }

    /// Small meshes broadcast more often; large ones back off linearly.
    pub fn congestion_coefficient(&self, online_nodes: u32) -> f32 {
        match online_nodes {
            0..=10 => 0.6,
            11..=20 => 0.7,
            21..=30 => 0.8,
            31..=40 => 1.0,
            n => 1.0 + (n - 40) as f32 * self.congestion_throttle,
        }
    }
}

/// Errors from configuration validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}
