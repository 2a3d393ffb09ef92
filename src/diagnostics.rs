//! Runtime diagnostics for the telemetry module.
//!
//! Transient failures are absorbed by the module and would otherwise only
//! show up in the log.  [`TelemetryStats`] counts them so a node that is
//! quietly failing every read (a flaky cable, a corrupted bus) is visible
//! from the admin channel.  The counters serialize with serde so the
//! snapshot can ride the same postcard/JSON paths as the config.

use serde::{Deserialize, Serialize};

use crate::error::{Error, SensorError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryStats {
    pub samples_ok: u32,
    pub not_ready: u32,
    pub crc_failures: u32,
    pub bus_errors: u32,
    pub decode_failures: u32,
    pub mesh_sends: u32,
    pub phone_sends: u32,
    pub replies: u32,
}

impl TelemetryStats {
    pub const fn new() -> Self {
        Self {
            samples_ok: 0,
            not_ready: 0,
            crc_failures: 0,
            bus_errors: 0,
            decode_failures: 0,
            mesh_sends: 0,
            phone_sends: 0,
            replies: 0,
        }
    }

    /// Bump the counter matching `err`.
    pub fn record(&mut self, err: &Error) {
        let counter = match err {
            Error::BusUnavailable => &mut self.bus_errors,
            Error::Sensor(SensorError::NotReady | SensorError::NotRunning) => &mut self.not_ready,
            Error::Sensor(SensorError::Bus(_)) => &mut self.bus_errors,
            Error::Sensor(SensorError::CrcMismatch { .. }) => &mut self.crc_failures,
            Error::Decode(_) => &mut self.decode_failures,
        };
        *counter = counter.saturating_add(1);
    }

    pub fn record_sample(&mut self) {
        self.samples_ok = self.samples_ok.saturating_add(1);
    }

    /// Every failure counted so far.
    pub fn failures(&self) -> u32 {
        self.not_ready
            .saturating_add(self.crc_failures)
            .saturating_add(self.bus_errors)
            .saturating_add(self.decode_failures)
    }
}

// ───────────────────────────────────────────────────────────────
// Panic hook
// ───────────────────────────────────────────────────────────────

/// Route panics through the `log` facade so they reach the serial console
/// with the rest of the module's output before the reset.
pub fn install_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };

        match info.location() {
            Some(loc) => log::error!("PANIC at {}:{}: {}", loc.file(), loc.line(), reason),
            None => log::error!("PANIC: {}", reason),
        }
    }));
}
