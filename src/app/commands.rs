//! Inbound commands to the telemetry module.
//!
//! These come from the node's admin channel (phone app, serial console)
//! and are applied by [`Co2TelemetryModule::handle_command`](super::service::Co2TelemetryModule::handle_command).

use crate::config::TelemetryConfig;

#[derive(Debug, Clone)]
pub enum ModuleCommand {
    /// Swap in a new configuration.  Rejected if it fails validation.
    UpdateConfig(TelemetryConfig),

    /// Node is going down: return the cached packet to the pool.
    Shutdown,
}
