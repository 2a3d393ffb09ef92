//! Log-based mesh adapter.
//!
//! Implements [`MeshPort`] by writing every outbound envelope to the
//! logger (UART / USB-CDC in production).  Stands in for the radio stack
//! on a bench node; a LoRa router adapter would implement the same trait.

use log::info;

use crate::app::ports::MeshPort;
use crate::telemetry::{DispatchEnvelope, TelemetryVariant};

/// Adapter that logs every envelope and always has airtime.
pub struct LogMeshAdapter {
    online_nodes: u32,
    sent: u32,
}

impl Default for LogMeshAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LogMeshAdapter {
    pub fn new() -> Self {
        Self {
            online_nodes: 1,
            sent: 0,
        }
    }

    /// Pretend this many nodes are online (drives congestion scaling).
    pub fn with_online_nodes(mut self, n: u32) -> Self {
        self.online_nodes = n;
        self
    }

    /// Envelopes logged so far, mesh and phone combined.
    pub fn sent(&self) -> u32 {
        self.sent
    }

    fn log(&mut self, channel: &str, envelope: &DispatchEnvelope) {
        self.sent = self.sent.wrapping_add(1);
        let to = envelope.to.node_num();
        match &envelope.record.variant {
            TelemetryVariant::AirQuality(m) => info!(
                "{} | to={:#010x} prio={:?} t={} | co2={:?}ppm T={:?}\u{00b0}C RH={:?}%",
                channel,
                to,
                envelope.priority,
                envelope.record.time,
                m.co2,
                m.temperature,
                m.relative_humidity,
            ),
            other => info!("{} | to={:#010x} | {:?}", channel, to, other.kind()),
        }
    }
}

impl MeshPort for LogMeshAdapter {
    fn send_to_mesh(&mut self, envelope: DispatchEnvelope, cc_phone: bool) -> bool {
        self.log(if cc_phone { "MESH+PHONE" } else { "MESH" }, &envelope);
        true
    }

    fn send_to_phone(&mut self, envelope: DispatchEnvelope) {
        self.log("PHONE", &envelope);
    }

    fn is_to_phone_queue_empty(&self) -> bool {
        true
    }

    fn is_tx_allowed(&self, _polite: bool) -> bool {
        true
    }

    fn online_node_count(&self) -> u32 {
        self.online_nodes
    }
}
