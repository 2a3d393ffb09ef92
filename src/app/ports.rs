//! Port traits: the hexagonal boundary between the telemetry module and
//! the rest of the node.
//!
//! ```text
//!   AirQualitySensor ──▶ ┌──────────────────────┐ ──▶ MeshPort
//!         ClockPort ──▶ │  Co2TelemetryModule  │ ◀─▶ PacketPool
//!                        └──────────────────────┘
//!                          ▲ PeriodicTask   ▲ InboundHandler
//!                          └── node scheduler / mesh router
//! ```
//!
//! Driven adapters (sensor driver, radio, clock, allocator) implement the
//! lower traits.  The node's scheduler and router drive the module
//! through [`PeriodicTask`] and [`InboundHandler`].

use crate::error::SensorError;
use crate::sensors::{SensorReading, SensorState};
use crate::telemetry::{DispatchEnvelope, InboundPacket};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → module)
// ───────────────────────────────────────────────────────────────

/// An air-quality sensor the module can bring up and sample.
pub trait AirQualitySensor {
    /// Check that the device answers on its bus.
    fn probe(&mut self) -> SensorState;

    /// Configure and start continuous measurement.
    fn initialize(&mut self) -> SensorState;

    fn state(&self) -> SensorState;

    /// One complete sample, or why there is none this cycle.
    fn read_metrics(&mut self) -> Result<SensorReading, SensorError>;

    /// Device firmware `(major, minor)`, if the sensor reports one.
    fn firmware_version(&mut self) -> Option<(u8, u8)> {
        None
    }
}

// ───────────────────────────────────────────────────────────────
// Mesh port (driven adapter: module → radio / phone link)
// ───────────────────────────────────────────────────────────────

/// Outbound delivery and the radio's view of channel health.
///
/// `send_*` take ownership of the envelope.
pub trait MeshPort {
    /// Queue an envelope for over-the-air delivery.  With `cc_phone` the
    /// router also hands a copy to the attached phone client.  `false` if
    /// the router refused it.
    fn send_to_mesh(&mut self, envelope: DispatchEnvelope, cc_phone: bool) -> bool;

    /// Hand an envelope to the attached phone client only.
    fn send_to_phone(&mut self, envelope: DispatchEnvelope);

    fn is_to_phone_queue_empty(&self) -> bool;

    /// Channel- and air-utilization gate.  `polite` asks for the stricter
    /// channel threshold used by non-critical traffic.
    fn is_tx_allowed(&self, polite: bool) -> bool;

    /// Nodes heard recently, used for congestion scaling.
    fn online_node_count(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

pub trait ClockPort {
    /// Monotonic milliseconds since boot.  Wraps at `u32::MAX`.
    fn millis(&self) -> u32;

    /// Wall-clock seconds since the Unix epoch, 0 if unknown.
    fn unix_time(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Packet pool (driven adapter: module ↔ node allocator)
// ───────────────────────────────────────────────────────────────

/// Fixed-capacity allocator for outbound and cached packets.
///
/// Every packet handed out by `alloc_copy` must come back through
/// `release` exactly once.
pub trait PacketPool {
    type Packet;

    /// Copy an envelope into a pooled packet.  `None` when exhausted.
    fn alloc_copy(&mut self, envelope: &DispatchEnvelope) -> Option<Self::Packet>;

    fn release(&mut self, packet: Self::Packet);
}

// ───────────────────────────────────────────────────────────────
// Driving ports (node → module)
// ───────────────────────────────────────────────────────────────

/// When the node scheduler should call [`PeriodicTask::run_once`] again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextRun {
    After(u32),
    Never,
}

/// A task invoked by the node's cooperative scheduler.
pub trait PeriodicTask {
    fn run_once(&mut self, mesh: &mut dyn MeshPort, clock: &dyn ClockPort) -> NextRun;
}

/// Whether an inbound packet was consumed.  `NotClaimed` lets the router
/// offer it to the next handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    NotClaimed,
    Claimed,
}

/// A handler registered with the mesh router for telemetry packets.
pub trait InboundHandler {
    /// Observe a telemetry packet from another node.
    fn handle_received(&mut self, packet: &InboundPacket) -> Handled;

    /// Build the response to a telemetry request, if this handler serves it.
    fn alloc_reply(
        &mut self,
        request: &InboundPacket,
        clock: &dyn ClockPort,
    ) -> Option<DispatchEnvelope>;
}
