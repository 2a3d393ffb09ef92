//! Mock adapters for integration tests.
//!
//! Record every mesh call and pool operation so tests can assert on the
//! full dispatch history without a radio stack.

use std::cell::Cell;

use co2telemetry::app::ports::{ClockPort, MeshPort, PacketPool};
use co2telemetry::app::service::Co2TelemetryModule;
use co2telemetry::config::TelemetryConfig;
use co2telemetry::sensors::scd30::Scd30;
use co2telemetry::sensors::scd30::sim::{SimDelay, SimulatedScd30};
use co2telemetry::telemetry::DispatchEnvelope;

pub type TestModule = Co2TelemetryModule<Scd30<SimulatedScd30, SimDelay>, CountingPool>;

/// Module wired to a simulated bus.  Keep a clone of `bus` to script it.
pub fn module(config: TelemetryConfig, bus: &SimulatedScd30) -> TestModule {
    module_with_pool(config, bus, CountingPool::new(8))
}

pub fn module_with_pool(config: TelemetryConfig, bus: &SimulatedScd30, pool: CountingPool) -> TestModule {
    let sensor = Scd30::new(bus.clone(), SimDelay::default());
    Co2TelemetryModule::new(config, sensor, pool)
}

pub fn enabled_config() -> TelemetryConfig {
    TelemetryConfig {
        air_quality_enabled: true,
        ..TelemetryConfig::default()
    }
}

// ── FakeMesh ──────────────────────────────────────────────────

pub struct FakeMesh {
    pub mesh_sent: Vec<DispatchEnvelope>,
    /// `cc_phone` flag of every accepted mesh send.
    pub mesh_cc_phone: Vec<bool>,
    pub phone_sent: Vec<DispatchEnvelope>,
    pub tx_allowed: bool,
    pub accept_mesh: bool,
    pub phone_queue_empty: bool,
    pub online_nodes: u32,
    /// `polite` argument of every `is_tx_allowed` call.
    pub polite_checks: Cell<Vec<bool>>,
}

#[allow(dead_code)]
impl FakeMesh {
    pub fn new() -> Self {
        Self {
            mesh_sent: Vec::new(),
            mesh_cc_phone: Vec::new(),
            phone_sent: Vec::new(),
            tx_allowed: true,
            accept_mesh: true,
            phone_queue_empty: true,
            online_nodes: 40,
            polite_checks: Cell::new(Vec::new()),
        }
    }

    pub fn total_sent(&self) -> usize {
        self.mesh_sent.len() + self.phone_sent.len()
    }

    pub fn polite_checks(&self) -> Vec<bool> {
        let v = self.polite_checks.take();
        self.polite_checks.set(v.clone());
        v
    }
}

impl Default for FakeMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshPort for FakeMesh {
    fn send_to_mesh(&mut self, envelope: DispatchEnvelope, cc_phone: bool) -> bool {
        if self.accept_mesh {
            self.mesh_sent.push(envelope);
            self.mesh_cc_phone.push(cc_phone);
        }
        self.accept_mesh
    }

    fn send_to_phone(&mut self, envelope: DispatchEnvelope) {
        self.phone_sent.push(envelope);
    }

    fn is_to_phone_queue_empty(&self) -> bool {
        self.phone_queue_empty
    }

    fn is_tx_allowed(&self, polite: bool) -> bool {
        let mut v = self.polite_checks.take();
        v.push(polite);
        self.polite_checks.set(v);
        self.tx_allowed
    }

    fn online_node_count(&self) -> u32 {
        self.online_nodes
    }
}

// ── FakeClock ─────────────────────────────────────────────────

pub struct FakeClock {
    millis: Cell<u32>,
    pub unix: u32,
}

#[allow(dead_code)]
impl FakeClock {
    pub fn at(millis: u32) -> Self {
        Self {
            millis: Cell::new(millis),
            unix: 1_700_000_000,
        }
    }

    pub fn set(&self, millis: u32) {
        self.millis.set(millis);
    }

    pub fn advance(&self, ms: u32) {
        self.millis.set(self.millis.get().wrapping_add(ms));
    }
}

impl ClockPort for FakeClock {
    fn millis(&self) -> u32 {
        self.millis.get()
    }

    fn unix_time(&self) -> u32 {
        self.unix
    }
}

// ── CountingPool ──────────────────────────────────────────────

/// Pool of numbered tokens that tracks allocations and releases.
pub struct CountingPool {
    capacity: usize,
    /// Successful allocations left before the pool reports exhaustion.
    alloc_budget: Option<usize>,
    next_id: u32,
    pub allocated: Vec<u32>,
    pub released: Vec<u32>,
    pub copies: Vec<DispatchEnvelope>,
}

#[allow(dead_code)]
impl CountingPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            alloc_budget: None,
            next_id: 0,
            allocated: Vec::new(),
            released: Vec::new(),
            copies: Vec::new(),
        }
    }

    /// Hand out `n` packets, then behave as exhausted.
    pub fn exhausted_after(mut self, n: usize) -> Self {
        self.alloc_budget = Some(n);
        self
    }

    pub fn outstanding(&self) -> usize {
        self.allocated.len() - self.released.len()
    }
}

impl PacketPool for CountingPool {
    type Packet = u32;

    fn alloc_copy(&mut self, envelope: &DispatchEnvelope) -> Option<u32> {
        if self.outstanding() >= self.capacity || self.alloc_budget == Some(0) {
            return None;
        }
        if let Some(n) = self.alloc_budget.as_mut() {
            *n -= 1;
        }
        self.next_id += 1;
        self.allocated.push(self.next_id);
        self.copies.push(envelope.clone());
        Some(self.next_id)
    }

    fn release(&mut self, packet: u32) {
        assert!(
            !self.released.contains(&packet),
            "packet {packet} released twice"
        );
        self.released.push(packet);
    }
}
