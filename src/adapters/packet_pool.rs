//! Heap-backed packet pool.
//!
//! Implements [`PacketPool`] with boxed envelopes and a hard cap on how
//! many may be outstanding at once, mirroring the fixed-size pools of a
//! radio stack.

use log::warn;

use crate::app::ports::PacketPool;
use crate::telemetry::DispatchEnvelope;

pub struct HeapPacketPool {
    capacity: usize,
    outstanding: usize,
}

impl HeapPacketPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            outstanding: 0,
        }
    }

    /// Packets handed out and not yet released.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl PacketPool for HeapPacketPool {
    type Packet = Box<DispatchEnvelope>;

    fn alloc_copy(&mut self, envelope: &DispatchEnvelope) -> Option<Self::Packet> {
        if self.outstanding >= self.capacity {
            warn!("Packet pool exhausted ({} outstanding)", self.outstanding);
            return None;
        }
        self.outstanding += 1;
        Some(Box::new(envelope.clone()))
    }

    fn release(&mut self, packet: Self::Packet) {
        drop(packet);
        self.outstanding = self.outstanding.saturating_sub(1);
    }
}
