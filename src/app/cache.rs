//! Single-slot holder for the most recent telemetry packet.

use super::ports::PacketPool;

/// Holds at most one pooled packet.  Replacing or clearing it returns the
/// previous packet to the pool, so each allocation is released exactly once.
pub struct LastPacketCache<T> {
    packet: Option<T>,
}

impl<T> Default for LastPacketCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LastPacketCache<T> {
    pub const fn new() -> Self {
        Self { packet: None }
    }

    /// Release the held packet (if any), then keep `packet`.
    pub fn store<P>(&mut self, packet: T, pool: &mut P)
    where
        P: PacketPool<Packet = T>,
    {
        if let Some(old) = self.packet.take() {
            pool.release(old);
        }
        self.packet = Some(packet);
    }

    pub fn clear<P>(&mut self, pool: &mut P)
    where
        P: PacketPool<Packet = T>,
    {
        if let Some(old) = self.packet.take() {
            pool.release(old);
        }
    }

    pub fn get(&self) -> Option<&T> {
        self.packet.as_ref()
    }
}
