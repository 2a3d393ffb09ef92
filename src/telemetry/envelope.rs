//! Routing wrappers around telemetry records.

use super::TelemetryRecord;

/// Mesh node number.
pub type NodeNum = u32;

/// Node number addressing every node on the mesh.
pub const NODENUM_BROADCAST: NodeNum = u32::MAX;

/// Largest application payload a mesh packet can carry.
pub const MAX_PAYLOAD_LEN: usize = 233;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Broadcast,
    Node(NodeNum),
}

impl Destination {
    pub fn node_num(self) -> NodeNum {
        match self {
            Self::Broadcast => NODENUM_BROADCAST,
            Self::Node(n) => n,
        }
    }

    pub fn from_node_num(num: NodeNum) -> Self {
        if num == NODENUM_BROADCAST {
            Self::Broadcast
        } else {
            Self::Node(num)
        }
    }
}

/// Delivery-priority hint for the mesh router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// Best effort, yields to everything else.
    Background,
    /// Router default.
    Default,
    /// Retried until acknowledged.
    Reliable,
}

/// A record plus everything the mesh needs to deliver it.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchEnvelope {
    /// Originating node; 0 means this node.
    pub from: NodeNum,
    pub to: Destination,
    pub priority: Priority,
    pub want_response: bool,
    pub record: TelemetryRecord,
}

impl DispatchEnvelope {
    /// Locally originated broadcast.
    pub fn broadcast(record: TelemetryRecord, priority: Priority) -> Self {
        Self {
            from: 0,
            to: Destination::Broadcast,
            priority,
            want_response: false,
            record,
        }
    }

    /// Reply addressed to the node that asked.
    pub fn reply_to(node: NodeNum, record: TelemetryRecord) -> Self {
        Self {
            from: 0,
            to: Destination::Node(node),
            priority: Priority::Default,
            want_response: false,
            record,
        }
    }

    /// Envelope view of a packet received from the mesh.
    pub fn received(packet: &InboundPacket, record: TelemetryRecord) -> Self {
        Self {
            from: packet.from,
            to: Destination::from_node_num(packet.to),
            priority: Priority::Default,
            want_response: packet.want_response,
            record,
        }
    }
}

/// A still-encoded packet handed to the module by the mesh router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundPacket {
    pub id: u32,
    pub from: NodeNum,
    pub to: NodeNum,
    pub want_response: bool,
    pub payload: heapless::Vec<u8, MAX_PAYLOAD_LEN>,
}

impl InboundPacket {
    /// Build a packet around an encoded payload.  Returns `None` if the
    /// payload does not fit.
    pub fn new(id: u32, from: NodeNum, to: NodeNum, payload: &[u8]) -> Option<Self> {
        Some(Self {
            id,
            from,
            to,
            want_response: false,
            payload: heapless::Vec::from_slice(payload).ok()?,
        })
    }
}
