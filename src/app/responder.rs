//! Request/reply helpers for telemetry requests from other nodes.
//!
//! A request is an inbound packet whose payload is an (empty) telemetry
//! record of the wanted kind.  Only air-quality requests are ours to
//! answer; anything else is left for other handlers.

use crate::error::DecodeError;
use crate::telemetry::{DispatchEnvelope, InboundPacket, TelemetryKind, TelemetryRecord, payload};

/// What an inbound request asks this module for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    AirQuality,
    /// A kind served by some other module.
    Other(TelemetryKind),
}

/// Decode the payload of a request packet.
pub fn parse_request(packet: &InboundPacket) -> Result<Request, DecodeError> {
    let record = payload::decode(&packet.payload)?;
    Ok(match record.kind() {
        TelemetryKind::AirQuality => Request::AirQuality,
        other => Request::Other(other),
    })
}

/// Address `record` back to whoever sent `request`.
pub fn reply_to(request: &InboundPacket, record: TelemetryRecord) -> DispatchEnvelope {
    DispatchEnvelope::reply_to(request.from, record)
}
