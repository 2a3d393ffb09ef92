//! Payload encoding for telemetry records (postcard).

use super::TelemetryRecord;
use super::envelope::MAX_PAYLOAD_LEN;
use crate::error::DecodeError;

/// Encode a record into a mesh-sized payload buffer.
pub fn encode(record: &TelemetryRecord) -> Result<heapless::Vec<u8, MAX_PAYLOAD_LEN>, DecodeError> {
    let mut buf = [0u8; MAX_PAYLOAD_LEN];
    let used = postcard::to_slice(record, &mut buf)?;
    heapless::Vec::from_slice(used).map_err(|_| DecodeError::TooLarge)
}

/// Decode a payload.  Trailing bytes after the record are rejected.
pub fn decode(bytes: &[u8]) -> Result<TelemetryRecord, DecodeError> {
    let (record, rest) = postcard::take_from_bytes::<TelemetryRecord>(bytes)?;
    if !rest.is_empty() {
        return Err(DecodeError::Malformed);
    }
    Ok(record)
}
