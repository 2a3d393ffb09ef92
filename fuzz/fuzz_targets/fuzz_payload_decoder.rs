//! Fuzz target: inbound telemetry payloads
//!
//! Arbitrary bytes arriving from the mesh must decode to a record or a
//! typed error, never a panic.  Accepted records must survive re-encoding.
//!
//! cargo fuzz run fuzz_payload_decoder

#![no_main]

use co2telemetry::telemetry::payload;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(record) = payload::decode(data) {
        let bytes = payload::encode(&record).expect("decoded record must re-encode");
        let again = payload::decode(&bytes).expect("re-encoded record must decode");
        assert_eq!(again.kind(), record.kind());
    }
});
