//! Fuzz target: SCD30 response decoding
//!
//! Feeds arbitrary bytes through the word and measurement decoders and
//! asserts that a frame either decodes to exactly what re-encodes to the
//! same bytes or is rejected with the index of a real bad word.
//!
//! cargo fuzz run fuzz_measurement_decoder

#![no_main]

use co2telemetry::sensors::scd30::frame::{
    MEASUREMENT_LEN, WORD_LEN, decode_float_triple, decode_word, encode_float_triple, encode_word,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Some(Ok(word)) = data.get(..WORD_LEN).map(<[u8; WORD_LEN]>::try_from) {
        if let Ok(value) = decode_word(&word) {
            assert_eq!(encode_word(value), word);
        }
    }

    let Some(bytes) = data.get(..MEASUREMENT_LEN) else {
        return;
    };
    let mut frame = [0u8; MEASUREMENT_LEN];
    frame.copy_from_slice(bytes);

    match decode_float_triple(&frame) {
        Ok(values) => assert_eq!(encode_float_triple(values), frame, "accepted frame must re-encode"),
        Err(e) => {
            assert!(e.word < MEASUREMENT_LEN / WORD_LEN);
            assert_ne!(e.expected, e.received);
        }
    }
});
