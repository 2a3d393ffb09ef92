//! SCD30 I2C frame codec.
//!
//! Wire format (all multi-byte values big-endian):
//!
//! ```text
//!  Command without argument      Command with argument
//! ┌──────────┐                  ┌──────────┬──────────┬─────┐
//! │ Code (2B)│                  │ Code (2B)│ Arg (2B) │ CRC │
//! └──────────┘                  └──────────┴──────────┴─────┘
//!
//!  Response: N words, each followed by its own CRC
//! ┌──────────┬─────┬──────────┬─────┬─ ─ ─
//! │ Word (2B)│ CRC │ Word (2B)│ CRC │
//! └──────────┴─────┴──────────┴─────┴─ ─ ─
//! ```
//!
//! A measurement is six words: CO2, temperature and humidity, each an
//! IEEE-754 single split across two consecutive words (MSW first).

use core::fmt;

use crc::{Algorithm, Crc};

/// Sensirion CRC-8 (catalogued as CRC-8/NRSC-5).
/// Polynomial: 0x31
/// Initial Value: 0xFF
/// Input/Output Reflected: false
/// Final XOR: 0x00
/// Check Value: 0xF7 (for "123456789")
pub const SENSIRION_CRC8: Algorithm<u8> = Algorithm {
    width: 8,
    poly: 0x31,
    init: 0xFF,
    refin: false,
    refout: false,
    xorout: 0x00,
    check: 0xF7,
    residue: 0x00,
};

const CRC_COMPUTER: Crc<u8> = Crc::<u8>::new(&SENSIRION_CRC8);

/// Bytes in one CRC-protected response word.
pub const WORD_LEN: usize = 3;

/// Bytes in a full measurement response (6 words).
pub const MEASUREMENT_LEN: usize = 6 * WORD_LEN;

/// A response word whose CRC byte did not match its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrcMismatch {
    /// Zero-based index of the offending word within the response.
    pub word: usize,
    /// CRC computed over the received word bytes.
    pub expected: u8,
    /// CRC byte actually received.
    pub received: u8,
}

impl fmt::Display for CrcMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CRC mismatch in word {}: expected {:#04x}, received {:#04x}",
            self.word, self.expected, self.received
        )
    }
}

/// CRC-8 over `data`.
#[inline]
pub fn crc8(data: &[u8]) -> u8 {
    CRC_COMPUTER.checksum(data)
}

/// Frame a bare command (no argument, no CRC).
pub fn build_command(code: u16) -> [u8; 2] {
    code.to_be_bytes()
}

/// Frame a command carrying a 16-bit argument plus the argument's CRC.
pub fn build_command_with_arg(code: u16, argument: u16) -> [u8; 5] {
    let [c0, c1] = code.to_be_bytes();
    let [a0, a1] = argument.to_be_bytes();
    [c0, c1, a0, a1, crc8(&[a0, a1])]
}

/// Validate and decode a single response word.
pub fn decode_word(bytes: &[u8; WORD_LEN]) -> Result<u16, CrcMismatch> {
    check_word(0, bytes)
}

/// Validate all six words of a measurement and reassemble three `f32`s.
///
/// Fails on the first bad word; a partially valid triple is never returned.
pub fn decode_float_triple(bytes: &[u8; MEASUREMENT_LEN]) -> Result<(f32, f32, f32), CrcMismatch> {
    let mut words = [0u16; 6];
    for (i, (word, chunk)) in words.iter_mut().zip(bytes.chunks_exact(WORD_LEN)).enumerate() {
        let group = [chunk[0], chunk[1], chunk[2]];
        *word = check_word(i, &group)?;
    }

    let join = |hi: u16, lo: u16| f32::from_bits((u32::from(hi) << 16) | u32::from(lo));
    Ok((
        join(words[0], words[1]),
        join(words[2], words[3]),
        join(words[4], words[5]),
    ))
}

/// Encode one word with its CRC (sensor side of the exchange).
pub fn encode_word(value: u16) -> [u8; WORD_LEN] {
    let [hi, lo] = value.to_be_bytes();
    [hi, lo, crc8(&[hi, lo])]
}

/// Encode three floats exactly as the sensor lays out a measurement.
pub fn encode_float_triple(values: (f32, f32, f32)) -> [u8; MEASUREMENT_LEN] {
    let mut out = [0u8; MEASUREMENT_LEN];
    let bits = [values.0.to_bits(), values.1.to_bits(), values.2.to_bits()];
    for (i, b) in bits.iter().enumerate() {
        let hi = encode_word((b >> 16) as u16);
        let lo = encode_word(*b as u16);
        let at = i * 2 * WORD_LEN;
        out[at..at + WORD_LEN].copy_from_slice(&hi);
        out[at + WORD_LEN..at + 2 * WORD_LEN].copy_from_slice(&lo);
    }
    out
}

fn check_word(index: usize, bytes: &[u8; WORD_LEN]) -> Result<u16, CrcMismatch> {
    let expected = crc8(&bytes[..2]);
    if expected != bytes[2] {
        return Err(CrcMismatch {
            word: index,
            expected,
            received: bytes[2],
        });
    }
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}
