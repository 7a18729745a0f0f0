//! 4b6b line code used on the radio link
//!
//! Each nibble becomes a 6-bit symbol chosen to keep the bit stream DC
//! balanced. Symbols are packed MSB-first and the final partial byte is
//! zero padded, which is what the bridge firmware expects to put on air.

use crate::hardware::{LinkError, LinkResult};

/// Symbol for each nibble value
const CODES: [u8; 16] = [
    0x15, 0x31, 0x32, 0x23, 0x34, 0x25, 0x26, 0x16, 0x1A, 0x19, 0x2A, 0x0B, 0x2C, 0x0D, 0x0E, 0x1C,
];

/// Reverse lookup from 6-bit symbol to nibble, 0xFF for unused symbols
const DECODE_TABLE: [u8; 64] = build_decode_table();

const fn build_decode_table() -> [u8; 64] {
    let mut table = [0xFFu8; 64];
    let mut nibble = 0;
    while nibble < 16 {
        table[CODES[nibble] as usize] = nibble as u8;
        nibble += 1;
    }
    table
}

/// Encode bytes for transmission
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity((data.len() * 12 + 7) / 8);
    let mut acc: u32 = 0;
    let mut bits = 0u32;

    for &byte in data {
        for nibble in [byte >> 4, byte & 0x0F] {
            acc = (acc << 6) | CODES[nibble as usize] as u32;
            bits += 6;
            while bits >= 8 {
                bits -= 8;
                output.push((acc >> bits) as u8);
                acc &= (1 << bits) - 1;
            }
        }
    }

    if bits > 0 {
        output.push((acc << (8 - bits)) as u8);
    }

    output
}

/// Decode a received bit stream back into bytes.
///
/// Decoding stops at an all-zero symbol (end of packet padding) or when
/// fewer than two symbols remain; any other unknown symbol is an error.
pub fn decode(data: &[u8]) -> LinkResult<Vec<u8>> {
    let mut output = Vec::with_capacity(data.len() * 8 / 12);
    let mut acc: u32 = 0;
    let mut bits = 0u32;
    let mut high: Option<u8> = None;

    for &byte in data {
        acc = (acc << 8) | byte as u32;
        bits += 8;
        while bits >= 6 {
            bits -= 6;
            let symbol = ((acc >> bits) & 0x3F) as u8;
            acc &= (1 << bits) - 1;

            if symbol == 0 {
                return Ok(output);
            }
            let nibble = DECODE_TABLE[symbol as usize];
            if nibble == 0xFF {
                return Err(LinkError::invalid_packet(format!(
                    "invalid 4b6b symbol 0x{:02x} at byte {}",
                    symbol,
                    output.len()
                )));
            }
            match high.take() {
                Some(h) => output.push((h << 4) | nibble),
                None => high = Some(nibble),
            }
        }
    }

    Ok(output)
}
