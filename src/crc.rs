//! CRC-16 implementation for GDL90 frames
//!
//! GDL90 protects every message with a CRC-16 over polynomial 0x1021
//! (MSB-first, zero initial value, no final XOR). The lookup table is built
//! at compile time, so there is no start-up or mutable global state.

/// Generator polynomial, x^16 + x^12 + x^5 + 1.
const POLY: u16 = 0x1021;

const fn build_crc_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ POLY;
            } else {
                crc <<= 1;
            }
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Precomputed CRC table, one entry per value of the high byte.
pub const CRC16_TABLE: [u16; 256] = build_crc_table();

/// Calculate the GDL90 CRC of a message (message ID plus payload, no flags).
///
/// This is the table-driven form from the GDL90 ICD: the high byte of the
/// running CRC selects the table entry and the new data byte is XORed in
/// after the shift.
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(0u16, |crc, &b| {
        CRC16_TABLE[(crc >> 8) as usize] ^ (crc << 8) ^ b as u16
    })
}

/// Split the CRC bytes off an unstuffed frame body.
///
/// The CRC is transmitted little-endian (low byte first) after the message.
/// Returns `None` if the body cannot hold a CRC.
pub fn split_crc(body: &[u8]) -> Option<(&[u8], u16)> {
    if body.len() < 2 {
        return None;
    }
    let (msg, crc) = body.split_at(body.len() - 2);
    Some((msg, u16::from_le_bytes([crc[0], crc[1]])))
}

/// Verify the trailing CRC of an unstuffed frame body.
pub fn verify_crc(body: &[u8]) -> bool {
    match split_crc(body) {
        Some((msg, received)) => crc16(msg) == received,
        None => false,
    }
}
