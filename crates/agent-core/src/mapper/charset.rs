//! Gen 3 proprietary text decoding.
//!
//! One-directional byte-to-glyph mapping over three contiguous ranges.
//! No escaping or multi-byte glyphs are modeled.

/// Fixed length of the player-name field in RAM.
pub const PLAYER_NAME_LEN: usize = 7;

/// Substituted for any byte outside the known glyph ranges.
pub const UNKNOWN_GLYPH: char = '?';

pub fn decode_glyph(byte: u8) -> Option<char> {
    match byte {
        0xA1..=0xAA => Some((b'0' + (byte - 0xA1)) as char),
        0xBB..=0xD4 => Some((b'A' + (byte - 0xBB)) as char),
        0xD5..=0xEE => Some((b'a' + (byte - 0xD5)) as char),
        _ => None,
    }
}

/// Decodes a fixed-length name run.
///
/// Stops at the 0xFF terminator (0x00 is treated the same, as an unwritten
/// byte). Out-of-range bytes decode to [`UNKNOWN_GLYPH`] and decoding
/// continues. An empty decode falls back to `"Unknown"`.
pub fn decode_name(bytes: &[u8]) -> String {
    let mut name = String::new();
    for &byte in bytes.iter().take(PLAYER_NAME_LEN) {
        if byte == 0xFF || byte == 0x00 {
            break;
        }
        name.push(decode_glyph(byte).unwrap_or(UNKNOWN_GLYPH));
    }
    if name.is_empty() {
        "Unknown".to_string()
    } else {
        name
    }
}
