//! Session identifier generation
//!
//! Identifiers are 32 bytes from the operating system CSPRNG, rendered as
//! RFC 4648 base-32 with the trailing `=` padding removed. Uniqueness rests
//! on entropy alone; the store never checks for collisions.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::SessionError;

/// Number of random bytes behind each identifier
pub const ID_BYTES: usize = 32;

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Generate a new session identifier
pub fn generate_session_id() -> Result<String, SessionError> {
    let mut key = [0u8; ID_BYTES];
    OsRng.try_fill_bytes(&mut key)?;
    Ok(base32_unpadded(&key))
}

/// Standard-alphabet base-32 without padding characters
fn base32_unpadded(input: &[u8]) -> String {
    let mut out = String::with_capacity((input.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits = 0u32;

    for &byte in input {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
        buffer &= (1 << bits) - 1;
    }

    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }

    out
}
