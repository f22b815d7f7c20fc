#![allow(dead_code)]

pub mod range_server;

/// Deterministic non-repeating-ish body so misplaced bytes are detected.
pub fn pattern_body(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8 ^ (i >> 12) as u8).collect()
}
