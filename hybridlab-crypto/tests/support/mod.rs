//! Shared helpers for the hybridlab-crypto integration tests.
//!
//! RSA key generation dominates test time, so each test binary generates
//! its pairs once and shares them.

#![allow(dead_code)]

use hybridlab_crypto::{KeyPair, generate_key_pair};
use std::sync::OnceLock;

/// A 2048-bit pair shared by every test in the binary.
pub fn primary_pair() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| generate_key_pair(2048).expect("generate primary pair"))
}

/// A second, unrelated 2048-bit pair.
pub fn other_pair() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| generate_key_pair(2048).expect("generate other pair"))
}

/// Deterministic non-trivial plaintext of the given length.
pub fn sample_plaintext(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}
