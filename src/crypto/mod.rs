//! Cryptographic operations for onion address mining.
//!
//! This module provides:
//! - Ed25519 key pair generation with Tor's expanded secret-key layout
//! - An amortized key iterator that steps through the public-key space
//!   using point addition instead of a scalar multiplication per candidate
//! - v3 onion hostname encoding (exact and checksum-free approximate)

mod address;
mod iterator;
mod keypair;

pub use address::{
    encode_approx, encode_full, OnionAddress, HOSTNAME_APPROX_LEN, HOSTNAME_LEN,
};
pub use iterator::KeyIterator;
pub use keypair::{KeyError, KeyPair, PUBLIC_KEY_LEN, SECRET_KEY_LEN};

pub(crate) use address::ONION_ALPHABET;
