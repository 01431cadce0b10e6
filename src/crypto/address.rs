//! v3 onion hostname encoding.
//!
//! A v3 hostname is `base32(pubkey || checksum[..2] || version)` in the
//! lowercase RFC 4648 alphabet, 56 characters, where
//! `checksum = SHA3-256(".onion checksum" || pubkey || version)`.
//!
//! Base32 encodes 5-byte groups independently, so the first 51 characters
//! depend only on the public key and can be produced without hashing. The
//! approximate encoder exploits this to keep SHA3 off the search hot path.

use data_encoding::BASE32_NOPAD;
use sha3::{Digest, Sha3_256};

use super::keypair::{KeyPair, PUBLIC_KEY_LEN};

/// Number of leading hostname bytes the approximate encoder fills in
/// correctly.
pub const HOSTNAME_APPROX_LEN: usize = 51;

/// Length, in bytes, of a full v3 hostname (without the `.onion` suffix).
pub const HOSTNAME_LEN: usize = 56;

/// Base32 alphabet used by onion hostnames.
pub(crate) const ONION_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz234567";

const ONION_VERSION: u8 = 0x03;
const CHECKSUM_PREFIX: &[u8] = b".onion checksum";

/// An Ed25519 key pair together with its derived onion hostname encodings.
///
/// Encodings are recomputed on demand; nothing is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnionAddress {
    key_pair: KeyPair,
}

impl OnionAddress {
    pub fn new(key_pair: KeyPair) -> Self {
        Self { key_pair }
    }

    #[inline]
    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    #[inline]
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LEN] {
        self.key_pair.public_key()
    }

    /// Writes the 56-byte hostname into `hostname`.
    ///
    /// # Panics
    /// Panics if `hostname` is not exactly [`HOSTNAME_LEN`] bytes.
    pub fn hostname(&self, hostname: &mut [u8]) {
        encode_full(self.public_key(), hostname);
    }

    /// Writes the checksum-free approximation of the hostname into
    /// `hostname`. Only the first [`HOSTNAME_APPROX_LEN`] bytes are
    /// meaningful; the rest must be ignored.
    ///
    /// # Panics
    /// Panics if `hostname` is not exactly [`HOSTNAME_LEN`] bytes.
    pub fn hostname_approx(&self, hostname: &mut [u8]) {
        encode_approx(self.public_key(), hostname);
    }

    /// Returns the full hostname with the `.onion` suffix.
    pub fn hostname_string(&self) -> String {
        let mut hostname = [0u8; HOSTNAME_LEN];
        self.hostname(&mut hostname);

        let mut out = String::with_capacity(HOSTNAME_LEN + 6);
        out.push_str(std::str::from_utf8(&hostname).expect("base32 output is ASCII"));
        out.push_str(".onion");
        out
    }
}

impl std::fmt::Display for OnionAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.hostname_string())
    }
}

/// Encodes the exact v3 hostname for `public_key` into `out`.
///
/// # Panics
/// Panics if `out` is not exactly [`HOSTNAME_LEN`] bytes.
pub fn encode_full(public_key: &[u8; PUBLIC_KEY_LEN], out: &mut [u8]) {
    assert_eq!(out.len(), HOSTNAME_LEN, "hostname buffer must be {HOSTNAME_LEN} bytes");

    let mut hasher = Sha3_256::new();
    hasher.update(CHECKSUM_PREFIX);
    hasher.update(public_key);
    hasher.update([ONION_VERSION]);
    let checksum = hasher.finalize();

    let mut payload = [0u8; 35];
    payload[..32].copy_from_slice(public_key);
    payload[32..34].copy_from_slice(&checksum[..2]);
    payload[34] = ONION_VERSION;

    BASE32_NOPAD.encode_mut(&payload, out);
    out.make_ascii_lowercase();
}

/// Encodes the checksum-free approximation of the hostname for `public_key`
/// into `out`. Bytes `[0..51)` match the exact hostname; the tail is
/// truncated and must be ignored.
///
/// # Panics
/// Panics if `out` is not exactly [`HOSTNAME_LEN`] bytes.
pub fn encode_approx(public_key: &[u8; PUBLIC_KEY_LEN], out: &mut [u8]) {
    assert_eq!(out.len(), HOSTNAME_LEN, "hostname buffer must be {HOSTNAME_LEN} bytes");

    // 32 bytes of key encode to 52 base32 characters; only the first 51
    // are independent of the checksum.
    let encoded = BASE32_NOPAD.encode_len(PUBLIC_KEY_LEN);
    BASE32_NOPAD.encode_mut(public_key, &mut out[..encoded]);
    out[..encoded].make_ascii_lowercase();
}
