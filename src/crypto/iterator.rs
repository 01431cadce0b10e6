//! Amortized Ed25519 key enumeration.
//!
//! Checking a candidate public key only needs the curve point, so the
//! iterator keeps a running point `P = (s + k)·G` and steps it by the fixed
//! point `8·G`. One point addition per candidate replaces a full scalar
//! multiplication; the secret scalar is only reconstructed when a candidate
//! actually matches.
//!
//! Stepping by 8 keeps the scalar clamped: `k` stays a multiple of 8, so
//! bits 0-2 of `s + k` remain clear.

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use rand::{CryptoRng, RngCore};

use super::keypair::{KeyError, KeyPair, PUBLIC_KEY_LEN, SECRET_KEY_LEN};

/// Highest counter value at which another step of 8 is still allowed.
const COUNTER_MAX: u64 = u64::MAX - 8;

/// Enumerates valid Ed25519 key pairs starting from a random seed key.
///
/// Not thread safe; create a separate iterator per worker instead of sharing
/// one instance.
pub struct KeyIterator {
    base: KeyPair,
    scalar: [u8; 32],
    point: EdwardsPoint,
    eight_base: EdwardsPoint,
    counter: u64,
}

impl KeyIterator {
    /// Creates an iterator positioned at a freshly generated key pair.
    pub fn new<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let base = KeyPair::generate(rng);
        let scalar = base.scalar_bytes();
        let point = EdwardsPoint::mul_base_clamped(scalar);
        let eight_base = EdwardsPoint::mul_base(&Scalar::from(8u64));

        Self {
            base,
            scalar,
            point,
            eight_base,
            counter: 0,
        }
    }

    /// Returns the compressed Edwards-Y encoding of the current public key.
    #[inline]
    pub fn public_key(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.point.compress().to_bytes()
    }

    /// Steps to the next key pair.
    ///
    /// Returns `false` once the iterator has exhausted its 2^64 slice of the
    /// key space; the iterator then stays exhausted and keeps returning
    /// `false`.
    #[inline]
    pub fn advance(&mut self) -> bool {
        if self.counter > COUNTER_MAX {
            return false;
        }

        self.point += &self.eight_base;
        self.counter += 8;

        true
    }

    /// Reconstructs the expanded secret key for the current position.
    ///
    /// The scalar is rebuilt as `s + k` with a plain byte-wise add, so the
    /// result is checked for the clamped bit pattern; a carry past bit 254
    /// surfaces as [`KeyError::SanityCheckFailed`].
    pub fn secret_key(&self) -> Result<[u8; SECRET_KEY_LEN], KeyError> {
        let mut scalar = self.scalar;
        if self.counter > 0 {
            scalar_add_u64(&mut scalar, self.counter);
        }

        if scalar[0] & 248 != scalar[0] || (scalar[31] & 63) | 64 != scalar[31] {
            return Err(KeyError::SanityCheckFailed);
        }

        let mut secret = [0u8; SECRET_KEY_LEN];
        secret[..32].copy_from_slice(&scalar);
        secret[32..].copy_from_slice(&self.base.secret_key()[32..]);

        Ok(secret)
    }
}

/// Adds `value` to a 256-bit little-endian integer, propagating the carry
/// across all 32 bytes. No modular reduction; overflow past bit 255 is
/// discarded.
fn scalar_add_u64(scalar: &mut [u8; 32], mut value: u64) {
    let mut carry = 0u16;

    for byte in scalar.iter_mut() {
        let sum = u16::from(*byte) + ((value & 0xff) as u16) + carry;
        *byte = sum as u8;
        carry = sum >> 8;
        value >>= 8;

        if value == 0 && carry == 0 {
            break;
        }
    }
}
