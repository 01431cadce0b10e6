//! Ed25519 key pair generation in Tor's expanded secret-key layout.

use curve25519_dalek::edwards::EdwardsPoint;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha512};

/// Size, in bytes, of a public key (compressed Edwards-Y encoding).
pub const PUBLIC_KEY_LEN: usize = 32;

/// Size, in bytes, of an expanded secret key (clamped scalar + signing prefix).
pub const SECRET_KEY_LEN: usize = 64;

/// Errors produced by key reconstruction and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// The reconstructed secret scalar no longer has the Ed25519 clamped
    /// bit pattern (bits 0-2 clear, bit 254 set, bit 255 clear).
    #[error("secret key scalar failed the clamping sanity check")]
    SanityCheckFailed,

    /// The public key does not equal the one derived from the secret key.
    #[error("public key does not match the one derived from the secret key")]
    KeyMismatch,
}

/// An Ed25519 key pair.
///
/// The secret key is held in Tor's expanded form: the first 32 bytes are the
/// SHA-512-clamped scalar, the last 32 bytes the SHA-512-derived prefix used
/// by Ed25519 signing.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    public: [u8; PUBLIC_KEY_LEN],
    secret: [u8; SECRET_KEY_LEN],
}

impl KeyPair {
    /// Generates a new key pair from a fresh random seed.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut seed = [0u8; 32];
        rng.fill_bytes(&mut seed);

        let mut hasher = Sha512::new();
        hasher.update(seed);
        let digest = hasher.finalize();

        let mut secret = [0u8; SECRET_KEY_LEN];
        secret.copy_from_slice(&digest);
        clamp_scalar(&mut secret);

        let public = derive_public_key(&secret);
        Self { public, secret }
    }

    /// Assembles a key pair from raw parts, without checking that they
    /// belong together. Call [`KeyPair::validate`] to check.
    pub fn from_parts(public: [u8; PUBLIC_KEY_LEN], secret: [u8; SECRET_KEY_LEN]) -> Self {
        Self { public, secret }
    }

    /// Returns the 32-byte public key.
    #[inline]
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public
    }

    /// Returns the 64-byte expanded secret key.
    #[inline]
    pub fn secret_key(&self) -> &[u8; SECRET_KEY_LEN] {
        &self.secret
    }

    /// Returns a copy of the secret scalar (first half of the secret key).
    pub(crate) fn scalar_bytes(&self) -> [u8; 32] {
        let mut scalar = [0u8; 32];
        scalar.copy_from_slice(&self.secret[..32]);
        scalar
    }

    /// Checks that the public key equals the one derived from the secret key.
    pub fn validate(&self) -> Result<(), KeyError> {
        if derive_public_key(&self.secret) != self.public {
            return Err(KeyError::KeyMismatch);
        }
        Ok(())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The secret key is deliberately not printed.
        write!(f, "KeyPair({})", hex::encode(self.public))
    }
}

/// Derives the compressed Edwards-Y public key from an expanded secret key.
pub(crate) fn derive_public_key(secret: &[u8; SECRET_KEY_LEN]) -> [u8; PUBLIC_KEY_LEN] {
    let mut scalar = [0u8; 32];
    scalar.copy_from_slice(&secret[..32]);

    EdwardsPoint::mul_base_clamped(scalar).compress().to_bytes()
}

/// Applies Ed25519 clamping to the scalar half of an expanded secret key.
fn clamp_scalar(secret: &mut [u8; SECRET_KEY_LEN]) {
    secret[0] &= 248;
    secret[31] &= 63;
    secret[31] |= 64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generated_pair_is_valid() {
        let mut rng = StdRng::seed_from_u64(1);
        let pair = KeyPair::generate(&mut rng);
        assert!(pair.validate().is_ok());
    }

    #[test]
    fn generated_scalar_is_clamped() {
        let mut rng = StdRng::seed_from_u64(2);
        let pair = KeyPair::generate(&mut rng);
        let sk = pair.secret_key();
        assert_eq!(sk[0] & 7, 0);
        assert_eq!(sk[31] & 0x80, 0);
        assert_eq!(sk[31] & 0x40, 0x40);
    }

    #[test]
    fn generation_is_deterministic_for_a_fixed_seed() {
        let mut rng_a = StdRng::seed_from_u64(3);
        let mut rng_b = StdRng::seed_from_u64(3);
        let a = KeyPair::generate(&mut rng_a);
        let b = KeyPair::generate(&mut rng_b);
        assert_eq!(a, b);
    }

    #[test]
    fn validate_rejects_mismatched_public_key() {
        let mut rng = StdRng::seed_from_u64(4);
        let pair = KeyPair::generate(&mut rng);

        let mut wrong = *pair.public_key();
        wrong[0] ^= 1;
        let forged = KeyPair::from_parts(wrong, *pair.secret_key());
        assert_eq!(forged.validate(), Err(KeyError::KeyMismatch));
    }

    #[test]
    fn debug_does_not_leak_secret_key() {
        let mut rng = StdRng::seed_from_u64(5);
        let pair = KeyPair::generate(&mut rng);
        let printed = format!("{pair:?}");
        assert!(!printed.contains(&hex::encode(&pair.secret_key()[..8])));
    }
}
