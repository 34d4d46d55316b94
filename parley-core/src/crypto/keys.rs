//! Ed25519 node identity keys.

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use crate::error::CryptoError;

/// Key size, in bits, of an Ed25519 key.
pub const ED25519_KEY_BITS: usize = 256;

/// Length in bytes of an encoded Ed25519 public key.
pub const PUBLIC_KEY_LENGTH: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;

/// Ed25519 public key wrapper.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey(pub VerifyingKey);

impl PublicKey {
    /// Get the raw bytes of the public key.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        self.0.as_bytes()
    }

    /// Short hex fingerprint for display.
    pub fn fingerprint(&self) -> String {
        fingerprint(self.as_bytes())
    }
}

/// Hex fingerprint of an encoded public key: the first 8 bytes.
///
/// Works on arbitrary byte strings, since keys received from peers are
/// stored as sent and never parsed.
pub fn fingerprint(key: &[u8]) -> String {
    hex::encode(&key[..key.len().min(8)])
}

/// A node's key pair.
///
/// Generated once at startup and never mutated afterwards. The secret half
/// stays in process; only the public half goes on the wire.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new random key pair using the OS random number generator.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        KeyPair { signing_key }
    }

    /// Generate a key pair of the requested size in bits.
    ///
    /// Ed25519 keys are fixed at 256 bits; any other size is rejected.
    pub fn generate_with_size(key_bits: usize) -> Result<Self, CryptoError> {
        if key_bits != ED25519_KEY_BITS {
            return Err(CryptoError::UnsupportedKeySize {
                requested: key_bits,
                supported: ED25519_KEY_BITS,
            });
        }
        Ok(Self::generate())
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key())
    }

    /// Raw encoding of the public key, as carried in Register frames.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.public_key().as_bytes().to_vec()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key().fingerprint())
            .finish_non_exhaustive()
    }
}
