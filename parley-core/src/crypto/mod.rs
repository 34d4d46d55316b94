//! Cryptographic identity for parley nodes.
//!
//! Every node holds one Ed25519 key pair, generated at startup. The public
//! key is exchanged during registration; message bodies are not encrypted.

mod keys;

pub use keys::{fingerprint, KeyPair, PublicKey, ED25519_KEY_BITS, PUBLIC_KEY_LENGTH};
