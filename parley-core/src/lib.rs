//! Core types for the parley peer-to-peer messenger.
//!
//! This crate holds the node identity (key pair generation and public-key
//! handling) shared by the transport and the node binary.

pub mod crypto;
pub mod error;

pub use crypto::{KeyPair, PublicKey};
pub use error::CryptoError;
