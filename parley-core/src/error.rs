//! Error types for the parley core crate.

use thiserror::Error;

/// Errors related to key generation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// The requested key size is not supported by the key algorithm.
    #[error("unsupported key size: {requested} bits (supported: {supported})")]
    UnsupportedKeySize { requested: usize, supported: usize },
}
