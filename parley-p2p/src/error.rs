//! P2P error types.

use std::fmt;
use std::io;
use std::net::SocketAddr;

use parley_core::CryptoError;
use thiserror::Error;

/// Errors decoding a wire frame.
///
/// Any of these ends processing of the connection it occurred on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Too short to hold the message-kind tag.
    #[error("Malformed frame: {len} bytes is shorter than the message tag")]
    MalformedFrame { len: usize },

    /// Message-kind tag is not a known kind.
    #[error("Unknown message kind: {0}")]
    UnknownMessageKind(u32),

    /// Frame shorter than its kind requires, or a declared length overruns it.
    #[error("Truncated frame: need {needed} bytes, have {available}")]
    TruncatedFrame { needed: usize, available: usize },

    /// Ack-kind tag is not a known kind.
    #[error("Unknown ack kind: {0}")]
    UnknownAckKind(u32),

    /// Text body is not valid UTF-8.
    #[error("Text body is not valid UTF-8")]
    InvalidText,
}

/// Why a text delivery was not acknowledged as received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// The remote rejected the frame.
    Invalid,
    /// The remote still did not know us after registering.
    Unregistered,
    /// The remote replied with something other than an ack.
    ProtocolViolation,
    /// No reply arrived within the read timeout.
    Timeout,
}

impl fmt::Display for DeliveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryFailure::Invalid => write!(f, "rejected as invalid"),
            DeliveryFailure::Unregistered => write!(f, "sender still unregistered"),
            DeliveryFailure::ProtocolViolation => write!(f, "protocol violation"),
            DeliveryFailure::Timeout => write!(f, "timed out waiting for ack"),
        }
    }
}

/// P2P-specific errors.
#[derive(Debug, Error)]
pub enum P2pError {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Received bytes could not be decoded.
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// Message exceeds maximum allowed size.
    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// Outbound connection refused or reset.
    #[error("Connection to {addr} failed: {source}")]
    ConnectionFailed {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Outbound connection timed out.
    #[error("Connection timeout to {addr}")]
    ConnectionTimeout { addr: SocketAddr },

    /// No frame arrived within the read timeout.
    #[error("Read timeout from {addr}")]
    ReadTimeout { addr: SocketAddr },

    /// Remote closed the connection before sending a frame.
    #[error("Connection closed by {addr}")]
    ConnectionClosed { addr: SocketAddr },

    /// Peer sent an unexpected message.
    #[error("Unexpected message: expected {expected}, got {actual}")]
    UnexpectedMessage {
        expected: &'static str,
        actual: &'static str,
    },

    /// Registration handshake ended in the FAILED state.
    #[error("Registration with {host} failed at {stage}: {source}")]
    RegistrationFailed {
        host: String,
        stage: &'static str,
        #[source]
        source: Box<P2pError>,
    },

    /// Handshake state machine asked to make an illegal transition.
    #[error("Invalid handshake transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    /// Text delivery was not acknowledged as received.
    #[error("Delivery failed: {0}")]
    DeliveryFailed(DeliveryFailure),

    /// Peer not found.
    #[error("Peer not found: {0}")]
    PeerNotFound(String),

    /// Invalid peer address.
    #[error("Invalid peer address: {0}")]
    InvalidAddress(String),

    /// Key generation failed.
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl P2pError {
    /// Whether this error came from the connection itself rather than from
    /// what the peer said.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            P2pError::Io(_)
                | P2pError::ConnectionFailed { .. }
                | P2pError::ConnectionTimeout { .. }
                | P2pError::ReadTimeout { .. }
                | P2pError::ConnectionClosed { .. }
        )
    }
}

/// Result type for P2P operations.
pub type P2pResult<T> = Result<T, P2pError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_classification() {
        let addr: SocketAddr = "127.0.0.1:8000".parse().unwrap();
        assert!(P2pError::ConnectionTimeout { addr }.is_connection_error());
        assert!(P2pError::ReadTimeout { addr }.is_connection_error());
        assert!(!P2pError::Frame(FrameError::InvalidText).is_connection_error());
        assert!(!P2pError::DeliveryFailed(DeliveryFailure::Invalid).is_connection_error());
    }

    #[test]
    fn test_registration_failed_display() {
        let err = P2pError::RegistrationFailed {
            host: "10.0.0.2".to_string(),
            stage: "await_peer_register",
            source: Box::new(P2pError::Frame(FrameError::UnknownMessageKind(99))),
        };
        assert_eq!(
            err.to_string(),
            "Registration with 10.0.0.2 failed at await_peer_register: Frame error: Unknown message kind: 99"
        );
    }
}
