//! Peer records.

use std::fmt;

use parley_core::crypto::fingerprint;

/// A registered peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRecord {
    /// Host identity (canonical IP string).
    pub host: String,
    /// Port the peer accepts connections on.
    pub listening_port: u16,
    /// Public key announced in the peer's Register frame.
    pub public_key: Vec<u8>,
    /// Messages received from this peer and not yet drained, oldest first.
    pub pending_messages: Vec<String>,
}

impl PeerRecord {
    /// Create a record with an empty queue.
    pub fn new(host: impl Into<String>, listening_port: u16, public_key: Vec<u8>) -> Self {
        Self {
            host: host.into(),
            listening_port,
            public_key,
            pending_messages: Vec::new(),
        }
    }

    /// Whether a Register with this key and port would change the record.
    pub fn matches(&self, listening_port: u16, public_key: &[u8]) -> bool {
        self.listening_port == listening_port && self.public_key == public_key
    }

    /// Read-only summary of this record.
    pub fn snapshot(&self) -> PeerSnapshot {
        PeerSnapshot {
            host: self.host.clone(),
            listening_port: self.listening_port,
            key_fingerprint: fingerprint(&self.public_key),
            pending: self.pending_messages.len(),
        }
    }
}

/// Snapshot of peer information for external reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSnapshot {
    /// Peer host.
    pub host: String,
    /// Peer listening port.
    pub listening_port: u16,
    /// Hex fingerprint of the peer's public key.
    pub key_fingerprint: String,
    /// Number of undrained messages.
    pub pending: usize,
}

impl fmt::Display for PeerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} key={} pending={}",
            self.host, self.listening_port, self.key_fingerprint, self.pending
        )
    }
}
