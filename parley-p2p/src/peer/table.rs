//! Registry of known peers.
//!
//! The peer table is the only state shared between connection tasks. It is
//! keyed by host and holds, per peer, the callback port, the announced public
//! key and the queue of messages not yet read.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::{P2pError, P2pResult};
use crate::peer::info::{PeerRecord, PeerSnapshot};

/// Peer table abstraction.
///
/// Implementations must be safe to share across connection tasks; every
/// operation is atomic with respect to the others.
pub trait PeerTable: Send + Sync {
    /// Insert or overwrite the record for `host`.
    ///
    /// Overwriting discards the previous pending queue. Returns the replaced
    /// record, if any.
    fn upsert(&self, host: &str, listening_port: u16, public_key: Vec<u8>) -> Option<PeerRecord>;

    /// Upsert unless the current record already has this port and key.
    ///
    /// Returns `true` if the table changed.
    fn upsert_if_changed(&self, host: &str, listening_port: u16, public_key: Vec<u8>) -> bool {
        match self.lookup(host) {
            Some(record) if record.matches(listening_port, &public_key) => false,
            _ => {
                self.upsert(host, listening_port, public_key);
                true
            }
        }
    }

    /// Get a copy of the record for `host`.
    fn lookup(&self, host: &str) -> Option<PeerRecord>;

    /// Append a message to the queue of `host`.
    fn enqueue(&self, host: &str, message: String) -> P2pResult<()>;

    /// Take every queued message for `host`, oldest first.
    ///
    /// Unknown hosts yield an empty list.
    fn drain(&self, host: &str) -> Vec<String>;

    /// Snapshot of every record, sorted by host.
    fn list(&self) -> Vec<PeerSnapshot>;

    /// Number of registered peers.
    fn len(&self) -> usize;

    /// Check if no peer is registered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory peer table.
#[derive(Debug, Default)]
pub struct MemoryPeerTable {
    peers: Mutex<HashMap<String, PeerRecord>>,
}

impl MemoryPeerTable {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PeerTable for MemoryPeerTable {
    fn upsert(&self, host: &str, listening_port: u16, public_key: Vec<u8>) -> Option<PeerRecord> {
        let record = PeerRecord::new(host, listening_port, public_key);
        let previous = self.peers.lock().insert(host.to_string(), record);
        if let Some(previous) = &previous {
            if !previous.pending_messages.is_empty() {
                tracing::debug!(
                    host,
                    dropped = previous.pending_messages.len(),
                    "Re-registration discarded pending messages"
                );
            }
        }
        previous
    }

    fn upsert_if_changed(&self, host: &str, listening_port: u16, public_key: Vec<u8>) -> bool {
        let mut peers = self.peers.lock();
        if let Some(record) = peers.get(host) {
            if record.matches(listening_port, &public_key) {
                return false;
            }
        }
        peers.insert(
            host.to_string(),
            PeerRecord::new(host, listening_port, public_key),
        );
        true
    }

    fn lookup(&self, host: &str) -> Option<PeerRecord> {
        self.peers.lock().get(host).cloned()
    }

    fn enqueue(&self, host: &str, message: String) -> P2pResult<()> {
        match self.peers.lock().get_mut(host) {
            Some(record) => {
                record.pending_messages.push(message);
                Ok(())
            }
            None => Err(P2pError::PeerNotFound(host.to_string())),
        }
    }

    fn drain(&self, host: &str) -> Vec<String> {
        self.peers
            .lock()
            .get_mut(host)
            .map(|record| std::mem::take(&mut record.pending_messages))
            .unwrap_or_default()
    }

    fn list(&self) -> Vec<PeerSnapshot> {
        let mut snapshots: Vec<_> = self.peers.lock().values().map(PeerRecord::snapshot).collect();
        snapshots.sort_by(|a, b| a.host.cmp(&b.host));
        snapshots
    }

    fn len(&self) -> usize {
        self.peers.lock().len()
    }
}
