//! Peer management.
//!
//! This module provides:
//! - Peer records and snapshots
//! - The shared peer table
//! - Framed request/response connections

pub mod connection;
pub mod info;
pub mod table;

// Re-export main types
pub use connection::{host_of, Connection};
pub use info::{PeerRecord, PeerSnapshot};
pub use table::{MemoryPeerTable, PeerTable};
