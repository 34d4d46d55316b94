//! Shared node state handed to every connection task.

use std::net::SocketAddr;
use std::sync::Arc;

use parley_core::KeyPair;

use crate::config::P2pConfig;
use crate::peer::PeerTable;
use crate::protocol::WireMessage;

/// Everything a handshake or delivery needs to know about the local node.
pub struct NodeContext {
    /// P2P configuration.
    pub config: Arc<P2pConfig>,
    /// Node identity.
    pub keypair: KeyPair,
    /// Port announced in Register frames.
    pub listening_port: u16,
    /// Address the listener is bound to.
    pub local_addr: SocketAddr,
    /// Known peers.
    pub peers: Arc<dyn PeerTable>,
}

impl NodeContext {
    /// Our own Register frame.
    pub fn register_message(&self) -> WireMessage {
        WireMessage::Register {
            public_key: self.keypair.public_key_bytes(),
            listening_port: self.listening_port,
        }
    }
}
