//! Main P2P node orchestrator.

use std::net::SocketAddr;
use std::sync::Arc;

use parley_core::crypto::ED25519_KEY_BITS;
use parley_core::{CryptoError, KeyPair, PublicKey};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::P2pConfig;
use crate::context::NodeContext;
use crate::delivery;
use crate::error::{P2pError, P2pResult};
use crate::manager::ConnectionDispatcher;
use crate::peer::{MemoryPeerTable, PeerRecord, PeerSnapshot, PeerTable};
use crate::registration;

/// Main P2P node.
///
/// Owns the listener until [`P2pNode::run`] hands it to the dispatcher.
/// Interaction with the running node goes through [`MessengerHandle`].
pub struct P2pNode {
    /// Bound listener.
    listener: TcpListener,
    /// Shared node state.
    ctx: Arc<NodeContext>,
    /// Shutdown signal receiver.
    shutdown_rx: mpsc::Receiver<()>,
    /// Shutdown signal sender (for cloning).
    shutdown_tx: mpsc::Sender<()>,
}

impl P2pNode {
    /// Bind a node with an in-memory peer table.
    pub async fn bind(config: P2pConfig, keypair: KeyPair) -> P2pResult<Self> {
        Self::bind_with_table(config, keypair, Arc::new(MemoryPeerTable::new())).await
    }

    /// Bind a node over the given peer table.
    pub async fn bind_with_table(
        config: P2pConfig,
        keypair: KeyPair,
        peers: Arc<dyn PeerTable>,
    ) -> P2pResult<Self> {
        if config.key_size != ED25519_KEY_BITS {
            return Err(CryptoError::UnsupportedKeySize {
                requested: config.key_size,
                supported: ED25519_KEY_BITS,
            }
            .into());
        }

        let listener = TcpListener::bind(config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        let listening_port = config.advertised_port.unwrap_or(local_addr.port());

        tracing::info!(
            addr = %local_addr,
            port = listening_port,
            key = %keypair.public_key().fingerprint(),
            "P2P node listening"
        );

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        Ok(Self {
            listener,
            ctx: Arc::new(NodeContext {
                config: Arc::new(config),
                keypair,
                listening_port,
                local_addr,
                peers,
            }),
            shutdown_rx,
            shutdown_tx,
        })
    }

    /// Get a handle for registering, sending and reading messages.
    pub fn handle(&self) -> MessengerHandle {
        MessengerHandle {
            ctx: self.ctx.clone(),
        }
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.ctx.local_addr
    }

    /// Get the shutdown sender for external shutdown signals.
    pub fn shutdown_handle(&self) -> mpsc::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Run the P2P node until a shutdown signal arrives.
    pub async fn run(self) -> P2pResult<()> {
        let Self {
            listener,
            ctx,
            shutdown_rx,
            shutdown_tx,
        } = self;

        // Held so the channel stays open while the dispatcher runs.
        let _shutdown_tx = shutdown_tx;

        ConnectionDispatcher::new(listener, ctx, shutdown_rx).run().await?;
        tracing::info!("P2P node stopped");
        Ok(())
    }
}

/// Handle to a node's messaging operations.
///
/// Cheap to clone; every clone shares the node's peer table.
#[derive(Clone)]
pub struct MessengerHandle {
    ctx: Arc<NodeContext>,
}

impl MessengerHandle {
    /// Register with the peer listening on `host:port`.
    pub async fn register(&self, host: &str, port: u16) -> P2pResult<()> {
        registration::ensure_registered(&self.ctx, host, port).await
    }

    /// Send a message to a registered peer.
    pub async fn send_text(&self, host: &str, body: &str) -> P2pResult<()> {
        let record = self
            .ctx
            .peers
            .lookup(host)
            .ok_or_else(|| P2pError::PeerNotFound(host.to_string()))?;
        self.send_text_to(host, record.listening_port, body).await
    }

    /// Send a message to `host:port`, registering first if the peer asks.
    pub async fn send_text_to(&self, host: &str, port: u16, body: &str) -> P2pResult<()> {
        delivery::send_text(&self.ctx, host, port, body).await
    }

    /// Snapshot of registered peers, sorted by host.
    pub fn list_peers(&self) -> Vec<PeerSnapshot> {
        self.ctx.peers.list()
    }

    /// Take every message received from `host`, oldest first.
    pub fn drain(&self, host: &str) -> Vec<String> {
        self.ctx.peers.drain(host)
    }

    /// Look up a registered peer.
    pub fn lookup(&self, host: &str) -> Option<PeerRecord> {
        self.ctx.peers.lookup(host)
    }

    /// The node's peer table.
    pub fn peer_table(&self) -> Arc<dyn PeerTable> {
        self.ctx.peers.clone()
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.ctx.local_addr
    }

    /// The node's public key.
    pub fn public_key(&self) -> PublicKey {
        self.ctx.keypair.public_key()
    }
}
