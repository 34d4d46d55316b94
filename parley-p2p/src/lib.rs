//! P2P transport for the parley messenger.
//!
//! This crate provides the peer-to-peer layer of parley, including:
//!
//! - A fixed-layout wire codec for Register, Text and Ack frames
//! - The registration handshake that exchanges public keys and callback ports
//! - Acknowledged text delivery with lazy registration on demand
//! - A shared peer table holding per-peer message queues
//!
//! # Architecture
//!
//! Every exchange is one request frame and one reply frame over a fresh TCP
//! connection. Inbound connections each run in their own tokio task; the
//! peer table is the only state they share.
//!
//! ```text
//! Main Task (P2pNode::run())
//! └── ConnectionDispatcher (accept loop)
//!     ├── Connection Task 1 (Register -> handle_register)
//!     ├── Connection Task 2 (Text -> receive_text)
//!     └── ...
//!
//! MessengerHandle (any task)
//! ├── register  -> ensure_registered (outbound handshake)
//! └── send_text -> Text/Ack, ensure_registered + one retry on Ack(unregistered)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use parley_core::KeyPair;
//! use parley_p2p::{P2pConfig, P2pNode};
//!
//! let config = P2pConfig::new("0.0.0.0:8000".parse().unwrap());
//! let node = P2pNode::bind(config, KeyPair::generate()).await?;
//! let handle = node.handle();
//! tokio::spawn(node.run());
//!
//! handle.register("10.0.0.2", 8000).await?;
//! handle.send_text("10.0.0.2", "hello").await?;
//! ```

pub mod config;
pub mod error;

pub mod context;
pub mod delivery;
pub mod manager;
pub mod node;
pub mod peer;
pub mod protocol;
pub mod registration;

// Re-export main types
pub use config::P2pConfig;
pub use error::{DeliveryFailure, FrameError, P2pError, P2pResult};
pub use node::{MessengerHandle, P2pNode};
pub use peer::{MemoryPeerTable, PeerRecord, PeerSnapshot, PeerTable};
pub use protocol::{AckKind, WireCodec, WireMessage};
