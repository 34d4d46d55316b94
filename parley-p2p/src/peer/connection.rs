//! Framed request/response connection to a peer.
//!
//! Every exchange is one request frame and one reply frame over a fresh TCP
//! connection. [`Connection`] wraps the stream in a [`WireCodec`] and applies
//! the configured read timeout to each receive.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;

use crate::config::P2pConfig;
use crate::error::{P2pError, P2pResult};
use crate::protocol::{AckKind, WireCodec, WireMessage};

/// Canonical host string for a socket address.
///
/// IPv4-mapped IPv6 addresses are reported as plain IPv4 so a peer has one
/// identity whichever listener family accepted it.
pub fn host_of(addr: &SocketAddr) -> String {
    addr.ip().to_canonical().to_string()
}

/// A single framed connection.
pub struct Connection {
    framed: Framed<TcpStream, WireCodec>,
    addr: SocketAddr,
    read_timeout: Duration,
}

impl Connection {
    /// Wrap an established stream.
    pub fn new(stream: TcpStream, addr: SocketAddr, config: &P2pConfig) -> Self {
        Self {
            framed: Framed::new(stream, WireCodec::new(config.max_frame_size)),
            addr,
            read_timeout: config.read_timeout,
        }
    }

    /// Remote socket address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Remote host identity.
    pub fn peer_host(&self) -> String {
        host_of(&self.addr)
    }

    /// Send one frame and flush it.
    pub async fn send(&mut self, message: WireMessage) -> P2pResult<()> {
        tracing::trace!(addr = %self.addr, msg = %message, "Sending frame");
        self.framed.send(message).await
    }

    /// Wait for the next frame, bounded by the read timeout.
    pub async fn recv(&mut self) -> P2pResult<WireMessage> {
        match timeout(self.read_timeout, self.framed.next()).await {
            Ok(Some(Ok(message))) => {
                tracing::trace!(addr = %self.addr, msg = %message, "Received frame");
                Ok(message)
            }
            Ok(Some(Err(e))) => Err(e),
            Ok(None) => Err(P2pError::ConnectionClosed { addr: self.addr }),
            Err(_) => Err(P2pError::ReadTimeout { addr: self.addr }),
        }
    }

    /// Reply `Ack(invalid)` if the connection still accepts writes.
    pub async fn reject(&mut self) {
        if let Err(e) = self.send(WireMessage::ack(AckKind::Invalid)).await {
            tracing::debug!(addr = %self.addr, error = %e, "Could not send invalid ack");
        }
    }

    /// Flush and shut down the write half.
    pub async fn close(mut self) {
        if let Err(e) = SinkExt::close(&mut self.framed).await {
            tracing::debug!(addr = %self.addr, error = %e, "Error closing connection");
        }
    }
}
