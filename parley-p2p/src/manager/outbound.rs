//! Outbound connection management.

use std::net::{IpAddr, SocketAddr};

use tokio::net::{TcpSocket, TcpStream};
use tokio::time::timeout;

use crate::config::P2pConfig;
use crate::error::{P2pError, P2pResult};
use crate::peer::Connection;

/// Resolve an IP-literal host and port to a socket address.
pub fn resolve_peer_addr(host: &str, port: u16) -> P2pResult<SocketAddr> {
    let ip: IpAddr = host
        .parse()
        .map_err(|_| P2pError::InvalidAddress(host.to_string()))?;
    Ok(SocketAddr::new(ip, port))
}

async fn connect_stream(addr: SocketAddr, config: &P2pConfig) -> std::io::Result<TcpStream> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };

    // Originate from the listening IP so the peer sees one host for us.
    if let Some(ip) = config.outbound_bind_ip() {
        if ip.is_ipv4() == addr.is_ipv4() {
            socket.bind(SocketAddr::new(ip, 0))?;
        }
    }

    socket.connect(addr).await
}

/// Open a connection to a peer.
pub async fn open_connection(addr: SocketAddr, config: &P2pConfig) -> P2pResult<Connection> {
    tracing::debug!(addr = %addr, "Connecting to peer");

    // Attempt TCP connection with timeout
    let stream = match timeout(config.connect_timeout, connect_stream(addr, config)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            return Err(P2pError::ConnectionFailed { addr, source: e });
        }
        Err(_) => {
            return Err(P2pError::ConnectionTimeout { addr });
        }
    };

    // Configure the stream
    if let Err(e) = stream.set_nodelay(true) {
        tracing::warn!(addr = %addr, error = %e, "Failed to set TCP_NODELAY");
    }

    Ok(Connection::new(stream, addr, config))
}
