//! P2P configuration.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Default listening address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Default maximum frame size in bytes.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024;

/// Default key size in bits for the node key pair.
pub const DEFAULT_KEY_SIZE: usize = 256;

/// Default connection timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout waiting for a reply frame.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the P2P node.
#[derive(Debug, Clone)]
pub struct P2pConfig {
    /// Address to bind the listener to.
    pub bind_addr: SocketAddr,

    /// Largest frame accepted or emitted, in bytes.
    ///
    /// Also bounds every length field read off the wire, so oversized
    /// claims are rejected before any buffer is reserved for them.
    pub max_frame_size: usize,

    /// Key size in bits for the generated key pair.
    pub key_size: usize,

    /// Timeout for establishing outbound connections.
    pub connect_timeout: Duration,

    /// Timeout waiting for the next frame on an open connection.
    pub read_timeout: Duration,

    /// Listening port announced in Register frames.
    ///
    /// `None` announces the port the listener actually bound.
    pub advertised_port: Option<u16>,
}

impl Default for P2pConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            key_size: DEFAULT_KEY_SIZE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            advertised_port: None,
        }
    }
}

impl P2pConfig {
    /// Create a new configuration with the specified bind address.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            ..Default::default()
        }
    }

    /// Set the maximum frame size.
    pub fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Set the key size in bits.
    pub fn with_key_size(mut self, bits: usize) -> Self {
        self.key_size = bits;
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Announce a fixed listening port instead of the bound one.
    pub fn with_advertised_port(mut self, port: u16) -> Self {
        self.advertised_port = Some(port);
        self
    }

    /// Source IP for outbound connections.
    ///
    /// When the listener is bound to a specific address, outbound
    /// connections originate from it too, so peers see the same host for
    /// our registrations and our messages.
    pub fn outbound_bind_ip(&self) -> Option<IpAddr> {
        let ip = self.bind_addr.ip();
        (!ip.is_unspecified()).then_some(ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = P2pConfig::default();
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(config.max_frame_size, DEFAULT_MAX_FRAME_SIZE);
        assert_eq!(config.key_size, DEFAULT_KEY_SIZE);
        assert_eq!(config.read_timeout, DEFAULT_READ_TIMEOUT);
        assert!(config.advertised_port.is_none());
        assert!(config.outbound_bind_ip().is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = P2pConfig::new("127.0.0.2:9999".parse().unwrap())
            .with_max_frame_size(4096)
            .with_key_size(256)
            .with_connect_timeout(Duration::from_secs(1))
            .with_read_timeout(Duration::from_millis(500))
            .with_advertised_port(7000);

        assert_eq!(config.bind_addr.port(), 9999);
        assert_eq!(config.max_frame_size, 4096);
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
        assert_eq!(config.read_timeout, Duration::from_millis(500));
        assert_eq!(config.advertised_port, Some(7000));
        assert_eq!(
            config.outbound_bind_ip(),
            Some("127.0.0.2".parse().unwrap())
        );
    }
}
