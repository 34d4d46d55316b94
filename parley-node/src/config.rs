//! Node configuration.

use std::net::SocketAddr;
use std::time::Duration;

use parley_p2p::config::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_KEY_SIZE, DEFAULT_MAX_FRAME_SIZE, DEFAULT_READ_TIMEOUT,
};
use parley_p2p::P2pConfig;

use crate::cli::Cli;

/// Default inbox poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// P2P listen address.
    pub p2p_addr: SocketAddr,

    /// Port announced to peers, if not the bound one.
    pub advertised_port: Option<u16>,

    /// Largest frame accepted or sent.
    pub max_frame_size: usize,

    /// Key size in bits.
    pub key_size: usize,

    /// Outbound connect timeout.
    pub connect_timeout: Duration,

    /// Reply read timeout.
    pub read_timeout: Duration,

    /// Inbox poll interval.
    pub poll_interval: Duration,

    /// Log level.
    pub log_level: String,
}

impl NodeConfig {
    /// Create a node configuration from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            p2p_addr: cli.listen,
            advertised_port: cli.advertised_port,
            max_frame_size: cli.max_frame_size,
            key_size: cli.key_size,
            connect_timeout: Duration::from_secs(cli.connect_timeout_secs),
            read_timeout: Duration::from_secs(cli.read_timeout_secs),
            // A zero interval would make the printer spin.
            poll_interval: Duration::from_millis(cli.poll_interval_ms.max(1)),
            log_level: cli.log_level.clone(),
        }
    }

    /// Build P2P configuration from node config.
    pub fn p2p_config(&self) -> P2pConfig {
        let config = P2pConfig::new(self.p2p_addr)
            .with_max_frame_size(self.max_frame_size)
            .with_key_size(self.key_size)
            .with_connect_timeout(self.connect_timeout)
            .with_read_timeout(self.read_timeout);

        match self.advertised_port {
            Some(port) => config.with_advertised_port(port),
            None => config,
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            p2p_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            advertised_port: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            key_size: DEFAULT_KEY_SIZE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            log_level: "info".to_string(),
        }
    }
}
