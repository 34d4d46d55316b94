//! Command-line argument parsing.

use std::net::SocketAddr;

use clap::Parser;
use parley_p2p::config::{DEFAULT_KEY_SIZE, DEFAULT_MAX_FRAME_SIZE};

/// Peer-to-peer text messenger.
#[derive(Parser, Debug, Clone)]
#[command(name = "parley-node")]
#[command(about = "Peer-to-peer text messenger node")]
#[command(version)]
pub struct Cli {
    /// Listen address for inbound peer connections.
    #[arg(long, default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,

    /// Port announced to peers (defaults to the bound port).
    #[arg(long)]
    pub advertised_port: Option<u16>,

    /// Largest frame accepted or sent, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    pub max_frame_size: usize,

    /// Key size in bits for the node key pair.
    #[arg(long, default_value_t = DEFAULT_KEY_SIZE)]
    pub key_size: usize,

    /// Timeout for outbound connections, in seconds.
    #[arg(long, default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// Timeout waiting for a reply frame, in seconds.
    #[arg(long, default_value_t = 5)]
    pub read_timeout_secs: u64,

    /// How often the inbox is checked for new messages, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub poll_interval_ms: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let cli = Cli::parse_from(["parley-node"]);
        assert_eq!(cli.listen.port(), 8000);
        assert!(cli.advertised_port.is_none());
        assert_eq!(cli.max_frame_size, 1024);
        assert_eq!(cli.key_size, 256);
        assert_eq!(cli.connect_timeout_secs, 10);
        assert_eq!(cli.read_timeout_secs, 5);
        assert_eq!(cli.poll_interval_ms, 1000);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "parley-node",
            "--listen",
            "127.0.0.2:9000",
            "--advertised-port",
            "9100",
            "--max-frame-size",
            "4096",
            "--read-timeout-secs",
            "1",
        ]);
        assert_eq!(cli.listen, "127.0.0.2:9000".parse().unwrap());
        assert_eq!(cli.advertised_port, Some(9100));
        assert_eq!(cli.max_frame_size, 4096);
        assert_eq!(cli.read_timeout_secs, 1);
    }

    #[test]
    fn test_rejects_bad_listen_address() {
        assert!(Cli::try_parse_from(["parley-node", "--listen", "nowhere"]).is_err());
    }
}
