//! Interactive command shell.
//!
//! Lines are read from stdin on a dedicated thread and handed to the async
//! shell loop over a channel, so a blocked read never holds up shutdown.

use std::io::BufRead;
use std::net::IpAddr;

use parley_p2p::{MessengerHandle, P2pError, PeerSnapshot};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::shutdown::{Shutdown, ShutdownGuard, ShutdownReason};

/// Banner printed when the shell starts.
pub const BANNER: &str = "Welcome to parley. Type help to list commands.";

/// Command name and usage, description.
pub static COMMANDS: &[(&str, &str)] = &[
    ("register <host> <port>", "Exchange keys with the peer listening on host:port"),
    ("send <host> <message>", "Send a message to a registered peer"),
    ("list_peers", "List registered peers"),
    ("help", "Show this list"),
    ("exit", "Shut down and exit"),
];

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Register { host: IpAddr, port: u16 },
    Send { host: IpAddr, message: String },
    ListPeers,
    Help,
    Exit,
}

/// Why a line did not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command: {0}. Type help to list commands.")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Invalid host: {0} (expected an IP address)")]
    InvalidHost(String),

    #[error("Invalid port: {0} (expected 0-65535)")]
    InvalidPort(String),
}

/// Split off the first whitespace-delimited word.
fn split_word(s: &str) -> (&str, &str) {
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    }
}

/// Parse a host argument into the form peers are keyed by.
///
/// IPv4-mapped IPv6 addresses collapse to plain IPv4.
fn parse_host(s: &str) -> Result<IpAddr, CommandError> {
    s.parse::<IpAddr>()
        .map(|ip| ip.to_canonical())
        .map_err(|_| CommandError::InvalidHost(s.to_string()))
}

/// Parse one input line.
///
/// An empty line is treated as `help`.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let (name, rest) = split_word(line.trim());

    match name {
        "" | "help" => Ok(Command::Help),
        "exit" => Ok(Command::Exit),
        "list_peers" => Ok(Command::ListPeers),
        "register" => {
            let args: Vec<&str> = rest.split_whitespace().collect();
            let &[host, port] = args.as_slice() else {
                return Err(CommandError::Usage(COMMANDS[0].0));
            };
            let host = parse_host(host)?;
            let port = port
                .parse()
                .map_err(|_| CommandError::InvalidPort(port.to_string()))?;
            Ok(Command::Register { host, port })
        }
        "send" => {
            let (host, message) = split_word(rest);
            if host.is_empty() || message.is_empty() {
                return Err(CommandError::Usage(COMMANDS[1].0));
            }
            Ok(Command::Send {
                host: parse_host(host)?,
                message: message.to_string(),
            })
        }
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

/// Render the help table.
pub fn format_help() -> String {
    COMMANDS
        .iter()
        .map(|(usage, description)| format!("  {:<24} {}", usage, description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the peer list.
pub fn format_peers(peers: &[PeerSnapshot]) -> String {
    if peers.is_empty() {
        return "No registered peers.".to_string();
    }
    peers
        .iter()
        .map(|peer| format!("  {}", peer))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read stdin lines on a dedicated thread.
///
/// The channel closes at end of input.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Interactive shell over a messenger handle.
pub struct Shell {
    handle: MessengerHandle,
    shutdown: Shutdown,
}

impl Shell {
    /// Create a shell.
    pub fn new(handle: MessengerHandle, shutdown: Shutdown) -> Self {
        Self { handle, shutdown }
    }

    /// Process lines until `exit`, end of input or shutdown.
    ///
    /// A command still in flight when shutdown arrives is abandoned.
    pub async fn run(self, mut guard: ShutdownGuard, mut lines: mpsc::Receiver<String>) {
        println!("{}", BANNER);

        while let Some(line) = guard.run_until(lines.recv()).await {
            let Some(line) = line else {
                self.shutdown.trigger(ShutdownReason::EndOfInput);
                break;
            };

            let command = match parse_command(&line) {
                Ok(Command::Exit) => {
                    self.shutdown.trigger(ShutdownReason::Exit);
                    break;
                }
                Ok(command) => command,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            };

            match guard.run_until(self.execute(command)).await {
                Some(outcome) => println!("{}", outcome),
                None => break,
            }
        }

        tracing::debug!("Shell stopped");
    }

    /// Run one command and describe the outcome.
    pub async fn execute(&self, command: Command) -> String {
        match command {
            Command::Register { host, port } => {
                match self.handle.register(&host.to_string(), port).await {
                    Ok(()) => format!("Registered with {}:{}.", host, port),
                    Err(e) => format!("Registration failed: {}", e),
                }
            }
            Command::Send { host, message } => {
                match self.handle.send_text(&host.to_string(), &message).await {
                    Ok(()) => format!("Sent to {}.", host),
                    Err(P2pError::PeerNotFound(_)) => format!(
                        "Unknown peer {}. Register first with: {}",
                        host, COMMANDS[0].0
                    ),
                    Err(e) => format!("Send failed: {}", e),
                }
            }
            Command::ListPeers => format_peers(&self.handle.list_peers()),
            Command::Help => format_help(),
            Command::Exit => "Shutting down.".to_string(),
        }
    }
}
