//! Node orchestrator.
//!
//! Coordinates the node components: P2P listener, inbox printer and shell.

use parley_core::KeyPair;
use parley_p2p::P2pNode;
use tokio::sync::mpsc;

use crate::config::NodeConfig;
use crate::inbox::run_inbox_printer;
use crate::shell::{spawn_stdin_reader, Shell};
use crate::shutdown::Shutdown;

/// The main node structure.
pub struct Node {
    /// Node configuration.
    config: NodeConfig,

    /// Node identity.
    keypair: KeyPair,

    /// Shutdown trigger.
    shutdown: Shutdown,
}

impl Node {
    /// Create a new node with the given configuration.
    pub fn new(config: NodeConfig) -> anyhow::Result<Self> {
        let keypair = KeyPair::generate_with_size(config.key_size)?;
        tracing::info!("Generated node key {}", keypair.public_key().fingerprint());

        Ok(Self {
            config,
            keypair,
            shutdown: Shutdown::new(),
        })
    }

    /// Run the node until `exit`, end of input or a signal.
    pub async fn run(self) -> anyhow::Result<()> {
        self.run_with_input(spawn_stdin_reader()).await
    }

    /// Run the node with shell input taken from `lines`.
    pub async fn run_with_input(self, lines: mpsc::Receiver<String>) -> anyhow::Result<()> {
        tracing::info!("Starting parley node...");
        tracing::info!("  P2P address: {}", self.config.p2p_addr);
        tracing::info!("  Max frame size: {}", self.config.max_frame_size);

        // Every guard exists before any task that can trigger shutdown runs
        let mut guard = self.shutdown.guard();
        let inbox_guard = self.shutdown.guard();
        let shell_guard = self.shutdown.guard();

        // Start P2P node
        let p2p_node = P2pNode::bind(self.config.p2p_config(), self.keypair).await?;
        let handle = p2p_node.handle();
        let p2p_shutdown = p2p_node.shutdown_handle();

        let p2p_task = tokio::spawn(async move {
            match p2p_node.run().await {
                Ok(()) => {
                    tracing::info!("P2P node stopped gracefully");
                }
                Err(e) => {
                    tracing::error!("P2P node error: {}", e);
                }
            }
        });

        tracing::info!("P2P node started on {}", handle.local_addr());

        let inbox_task = tokio::spawn(run_inbox_printer(
            handle.clone(),
            self.config.poll_interval,
            inbox_guard,
        ));

        let shell = Shell::new(handle, self.shutdown.clone());
        let shell_task = tokio::spawn(shell.run(shell_guard, lines));

        // Wait for exit, end of input or a signal
        self.shutdown.wait_for_trigger_or_signal(&mut guard).await;
        tracing::info!("Shutting down node...");

        // Stop P2P
        let _ = p2p_shutdown.send(()).await;
        let _ = p2p_task.await;

        let _ = inbox_task.await;
        let _ = shell_task.await;

        tracing::info!("Node shutdown complete");
        Ok(())
    }
}
