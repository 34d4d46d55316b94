//! Inbound connection dispatcher.
//!
//! Accepts connections, reads the first frame of each and routes it to the
//! registration or delivery handler. Every connection runs in its own task.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::context::NodeContext;
use crate::delivery::receive_text;
use crate::error::{P2pError, P2pResult};
use crate::peer::Connection;
use crate::protocol::WireMessage;
use crate::registration::handle_register;

/// Inbound connection listener.
pub struct ConnectionDispatcher {
    /// TCP listener.
    listener: TcpListener,
    /// Shared node state.
    ctx: Arc<NodeContext>,
    /// Shutdown signal receiver.
    shutdown_rx: mpsc::Receiver<()>,
    /// In-flight connection tasks.
    tasks: JoinSet<()>,
}

impl ConnectionDispatcher {
    /// Create a dispatcher over a bound listener.
    pub fn new(listener: TcpListener, ctx: Arc<NodeContext>, shutdown_rx: mpsc::Receiver<()>) -> Self {
        Self {
            listener,
            ctx,
            shutdown_rx,
            tasks: JoinSet::new(),
        }
    }

    /// Accept connections until shutdown.
    ///
    /// On shutdown the listener is dropped and in-flight connection tasks are
    /// aborted, closing their sockets.
    pub async fn run(mut self) -> P2pResult<()> {
        loop {
            tokio::select! {
                // Handle shutdown
                _ = self.shutdown_rx.recv() => {
                    tracing::info!("Dispatcher shutting down");
                    break;
                }

                // Accept inbound connections
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if let Err(e) = stream.set_nodelay(true) {
                                tracing::warn!(error = %e, "Failed to set TCP_NODELAY");
                            }

                            tracing::debug!(addr = %addr, "Accepted inbound");
                            let conn = Connection::new(stream, addr, &self.ctx.config);
                            let ctx = self.ctx.clone();
                            self.tasks.spawn(async move {
                                handle_connection(&ctx, conn).await;
                            });
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Accept error");
                        }
                    }
                }

                // Reap finished connection tasks
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            tracing::error!(error = %e, "Connection task panicked");
                        }
                    }
                }
            }
        }

        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}
        Ok(())
    }
}

/// Serve one inbound connection.
pub async fn handle_connection(ctx: &NodeContext, mut conn: Connection) {
    let addr = conn.peer_addr();

    let first = match conn.recv().await {
        Ok(message) => message,
        Err(P2pError::Frame(e)) => {
            tracing::warn!(addr = %addr, error = %e, "Undecodable first frame");
            reply_invalid(conn).await;
            return;
        }
        Err(e) => {
            tracing::debug!(addr = %addr, error = %e, "Connection dropped before first frame");
            return;
        }
    };

    tracing::debug!(addr = %addr, msg = %first, "Dispatching inbound frame");

    let result = match first {
        WireMessage::Register {
            public_key,
            listening_port,
        } => handle_register(ctx, conn, public_key, listening_port).await,
        WireMessage::Text { body } => receive_text(ctx, conn, body).await,
        WireMessage::Ack { kind } => {
            tracing::warn!(addr = %addr, ack = %kind, "Ack cannot open a connection");
            reply_invalid(conn).await;
            return;
        }
    };

    match result {
        Ok(()) => {}
        Err(e) if e.is_connection_error() => {
            tracing::debug!(addr = %addr, error = %e, "Inbound connection lost");
        }
        Err(e) => {
            tracing::warn!(addr = %addr, error = %e, "Inbound request failed");
        }
    }
}

async fn reply_invalid(mut conn: Connection) {
    conn.reject().await;
    conn.close().await;
}
