//! Registration handshake drivers.
//!
//! [`ensure_registered`] runs the initiator side over a fresh outbound
//! connection; [`handle_register`] runs the responder side for a connection
//! whose first frame was a Register. Both walk the state machines in
//! [`crate::protocol::registration`] and report any failure as
//! [`P2pError::RegistrationFailed`] naming the last stage reached.

use crate::context::NodeContext;
use crate::error::{P2pError, P2pResult};
use crate::manager::{open_connection, resolve_peer_addr};
use crate::peer::Connection;
use crate::protocol::{AckKind, InitiatorState, ResponderState, WireMessage};

/// Register with `host:port`, recording it in the peer table.
///
/// Runs the full handshake to completion or fails; never retries.
pub async fn ensure_registered(ctx: &NodeContext, host: &str, port: u16) -> P2pResult<()> {
    let addr = resolve_peer_addr(host, port)?;
    let mut state = InitiatorState::new();

    match run_initiator(ctx, addr, &mut state).await {
        Ok(peer_host) => {
            tracing::info!(host = %peer_host, port, "Registered with peer");
            Ok(())
        }
        Err(e) => Err(state.fail(host, e)),
    }
}

async fn run_initiator(
    ctx: &NodeContext,
    addr: std::net::SocketAddr,
    state: &mut InitiatorState,
) -> P2pResult<String> {
    let mut conn = open_connection(addr, &ctx.config).await?;

    conn.send(ctx.register_message()).await?;
    state.sent_register()?;
    state.awaiting_peer_register()?;

    let (public_key, listening_port) = match conn.recv().await? {
        WireMessage::Register {
            public_key,
            listening_port,
        } => (public_key, listening_port),
        other => {
            return Err(P2pError::UnexpectedMessage {
                expected: "register",
                actual: other.name(),
            })
        }
    };

    let peer_host = conn.peer_host();
    ctx.peers.upsert(&peer_host, listening_port, public_key);

    conn.send(WireMessage::ack(AckKind::Received)).await?;
    state.sent_ack()?;

    conn.close().await;
    state.done()?;
    Ok(peer_host)
}

/// Answer a Register frame that opened an inbound connection.
///
/// The initiator is recorded before our own Register goes out and is kept
/// even if the confirming Ack never arrives.
pub async fn handle_register(
    ctx: &NodeContext,
    mut conn: Connection,
    public_key: Vec<u8>,
    listening_port: u16,
) -> P2pResult<()> {
    let host = conn.peer_host();
    let mut state = ResponderState::new();

    let result = run_responder(ctx, &mut conn, &host, &mut state, public_key, listening_port).await;
    conn.close().await;

    match result {
        Ok(()) => {
            tracing::info!(host = %host, port = listening_port, "Peer registered with us");
            Ok(())
        }
        Err(e) => Err(state.fail(&host, e)),
    }
}

async fn run_responder(
    ctx: &NodeContext,
    conn: &mut Connection,
    host: &str,
    state: &mut ResponderState,
    public_key: Vec<u8>,
    listening_port: u16,
) -> P2pResult<()> {
    state.received_register()?;

    if !ctx.peers.upsert_if_changed(host, listening_port, public_key) {
        tracing::debug!(host, port = listening_port, "Peer already registered");
    }
    state.registered_locally()?;

    conn.send(ctx.register_message()).await?;
    state.sent_own_register()?;
    state.awaiting_ack()?;

    let reply = match conn.recv().await {
        Ok(message) => message,
        Err(P2pError::Frame(e)) => {
            tracing::warn!(host, error = %e, "Undecodable registration confirmation");
            conn.reject().await;
            return Err(P2pError::Frame(e));
        }
        Err(e) => return Err(e),
    };

    match reply {
        WireMessage::Ack {
            kind: AckKind::Received,
        } => state.done(),
        WireMessage::Ack { kind } => {
            tracing::warn!(host, ack = %kind, "Registration confirmation failed");
            Err(P2pError::UnexpectedMessage {
                expected: "received",
                actual: kind.name(),
            })
        }
        other => Err(P2pError::UnexpectedMessage {
            expected: "ack",
            actual: other.name(),
        }),
    }
}
