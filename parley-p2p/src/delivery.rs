//! Text delivery.
//!
//! A delivery is one Text frame answered by one Ack. A peer that does not
//! know us answers `Ack(unregistered)`; we then register and resend exactly
//! once.

use std::net::SocketAddr;

use crate::context::NodeContext;
use crate::error::{DeliveryFailure, P2pError, P2pResult};
use crate::manager::{open_connection, resolve_peer_addr};
use crate::peer::Connection;
use crate::protocol::{AckKind, WireMessage};
use crate::registration::ensure_registered;

/// Deliver `body` to the peer listening on `host:port`.
pub async fn send_text(ctx: &NodeContext, host: &str, port: u16, body: &str) -> P2pResult<()> {
    let addr = resolve_peer_addr(host, port)?;

    match attempt_delivery(ctx, addr, body).await? {
        AckKind::Received => Ok(()),
        AckKind::Invalid => Err(P2pError::DeliveryFailed(DeliveryFailure::Invalid)),
        AckKind::Unregistered => {
            tracing::info!(host, port, "Peer does not know us, registering");
            ensure_registered(ctx, host, port).await?;

            match attempt_delivery(ctx, addr, body).await? {
                AckKind::Received => Ok(()),
                AckKind::Invalid => Err(P2pError::DeliveryFailed(DeliveryFailure::Invalid)),
                AckKind::Unregistered => {
                    Err(P2pError::DeliveryFailed(DeliveryFailure::Unregistered))
                }
            }
        }
    }
}

/// One Text/Ack exchange; returns the ack kind.
async fn attempt_delivery(ctx: &NodeContext, addr: SocketAddr, body: &str) -> P2pResult<AckKind> {
    let mut conn = open_connection(addr, &ctx.config).await?;
    conn.send(WireMessage::Text {
        body: body.to_string(),
    })
    .await?;

    let reply = conn.recv().await;
    conn.close().await;

    match reply {
        Ok(WireMessage::Ack { kind }) => {
            tracing::debug!(addr = %addr, ack = %kind, "Delivery acknowledged");
            Ok(kind)
        }
        Ok(other) => {
            tracing::warn!(addr = %addr, msg = %other, "Expected ack, got other message");
            Err(P2pError::DeliveryFailed(DeliveryFailure::ProtocolViolation))
        }
        Err(P2pError::Frame(e)) => {
            tracing::warn!(addr = %addr, error = %e, "Undecodable reply");
            Err(P2pError::DeliveryFailed(DeliveryFailure::ProtocolViolation))
        }
        Err(P2pError::ReadTimeout { .. }) => {
            Err(P2pError::DeliveryFailed(DeliveryFailure::Timeout))
        }
        Err(e) => Err(e),
    }
}

/// Store a Text frame that opened an inbound connection.
///
/// Bodies from unknown hosts are not kept; the sender is told to register.
pub async fn receive_text(ctx: &NodeContext, mut conn: Connection, body: String) -> P2pResult<()> {
    let host = conn.peer_host();

    let ack = match ctx.peers.enqueue(&host, body) {
        Ok(()) => AckKind::Received,
        Err(P2pError::PeerNotFound(_)) => {
            tracing::debug!(host = %host, "Text from unregistered host");
            AckKind::Unregistered
        }
        Err(e) => {
            conn.close().await;
            return Err(e);
        }
    };

    let result = conn.send(WireMessage::ack(ack)).await;
    conn.close().await;
    result
}
