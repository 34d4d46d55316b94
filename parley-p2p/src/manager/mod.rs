//! Connection management.
//!
//! This module provides:
//! - The inbound dispatcher (accept loop and first-frame routing)
//! - Outbound connection setup

pub mod inbound;
pub mod outbound;

pub use inbound::{handle_connection, ConnectionDispatcher};
pub use outbound::{open_connection, resolve_peer_addr};
