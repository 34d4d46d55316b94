//! P2P protocol layer.
//!
//! This module contains:
//! - Message definitions for the Register, Text and Ack frames
//! - Fixed-layout framing codec
//! - Registration handshake state machines

pub mod framing;
pub mod messages;
pub mod registration;

// Re-export main types
pub use framing::{decode, encode, WireCodec};
pub use messages::{AckKind, MessageKind, WireMessage};
pub use registration::{InitiatorState, ResponderState};
