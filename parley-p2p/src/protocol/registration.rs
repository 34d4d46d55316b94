//! Registration handshake state machines.
//!
//! The handshake protocol:
//! 1. Initiator sends Register with its key and listening port
//! 2. Responder records the initiator and replies with its own Register
//! 3. Initiator records the responder and replies Ack(received)
//! 4. Both sides close the connection
//!
//! The drivers in [`crate::registration`] walk these states; each side's
//! transitions are checked so a driver cannot skip a step.

use crate::error::{P2pError, P2pResult};

/// Handshake state on the side that opened the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitiatorState {
    /// Nothing sent yet.
    Init,
    /// Our Register is on the wire.
    SentRegister,
    /// Waiting for the responder's Register.
    AwaitPeerRegister,
    /// Responder recorded; our Ack is on the wire.
    SentAck,
    /// Handshake complete.
    Done,
    /// Handshake failed.
    Failed,
}

impl InitiatorState {
    /// Create initial handshake state.
    pub fn new() -> Self {
        Self::Init
    }

    /// Stage name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::SentRegister => "sent_register",
            Self::AwaitPeerRegister => "await_peer_register",
            Self::SentAck => "sent_ack",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    fn advance(&mut self, from: Self, to: Self) -> P2pResult<()> {
        if *self != from {
            return Err(P2pError::InvalidTransition {
                from: self.name(),
                to: to.name(),
            });
        }
        tracing::debug!(from = from.name(), to = to.name(), "Initiator transition");
        *self = to;
        Ok(())
    }

    /// Process sending our Register.
    pub fn sent_register(&mut self) -> P2pResult<()> {
        self.advance(Self::Init, Self::SentRegister)
    }

    /// Begin waiting for the responder's Register.
    pub fn awaiting_peer_register(&mut self) -> P2pResult<()> {
        self.advance(Self::SentRegister, Self::AwaitPeerRegister)
    }

    /// Process sending the confirming Ack.
    pub fn sent_ack(&mut self) -> P2pResult<()> {
        self.advance(Self::AwaitPeerRegister, Self::SentAck)
    }

    /// Mark the handshake complete.
    pub fn done(&mut self) -> P2pResult<()> {
        self.advance(Self::SentAck, Self::Done)
    }

    /// Move to `Failed`, wrapping `error` with the last stage reached.
    pub fn fail(&mut self, host: &str, error: P2pError) -> P2pError {
        let stage = self.name();
        tracing::debug!(host, stage, error = %error, "Initiator failed");
        *self = Self::Failed;
        P2pError::RegistrationFailed {
            host: host.to_string(),
            stage,
            source: Box::new(error),
        }
    }
}

impl Default for InitiatorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Handshake state on the side that accepted the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponderState {
    /// Connection accepted, no frame read.
    Listening,
    /// Initiator's Register decoded.
    ReceivedRegister,
    /// Initiator written to the peer table.
    RegisteredLocally,
    /// Our Register is on the wire.
    SentOwnRegister,
    /// Waiting for the initiator's Ack.
    AwaitAck,
    /// Handshake complete.
    Done,
    /// Handshake failed.
    Failed,
}

impl ResponderState {
    /// Create initial handshake state.
    pub fn new() -> Self {
        Self::Listening
    }

    /// Stage name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Listening => "listening",
            Self::ReceivedRegister => "received_register",
            Self::RegisteredLocally => "registered_locally",
            Self::SentOwnRegister => "sent_own_register",
            Self::AwaitAck => "await_ack",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    fn advance(&mut self, from: Self, to: Self) -> P2pResult<()> {
        if *self != from {
            return Err(P2pError::InvalidTransition {
                from: self.name(),
                to: to.name(),
            });
        }
        tracing::debug!(from = from.name(), to = to.name(), "Responder transition");
        *self = to;
        Ok(())
    }

    /// Process receiving the initiator's Register.
    pub fn received_register(&mut self) -> P2pResult<()> {
        self.advance(Self::Listening, Self::ReceivedRegister)
    }

    /// Process recording the initiator.
    pub fn registered_locally(&mut self) -> P2pResult<()> {
        self.advance(Self::ReceivedRegister, Self::RegisteredLocally)
    }

    /// Process sending our own Register.
    pub fn sent_own_register(&mut self) -> P2pResult<()> {
        self.advance(Self::RegisteredLocally, Self::SentOwnRegister)
    }

    /// Begin waiting for the confirming Ack.
    pub fn awaiting_ack(&mut self) -> P2pResult<()> {
        self.advance(Self::SentOwnRegister, Self::AwaitAck)
    }

    /// Mark the handshake complete.
    pub fn done(&mut self) -> P2pResult<()> {
        self.advance(Self::AwaitAck, Self::Done)
    }

    /// Move to `Failed`, wrapping `error` with the last stage reached.
    pub fn fail(&mut self, host: &str, error: P2pError) -> P2pError {
        let stage = self.name();
        tracing::debug!(host, stage, error = %error, "Responder failed");
        *self = Self::Failed;
        P2pError::RegistrationFailed {
            host: host.to_string(),
            stage,
            source: Box::new(error),
        }
    }
}

impl Default for ResponderState {
    fn default() -> Self {
        Self::new()
    }
}
