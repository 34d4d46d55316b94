//! Wire protocol messages.
//!
//! Three message kinds travel between peers: Register (handshake), Text
//! (a chat message) and Ack (the reply to either).

use std::fmt;

/// Message-kind tag carried in the first four bytes of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MessageKind {
    Register = 1,
    Text = 2,
    Ack = 3,
}

impl MessageKind {
    /// Parse a wire tag.
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            1 => Some(MessageKind::Register),
            2 => Some(MessageKind::Text),
            3 => Some(MessageKind::Ack),
            _ => None,
        }
    }

    /// The wire tag.
    pub fn tag(self) -> u32 {
        self as u32
    }
}

/// Acknowledgement outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AckKind {
    /// Frame received and processed.
    Received = 1,
    /// Sender is not registered with us and should register first.
    Unregistered = 2,
    /// Frame could not be processed.
    Invalid = 3,
}

impl AckKind {
    /// Parse a wire tag.
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            1 => Some(AckKind::Received),
            2 => Some(AckKind::Unregistered),
            3 => Some(AckKind::Invalid),
            _ => None,
        }
    }

    /// The wire tag.
    pub fn tag(self) -> u32 {
        self as u32
    }

    /// Lowercase name used in logs and errors.
    pub fn name(self) -> &'static str {
        match self {
            AckKind::Received => "received",
            AckKind::Unregistered => "unregistered",
            AckKind::Invalid => "invalid",
        }
    }
}

impl fmt::Display for AckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// All protocol messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireMessage {
    /// Announce our public key and the port we accept connections on.
    Register {
        public_key: Vec<u8>,
        listening_port: u16,
    },
    /// A chat message.
    Text { body: String },
    /// Reply to the previous frame.
    Ack { kind: AckKind },
}

impl WireMessage {
    /// Get the message kind.
    pub fn kind(&self) -> MessageKind {
        match self {
            WireMessage::Register { .. } => MessageKind::Register,
            WireMessage::Text { .. } => MessageKind::Text,
            WireMessage::Ack { .. } => MessageKind::Ack,
        }
    }

    /// Get a human-readable name for the message type.
    pub fn name(&self) -> &'static str {
        match self {
            WireMessage::Register { .. } => "register",
            WireMessage::Text { .. } => "text",
            WireMessage::Ack { .. } => "ack",
        }
    }

    /// Shorthand for an Ack frame.
    pub fn ack(kind: AckKind) -> Self {
        WireMessage::Ack { kind }
    }
}

impl fmt::Display for WireMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireMessage::Register {
                public_key,
                listening_port,
            } => write!(
                f,
                "Register(key_len={}, port={})",
                public_key.len(),
                listening_port
            ),
            WireMessage::Text { body } => write!(f, "Text(len={})", body.len()),
            WireMessage::Ack { kind } => write!(f, "Ack({})", kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        for kind in [MessageKind::Register, MessageKind::Text, MessageKind::Ack] {
            assert_eq!(MessageKind::from_tag(kind.tag()), Some(kind));
        }
        for kind in [AckKind::Received, AckKind::Unregistered, AckKind::Invalid] {
            assert_eq!(AckKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(MessageKind::from_tag(0), None);
        assert_eq!(AckKind::from_tag(4), None);
    }

    #[test]
    fn test_message_names() {
        assert_eq!(WireMessage::ack(AckKind::Received).name(), "ack");
        assert_eq!(WireMessage::Text { body: "hi".into() }.name(), "text");
        assert_eq!(
            WireMessage::Text { body: "hi".into() }.kind(),
            MessageKind::Text
        );
    }

    #[test]
    fn test_message_display() {
        let msg = WireMessage::ack(AckKind::Unregistered);
        assert_eq!(format!("{}", msg), "Ack(unregistered)");

        let msg = WireMessage::Register {
            public_key: vec![0u8; 32],
            listening_port: 8000,
        };
        assert_eq!(format!("{}", msg), "Register(key_len=32, port=8000)");
    }
}
