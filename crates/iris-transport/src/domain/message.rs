//! Messages moved through Iris
//!
//! A message is a payload plus the address it is going to (outbound) or came
//! from (inbound). The payload is either text or raw bytes, and the mode is
//! derived from which one it is, so mode and payload can never disagree.
//!
//! ```text
//! [TEXT] ──to_binary──→ [BINARY]
//!    ↑                      │
//!    └────from_binary───────┘
//! ```

use super::address::Address;
use crate::error::MessageError;
use std::fmt;

/// Whether a message carries text or raw bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Application-level text payload
    Text,
    /// Wire-level byte payload
    Binary,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "TEXT"),
            Self::Binary => write!(f, "BINARY"),
        }
    }
}

/// Message payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Payload {
    /// UTF-8 text
    Text(String),
    /// Raw bytes
    Binary(Vec<u8>),
}

impl Payload {
    /// Mode implied by this payload.
    pub fn mode(&self) -> Mode {
        match self {
            Self::Text(_) => Mode::Text,
            Self::Binary(_) => Mode::Binary,
        }
    }

    /// Bytes that go on the wire (text is sent as UTF-8).
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    /// Text content, if this is a text payload.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Self::Binary(bytes.to_vec())
    }
}

/// Which messages a queue is bound to accept.
///
/// `Any` is the widest kind; `Text` and `Binary` are refinements of it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Accept every message
    #[default]
    Any,
    /// Accept TEXT messages only
    Text,
    /// Accept BINARY messages only
    Binary,
}

impl MessageKind {
    /// Whether `message` is an instance of this kind.
    pub fn accepts(self, message: &Message) -> bool {
        match self {
            Self::Any => true,
            Self::Text => message.mode() == Mode::Text,
            Self::Binary => message.mode() == Mode::Binary,
        }
    }

    /// Construct a message of this kind from a received datagram.
    ///
    /// `Text` decodes the bytes as UTF-8; `Binary` and `Any` keep them raw.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Init`] for empty datagrams, and for bytes that
    /// are not UTF-8 when the kind is `Text`.
    pub fn build(self, raw: Vec<u8>, sender: Address) -> Result<Message, MessageError> {
        match self {
            Self::Text => {
                let text = String::from_utf8(raw).map_err(|e| {
                    MessageError::Init(format!("datagram from {} is not UTF-8: {}", sender, e))
                })?;
                Message::text(text, sender)
            }
            Self::Binary | Self::Any => Message::binary(raw, sender),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "ANY"),
            Self::Text => write!(f, "TEXT"),
            Self::Binary => write!(f, "BINARY"),
        }
    }
}

/// A payload addressed to (or received from) a peer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    payload: Payload,
    address: Address,
}

impl Message {
    /// Create a message; the mode follows the payload variant.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Init`] if the payload is empty.
    pub fn new(payload: impl Into<Payload>, address: Address) -> Result<Self, MessageError> {
        let payload = payload.into();
        if payload.is_empty() {
            return Err(MessageError::Init(
                "cannot create a message without payload".to_string(),
            ));
        }
        Ok(Self { payload, address })
    }

    /// Create a TEXT message.
    pub fn text(payload: impl Into<String>, address: Address) -> Result<Self, MessageError> {
        Self::new(Payload::Text(payload.into()), address)
    }

    /// Create a BINARY message.
    pub fn binary(payload: impl Into<Vec<u8>>, address: Address) -> Result<Self, MessageError> {
        Self::new(Payload::Binary(payload.into()), address)
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.payload.mode()
    }

    /// Payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Destination (outbound) or sender (inbound).
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Split into payload and address.
    pub fn into_parts(self) -> (Payload, Address) {
        (self.payload, self.address)
    }

    /// Encode a TEXT message into BINARY mode for transmission.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Encoding`] if the message is not in TEXT mode.
    pub fn to_binary(self) -> Result<Self, MessageError> {
        match self.payload {
            Payload::Text(text) => Ok(Self {
                payload: Payload::Binary(text.into_bytes()),
                address: self.address,
            }),
            Payload::Binary(_) => Err(MessageError::Encoding(format!(
                "message to {} must be in TEXT mode",
                self.address
            ))),
        }
    }

    /// Decode a BINARY message into TEXT mode for the application.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Decoding`] if the message is not in BINARY
    /// mode or its bytes are not UTF-8.
    pub fn from_binary(self) -> Result<Self, MessageError> {
        match self.payload {
            Payload::Binary(bytes) => {
                let text = String::from_utf8(bytes).map_err(|e| {
                    MessageError::Decoding(format!(
                        "payload from {} is not UTF-8: {}",
                        self.address, e
                    ))
                })?;
                Ok(Self {
                    payload: Payload::Text(text),
                    address: self.address,
                })
            }
            Payload::Text(_) => Err(MessageError::Decoding(format!(
                "message from {} must be in BINARY mode",
                self.address
            ))),
        }
    }
}
