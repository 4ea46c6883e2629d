//! # Driven Ports (Outbound SPI)
//!
//! Interfaces the engine and translator require from their collaborators.

use crate::domain::Message;
use crate::error::{MessageError, NetworkError, QueueError};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// Transport semantics reported by an endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    /// Connectionless, message-oriented (UDP)
    Datagram,
    /// Connection-oriented byte stream (TCP)
    Stream,
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Datagram => write!(f, "datagram"),
            Self::Stream => write!(f, "stream"),
        }
    }
}

/// Which side of the engine an endpoint serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndpointRole {
    /// Endpoint read by the receive step
    Listen,
    /// Endpoint written by the send step
    Send,
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listen => write!(f, "listen"),
            Self::Send => write!(f, "send"),
        }
    }
}

/// Abstract network endpoint.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: with the threaded strategy the send
/// worker and the receive worker use the same endpoint concurrently.
pub trait NetworkEndpoint: Send + Sync + fmt::Debug {
    /// Transport semantics; the engine only accepts [`EndpointKind::Datagram`].
    fn kind(&self) -> EndpointKind;

    /// Send one datagram. Returns the number of bytes written.
    fn send_to(&self, payload: &[u8], target: SocketAddr) -> Result<usize, NetworkError>;

    /// Receive at most one datagram into `buf`.
    ///
    /// Waits no longer than the poll timeout. Returns `Ok(None)` when nothing
    /// arrived in that window.
    fn recv_from(&self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>, NetworkError>;

    /// Bound how long [`recv_from`](Self::recv_from) may wait.
    fn set_poll_timeout(&self, timeout: Duration) -> Result<(), NetworkError>;

    /// Locally bound address.
    fn local_addr(&self) -> Result<SocketAddr, NetworkError>;

    /// Release the endpoint.
    ///
    /// Succeeds exactly once; later calls return [`NetworkError::AlreadyClosed`]
    /// and every other operation returns [`NetworkError::Closed`].
    fn close(&self) -> Result<(), NetworkError>;

    /// Whether [`close`](Self::close) has been called.
    fn is_closed(&self) -> bool;
}

/// Source of outbound messages.
pub trait MessageSource: Send + Sync {
    /// Yield the next pending message, or `None` without blocking.
    fn next_message(&self) -> Option<Message>;
}

/// Destination for completed messages.
pub trait MessageDestination: Send + Sync {
    /// Accept one completed message. A refused message comes back inside the
    /// error.
    fn accept(&self, message: Message) -> Result<(), QueueError>;

    /// Construct a message of this destination's kind from a received datagram.
    fn build_message(&self, raw: Vec<u8>, sender: SocketAddr) -> Result<Message, MessageError>;
}
