//! Error types for the Iris transport core
//!
//! Two families of errors live here:
//! - misuse of the public API (bad constructor arguments, calls from the
//!   wrong lifecycle state, registry conflicts), returned synchronously
//! - the fate of a single message (send, receive, translation failures),
//!   contained by the worker loop that hit them and logged

use crate::config::ConfigError;
use crate::domain::{Address, EngineState, Message, MessageKind, Mode, TranslatorState};
use crate::ports::{EndpointKind, EndpointRole};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Result type alias for translator operations
pub type TranslatorResult<T> = std::result::Result<T, TranslatorError>;

/// Errors raised while building or transforming a message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// Payload or address rejected at construction
    #[error("Message init error: {0}")]
    Init(String),

    /// TEXT -> BINARY transition failed
    #[error("Message encoding error: {0}")]
    Encoding(String),

    /// BINARY -> TEXT transition failed
    #[error("Message decoding error: {0}")]
    Decoding(String),
}

/// Errors raised by message queues
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Message does not match the kind the queue was bound to
    #[error("Queue accepts {expected} messages, got a {actual} message")]
    KindMismatch {
        /// Kind the queue was constructed with
        expected: MessageKind,
        /// Mode of the rejected message
        actual: Mode,
        /// The rejected message, handed back to the caller
        message: Box<Message>,
    },
}

impl QueueError {
    /// Recover the message the queue refused.
    pub fn into_message(self) -> Message {
        match self {
            Self::KindMismatch { message, .. } => *message,
        }
    }
}

/// Errors from network endpoints
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Endpoint has been closed
    #[error("Endpoint is closed")]
    Closed,

    /// `close()` was called on an endpoint that was already closed
    #[error("Endpoint was already closed")]
    AlreadyClosed,

    /// Datagram exceeds the configured maximum size
    #[error("Datagram of {size} bytes exceeds maximum of {max} bytes")]
    MessageTooLarge {
        /// Payload size in bytes
        size: usize,
        /// Configured maximum
        max: usize,
    },

    /// Host name could not be resolved to a socket address
    #[error("Failed to resolve {address}: {reason}")]
    Resolution {
        /// Address that failed to resolve
        address: String,
        /// Resolver message
        reason: String,
    },

    /// Underlying socket error
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons an engine could not be constructed
#[derive(Debug, Error)]
pub enum EngineInitError {
    /// Endpoint is not connectionless
    #[error("{role} endpoint must be a datagram endpoint, got {kind}")]
    NotDatagram {
        /// Which endpoint was rejected
        role: EndpointRole,
        /// What the endpoint reported
        kind: EndpointKind,
    },

    /// Endpoint configuration (poll timeout or caller hook) failed
    #[error("Failed to configure {role} endpoint: {source}")]
    Configure {
        /// Which endpoint failed
        role: EndpointRole,
        /// Underlying failure
        #[source]
        source: NetworkError,
    },
}

/// A single outbound message could not be transmitted
#[derive(Debug, Error)]
#[error("Failed to send to {address}: {source}")]
pub struct SendError {
    /// Destination of the dropped message
    pub address: Address,
    /// Underlying failure
    #[source]
    pub source: NetworkError,
}

/// Errors that can occur in the engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Bad constructor arguments
    #[error("Engine init failed: {0}")]
    Init(#[from] EngineInitError),

    /// `start()` called from RUNNING or SHUTDOWN
    #[error("Cannot start engine from {0} state")]
    Start(EngineState),

    /// `stop()` called while not RUNNING
    #[error("Cannot stop engine from {0} state")]
    Stop(EngineState),

    /// Workers did not observe the stop request in time
    #[error("Engine did not reach STOPPED within {0:?}")]
    StopTimeout(Duration),

    /// `shutdown()` called on an engine that is already shut down
    #[error("Cannot shut down engine from {0} state")]
    Shutdown(EngineState),

    /// Worker loop entered with its run flag already lowered
    #[error("Worker {0} entered its loop with the run flag lowered")]
    Flag(String),

    /// Per-message transmission failure
    #[error(transparent)]
    Send(#[from] SendError),

    /// Receive poll failed for a reason other than "no data"
    #[error("Failed to receive datagram: {0}")]
    Receive(#[source] NetworkError),

    /// OS refused to start a worker thread
    #[error("Failed to spawn worker {name}: {source}")]
    Spawn {
        /// Thread name
        name: String,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur in the translator
#[derive(Debug, Error)]
pub enum TranslatorError {
    /// Operation could not be registered
    #[error("Failed to register operation {key}: {reason}")]
    Registration {
        /// Debug rendering of the operation key
        key: String,
        /// Why registration was refused
        reason: String,
    },

    /// No operation registered under the key
    #[error("Operation {key} is not registered")]
    Deregistration {
        /// Debug rendering of the operation key
        key: String,
    },

    /// `start()` called while RUNNING
    #[error("Cannot start translator from {0} state")]
    Start(TranslatorState),

    /// `stop()` called while not RUNNING
    #[error("Cannot stop translator from {0} state")]
    Stop(TranslatorState),

    /// Loop did not observe the stop request in time
    #[error("Translator did not reach STOPPED within {0:?}")]
    StopTimeout(Duration),

    /// Loop entered with its run flag already lowered
    #[error("Translator loop entered with the run flag lowered")]
    Flag,

    /// OS refused to start the loop thread
    #[error("Failed to spawn translator loop: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Errors surfaced by the [`Iris`](crate::Iris) façade
#[derive(Debug, Error)]
pub enum IrisError {
    /// Local endpoint could not be bound
    #[error("Binding failed: {0}")]
    Binding(String),

    /// Outbound message rejected before queueing
    #[error("Sending failed: {0}")]
    Sending(String),

    /// Lifecycle call made from the wrong state
    #[error("Cannot {action} from {state} state")]
    Lifecycle {
        /// Attempted transition
        action: &'static str,
        /// State at the time of the call
        state: EngineState,
    },

    /// Engine failure
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Translator failure
    #[error(transparent)]
    Translator(#[from] TranslatorError),

    /// Queue failure
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Unusable configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}
