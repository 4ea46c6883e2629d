//! # Iris Transport
//!
//! Core of the Iris datagram message transmitter.
//!
//! An application hands Iris outbound payloads and an address; Iris delivers
//! them over a datagram transport and hands back payloads received from the
//! network.
//!
//! ## Architecture
//!
//! ```text
//!  application
//!      │ send_message()                              receive_message() ▲
//!      ▼                                                               │
//! ┌─────────────┐   encode    ┌─────────────┐      ┌─────────────┐  decode  ┌─────────────┐
//! │ outbound    │ ──────────→ │ outbound    │      │ inbound     │ ───────→ │ inbound     │
//! │ (TEXT)      │ Translator  │ (BINARY)    │      │ (BINARY)    │Translator│ (TEXT)      │
//! └─────────────┘             └──────┬──────┘      └──────▲──────┘          └─────────────┘
//!                                    │ send step          │ receive step
//!                                    ▼                    │
//!                              ┌──────────────────────────┴──┐
//!                              │            Engine           │
//!                              │ (sequential | threaded)     │
//!                              └──────────────┬──────────────┘
//!                                             │ UDP datagrams
//!                                             ▼
//!                                          network
//! ```
//!
//! The crate follows the ports-and-adapters layout:
//! - **Domain Layer:** messages, addresses, lifecycle state machines
//! - **Ports Layer:** traits the engine and translator are written against
//! - **Adapters Layer:** UDP and in-memory endpoints
//! - **Queue / Engine / Translator:** the concurrent pipeline stages
//! - **Service:** the [`Iris`] façade wiring everything together
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use iris_transport::{Address, LockedMessageQueue, Message, MessageKind, Translator};
//!
//! let plain = Arc::new(LockedMessageQueue::new(MessageKind::Text));
//! let wire = Arc::new(LockedMessageQueue::new(MessageKind::Binary));
//!
//! let translator: Translator<&str> = Translator::default();
//! translator
//!     .register_operation(plain.clone(), wire.clone(), Message::to_binary, "encode")
//!     .unwrap();
//!
//! let address = Address::new("127.0.0.1", 9999).unwrap();
//! plain.enqueue(Message::text("ping", address).unwrap()).unwrap();
//! translator.run_pass();
//!
//! let encoded = wire.dequeue().unwrap();
//! assert_eq!(encoded.payload().as_bytes(), b"ping");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod activity;
pub mod adapters;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ports;
pub mod queue;
pub mod service;
pub mod translator;

// Domain
pub use domain::{
    is_valid_address, Address, EngineState, Message, MessageKind, Mode, Payload, StatusCell,
    TranslatorState,
};

// Ports
pub use ports::{EndpointKind, EndpointRole, MessageDestination, MessageSource, NetworkEndpoint};

// Adapters
pub use adapters::{MemoryEndpoint, UdpEndpoint};

// Pipeline stages
pub use activity::{CancellationFlag, RunHandle};
pub use engine::{
    ConcurrencyStrategy, Engine, EngineBuilder, EngineIo, LaunchContext, ReceiveOutcome,
    SendOutcome, SequentialStrategy, StrategyKind, ThreadedStrategy,
};
pub use queue::{LockedMessageQueue, MessageQueue};
pub use translator::{PassReport, Translator};

// Configuration and errors
pub use config::{ConfigError, EngineConfig, IrisConfig, TranslatorConfig};
pub use error::{
    EngineError, EngineInitError, EngineResult, IrisError, MessageError, NetworkError,
    QueueError, SendError, TranslatorError, TranslatorResult,
};

// Façade
pub use service::{Iris, DECODE_OPERATION, ENCODE_OPERATION};

/// Maximum datagram size read by the receive step, in bytes.
pub const MAX_DATAGRAM_SIZE: usize = 1500;

/// Default bound on how long a receive poll may wait for data.
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 5;

/// Default pause taken by a worker loop that found nothing to do.
pub const DEFAULT_IDLE_BACKOFF_MS: u64 = 1;

/// Default bound on how long `stop()` waits for workers to wind down.
pub const DEFAULT_STOP_TIMEOUT_MS: u64 = 5_000;
