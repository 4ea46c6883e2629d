//! Domain Layer - values and state machines with no I/O
//!
//! - Addresses and address validation
//! - Messages, payloads, modes and the kinds a queue can be bound to
//! - Lifecycle states shared by the engine, the translator and the façade

pub mod address;
pub mod lifecycle;
pub mod message;

pub use address::{is_valid_address, Address};
pub use lifecycle::{EngineState, StatusCell, TranslatorState};
pub use message::{Message, MessageKind, Mode, Payload};
