//! # Ports Layer - Hexagonal Architecture Boundaries
//!
//! The engine and the translator are written against these traits rather
//! than concrete queues or sockets:
//! - [`MessageSource`]: yields the next pending message without blocking
//! - [`MessageDestination`]: accepts completed messages and builds inbound ones
//! - [`NetworkEndpoint`]: a connectionless socket with bounded receive polls

pub mod outbound;

pub use outbound::{EndpointKind, EndpointRole, MessageDestination, MessageSource, NetworkEndpoint};
