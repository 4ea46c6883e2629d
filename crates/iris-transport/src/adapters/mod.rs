//! # Endpoint Adapters
//!
//! - `UdpEndpoint` - production endpoint over `std::net::UdpSocket`
//! - `MemoryEndpoint` - in-process endpoint for tests and embedding

pub mod memory;
pub mod udp;

pub use memory::MemoryEndpoint;
pub use udp::UdpEndpoint;
