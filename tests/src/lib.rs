//! # Iris Test Suite
//!
//! Cross-component tests that need real sockets, plus benchmarks.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/
//! │   ├── support.rs        # UDP echo peer, logging bootstrap
//! │   └── integration/
//! │       ├── flows.rs      # engine / façade over loopback UDP
//! │       └── concurrency.rs# producer fan-in, restart under load
//! └── benches/
//!     └── transport_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p iris-tests
//! cargo test -p iris-tests integration::flows
//!
//! # Benchmarks
//! cargo bench -p iris-tests
//! ```

pub mod integration;
pub mod support;
