//! # Iris Telemetry
//!
//! Structured logging setup for Iris processes and test harnesses.
//!
//! The transport crate only emits `tracing` events; installing a subscriber is
//! left to whoever owns the process. This crate does that in one call.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use iris_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config).expect("Failed to init logging");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `IRIS_LOG_LEVEL` or `RUST_LOG` | `info` | Log level filter |
//! | `IRIS_JSON_LOGS` | `false` | Emit JSON lines instead of pretty text |
//! | `IRIS_SERVICE_NAME` | `iris` | Service name attached to startup log |

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

#[doc(hidden)]
pub use tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Filter directive could not be parsed
    #[error("Invalid log filter {directive:?}: {reason}")]
    Filter {
        /// Offending directive
        directive: String,
        /// Parser message
        reason: String,
    },

    /// A global subscriber is already installed
    #[error("Failed to install subscriber: {0}")]
    Install(String),
}
