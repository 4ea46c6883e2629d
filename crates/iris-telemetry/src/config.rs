//! Telemetry configuration from environment variables.

use std::env;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name reported when logging starts
    pub service_name: String,

    /// Filter directive (`info`, `iris_transport=debug`, ...)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to colour pretty output
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "iris".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            ansi: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `IRIS_SERVICE_NAME`: Service name (default: iris)
    /// - `IRIS_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `IRIS_JSON_LOGS`: Enable JSON logs (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Quiet configuration for test harnesses: warnings only, no colour.
    pub fn for_tests() -> Self {
        Self {
            service_name: "iris-tests".to_string(),
            log_level: "warn".to_string(),
            json_logs: false,
            ansi: false,
        }
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let json_logs = lookup("IRIS_JSON_LOGS")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(defaults.json_logs);

        Self {
            service_name: lookup("IRIS_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: lookup("IRIS_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            json_logs,
            // JSON consumers never want escape codes.
            ansi: !json_logs,
        }
    }
}
