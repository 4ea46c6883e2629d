//! # Integration Flows
//!
//! End-to-end runs of the engine and the façade over loopback UDP.

pub mod concurrency;
pub mod flows;
