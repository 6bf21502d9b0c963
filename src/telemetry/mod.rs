//! Logging for dugit.
//!
//! Structured logging via the `tracing` crate. User-facing messages go
//! through [`crate::cli::output::Output`], not the logger.
//!
//! # Feature Flags
//!
//! - `release-logs`: Strip debug/trace at compile time
//! - `max-perf`: Disable all tracing for maximum performance

mod init;

pub use init::{init_telemetry, TelemetryConfig};
