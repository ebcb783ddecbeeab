//! Telemetry for the captioner service.
//!
//! Initializes `tracing` with structured JSON output on standard output in
//! production and human-readable output in development, and installs a panic
//! hook that routes panics through the tracing subscriber.

pub mod tracing;

pub use crate::tracing::{LogFlusher, TracingError, init_tracing};
