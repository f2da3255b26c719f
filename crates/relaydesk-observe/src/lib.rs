//! Observability setup for RelayDesk.
//!
//! Structured logging via `tracing-subscriber` with an optional
//! OpenTelemetry bridge for span export.

pub mod tracing_setup;
