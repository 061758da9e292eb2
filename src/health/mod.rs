//! Read-only diagnostics over the buses and the dispatcher.
//!
//! - [`HealthReporter`] history queries and dispatcher health
//! - [`DiagnosticsSnapshot`] serializable point-in-time summary

mod reporter;

pub use reporter::{BusDiagnostics, DiagnosticsSnapshot, HealthReporter};
