//! # Built-in listeners
//!
//! - [`LogWriter`]: writes events to `tracing` (debug/diagnostics).

mod log;

pub use log::LogWriter;
