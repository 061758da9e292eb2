//! Runtime core: configuration and composition.
//!
//! - [`Config`] settings for both buses and the dispatcher;
//! - [`RuntimeBuilder`] wires sink, timer and pre-registered listeners;
//! - [`Runtime`] owns the two buses, the dispatcher and the health reporter.

mod builder;
mod config;
mod runtime;

pub use builder::RuntimeBuilder;
pub use config::{BusConfig, Config, DispatchConfig};
pub use runtime::Runtime;
