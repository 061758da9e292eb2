//! # Event listeners for the bus.
//!
//! This module provides the [`Listen`] trait, the kind-indexed [`ListenerSet`]
//! that performs isolated fan-out, and built-in implementations.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   producer ── emit(kind, payload) ──► EventBus ──► ListenerSet::fan_out
//!                                                         │
//!                                          ┌──────────────┼──────────────┐
//!                                          ▼              ▼              ▼
//!                                      LogWriter   DispatchListener   custom
//!                                                  (telemetry sink)
//! ```
//!
//! ## Listener types
//! - **Trait listeners**: implement [`Listen`] on your own type.
//! - **Closure listeners**: wrap an async closure with [`ListenerFn`].

mod embedded;
mod listener;
mod listener_fn;
mod listener_set;

pub use embedded::LogWriter;
pub use listener::{Listen, ListenerRef};
pub use listener_fn::ListenerFn;
pub use listener_set::{FanOut, ListenerSet, Subscription};
