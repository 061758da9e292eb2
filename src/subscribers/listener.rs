//! # Event listener trait.
//!
//! Provides [`Listen`], the extension point for reacting to events published on
//! an [`EventBus`](crate::EventBus).
//!
//! Each listener invocation gets:
//! - **Concurrent scheduling** with the other listeners of the same emission
//! - **Failure isolation** (errors and panics are caught, logged and re-published
//!   as the bus' `internal_error` event)
//! - **Read-only payload** (shared reference; listeners cannot mutate it)
//!
//! ## Rules
//! - Invocation order within one emission is not guaranteed.
//! - A failing listener never prevents the others from running.
//! - A listener may subscribe/unsubscribe on the same bus from inside its callback.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use pulsebus::{BoxError, Listen, Payload, UiEvent};
//!
//! struct Confetti;
//!
//! #[async_trait]
//! impl Listen<UiEvent> for Confetti {
//!     async fn on_event(&self, kind: UiEvent, payload: &Payload) -> Result<(), BoxError> {
//!         if kind == UiEvent::FormSubmitted {
//!             let _ = payload.get("formId");
//!             // trigger the animation
//!         }
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str { "confetti" }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::events::{EventKind, Payload};

/// Event listener bound to a bus over kinds `K`.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Report failures through the returned `Result`; panics are caught but
///   logged at a higher severity.
/// - Long-running work delays the resolution of `emit` (unless the bus has a
///   listener timeout configured).
#[async_trait]
pub trait Listen<K: EventKind>: Send + Sync + 'static {
    /// Handles one event.
    async fn on_event(&self, kind: K, payload: &Payload) -> Result<(), BoxError>;

    /// Returns the listener name used in logs and internal error events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose; override it when possible.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared listener handle.
pub type ListenerRef<K> = Arc<dyn Listen<K>>;
