//! # Closure-backed listener (`ListenerFn`)
//!
//! [`ListenerFn`] wraps a closure `F: Fn(K, Payload) -> Fut`, producing a fresh
//! future per event. The payload is handed over as an owned clone so the
//! returned future can be `'static`.
//!
//! ## Example
//! ```rust
//! use pulsebus::{BoxError, ListenerFn, ListenerRef, Payload, UiEvent};
//!
//! let l: ListenerRef<UiEvent> = ListenerFn::arc("printer", |kind: UiEvent, payload: Payload| async move {
//!     let _ = (kind, payload.source().to_string());
//!     Ok::<_, BoxError>(())
//! });
//!
//! assert_eq!(l.name(), "printer");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::events::{EventKind, Payload};
use crate::subscribers::listener::Listen;

/// Function-backed listener implementation.
pub struct ListenerFn<K, F> {
    name: Cow<'static, str>,
    f: F,
    _kind: PhantomData<fn(K)>,
}

impl<K, F> ListenerFn<K, F> {
    /// Creates a new function-backed listener.
    ///
    /// Prefer [`ListenerFn::arc`] when you immediately need a [`ListenerRef`](crate::ListenerRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            _kind: PhantomData,
        }
    }

    /// Creates the listener and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<K, F, Fut> Listen<K> for ListenerFn<K, F>
where
    K: EventKind,
    F: Fn(K, Payload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    async fn on_event(&self, kind: K, payload: &Payload) -> Result<(), BoxError> {
        (self.f)(kind, payload.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
