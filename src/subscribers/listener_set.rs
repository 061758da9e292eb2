//! # Listener registry and isolated fan-out.
//!
//! [`ListenerSet`] maps each event kind to the listeners registered for it and
//! runs one emission across all of them.
//!
//! ## Architecture
//! ```text
//! fan_out(kind, payload)
//!     │  snapshot = listeners[kind].clone()      (taken once, up front)
//!     │
//!     ├──► still registered? ─► catch_unwind(l1.on_event()) ─► Ok / Failed / Panicked
//!     ├──► still registered? ─► catch_unwind(l2.on_event()) ─► Ok / Failed / Panicked
//!     └──► still registered? ─► catch_unwind(lN.on_event()) ─► Ok / Failed / Panicked
//!                         join_all (wait for every listener, never fail fast)
//! ```
//!
//! ## Rules
//! - **Snapshot iteration**: listeners added during an emission do not see it.
//! - **Unsubscribe wins**: a listener removed before its invocation starts is skipped.
//! - **Isolation**: errors, panics and timeouts are collected, never propagated.
//! - **Cleanup**: removing the last listener of a kind removes the kind's entry.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a listener uses `Arc<Mutex<T>>` and panics while holding the lock.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::Duration;

use futures::FutureExt;
use futures::future::join_all;
use tokio::time;

use crate::error::ListenerError;
use crate::events::{EventKind, Payload};
use crate::subscribers::listener::ListenerRef;

type Slots<K> = HashMap<K, Vec<(u64, ListenerRef<K>)>>;

struct Inner<K> {
    slots: RwLock<Slots<K>>,
    next_id: AtomicU64,
}

impl<K: EventKind> Inner<K> {
    fn remove(&self, kind: K, id: u64) -> bool {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let Some(list) = slots.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(lid, _)| *lid != id);
        let removed = list.len() != before;
        if list.is_empty() {
            slots.remove(&kind);
        }
        removed
    }

    fn is_live(&self, kind: K, id: u64) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .is_some_and(|list| list.iter().any(|(lid, _)| *lid == id))
    }
}

/// Capability returned by `subscribe`.
///
/// Consuming it removes exactly the listener it was issued for, so it can
/// neither run twice nor remove somebody else's listener. Dropping it without
/// calling [`unsubscribe`](Self::unsubscribe) leaves the listener registered.
pub struct Subscription {
    remove: Box<dyn FnOnce() -> bool + Send + Sync>,
}

impl Subscription {
    /// Removes the listener. Returns false if the bus is gone or the listener was
    /// already removed by other means.
    pub fn unsubscribe(self) -> bool {
        (self.remove)()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Result of one fan-out.
#[derive(Debug, Default)]
pub struct FanOut {
    /// Listeners that completed successfully.
    pub delivered: usize,
    /// Listeners unsubscribed between snapshot and invocation.
    pub skipped: usize,
    /// Listeners that failed, panicked or timed out.
    pub failures: Vec<ListenerError>,
}

enum Invocation {
    Delivered,
    Skipped,
    Failed(ListenerError),
}

/// Kind-indexed listener registry.
pub struct ListenerSet<K> {
    inner: Arc<Inner<K>>,
}

impl<K: EventKind> Default for ListenerSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: EventKind> ListenerSet<K> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Registers `listener` under `kind` and returns its removal capability.
    pub fn insert(&self, kind: K, listener: ListenerRef<K>) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, AtomicOrdering::Relaxed);
        self.inner
            .slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push((id, listener));

        let weak: Weak<Inner<K>> = Arc::downgrade(&self.inner);
        Subscription {
            remove: Box::new(move || weak.upgrade().is_some_and(|inner| inner.remove(kind, id))),
        }
    }

    /// Number of listeners currently registered for `kind`.
    pub fn count(&self, kind: K) -> usize {
        self.inner
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Number of kinds with at least one listener.
    pub fn kinds(&self) -> usize {
        self.inner
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn snapshot(&self, kind: K) -> Vec<(u64, ListenerRef<K>)> {
        self.inner
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    /// Runs every listener of `kind` concurrently and waits for all of them.
    ///
    /// `timeout` bounds each invocation individually; `None` waits indefinitely.
    pub async fn fan_out(&self, kind: K, payload: &Payload, timeout: Option<Duration>) -> FanOut {
        let snapshot = self.snapshot(kind);
        if snapshot.is_empty() {
            return FanOut::default();
        }

        let calls = snapshot.into_iter().map(|(id, listener)| {
            let inner = Arc::clone(&self.inner);
            async move {
                if !inner.is_live(kind, id) {
                    return Invocation::Skipped;
                }
                let call = AssertUnwindSafe(listener.on_event(kind, payload)).catch_unwind();
                let res = match timeout {
                    Some(limit) => match time::timeout(limit, call).await {
                        Ok(res) => res,
                        Err(_elapsed) => {
                            return Invocation::Failed(ListenerError::TimedOut {
                                listener: listener.name().to_string(),
                                timeout: limit,
                            });
                        }
                    },
                    None => call.await,
                };
                match res {
                    Ok(Ok(())) => Invocation::Delivered,
                    Ok(Err(err)) => Invocation::Failed(ListenerError::Failed {
                        listener: listener.name().to_string(),
                        message: err.to_string(),
                    }),
                    Err(panic_err) => {
                        let message = if let Some(msg) = panic_err.downcast_ref::<&'static str>() {
                            (*msg).to_string()
                        } else if let Some(msg) = panic_err.downcast_ref::<String>() {
                            msg.clone()
                        } else {
                            "unknown panic".to_string()
                        };
                        Invocation::Failed(ListenerError::Panicked {
                            listener: listener.name().to_string(),
                            message,
                        })
                    }
                }
            }
        });

        let mut out = FanOut::default();
        for invocation in join_all(calls).await {
            match invocation {
                Invocation::Delivered => out.delivered += 1,
                Invocation::Skipped => out.skipped += 1,
                Invocation::Failed(err) => out.failures.push(err),
            }
        }
        out
    }
}
