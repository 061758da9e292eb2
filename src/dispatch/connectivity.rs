//! # Online/offline signal.
//!
//! [`Connectivity`] is the producer side of the platform's network status
//! notifications (browser `online`/`offline` events or an OS-level monitor).
//! Consumers get a `watch` receiver and observe only the latest state.
//!
//! ```text
//! platform hook ─► Connectivity::set_online(bool) ─► watch channel
//!                                                       └─► Dispatcher::watch_connectivity()
//! ```

use std::sync::Arc;

use tokio::sync::watch;

/// Shared online/offline state.
///
/// Cheap to clone; all clones drive the same channel.
#[derive(Clone, Debug)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl Connectivity {
    /// Creates the signal with an initial state.
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx: Arc::new(tx) }
    }

    /// Publishes a new state. Returns true if it differs from the previous one.
    ///
    /// Repeated notifications with the same value do not wake receivers.
    pub fn set_online(&self, online: bool) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        })
    }

    /// Last published state.
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Creates a receiver observing subsequent changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Connectivity {
    /// Starts online.
    fn default() -> Self {
        Self::new(true)
    }
}
