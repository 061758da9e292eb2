//! # Injectable timer for backoff sleeps.
//!
//! The dispatcher never calls `tokio::time::sleep` directly; it goes through a
//! [`Timer`] so tests can record the exact delay sequence or skip waiting.

use std::time::Duration;

use async_trait::async_trait;

/// Suspends the current task for a delay.
#[async_trait]
pub trait Timer: Send + Sync + 'static {
    /// Waits for `delay`.
    async fn sleep(&self, delay: Duration);
}

/// Default timer backed by `tokio::time::sleep`.
///
/// Honors tokio's paused clock (`#[tokio::test(start_paused = true)]`).
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioTimer;

#[async_trait]
impl Timer for TokioTimer {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}
