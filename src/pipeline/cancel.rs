//! Cooperative cancellation signal shared by every outbound call of a run.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

use crate::ports::Sleeper;

/// The run was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("run cancelled")]
pub struct Cancelled;

/// Triggers cancellation for every [`Cancellation`] cloned from the same pair.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observes a cancellation request.
#[derive(Debug, Clone)]
pub struct Cancellation {
    rx: Option<watch::Receiver<bool>>,
}

impl Cancellation {
    /// Creates a linked handle/signal pair.
    #[must_use]
    pub fn new() -> (CancelHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, Self { rx: Some(rx) })
    }

    /// A signal that never fires.
    #[must_use]
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Completes once cancellation is requested; pends forever otherwise.
    pub async fn cancelled(&self) {
        if let Some(rx) = &self.rx {
            let mut rx = rx.clone();
            if rx.wait_for(|cancelled| *cancelled).await.is_ok() {
                return;
            }
        }
        // No sender left, so the signal can no longer fire.
        std::future::pending::<()>().await;
    }

    /// Drives `fut` unless cancellation arrives first.
    ///
    /// A future that completes after cancellation was requested has its
    /// output discarded.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if cancellation was requested before or while `fut` ran.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Cancelled> {
        if self.is_cancelled() {
            return Err(Cancelled);
        }
        let output = tokio::select! {
            output = fut => output,
            () = self.cancelled() => return Err(Cancelled),
        };
        if self.is_cancelled() {
            return Err(Cancelled);
        }
        Ok(output)
    }

    /// Sleeps through `sleeper`, waking early on cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if cancellation was requested before or during the wait.
    pub async fn sleep(&self, sleeper: &dyn Sleeper, duration: Duration) -> Result<(), Cancelled> {
        self.run(sleeper.sleep(duration)).await
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::never()
    }
}
