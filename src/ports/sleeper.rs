//! Sleeper port for politeness delays and retry backoff.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Boxed future returned by [`Sleeper::sleep`].
pub type SleepFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Waits for a duration.
///
/// Abstracting waits lets tests and cassette playback run retry and
/// crawl-delay logic without real wall-clock time.
pub trait Sleeper: Send + Sync {
    /// Completes after `duration` has elapsed.
    fn sleep(&self, duration: Duration) -> SleepFuture<'_>;
}
