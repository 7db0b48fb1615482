//! Bounded retry loop with fixed backoff through an injected [`Sleeper`].

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::cancel::{Cancellation, Cancelled};
use crate::ports::Sleeper;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(1000);

/// How many times a call is attempted and how long to wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Treated as at least one.
    pub max_attempts: u32,
    /// Fixed pause between consecutive attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: DEFAULT_MAX_ATTEMPTS, backoff: DEFAULT_BACKOFF }
    }
}

/// Why a retried call gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// The error is not retryable; returned after the attempt that produced it.
    Fatal(E),
    /// Every attempt failed; carries the last error.
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// Error from the final attempt.
        last: E,
    },
    /// Cancellation was requested before or between attempts.
    Cancelled,
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are used up.
///
/// Sleeps `policy.backoff` between attempts, never after the last one.
/// Each attempt races the cancellation signal; an attempt that finishes
/// after cancellation is discarded. `what` names the call in log output.
///
/// # Errors
///
/// Returns [`RetryError`] describing why no attempt succeeded.
pub async fn retry<T, E, F, Fut, R>(
    policy: RetryPolicy,
    sleeper: &dyn Sleeper,
    cancel: &Cancellation,
    what: &str,
    is_retryable: R,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let err = match cancel.run(op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => err,
            Err(Cancelled) => return Err(RetryError::Cancelled),
        };
        if !is_retryable(&err) {
            return Err(RetryError::Fatal(err));
        }
        if attempt >= max_attempts {
            return Err(RetryError::Exhausted { attempts: attempt, last: err });
        }
        warn!(what, attempt, max_attempts, error = %err, "call failed, retrying");
        if cancel.sleep(sleeper, policy.backoff).await.is_err() {
            return Err(RetryError::Cancelled);
        }
        attempt += 1;
    }
}
