//! A `Sleeper` that returns immediately and remembers what it was asked for.

use std::sync::Mutex;
use std::time::Duration;

use crate::ports::{SleepFuture, Sleeper};

/// Records each requested wait without waiting.
#[derive(Debug, Default)]
pub struct InstantSleeper {
    requested: Mutex<Vec<Duration>>,
}

impl InstantSleeper {
    /// Every duration passed to `sleep` so far, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn recorded(&self) -> Vec<Duration> {
        self.requested.lock().expect("sleeper lock poisoned").clone()
    }
}

impl Sleeper for InstantSleeper {
    fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
        Box::pin(async move {
            self.requested.lock().expect("sleeper lock poisoned").push(duration);
        })
    }
}
