//! Bounded retry for the one-time session setup

use std::future::Future;
use std::time::Duration;

use crate::error::{OverlayError, Result};

/// Fixed-delay, bounded retry policy.
///
/// `max_retries` counts retries after the first attempt, so a step runs at
/// most `max_retries + 1` times. Every attempt re-runs the whole step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(1000))
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Run `step` until it succeeds or the budget is spent.
    ///
    /// Exhaustion returns [`OverlayError::SetupExhausted`] carrying the last
    /// error.
    pub async fn attempt<T, F, Fut>(&self, mut step: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 1;

        loop {
            match step().await {
                Ok(value) => {
                    if attempt > 1 {
                        log::info!("Setup succeeded on attempt {}/{}", attempt, max_attempts);
                    }
                    return Ok(value);
                }
                Err(e) if attempt >= max_attempts => {
                    log::error!("Setup failed after {} attempts: {}", attempt, e);
                    return Err(OverlayError::SetupExhausted {
                        attempts: attempt,
                        last_error: e.to_string(),
                    });
                }
                Err(e) => {
                    log::warn!(
                        "Setup attempt {}/{} failed: {}; retrying in {:?}",
                        attempt,
                        max_attempts,
                        e,
                        self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
