//! Bounded retry with exponential backoff

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::index::error::FetchError;

/// Retry policy: `max_attempts` tries, waiting `1s / max_attempts` after the
/// first failure and doubling the wait after each further one.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    max_attempts: u32,
    initial_delay: Duration,
    verbose: bool,
}

impl Backoff {
    pub fn new(max_attempts: u32, verbose: bool) -> Self {
        let max_attempts = max_attempts.max(1);
        Self {
            max_attempts,
            initial_delay: Duration::from_secs(1) / max_attempts,
            verbose,
        }
    }

    /// Runs `action` until it succeeds, fails with a non-transient error,
    /// or `max_attempts` is exhausted (returning the last error).
    ///
    /// Both the action and the wait between attempts are abandoned with
    /// `FetchError::Cancelled` as soon as `token` fires.
    pub async fn retry<T, F, Fut>(
        &self,
        token: &CancellationToken,
        mut action: F,
    ) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut delay = self.initial_delay;
        let mut attempt = 1;
        loop {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(FetchError::Cancelled),
                result = action() => result,
            };

            let err = match result {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() || attempt >= self.max_attempts => return Err(err),
                Err(err) => err,
            };

            if self.verbose {
                warn!(
                    "Attempt {}/{} failed, retrying in {:?}: {}",
                    attempt, self.max_attempts, delay, err
                );
            } else {
                debug!(
                    "Attempt {}/{} failed, retrying in {:?}: {}",
                    attempt, self.max_attempts, delay, err
                );
            }

            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(FetchError::Cancelled),
                _ = sleep(delay) => {}
            }
            delay = delay.saturating_mul(2);
            attempt += 1;
        }
    }
}
