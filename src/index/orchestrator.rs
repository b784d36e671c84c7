//! Parallel fetch of the whole index history

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::{FetchConfig, OUTPUT_BUFFER};
use crate::index::cache::PageCache;
use crate::index::error::FetchError;
use crate::index::retry::Backoff;
use crate::index::source::IndexSource;
use crate::index::types::{ModuleVersion, TimeWindow};
use crate::index::window::WindowFetcher;

/// Splits the index history into windows and fetches them all concurrently
pub struct Orchestrator {
    config: FetchConfig,
    fetcher: WindowFetcher,
}

impl Orchestrator {
    pub fn new(config: FetchConfig, source: Arc<dyn IndexSource>) -> Self {
        let cache = config
            .cache
            .then(|| PageCache::new(config.cache_dir.clone()));
        let backoff = Backoff::new(config.max_attempts, config.verbose);
        let fetcher = WindowFetcher::new(source, cache, backoff, config.verbose);
        Self { config, fetcher }
    }

    /// Windows covering `[origin, now)`
    pub fn windows(&self, now: DateTime<Utc>) -> Vec<TimeWindow> {
        TimeWindow::partition(self.config.origin, now, self.config.window)
    }

    /// Starts the fetch in the background.
    ///
    /// The receiver yields records until every window has finished; the
    /// handle resolves to the outcome of the whole fetch.
    pub fn spawn(
        self: Arc<Self>,
        now: DateTime<Utc>,
        token: CancellationToken,
    ) -> (
        mpsc::Receiver<ModuleVersion>,
        JoinHandle<Result<(), FetchError>>,
    ) {
        let (tx, rx) = mpsc::channel(OUTPUT_BUFFER);
        let handle = tokio::spawn(async move { self.run(now, tx, token).await });
        (rx, handle)
    }

    /// Fetches every window into `tx`, one task per window.
    ///
    /// The first window to fail cancels its siblings through a child of
    /// `token`, and its error is returned once all tasks have stopped. `tx` is
    /// dropped on return, which closes the channel once the window tasks are gone.
    pub async fn run(
        &self,
        now: DateTime<Utc>,
        tx: mpsc::Sender<ModuleVersion>,
        token: CancellationToken,
    ) -> Result<(), FetchError> {
        let group = token.child_token();
        let windows = self.windows(now);
        info!(
            "Fetching {} windows from {} to {}",
            windows.len(),
            self.config.origin,
            now
        );

        let mut tasks = JoinSet::new();
        for window in windows {
            let fetcher = self.fetcher.clone();
            let tx = tx.clone();
            let group = group.clone();
            tasks.spawn(async move {
                let result = fetcher.fetch(window, &tx, &group).await;
                (window, result)
            });
        }
        drop(tx);

        let deadline = self.config.timeout;
        let expired = async {
            match deadline {
                Some(timeout) => sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(expired);

        let mut timed_out = false;
        let mut first_error: Option<FetchError> = None;
        let mut total = 0;
        loop {
            let joined = tokio::select! {
                joined = tasks.join_next() => joined,
                _ = &mut expired, if !timed_out => {
                    error!("Fetch deadline of {:?} exceeded", deadline);
                    timed_out = true;
                    group.cancel();
                    continue;
                }
            };
            let Some(joined) = joined else {
                break;
            };

            let result = match joined {
                Ok((window, result)) => result.inspect_err(|e| {
                    debug!("Window {} .. {} stopped: {}", window.from, window.to, e)
                }),
                Err(e) => Err(FetchError::Task(e.to_string())),
            };
            match result {
                Ok(count) => total += count,
                Err(e) => {
                    if !matches!(e, FetchError::Cancelled) {
                        error!("Window fetch failed: {}", e);
                    }
                    group.cancel();
                    first_error = Some(prefer_cause(first_error, e));
                }
            }
        }

        let expired_after = deadline.filter(|_| timed_out);
        settle(first_error, expired_after).inspect(|_| info!("Fetched {} records", total))
    }
}

/// Keeps the first real failure over cancellations it caused
fn prefer_cause(current: Option<FetchError>, next: FetchError) -> FetchError {
    match current {
        Some(FetchError::Cancelled) | None => next,
        Some(current) => current,
    }
}

/// A window failure outranks an expired deadline, which outranks cancellation
fn settle(
    first_error: Option<FetchError>,
    expired_after: Option<Duration>,
) -> Result<(), FetchError> {
    match (first_error, expired_after) {
        (Some(FetchError::Cancelled), Some(timeout)) | (None, Some(timeout)) => {
            Err(FetchError::TimedOut(timeout))
        }
        (Some(e), _) => Err(e),
        (None, None) => Ok(()),
    }
}
