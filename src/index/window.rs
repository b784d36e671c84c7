//! Fetching of a single time window

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::index::cache::PageCache;
use crate::index::error::{CacheError, FetchError};
use crate::index::retry::Backoff;
use crate::index::source::IndexSource;
use crate::index::types::{ModuleVersion, TimeWindow};

/// Drains one time window from the cache or the index into the output channel
#[derive(Clone)]
pub struct WindowFetcher {
    source: Arc<dyn IndexSource>,
    cache: Option<PageCache>,
    backoff: Backoff,
    verbose: bool,
}

impl WindowFetcher {
    /// `cache` is `None` when caching is disabled
    pub fn new(
        source: Arc<dyn IndexSource>,
        cache: Option<PageCache>,
        backoff: Backoff,
        verbose: bool,
    ) -> Self {
        Self {
            source,
            cache,
            backoff,
            verbose,
        }
    }

    /// Sends every record of `window` to `tx` in timestamp order.
    ///
    /// Closed windows are replayed from the cache when possible; otherwise the
    /// index is paged from `window.from` until it runs dry or passes
    /// `window.to`, and the result is cached. Returns the number of records sent.
    pub async fn fetch(
        &self,
        window: TimeWindow,
        tx: &mpsc::Sender<ModuleVersion>,
        token: &CancellationToken,
    ) -> Result<usize, FetchError> {
        let cache = self.cache.as_ref().filter(|_| window.cacheable);

        if let Some(cache) = cache
            && let Some(records) = self.load_cached(cache, window, token).await?
        {
            let count = records.len();
            for record in records {
                emit(tx, token, record).await?;
            }
            debug!("Replayed {} cached records for {:?}", count, window);
            return Ok(count);
        }

        let mut buffer = Vec::new();
        let mut count = 0;
        let mut cursor = window.from;
        'pages: loop {
            let page = self
                .backoff
                .retry(token, || self.source.fetch_page(cursor))
                .await?;

            let Some(next) = next_cursor(cursor, &page) else {
                break;
            };
            for record in page {
                if record.timestamp > window.to {
                    break 'pages;
                }
                if cache.is_some() {
                    buffer.push(record.clone());
                }
                emit(tx, token, record).await?;
                count += 1;
            }
            cursor = next;
        }
        info!(
            "Fetched {} records for {} .. {}",
            count, window.from, window.to
        );

        if let Some(cache) = cache {
            let cache = cache.clone();
            let stored = run_blocking(token, move || cache.store(&window, &buffer)).await?;
            match stored {
                Err(e) if self.verbose => warn!("Failed to cache window {:?}: {}", window, e),
                Err(e) => debug!("Failed to cache window {:?}: {}", window, e),
                Ok(()) => {}
            }
        }

        Ok(count)
    }

    async fn load_cached(
        &self,
        cache: &PageCache,
        window: TimeWindow,
        token: &CancellationToken,
    ) -> Result<Option<Vec<ModuleVersion>>, FetchError> {
        let cache = cache.clone();
        match run_blocking(token, move || cache.load(&window)).await? {
            Ok(records) => Ok(records),
            Err(e) => {
                if self.verbose {
                    warn!("Ignoring cache entry for {:?}: {}", window, e);
                } else {
                    debug!("Ignoring cache entry for {:?}: {}", window, e);
                }
                Ok(None)
            }
        }
    }
}

/// Position after the last record of `page`, always strictly past `cursor`.
/// `None` for an empty page.
fn next_cursor(cursor: DateTime<Utc>, page: &[ModuleVersion]) -> Option<DateTime<Utc>> {
    let last = page.last()?;
    let step = Duration::nanoseconds(1);
    Some((last.timestamp + step).max(cursor + step))
}

async fn emit(
    tx: &mpsc::Sender<ModuleVersion>,
    token: &CancellationToken,
    record: ModuleVersion,
) -> Result<(), FetchError> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(FetchError::Cancelled),
        sent = tx.send(record) => sent.map_err(|_| FetchError::OutputClosed),
    }
}

/// Runs blocking cache I/O off the async workers, giving up on cancellation
async fn run_blocking<T, F>(
    token: &CancellationToken,
    f: F,
) -> Result<Result<T, CacheError>, FetchError>
where
    F: FnOnce() -> Result<T, CacheError> + Send + 'static,
    T: Send + 'static,
{
    let task = tokio::task::spawn_blocking(f);
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(FetchError::Cancelled),
        joined = task => Ok(joined.map_err(|e| CacheError::Task(e.to_string())).and_then(|r| r)),
    }
}
