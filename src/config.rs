use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};

// =============================================================================
// Index-related constants
// =============================================================================

/// Default endpoint of the Go module index
pub const DEFAULT_INDEX_URL: &str = "https://index.golang.org/index";

/// Size of one concurrently fetched time window in days
pub const WINDOW_DAYS: i64 = 30;

/// Maximum attempts for a single page request
pub const API_RETRIES: u32 = 4;

/// Number of records the index returns per page
pub const PAGE_SIZE: usize = 2000;

/// Capacity of the channel between the fetchers and the consumer
pub const OUTPUT_BUFFER: usize = PAGE_SIZE * 16;

/// Timestamp of the first record ever published to the index
pub fn index_origin() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2019, 4, 10)
        .and_then(|d| d.and_hms_nano_opt(19, 8, 52, 997_264))
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Settings consumed by the fetch pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// Index endpoint queried with `?since=`
    pub base_url: String,
    /// Read and write completed windows from `cache_dir`
    pub cache: bool,
    pub cache_dir: PathBuf,
    /// Report recoverable errors (cache misses, retried requests) as warnings
    pub verbose: bool,
    /// Overall deadline for the whole fetch
    pub timeout: Option<Duration>,
    /// Left edge of the first window
    pub origin: DateTime<Utc>,
    pub window: chrono::Duration,
    pub max_attempts: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_INDEX_URL.to_string(),
            cache: true,
            cache_dir: cache_dir(),
            verbose: false,
            timeout: None,
            origin: index_origin(),
            window: chrono::Duration::days(WINDOW_DAYS),
            max_attempts: API_RETRIES,
        }
    }
}

/// Returns the directory holding cached windows.
/// Uses $XDG_CACHE_HOME/modhist if XDG_CACHE_HOME is set,
/// otherwise falls back to the platform cache directory,
/// or ./.cache/modhist if neither is available.
pub fn cache_dir() -> PathBuf {
    cache_dir_with_env(std::env::var("XDG_CACHE_HOME").ok(), dirs::cache_dir())
}

fn cache_dir_with_env(xdg_cache_home: Option<String>, platform_dir: Option<PathBuf>) -> PathBuf {
    let cache_dir = xdg_cache_home
        .map(PathBuf::from)
        .or(platform_dir)
        .unwrap_or_else(|| PathBuf::from("./.cache"));

    cache_dir.join("modhist")
}
