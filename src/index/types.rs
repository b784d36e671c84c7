//! Common types for the index fetch pipeline

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One published module version as reported by the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModuleVersion {
    /// Module path (e.g., "golang.org/x/text")
    pub path: String,
    /// Version exactly as published, not normalized
    pub version: String,
    /// Time the index first saw this version
    pub timestamp: DateTime<Utc>,
}

impl ModuleVersion {
    pub fn new(path: impl Into<String>, version: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
            timestamp,
        }
    }
}

/// A contiguous slice of index history fetched by one task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    /// False for the trailing window that ends at "now"; its contents are still growing
    pub cacheable: bool,
}

impl TimeWindow {
    /// Splits `[origin, now)` into contiguous windows of `size`.
    ///
    /// The last window is clipped to `now` and is never cacheable.
    /// Returns no windows when `origin` is not before `now` or `size` is not positive.
    pub fn partition(origin: DateTime<Utc>, now: DateTime<Utc>, size: Duration) -> Vec<TimeWindow> {
        let mut windows = Vec::new();
        if size <= Duration::zero() {
            return windows;
        }

        let mut from = origin;
        while from < now {
            let to = from + size;
            if to >= now {
                windows.push(TimeWindow {
                    from,
                    to: now,
                    cacheable: false,
                });
                break;
            }
            windows.push(TimeWindow {
                from,
                to,
                cacheable: true,
            });
            from = to;
        }
        windows
    }

    /// Stable file-system friendly key derived from both bounds
    pub fn cache_key(&self) -> String {
        const FORMAT: &str = "%Y%m%dT%H%M%S%.9fZ";
        format!(
            "page_{}_{}.json",
            self.from.format(FORMAT),
            self.to.format(FORMAT)
        )
    }
}
