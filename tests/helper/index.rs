//! In-memory module index for pipeline tests

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use modhist::config::FetchConfig;
use modhist::index::error::FetchError;
use modhist::index::source::IndexSource;
use modhist::index::types::ModuleVersion;

/// Fake index serving `records` in pages, recording every requested `since`
pub struct FakeIndex {
    records: Vec<ModuleVersion>,
    page_size: usize,
    offline: AtomicBool,
    failing_from: Option<DateTime<Utc>>,
    latency: Option<StdDuration>,
    requests: Mutex<Vec<DateTime<Utc>>>,
}

impl FakeIndex {
    pub fn new(mut records: Vec<ModuleVersion>) -> Self {
        records.sort_by_key(|r| r.timestamp);
        Self {
            records,
            page_size: 3,
            offline: AtomicBool::new(false),
            failing_from: None,
            latency: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request at or after `since` fails with a 500
    pub fn failing_from(mut self, since: DateTime<Utc>) -> Self {
        self.failing_from = Some(since);
        self
    }

    /// Each request sleeps this long before answering
    pub fn with_latency(mut self, latency: StdDuration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<DateTime<Utc>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }
}

#[async_trait]
impl IndexSource for FakeIndex {
    async fn fetch_page(&self, since: DateTime<Utc>) -> Result<Vec<ModuleVersion>, FetchError> {
        self.requests.lock().unwrap().push(since);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Status(503));
        }
        if self.failing_from.is_some_and(|from| since >= from) {
            return Err(FetchError::Status(500));
        }

        Ok(self
            .records
            .iter()
            .filter(|r| r.timestamp >= since)
            .take(self.page_size)
            .cloned()
            .collect())
    }
}

pub fn origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 4, 10, 19, 8, 52).unwrap()
}

/// One record every `step_hours`, starting half an hour after origin, for `days`
pub fn hourly_records(days: i64, step_hours: i64) -> Vec<ModuleVersion> {
    let mut records = Vec::new();
    let mut at = origin() + Duration::minutes(30);
    let end = origin() + Duration::days(days);
    let mut i = 0;
    while at < end {
        records.push(ModuleVersion::new(
            format!("example.com/mod{}", i % 7),
            format!("v1.{}.0", i),
            at,
        ));
        at += Duration::hours(step_hours);
        i += 1;
    }
    records
}

pub fn test_config(cache_dir: &std::path::Path, cache: bool) -> FetchConfig {
    FetchConfig {
        base_url: "http://127.0.0.1:9/index".to_string(),
        cache,
        cache_dir: cache_dir.to_path_buf(),
        verbose: true,
        timeout: None,
        origin: origin(),
        window: Duration::days(30),
        max_attempts: 2,
    }
}
