//! Page source trait for reading the module index

#[cfg(test)]
use mockall::automock;

use chrono::{DateTime, Utc};

use crate::index::error::FetchError;
use crate::index::types::ModuleVersion;

/// Trait for reading one page of the module index
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait IndexSource: Send + Sync {
    /// Fetches the page of records published at or after `since`
    ///
    /// # Returns
    /// * `Ok(records)` - Records in non-decreasing timestamp order; empty when
    ///   the index holds nothing after `since`
    /// * `Err(FetchError)` - Network, status, or decode failure
    async fn fetch_page(&self, since: DateTime<Utc>) -> Result<Vec<ModuleVersion>, FetchError>;
}
