//! Go module index API implementation

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;
use tracing::{debug, warn};

use crate::index::error::FetchError;
use crate::index::repair::repair_concatenated_json;
use crate::index::source::IndexSource;
use crate::index::types::ModuleVersion;

/// Page source backed by the index HTTP API
pub struct IndexClient {
    client: reqwest::Client,
    base_url: Url,
}

impl IndexClient {
    /// Creates a new IndexClient with a custom base URL
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let base_url =
            Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(format!("{base_url}: {e}")))?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("modhist/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, base_url })
    }
}

/// Formats a timestamp the way the index expects for `since`
pub fn format_since(since: DateTime<Utc>) -> String {
    since.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[async_trait::async_trait]
impl IndexSource for IndexClient {
    async fn fetch_page(&self, since: DateTime<Utc>) -> Result<Vec<ModuleVersion>, FetchError> {
        let since = format_since(since);
        debug!("Requesting index page since {}", since);

        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair("since", &since);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Index returned status {} for since={}", status, since);
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let records: Vec<ModuleVersion> = serde_json::from_str(&repair_concatenated_json(&body))?;
        debug!("Received {} records since {}", records.len(), since);

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use mockito::{Matcher, Server};

    fn since() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 4, 10, 19, 8, 52).unwrap() + Duration::nanoseconds(997_264)
    }

    #[test]
    fn format_since_keeps_nanoseconds_and_utc_suffix() {
        assert_eq!(format_since(since()), "2019-04-10T19:08:52.000997264Z");
        assert_eq!(
            format_since(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            "2020-01-01T00:00:00Z"
        );
    }

    #[tokio::test]
    async fn fetch_page_decodes_concatenated_objects() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/index")
            .match_query(Matcher::UrlEncoded(
                "since".into(),
                "2019-04-10T19:08:52.000997264Z".into(),
            ))
            .with_status(200)
            .with_header("content-type", "text/plain")
            .with_body(concat!(
                r#"{"Path":"golang.org/x/text","Version":"v0.3.0","Timestamp":"2019-04-10T19:08:52.997264Z"}"#,
                "\n",
                r#"{"Path":"golang.org/x/net","Version":"v0.1.0","Timestamp":"2019-04-10T19:09:00Z"}"#,
                "\n",
            ))
            .create_async()
            .await;

        let client = IndexClient::new(&format!("{}/index", server.url())).unwrap();
        let records = client.fetch_page(since()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].path, "golang.org/x/text");
        assert_eq!(records[0].version, "v0.3.0");
        assert_eq!(records[1].path, "golang.org/x/net");
        assert!(records[0].timestamp <= records[1].timestamp);
    }

    #[tokio::test]
    async fn fetch_page_returns_empty_for_empty_body() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/index")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        let client = IndexClient::new(&format!("{}/index", server.url())).unwrap();
        let records = client.fetch_page(since()).await.unwrap();

        mock.assert_async().await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn fetch_page_reports_unexpected_status() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/index")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let client = IndexClient::new(&format!("{}/index", server.url())).unwrap();
        let result = client.fetch_page(since()).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::Status(503))));
    }

    #[tokio::test]
    async fn fetch_page_reports_undecodable_body() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/index")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"Path":"golang.org/x/text","Version":"#)
            .create_async()
            .await;

        let client = IndexClient::new(&format!("{}/index", server.url())).unwrap();
        let result = client.fetch_page(since()).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[test]
    fn new_rejects_malformed_base_url() {
        assert!(matches!(
            IndexClient::new("not a url"),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn fetch_page_reports_unreachable_server_as_network_error() {
        let client = IndexClient::new("http://127.0.0.1:9/index").unwrap();

        let result = client.fetch_page(since()).await;

        assert!(matches!(result, Err(FetchError::Network(_))));
    }
}
