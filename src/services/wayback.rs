// src/services/wayback.rs

//! Client for a web-archive availability endpoint.
//!
//! Queries `GET {endpoint}?url=<url>` and reads the closest capture from
//! a response shaped like:
//!
//! ```text
//! {"archived_snapshots": {"closest": {"available": true, "url": "...", "status": "200"}}}
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ArchiveConfig, HttpConfig};
use crate::services::SnapshotIndex;
use crate::utils::http::create_client_with_timeout;

#[derive(Debug, Deserialize)]
struct AvailabilityResponse {
    #[serde(default)]
    archived_snapshots: ArchivedSnapshots,
}

#[derive(Debug, Default, Deserialize)]
struct ArchivedSnapshots {
    closest: Option<Snapshot>,
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    available: bool,
    url: String,
    #[serde(default)]
    status: Option<String>,
}

/// [`SnapshotIndex`] backed by an availability JSON endpoint.
#[derive(Debug, Clone)]
pub struct WaybackSnapshotIndex {
    client: Client,
    endpoint: Url,
}

impl WaybackSnapshotIndex {
    pub fn new(http: &HttpConfig, archive: &ArchiveConfig) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(http, archive.timeout())?,
            endpoint: Url::parse(&archive.endpoint)?,
        })
    }

    fn query_url(&self, url: &str) -> Url {
        let mut query = self.endpoint.clone();
        query.query_pairs_mut().append_pair("url", url);
        query
    }
}

#[async_trait]
impl SnapshotIndex for WaybackSnapshotIndex {
    async fn nearest_snapshot(&self, url: &str) -> Result<Option<String>> {
        let response = self.client.get(self.query_url(url)).send().await?;
        if !response.status().is_success() {
            return Err(AppError::archive(format!(
                "availability endpoint answered {}",
                response.status()
            )));
        }

        let body = response.bytes().await?;
        let parsed: AvailabilityResponse = serde_json::from_slice(&body)?;

        Ok(parsed
            .archived_snapshots
            .closest
            .filter(|s| s.available)
            // Captures of error pages are not useful replacements
            .filter(|s| s.status.as_deref().is_none_or(|code| code.starts_with('2')))
            .map(|s| s.url))
    }
}
