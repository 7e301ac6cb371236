// src/services/archive.rs

//! Archive snapshot enrichment for dead links.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Suggestion attached when an archived capture exists.
pub const ARCHIVE_SUGGESTION: &str = "Archive snapshot found — consider this replacement";

/// Lookup of archived captures of a URL.
#[async_trait]
pub trait SnapshotIndex: Send + Sync {
    /// Address of the nearest available capture, if any.
    async fn nearest_snapshot(&self, url: &str) -> Result<Option<String>>;
}

/// Replacement hints for a dead link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub archive_url: Option<String>,
    pub suggestions: Vec<String>,
}

/// Adds archive snapshots and replacement hints to dead links.
///
/// Never fails: lookup errors and timeouts produce an empty archive field.
#[derive(Clone)]
pub struct ArchiveEnricher {
    index: Option<Arc<dyn SnapshotIndex>>,
    timeout: Duration,
}

impl ArchiveEnricher {
    pub fn new(index: Arc<dyn SnapshotIndex>, timeout: Duration) -> Self {
        Self {
            index: Some(index),
            timeout,
        }
    }

    /// Enricher that only adds local hints.
    pub fn disabled() -> Self {
        Self {
            index: None,
            timeout: Duration::ZERO,
        }
    }

    pub async fn enrich(&self, url: &str) -> Enrichment {
        let mut enrichment = Enrichment::default();

        if let Some(index) = &self.index {
            match tokio::time::timeout(self.timeout, index.nearest_snapshot(url)).await {
                Ok(Ok(Some(snapshot))) => {
                    enrichment.archive_url = Some(snapshot);
                    enrichment.suggestions.push(ARCHIVE_SUGGESTION.to_string());
                }
                Ok(Ok(None)) => log::debug!("No archive snapshot for {}", url),
                Ok(Err(e)) => log::warn!("Archive lookup failed for {}: {}", url, e),
                Err(_) => log::warn!(
                    "Archive lookup for {} timed out after {:?}",
                    url,
                    self.timeout
                ),
            }
        }

        if let Some(rest) = url.strip_prefix("http://") {
            enrichment
                .suggestions
                .push(format!("Try the HTTPS version: https://{rest}"));
        }

        enrichment
    }
}
