//! Dead link check results and batch reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final outcome for one unreachable link in one post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LinkCheckResult {
    pub url: String,

    /// Last HTTP status seen, if the server answered at all
    pub status: Option<u16>,

    /// Transport error of the last attempt
    pub error: Option<String>,

    /// Excerpt of the text around the link
    pub context: String,

    pub post_id: String,
    pub post_title: String,
    pub post_slug: String,

    /// Closest archived capture, if one was found
    pub archive_url: Option<String>,

    #[serde(default)]
    pub suggestions: Vec<String>,

    /// Whether the failure looked transient
    pub retryable: bool,

    /// Attempts made before the outcome became final
    pub attempts: u32,

    pub checked_at: DateTime<Utc>,
}

/// Aggregate of a batch check.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateReport {
    /// Dead plus working links
    pub total_links: usize,
    pub dead_links: Vec<LinkCheckResult>,
    pub working_links: usize,
    pub processing_time_ms: u64,

    pub posts_checked: usize,

    /// Links extracted but never checked because a cap or the deadline hit
    pub skipped_links: usize,

    /// A post or link cap stopped the batch early
    pub truncated: bool,

    /// The overall deadline stopped the batch early
    pub deadline_exceeded: bool,
}

impl AggregateReport {
    /// Whether the report covers less than the requested work.
    pub fn is_partial(&self) -> bool {
        self.truncated || self.deadline_exceeded
    }

    /// Dead links that might recover on a later run.
    pub fn retryable_count(&self) -> usize {
        self.dead_links.iter().filter(|r| r.retryable).count()
    }
}
