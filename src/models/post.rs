//! Post data structure.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A published post as seen by the content backend's read API.
///
/// Collaborators translate whatever the backend returns into this shape;
/// nothing in this crate touches the raw API response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Backend identifier
    pub id: String,

    /// Canonical slug on the current platform
    pub slug: String,

    /// Display title
    pub title: String,

    /// Publication timestamp
    pub published_at: DateTime<Utc>,

    /// Rendered body
    #[serde(default)]
    pub body_html: String,
}

impl Post {
    /// Calendar date of publication (UTC).
    pub fn published_date(&self) -> NaiveDate {
        self.published_at.date_naive()
    }
}

/// Order post ids numerically when both are integers, lexicographically otherwise.
pub fn compare_post_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}
