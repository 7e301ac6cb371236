//! Legacy permalink keys and resolution results.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Post;

static LEGACY_PATH: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^/?(\d{4})/(\d{1,2})/(\d{1,2})/([^/]+)/?$").ok()
});

/// A date-structured permalink from the previous platform (`/YYYY/MM/DD/slug/`).
///
/// Construction validates the calendar date, so a key that exists is always
/// resolvable without further checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyUrlKey {
    date: NaiveDate,
    slug: String,
}

impl LegacyUrlKey {
    /// Build a key from its parts.
    pub fn new(year: i32, month: u32, day: u32, slug: &str) -> Result<Self> {
        if !(1..=9999).contains(&year) {
            return Err(AppError::validation(format!("year {year} is out of range")));
        }
        if !(1..=12).contains(&month) {
            return Err(AppError::validation(format!("month {month} is out of range")));
        }
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            AppError::validation(format!("{year:04}-{month:02}-{day:02} is not a calendar date"))
        })?;

        let slug = slug.trim().trim_matches('/').to_lowercase();
        if slug.is_empty() {
            return Err(AppError::validation("legacy slug is empty"));
        }
        if slug.contains('/') {
            return Err(AppError::validation(format!(
                "legacy slug '{slug}' contains a path separator"
            )));
        }

        Ok(Self { date, slug })
    }

    /// Parse an inbound request path such as `/2015/05/08/my-post/`.
    ///
    /// Query strings and fragments are ignored.
    pub fn parse_path(path: &str) -> Result<Self> {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        let re = LEGACY_PATH
            .as_ref()
            .ok_or_else(|| AppError::config("legacy path pattern failed to compile"))?;
        let caps = re.captures(path).ok_or_else(|| {
            AppError::validation(format!("'{path}' is not a /YYYY/MM/DD/slug/ permalink"))
        })?;

        let number = |i: usize| -> Result<u32> {
            caps[i]
                .parse()
                .map_err(|_| AppError::validation(format!("invalid number in '{path}'")))
        };
        let year = number(1)? as i32;
        Self::new(year, number(2)?, number(3)?, &caps[4])
    }

    /// Date encoded in the permalink.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Normalized (lowercase) legacy slug.
    pub fn slug(&self) -> &str {
        &self.slug
    }
}

/// Strategy that produced a legacy URL match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStrategy {
    /// Curated slug override
    ExactMapping,
    /// Legacy slug is already the canonical slug
    ExactSlug,
    /// Token similarity among posts published near the legacy date
    DateProximity,
    /// Last-resort search on the slug words
    FullTextSearch,
}

impl MatchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::ExactMapping => "EXACT_MAPPING",
            MatchStrategy::ExactSlug => "EXACT_SLUG",
            MatchStrategy::DateProximity => "DATE_PROXIMITY",
            MatchStrategy::FullTextSearch => "FULL_TEXT_SEARCH",
        }
    }
}

/// A resolved post with the confidence of the strategy that found it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub post: Post,
    /// 0-100, only `ExactMapping` reaches 100
    pub confidence: u8,
    pub strategy: MatchStrategy,
}

impl MatchResult {
    /// Whether the match is strong enough for an automatic redirect.
    pub fn is_confident(&self, threshold: u8) -> bool {
        self.confidence >= threshold
    }
}

/// Redirect answer handed to the route layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyRedirect {
    pub current_slug: String,
    pub confidence: u8,
    pub strategy: MatchStrategy,
    /// True when the match met the acceptance threshold; otherwise the
    /// caller should offer a search page instead of redirecting.
    pub permanent: bool,
}

impl LegacyRedirect {
    pub fn from_match(result: &MatchResult, threshold: u8) -> Self {
        Self {
            current_slug: result.post.slug.clone(),
            confidence: result.confidence,
            strategy: result.strategy,
            permanent: result.is_confident(threshold),
        }
    }
}
