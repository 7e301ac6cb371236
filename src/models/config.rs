//! Application configuration structures.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client settings shared by the prober and the archive client
    #[serde(default)]
    pub http: HttpConfig,

    /// Legacy URL resolution tuning
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Dead link checking behavior
    #[serde(default)]
    pub checker: CheckerConfig,

    /// Archive snapshot lookup
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Caller-facing batch rate limit
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Curated legacy slug to current slug overrides
    #[serde(default)]
    pub mappings: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.resolver.acceptance_threshold > 100 {
            return Err(AppError::validation(
                "resolver.acceptance_threshold must be <= 100",
            ));
        }
        if self.resolver.search_confidence >= 100 {
            return Err(AppError::validation(
                "resolver.search_confidence must be < 100",
            ));
        }
        if self.checker.max_concurrent == 0 {
            return Err(AppError::validation("checker.max_concurrent must be > 0"));
        }
        if self.archive.enabled && self.archive.timeout_secs == 0 {
            return Err(AppError::validation("archive.timeout_secs must be > 0"));
        }
        if self.archive.enabled {
            url::Url::parse(&self.archive.endpoint).map_err(|e| {
                AppError::validation(format!(
                    "archive.endpoint '{}' is not a valid URL: {}",
                    self.archive.endpoint, e
                ))
            })?;
        }
        if let Some(base) = &self.checker.site_base_url {
            url::Url::parse(base).map_err(|e| {
                AppError::validation(format!(
                    "checker.site_base_url '{}' is not a valid URL: {}",
                    base, e
                ))
            })?;
        }
        if self.rate_limit.batch_checks_per_hour == 0 {
            return Err(AppError::validation(
                "rate_limit.batch_checks_per_hour must be > 0",
            ));
        }
        for (legacy, current) in &self.mappings {
            if legacy.trim().is_empty() || current.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "mapping '{}' -> '{}' has an empty side",
                    legacy, current
                )));
            }
        }
        Ok(())
    }

    /// Override selected values from environment variables.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        fn parse<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Option<T> {
            let raw = raw?;
            match raw.trim().parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    log::warn!("Ignoring {}={:?}: not a valid number", key, raw);
                    None
                }
            }
        }

        if let Some(v) = parse("CHECK_TIMEOUT_SECS", get("CHECK_TIMEOUT_SECS")) {
            self.http.timeout_secs = v;
        }
        if let Some(v) = parse("MAX_CONCURRENT", get("MAX_CONCURRENT")) {
            self.checker.max_concurrent = v;
        }
        if let Some(v) = parse("MAX_RETRIES", get("MAX_RETRIES")) {
            self.checker.max_retries = v;
        }
        if let Some(v) = parse("BACKOFF_BASE_MS", get("BACKOFF_BASE_MS")) {
            self.checker.backoff_base_ms = v;
        }
        if let Some(v) = parse("ACCEPTANCE_THRESHOLD", get("ACCEPTANCE_THRESHOLD")) {
            self.resolver.acceptance_threshold = v;
        }
        if let Some(v) = parse("DATE_WINDOW_DAYS", get("DATE_WINDOW_DAYS")) {
            self.resolver.date_window_days = v;
        }
        if let Some(v) = parse("BATCH_CHECKS_PER_HOUR", get("BATCH_CHECKS_PER_HOUR")) {
            self.rate_limit.batch_checks_per_hour = v;
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-attempt request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Redirects followed before a link counts as broken
    #[serde(default = "defaults::max_redirects")]
    pub max_redirects: usize,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_redirects: defaults::max_redirects(),
        }
    }
}

/// Legacy URL resolver tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Minimum confidence (0-100) for a strategy result to stop the cascade
    #[serde(default = "defaults::acceptance_threshold")]
    pub acceptance_threshold: u8,

    /// Days on either side of the legacy date searched by date proximity
    #[serde(default = "defaults::date_window_days")]
    pub date_window_days: u32,

    /// Fixed confidence reported for a full-text search hit
    #[serde(default = "defaults::search_confidence")]
    pub search_confidence: u8,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: defaults::acceptance_threshold(),
            date_window_days: defaults::date_window_days(),
            search_confidence: defaults::search_confidence(),
        }
    }
}

/// Dead link checker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// Maximum concurrent link checks across a whole batch
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Additional attempts for retryable failures
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Backoff before the first retry, doubled for each further retry
    #[serde(default = "defaults::backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Characters of surrounding text kept as triage context
    #[serde(default = "defaults::context_chars")]
    pub context_chars: usize,

    /// Base URL used to resolve relative links in post bodies
    #[serde(default)]
    pub site_base_url: Option<String>,

    /// Hosts that are never checked (bot walls, internal links)
    #[serde(default)]
    pub ignored_hosts: Vec<String>,
}

impl CheckerConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: defaults::max_concurrent(),
            max_retries: defaults::max_retries(),
            backoff_base_ms: defaults::backoff_base_ms(),
            context_chars: defaults::context_chars(),
            site_base_url: None,
            ignored_hosts: Vec::new(),
        }
    }
}

/// Archive snapshot lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Whether dead links are enriched with archive snapshots
    #[serde(default = "defaults::archive_enabled")]
    pub enabled: bool,

    /// Availability endpoint queried with `?url=<dead link>`
    #[serde(default = "defaults::archive_endpoint")]
    pub endpoint: String,

    /// Timeout for a single snapshot lookup in seconds
    #[serde(default = "defaults::archive_timeout")]
    pub timeout_secs: u64,
}

impl ArchiveConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::archive_enabled(),
            endpoint: defaults::archive_endpoint(),
            timeout_secs: defaults::archive_timeout(),
        }
    }
}

/// Caller-facing rate limit for batch checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Batch-check invocations allowed per caller per hour
    #[serde(default = "defaults::batch_checks_per_hour")]
    pub batch_checks_per_hour: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            batch_checks_per_hour: defaults::batch_checks_per_hour(),
        }
    }
}

mod defaults {
    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; content-integrity/0.1; +link-checker)".into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn max_redirects() -> usize {
        5
    }

    // Resolver defaults
    pub fn acceptance_threshold() -> u8 {
        60
    }
    pub fn date_window_days() -> u32 {
        3
    }
    pub fn search_confidence() -> u8 {
        55
    }

    // Checker defaults
    pub fn max_concurrent() -> usize {
        5
    }
    pub fn max_retries() -> u32 {
        2
    }
    pub fn backoff_base_ms() -> u64 {
        500
    }
    pub fn context_chars() -> usize {
        80
    }

    // Archive defaults
    pub fn archive_enabled() -> bool {
        true
    }
    pub fn archive_endpoint() -> String {
        "https://archive.org/wayback/available".into()
    }
    pub fn archive_timeout() -> u64 {
        5
    }

    // Rate limit defaults
    pub fn batch_checks_per_hour() -> u32 {
        10
    }
}
