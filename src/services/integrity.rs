// src/services/integrity.rs

//! Entry points for the route and CLI layers.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{AggregateReport, Config, LegacyRedirect, LegacyUrlKey, LinkCheckResult};
use crate::services::archive::{ArchiveEnricher, SnapshotIndex};
use crate::services::checker::{CheckLimits, DeadLinkChecker};
use crate::services::prober::{HttpProber, Prober};
use crate::services::rate_limit::BatchRateLimiter;
use crate::services::resolver::LegacyUrlResolver;
use crate::services::wayback::WaybackSnapshotIndex;
use crate::services::{KnownMappings, PostLookup};

/// Legacy URL resolution and dead link checking behind one handle.
pub struct IntegrityService {
    lookup: Arc<dyn PostLookup>,
    resolver: LegacyUrlResolver,
    checker: DeadLinkChecker,
    limiter: BatchRateLimiter,
}

impl IntegrityService {
    /// Wire the service with the HTTP prober and, when enabled, the Wayback
    /// snapshot index.
    pub fn from_config(config: &Config, lookup: Arc<dyn PostLookup>) -> Result<Self> {
        let prober: Arc<dyn Prober> = Arc::new(HttpProber::new(&config.http)?);
        let snapshots: Option<Arc<dyn SnapshotIndex>> = if config.archive.enabled {
            Some(Arc::new(WaybackSnapshotIndex::new(
                &config.http,
                &config.archive,
            )?))
        } else {
            log::info!("Archive enrichment disabled");
            None
        };

        Self::with_collaborators(config, lookup, prober, snapshots)
    }

    pub fn with_collaborators(
        config: &Config,
        lookup: Arc<dyn PostLookup>,
        prober: Arc<dyn Prober>,
        snapshots: Option<Arc<dyn SnapshotIndex>>,
    ) -> Result<Self> {
        config.validate()?;

        let enricher = match snapshots {
            Some(index) => ArchiveEnricher::new(index, config.archive.timeout()),
            None => ArchiveEnricher::disabled(),
        };
        let mappings = Arc::new(KnownMappings::from_config(config));
        log::debug!("Loaded {} known legacy mappings", mappings.len());

        Ok(Self {
            resolver: LegacyUrlResolver::new(lookup.clone(), mappings, config.resolver.clone()),
            checker: DeadLinkChecker::new(prober, enricher, &config.checker)?,
            limiter: BatchRateLimiter::from_config(&config.rate_limit)?,
            lookup,
        })
    }

    /// Resolve `/{year}/{month}/{day}/{slug}/`.
    ///
    /// Out-of-range dates are rejected before any lookup. `Ok(None)` means
    /// nothing matched.
    pub async fn resolve_legacy_url(
        &self,
        year: i32,
        month: u32,
        day: u32,
        slug: &str,
    ) -> Result<Option<LegacyRedirect>> {
        let key = LegacyUrlKey::new(year, month, day, slug)?;
        Ok(self.resolve_key(&key).await)
    }

    /// Resolve a raw legacy request path.
    pub async fn resolve_legacy_path(&self, path: &str) -> Result<Option<LegacyRedirect>> {
        let key = LegacyUrlKey::parse_path(path)?;
        Ok(self.resolve_key(&key).await)
    }

    async fn resolve_key(&self, key: &LegacyUrlKey) -> Option<LegacyRedirect> {
        let result = self.resolver.resolve(key).await?;
        Some(LegacyRedirect::from_match(
            &result,
            self.resolver.acceptance_threshold(),
        ))
    }

    /// Dead links in one post. An unknown id yields no results.
    pub async fn check_single_post(&self, post_id: &str) -> Vec<LinkCheckResult> {
        match self.lookup.post_by_id(post_id).await {
            Ok(Some(post)) => self.checker.check_post(&post).await,
            Ok(None) => {
                log::info!("No post with id {}", post_id);
                Vec::new()
            }
            Err(e) => {
                log::warn!("Post lookup for {} failed: {}", post_id, e);
                Vec::new()
            }
        }
    }

    /// Check the most recent `max_posts` posts on behalf of `caller`.
    pub async fn check_post_batch(
        &self,
        caller: &str,
        max_posts: usize,
        max_links_per_post: usize,
    ) -> Result<AggregateReport> {
        let limits = CheckLimits {
            max_posts: Some(max_posts),
            max_links_per_post: Some(max_links_per_post),
            ..CheckLimits::default()
        };
        self.check_post_batch_with(caller, &limits).await
    }

    /// Batch check with full control over caps and deadline.
    ///
    /// Invalid limits fail before the caller's rate allowance is consumed.
    pub async fn check_post_batch_with(
        &self,
        caller: &str,
        limits: &CheckLimits,
    ) -> Result<AggregateReport> {
        limits.validate()?;
        self.limiter.check(caller)?;

        // One past the cap so the checker can tell the batch was cut short
        let wanted = limits
            .max_posts
            .map_or(usize::MAX, |cap| cap.saturating_add(1));
        let posts = match self.lookup.recent_posts(wanted).await {
            Ok(posts) => posts,
            Err(e) => {
                log::warn!("Could not list posts for batch check: {}", e);
                return Ok(AggregateReport::default());
            }
        };

        self.checker.check_posts(&posts, limits).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::error::AppError;
    use crate::models::{MatchStrategy, RateLimitConfig};
    use crate::services::prober::ProbeOutcome;
    use crate::services::testing::{FakeLookup, FakeProber, post};

    fn test_config() -> Config {
        let mut config = Config::default();
        config.checker.backoff_base_ms = 1;
        config.rate_limit = RateLimitConfig {
            batch_checks_per_hour: 2,
        };
        config.mappings = BTreeMap::from([(
            "old-rhodes-post".to_string(),
            "rhodes-must-fall".to_string(),
        )]);
        config
    }

    fn service(lookup: &Arc<FakeLookup>, prober: &Arc<FakeProber>) -> IntegrityService {
        IntegrityService::with_collaborators(&test_config(), lookup.clone(), prober.clone(), None)
            .unwrap()
    }

    fn posts() -> Vec<crate::models::Post> {
        let mut with_links = post("2", "dead-links-inside", "Dead links inside", (2016, 2, 1));
        with_links.body_html = concat!(
            r#"<p><a href="https://gone.example/">gone</a></p>"#,
            r#"<p><a href="https://ok.example/">ok</a></p>"#,
        )
        .to_string();
        vec![
            with_links,
            post("1", "apartheid-the-nazis-and-mcebo-dlamini", "Apartheid, the Nazis and Mcebo Dlamini", (2015, 5, 8)),
            post("3", "rhodes-must-fall", "Rhodes must fall", (2015, 3, 20)),
        ]
    }

    fn prober() -> Arc<FakeProber> {
        Arc::new(
            FakeProber::new()
                .with_script("https://gone.example/", vec![ProbeOutcome::from_status(404)]),
        )
    }

    #[tokio::test]
    async fn test_resolve_unchanged_slug() {
        let lookup = Arc::new(FakeLookup::new(posts()));
        let redirect = service(&lookup, &prober())
            .resolve_legacy_path("/2015/05/08/apartheid-the-nazis-and-mcebo-dlamini/")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(redirect.current_slug, "apartheid-the-nazis-and-mcebo-dlamini");
        assert_eq!(redirect.confidence, 95);
        assert_eq!(redirect.strategy, MatchStrategy::ExactSlug);
        assert!(redirect.permanent);
    }

    #[tokio::test]
    async fn test_resolve_known_mapping() {
        let lookup = Arc::new(FakeLookup::new(posts()));
        let redirect = service(&lookup, &prober())
            .resolve_legacy_url(2014, 1, 1, "old-rhodes-post")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(redirect.current_slug, "rhodes-must-fall");
        assert_eq!(redirect.confidence, 100);
        assert_eq!(redirect.strategy, MatchStrategy::ExactMapping);
    }

    #[tokio::test]
    async fn test_invalid_dates_make_no_lookup_calls() {
        let lookup = Arc::new(FakeLookup::new(posts()));
        let service = service(&lookup, &prober());

        for (month, day) in [(13, 1), (5, 32), (2, 30), (0, 10)] {
            let err = service
                .resolve_legacy_url(2015, month, day, "rhodes-must-fall")
                .await
                .unwrap_err();
            assert!(err.is_validation(), "{month}/{day}: {err}");
        }
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn test_search_fallback_is_not_permanent() {
        let hit = post("9", "a-rather-different-title", "A rather different title", (2012, 1, 1));
        let lookup = Arc::new(FakeLookup::new(posts()).with_search_hits(vec![hit]));
        let redirect = service(&lookup, &prober())
            .resolve_legacy_url(2019, 7, 7, "unrelated-words")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(redirect.strategy, MatchStrategy::FullTextSearch);
        assert!(!redirect.permanent);
    }

    #[tokio::test]
    async fn test_unresolvable_is_absent() {
        let lookup = Arc::new(FakeLookup::new(posts()));
        let result = service(&lookup, &prober())
            .resolve_legacy_url(2019, 7, 7, "unrelated-words")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_check_single_post() {
        let lookup = Arc::new(FakeLookup::new(posts()));
        let prober = prober();
        let service = service(&lookup, &prober);

        let results = service.check_single_post("2").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://gone.example/");
        assert!(!results[0].retryable);

        assert!(service.check_single_post("404").await.is_empty());
    }

    #[tokio::test]
    async fn test_batch_is_rate_limited_per_caller() {
        let lookup = Arc::new(FakeLookup::new(posts()));
        let service = service(&lookup, &prober());

        let report = service.check_post_batch("cron", 10, 10).await.unwrap();
        assert_eq!(report.posts_checked, 3);
        assert_eq!(report.total_links, 2);
        assert_eq!(report.working_links, 1);

        assert!(service.check_post_batch("cron", 10, 10).await.is_ok());
        let err = service.check_post_batch("cron", 10, 10).await.unwrap_err();
        assert!(matches!(err, AppError::RateLimited { .. }));
        assert!(service.check_post_batch("admin", 10, 10).await.is_ok());
    }

    #[tokio::test]
    async fn test_post_cap_below_available_posts_is_truncation() {
        let lookup = Arc::new(FakeLookup::new(posts()));
        let service = service(&lookup, &prober());

        let report = service.check_post_batch("cron", 2, 10).await.unwrap();
        assert_eq!(report.posts_checked, 2);
        assert!(report.truncated);
        assert!(report.is_partial());

        let report = service.check_post_batch("admin", 3, 10).await.unwrap();
        assert_eq!(report.posts_checked, 3);
        assert!(!report.truncated);
    }

    #[tokio::test]
    async fn test_invalid_caps_do_not_consume_allowance() {
        let lookup = Arc::new(FakeLookup::new(posts()));
        let prober = prober();
        let service = service(&lookup, &prober);

        for _ in 0..5 {
            let err = service.check_post_batch("cron", 0, 10).await.unwrap_err();
            assert!(err.is_validation());
        }
        assert_eq!(lookup.calls(), 0);
        assert_eq!(prober.total_attempts(), 0);
        assert!(service.check_post_batch("cron", 1, 10).await.is_ok());
    }

    #[tokio::test]
    async fn test_lookup_failure_yields_empty_report() {
        let lookup = Arc::new(FakeLookup::failing());
        let service = service(&lookup, &prober());

        let report = service.check_post_batch("cron", 5, 5).await.unwrap();
        assert_eq!(report, AggregateReport::default());
        assert!(service.check_single_post("1").await.is_empty());
    }
}
