// src/services/resolver.rs

//! Legacy permalink resolver.
//!
//! Runs a cascade of matching strategies against the post lookup and stops
//! at the first result whose confidence reaches the acceptance threshold:
//!
//! 1. **Exact mapping** (100): curated override table
//! 2. **Exact slug** (95): the legacy slug is still canonical
//! 3. **Date proximity** (<= 90): token overlap among posts published
//!    within the date window
//! 4. **Full-text search** (fixed, below threshold): terminal, returned as a
//!    weak match for the caller to confirm

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use chrono::Days;

use crate::error::Result;
use crate::models::{LegacyUrlKey, MatchResult, MatchStrategy, Post, ResolverConfig, compare_post_ids};
use crate::services::{KnownMappings, PostLookup};
use crate::utils::text::{jaccard, slug_tokens, word_tokens};

/// Confidence of a curated mapping.
pub const EXACT_MAPPING_CONFIDENCE: u8 = 100;
/// Confidence of an unchanged slug.
pub const EXACT_SLUG_CONFIDENCE: u8 = 95;
/// Ceiling for date proximity, kept below the exact strategies.
pub const DATE_PROXIMITY_CEILING: u8 = 90;

const CASCADE: [MatchStrategy; 4] = [
    MatchStrategy::ExactMapping,
    MatchStrategy::ExactSlug,
    MatchStrategy::DateProximity,
    MatchStrategy::FullTextSearch,
];

/// Resolves legacy date/slug permalinks to current posts.
pub struct LegacyUrlResolver {
    lookup: Arc<dyn PostLookup>,
    mappings: Arc<KnownMappings>,
    config: ResolverConfig,
}

impl LegacyUrlResolver {
    pub fn new(
        lookup: Arc<dyn PostLookup>,
        mappings: Arc<KnownMappings>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            lookup,
            mappings,
            config,
        }
    }

    pub fn acceptance_threshold(&self) -> u8 {
        self.config.acceptance_threshold
    }

    /// Resolve a legacy key to a post.
    ///
    /// Returns `None` when no strategy finds a post. A full-text search hit
    /// is returned even though it sits below the threshold; check
    /// [`MatchResult::is_confident`] before redirecting.
    pub async fn resolve(&self, key: &LegacyUrlKey) -> Option<MatchResult> {
        let threshold = self.config.acceptance_threshold;

        for strategy in CASCADE {
            let Some(found) = self.run(strategy, key).await else {
                continue;
            };

            if found.is_confident(threshold) || strategy == MatchStrategy::FullTextSearch {
                log::info!(
                    "Resolved {}/{} -> {} via {} (confidence {})",
                    key.date(),
                    key.slug(),
                    found.post.slug,
                    strategy.as_str(),
                    found.confidence
                );
                return Some(found);
            }

            log::debug!(
                "{} candidate {} for {} scored {} (< {}), continuing",
                strategy.as_str(),
                found.post.slug,
                key.slug(),
                found.confidence,
                threshold
            );
        }

        log::info!("No match for legacy permalink {}/{}", key.date(), key.slug());
        None
    }

    async fn run(&self, strategy: MatchStrategy, key: &LegacyUrlKey) -> Option<MatchResult> {
        match strategy {
            MatchStrategy::ExactMapping => self.exact_mapping(key).await,
            MatchStrategy::ExactSlug => self.exact_slug(key).await,
            MatchStrategy::DateProximity => self.date_proximity(key).await,
            MatchStrategy::FullTextSearch => self.full_text_search(key).await,
        }
    }

    async fn exact_mapping(&self, key: &LegacyUrlKey) -> Option<MatchResult> {
        let target = self.mappings.lookup(key.slug())?;
        let post = degrade("exact mapping", self.lookup.post_by_slug(target).await)?;
        let Some(post) = post else {
            log::warn!(
                "Curated mapping {} -> {} points at a missing post",
                key.slug(),
                target
            );
            return None;
        };

        Some(MatchResult {
            post,
            confidence: EXACT_MAPPING_CONFIDENCE,
            strategy: MatchStrategy::ExactMapping,
        })
    }

    async fn exact_slug(&self, key: &LegacyUrlKey) -> Option<MatchResult> {
        let post = degrade("exact slug", self.lookup.post_by_slug(key.slug()).await)??;
        Some(MatchResult {
            post,
            confidence: EXACT_SLUG_CONFIDENCE,
            strategy: MatchStrategy::ExactSlug,
        })
    }

    async fn date_proximity(&self, key: &LegacyUrlKey) -> Option<MatchResult> {
        let window = Days::new(u64::from(self.config.date_window_days));
        let from = key.date().checked_sub_days(window)?;
        let to = key.date().checked_add_days(window)?;
        let candidates = degrade(
            "date proximity",
            self.lookup.posts_published_between(from, to).await,
        )?;

        let legacy = slug_tokens(key.slug());
        let max_distance = i64::from(self.config.date_window_days);

        candidates
            .into_iter()
            .map(|post| {
                let distance = (post.published_date() - key.date()).num_days().abs();
                let confidence = proximity_confidence(&legacy, &post);
                (post, confidence, distance)
            })
            .filter(|(_, confidence, distance)| *confidence > 0 && *distance <= max_distance)
            .min_by(|a, b| rank_candidates((&a.0, a.1, a.2), (&b.0, b.1, b.2)))
            .map(|(post, confidence, _)| MatchResult {
                post,
                confidence,
                strategy: MatchStrategy::DateProximity,
            })
    }

    async fn full_text_search(&self, key: &LegacyUrlKey) -> Option<MatchResult> {
        let query = key.slug().replace('-', " ");
        let hits = degrade("full-text search", self.lookup.search_posts(&query).await)?;
        let post = hits.into_iter().next()?;
        Some(MatchResult {
            post,
            confidence: self.config.search_confidence,
            strategy: MatchStrategy::FullTextSearch,
        })
    }
}

/// `round(overlap * 90)`, using the better of the slug and title overlaps.
fn proximity_confidence(legacy: &HashSet<String>, post: &Post) -> u8 {
    let by_slug = jaccard(legacy, &slug_tokens(&post.slug));
    let by_title = jaccard(legacy, &word_tokens(&post.title));
    confidence_for_overlap(by_slug.max(by_title))
}

fn confidence_for_overlap(ratio: f64) -> u8 {
    let scaled = (ratio.clamp(0.0, 1.0) * f64::from(DATE_PROXIMITY_CEILING)).round();
    (scaled as u8).min(DATE_PROXIMITY_CEILING)
}

/// Best first: higher confidence, then nearer date, then lower post id.
fn rank_candidates(a: (&Post, u8, i64), b: (&Post, u8, i64)) -> Ordering {
    b.1.cmp(&a.1)
        .then(a.2.cmp(&b.2))
        .then_with(|| compare_post_ids(&a.0.id, &b.0.id))
}

/// Log a collaborator failure and treat it as a miss.
fn degrade<T>(strategy: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("{} lookup failed, skipping strategy: {}", strategy, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::services::testing::{FakeLookup, post};

    fn resolver(lookup: FakeLookup, mappings: KnownMappings) -> (LegacyUrlResolver, Arc<FakeLookup>) {
        let lookup = Arc::new(lookup);
        let resolver = LegacyUrlResolver::new(
            lookup.clone(),
            Arc::new(mappings),
            ResolverConfig::default(),
        );
        (resolver, lookup)
    }

    fn key(path: &str) -> LegacyUrlKey {
        LegacyUrlKey::parse_path(path).unwrap()
    }

    #[tokio::test]
    async fn test_exact_slug_example() {
        let (resolver, _) = resolver(
            FakeLookup::new(vec![post(
                "1",
                "apartheid-the-nazis-and-mcebo-dlamini",
                "Apartheid, the Nazis and Mcebo Dlamini",
                (2015, 5, 8),
            )]),
            KnownMappings::default(),
        );

        let found = resolver
            .resolve(&key("/2015/05/08/apartheid-the-nazis-and-mcebo-dlamini/"))
            .await
            .unwrap();
        assert_eq!(found.post.slug, "apartheid-the-nazis-and-mcebo-dlamini");
        assert_eq!(found.confidence, 95);
        assert_eq!(found.strategy, MatchStrategy::ExactSlug);
    }

    #[tokio::test]
    async fn test_exact_mapping_beats_every_other_strategy() {
        let posts = vec![
            // Would win EXACT_SLUG, DATE_PROXIMITY and search
            post("1", "old-post", "Old post", (2016, 3, 4)),
            post("2", "curated-target", "Something else entirely", (2019, 1, 1)),
        ];
        let lookup = FakeLookup::new(posts.clone()).with_search_hits(vec![posts[0].clone()]);
        let (resolver, _) = resolver(lookup, KnownMappings::new([("old-post", "curated-target")]));

        let found = resolver.resolve(&key("/2016/03/04/old-post/")).await.unwrap();
        assert_eq!(found.post.slug, "curated-target");
        assert_eq!(found.confidence, 100);
        assert_eq!(found.strategy, MatchStrategy::ExactMapping);
    }

    #[tokio::test]
    async fn test_mapping_to_missing_post_falls_through() {
        let (resolver, _) = resolver(
            FakeLookup::new(vec![post("1", "old-post", "Old post", (2016, 3, 4))]),
            KnownMappings::new([("old-post", "deleted-post")]),
        );
        let found = resolver.resolve(&key("/2016/03/04/old-post/")).await.unwrap();
        assert_eq!(found.strategy, MatchStrategy::ExactSlug);
    }

    #[tokio::test]
    async fn test_date_proximity_window_and_scoring() {
        let (resolver, lookup) = resolver(
            FakeLookup::new(vec![
                post("1", "rhodes-statue-protest-grows-larger", "Rhodes statue", (2015, 3, 20)),
                post("2", "weekend-weather", "Weekend weather", (2015, 3, 19)),
                // Outside the window
                post("3", "rhodes-statue-protest-grows-again", "Rhodes", (2015, 3, 30)),
            ]),
            KnownMappings::default(),
        );

        let found = resolver
            .resolve(&key("/2015/03/19/rhodes-statue-protest-grows/"))
            .await
            .unwrap();
        assert_eq!(found.post.id, "1");
        assert_eq!(found.strategy, MatchStrategy::DateProximity);
        // 4 shared tokens of 5 -> round(0.8 * 90)
        assert_eq!(found.confidence, 72);
        assert_eq!(
            lookup.windows(),
            vec![(
                NaiveDate::from_ymd_opt(2015, 3, 16).unwrap(),
                NaiveDate::from_ymd_opt(2015, 3, 22).unwrap()
            )]
        );
    }

    #[tokio::test]
    async fn test_date_proximity_uses_title_tokens() {
        let (resolver, _) = resolver(
            FakeLookup::new(vec![post(
                "9",
                "p-1234",
                "Fees Must Fall: The Morning After",
                (2015, 10, 21),
            )]),
            KnownMappings::default(),
        );
        let found = resolver
            .resolve(&key("/2015/10/22/fees-must-fall-the-morning-after/"))
            .await
            .unwrap();
        assert_eq!(found.post.id, "9");
        assert_eq!(found.confidence, 90);
    }

    #[tokio::test]
    async fn test_tie_break_prefers_nearer_date_then_lower_id() {
        let posts = vec![
            post("20", "uct-rhodes-statue-protest-grows", "x", (2015, 3, 19)),
            post("10", "rhodes-statue-protest-grows-today", "x", (2015, 3, 19)),
            post("5", "rhodes-statue-protest-grows-again", "x", (2015, 3, 21)),
        ];
        let (resolver, _) = resolver(FakeLookup::new(posts), KnownMappings::default());
        let key = key("/2015/03/19/rhodes-statue-protest-grows/");

        let first = resolver.resolve(&key).await.unwrap();
        assert_eq!(first.post.id, "10");
        for _ in 0..5 {
            assert_eq!(resolver.resolve(&key).await.unwrap().post.id, "10");
        }
    }

    #[tokio::test]
    async fn test_weak_proximity_falls_back_to_search() {
        let hit = post("7", "rhodes-must-fall-explained", "Rhodes Must Fall", (2017, 1, 1));
        let lookup = FakeLookup::new(vec![post(
            "1",
            "statue-of-liberty-tour",
            "Statue of Liberty tour",
            (2015, 3, 19),
        )])
        .with_search_hits(vec![hit]);
        let (resolver, lookup) = resolver(lookup, KnownMappings::default());

        let found = resolver.resolve(&key("/2015/03/19/rhodes-statue/")).await.unwrap();
        assert_eq!(lookup.queries(), vec!["rhodes statue".to_string()]);
        assert_eq!(found.post.id, "7");
        assert_eq!(found.strategy, MatchStrategy::FullTextSearch);
        assert_eq!(found.confidence, 55);
        assert!(!found.is_confident(resolver.acceptance_threshold()));
    }

    #[tokio::test]
    async fn test_no_match_is_none() {
        let (resolver, lookup) = resolver(FakeLookup::new(vec![]), KnownMappings::default());
        assert!(resolver.resolve(&key("/2015/03/19/nothing/")).await.is_none());
        // exact slug, date window, search
        assert_eq!(lookup.calls(), 3);
    }

    #[tokio::test]
    async fn test_failing_lookup_degrades_to_none() {
        let (resolver, _) = resolver(FakeLookup::failing(), KnownMappings::default());
        assert!(resolver.resolve(&key("/2015/03/19/anything/")).await.is_none());
    }

    #[test]
    fn test_confidence_is_monotonic_and_capped() {
        let mut previous = 0;
        for step in 0..=100 {
            let confidence = confidence_for_overlap(f64::from(step) / 100.0);
            assert!(confidence >= previous);
            assert!(confidence <= DATE_PROXIMITY_CEILING);
            previous = confidence;
        }
        assert_eq!(confidence_for_overlap(1.0), 90);
        assert_eq!(confidence_for_overlap(0.5), 45);
    }
}
