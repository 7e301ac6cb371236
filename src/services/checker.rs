// src/services/checker.rs

//! Dead link checking for single posts and post batches.
//!
//! Every network attempt (probe or archive lookup) holds a permit from one
//! semaphore owned by the checker, so concurrent checks never exceed
//! `max_concurrent` no matter how many posts or batches are in flight.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::sync::Semaphore;
use tokio::time::Instant;

use crate::error::{AppError, Result};
use crate::models::{AggregateReport, CheckerConfig, LinkCheckResult, Post};
use crate::services::archive::ArchiveEnricher;
use crate::services::extract::{ExtractedLink, LinkExtractor};
use crate::services::prober::{ProbeOutcome, Prober, RetryPolicy, probe_with_retry};

/// Caller-supplied bounds for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckLimits {
    pub max_posts: Option<usize>,
    /// Links checked across the whole batch
    pub max_links: Option<usize>,
    pub max_links_per_post: Option<usize>,
    /// Stop and return what has been collected once this passes
    pub deadline: Option<Instant>,
}

impl CheckLimits {
    pub fn validate(&self) -> Result<()> {
        let caps = [
            ("max_posts", self.max_posts),
            ("max_links", self.max_links),
            ("max_links_per_post", self.max_links_per_post),
        ];
        for (name, cap) in caps {
            if cap == Some(0) {
                return Err(AppError::validation(format!("{name} must be > 0")));
            }
        }
        Ok(())
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Per-post tally.
#[derive(Debug, Default)]
struct PostRun {
    dead: Vec<LinkCheckResult>,
    working: usize,
    skipped: usize,
    deadline_exceeded: bool,
}

/// Holds a checker permit for the duration of each probe attempt.
///
/// Backoff sleeps between attempts happen outside the permit.
struct GatedProber<'a> {
    inner: &'a dyn Prober,
    permits: &'a Semaphore,
}

#[async_trait]
impl<'a> Prober for GatedProber<'a> {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let Ok(_permit) = self.permits.acquire().await else {
            return ProbeOutcome::Permanent {
                status: None,
                error: Some("Link checker shut down".to_string()),
            };
        };
        self.inner.probe(url).await
    }
}

pub struct DeadLinkChecker {
    prober: Arc<dyn Prober>,
    enricher: ArchiveEnricher,
    extractor: LinkExtractor,
    policy: RetryPolicy,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
}

impl DeadLinkChecker {
    pub fn new(
        prober: Arc<dyn Prober>,
        enricher: ArchiveEnricher,
        config: &CheckerConfig,
    ) -> Result<Self> {
        if config.max_concurrent == 0 {
            return Err(AppError::validation("checker.max_concurrent must be > 0"));
        }

        Ok(Self {
            prober,
            enricher,
            extractor: LinkExtractor::from_config(config)?,
            policy: RetryPolicy::from_config(config),
            permits: Arc::new(Semaphore::new(config.max_concurrent)),
            max_concurrent: config.max_concurrent,
        })
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Dead links in one post. Working links are not materialized.
    pub async fn check_post(&self, post: &Post) -> Vec<LinkCheckResult> {
        let links = self.extractor.extract(&post.body_html);
        self.run_links(post, links, None).await.dead
    }

    /// Check posts one after another, honouring `limits`.
    ///
    /// Caps and the deadline never fail the call; they yield a partial report
    /// flagged with `truncated` or `deadline_exceeded`.
    pub async fn check_posts(&self, posts: &[Post], limits: &CheckLimits) -> Result<AggregateReport> {
        limits.validate()?;

        let start = std::time::Instant::now();
        let mut report = AggregateReport::default();
        let mut link_budget = limits.max_links;

        let post_cap = limits.max_posts.unwrap_or(posts.len());
        if posts.len() > post_cap {
            log::info!(
                "Batch capped at {} of {} posts",
                post_cap,
                posts.len()
            );
            report.truncated = true;
        }

        for post in posts.iter().take(post_cap) {
            if limits.deadline_passed() {
                report.deadline_exceeded = true;
                break;
            }

            let mut links = self.extractor.extract(&post.body_html);
            let mut keep = links.len();
            if let Some(per_post) = limits.max_links_per_post {
                keep = keep.min(per_post);
            }
            // The batch budget only cuts a post that still has links to check
            let budget_cut = link_budget.is_some_and(|remaining| remaining < keep);
            if let Some(remaining) = link_budget {
                keep = keep.min(remaining);
            }
            if keep < links.len() {
                report.skipped_links += links.len() - keep;
                report.truncated = true;
                links.truncate(keep);
            }
            if budget_cut && keep == 0 {
                break;
            }

            let run = self.run_links(post, links, limits.deadline).await;
            let checked = run.dead.len() + run.working;
            link_budget = link_budget.map(|b| b.saturating_sub(checked));

            report.posts_checked += 1;
            report.working_links += run.working;
            report.skipped_links += run.skipped;
            report.dead_links.extend(run.dead);

            if run.deadline_exceeded {
                report.deadline_exceeded = true;
                break;
            }
            if budget_cut {
                break;
            }
        }

        report.total_links = report.dead_links.len() + report.working_links;
        report.processing_time_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        log::info!(
            "Checked {} links in {} posts: {} dead, {} working, {} skipped ({} ms)",
            report.total_links,
            report.posts_checked,
            report.dead_links.len(),
            report.working_links,
            report.skipped_links,
            report.processing_time_ms
        );
        if report.deadline_exceeded {
            log::warn!("Batch deadline passed, returning partial report");
        }

        Ok(report)
    }

    async fn run_links(
        &self,
        post: &Post,
        links: Vec<ExtractedLink>,
        deadline: Option<Instant>,
    ) -> PostRun {
        let total = links.len();
        let mut run = PostRun::default();

        let mut checks = stream::iter(links)
            .map(|link| self.check_link(post, link))
            .buffer_unordered(self.max_concurrent);

        loop {
            let next = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, checks.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        run.deadline_exceeded = true;
                        break;
                    }
                },
                None => checks.next().await,
            };

            match next {
                Some(Some(result)) => run.dead.push(result),
                Some(None) => run.working += 1,
                None => break,
            }
        }

        run.skipped = total - run.dead.len() - run.working;
        run
    }

    /// `None` when the link is alive.
    async fn check_link(&self, post: &Post, link: ExtractedLink) -> Option<LinkCheckResult> {
        let gated = GatedProber {
            inner: self.prober.as_ref(),
            permits: &self.permits,
        };
        let (outcome, attempts) = probe_with_retry(&gated, &link.url, self.policy).await;

        if outcome.is_alive() {
            log::debug!("{} alive ({:?})", link.url, outcome.status());
            return None;
        }

        log::debug!(
            "{} dead after {} attempt(s): {:?}",
            link.url,
            attempts,
            outcome
        );

        let enrichment = {
            let _permit = self.permits.acquire().await.ok();
            self.enricher.enrich(&link.url).await
        };

        Some(LinkCheckResult {
            status: outcome.status(),
            error: outcome.error().map(str::to_string),
            retryable: outcome.is_retryable(),
            url: link.url,
            context: link.context,
            post_id: post.id.clone(),
            post_title: post.title.clone(),
            post_slug: post.slug.clone(),
            archive_url: enrichment.archive_url,
            suggestions: enrichment.suggestions,
            attempts,
            checked_at: Utc::now(),
        })
    }
}
