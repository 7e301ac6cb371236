// src/services/testing.rs

//! Hand-written collaborator fakes for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};

use crate::error::{AppError, Result};
use crate::models::Post;
use crate::services::{PostLookup, ProbeOutcome, Prober, SnapshotIndex};

/// Post with a publication date at noon UTC.
pub fn post(id: &str, slug: &str, title: &str, date: (i32, u32, u32)) -> Post {
    Post {
        id: id.to_string(),
        slug: slug.to_string(),
        title: title.to_string(),
        published_at: Utc
            .with_ymd_and_hms(date.0, date.1, date.2, 12, 0, 0)
            .unwrap(),
        body_html: String::new(),
    }
}

/// Post lookup over a fixed list that counts every call.
#[derive(Default)]
pub struct FakeLookup {
    posts: Vec<Post>,
    search_hits: Vec<Post>,
    failing: bool,
    calls: AtomicUsize,
    windows: Mutex<Vec<(NaiveDate, NaiveDate)>>,
    queries: Mutex<Vec<String>>,
}

impl FakeLookup {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts,
            ..Self::default()
        }
    }

    /// Fixed result list for `search_posts`.
    pub fn with_search_hits(mut self, hits: Vec<Post>) -> Self {
        self.search_hits = hits;
        self
    }

    /// Every call fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Date windows requested through `posts_published_between`.
    pub fn windows(&self) -> Vec<(NaiveDate, NaiveDate)> {
        self.windows.lock().map(|w| w.clone()).unwrap_or_default()
    }

    /// Queries passed to `search_posts`.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }

    fn enter(&self, op: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(AppError::lookup(op, "backend unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl PostLookup for FakeLookup {
    async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        self.enter("post_by_slug")?;
        Ok(self.posts.iter().find(|p| p.slug == slug).cloned())
    }

    async fn post_by_id(&self, id: &str) -> Result<Option<Post>> {
        self.enter("post_by_id")?;
        Ok(self.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn posts_published_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Post>> {
        self.enter("posts_published_between")?;
        if let Ok(mut windows) = self.windows.lock() {
            windows.push((from, to));
        }
        Ok(self
            .posts
            .iter()
            .filter(|p| (from..=to).contains(&p.published_date()))
            .cloned()
            .collect())
    }

    async fn search_posts(&self, query: &str) -> Result<Vec<Post>> {
        self.enter("search_posts")?;
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }
        Ok(self.search_hits.clone())
    }

    async fn recent_posts(&self, limit: usize) -> Result<Vec<Post>> {
        self.enter("recent_posts")?;
        Ok(self.posts.iter().take(limit).cloned().collect())
    }
}

/// Scripted prober that records attempts and peak concurrency.
///
/// Each URL replays its script one outcome per attempt, repeating the last
/// outcome once exhausted. Unscripted URLs answer 200.
#[derive(Default)]
pub struct FakeProber {
    scripts: HashMap<String, Vec<ProbeOutcome>>,
    delay: Duration,
    attempts: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, url: &str, outcomes: Vec<ProbeOutcome>) -> Self {
        self.scripts.insert(url.to_string(), outcomes);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn attempts(&self, url: &str) -> usize {
        self.attempts
            .lock()
            .map(|a| a.get(url).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_attempts(&self) -> usize {
        self.attempts
            .lock()
            .map(|a| a.values().sum())
            .unwrap_or(0)
    }

    /// Highest number of simultaneous `probe` calls observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for FakeProber {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let attempt = {
            let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
            let count = attempts.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.scripts.get(url) {
            Some(script) if !script.is_empty() => {
                script[(attempt - 1).min(script.len() - 1)].clone()
            }
            _ => ProbeOutcome::Alive { status: 200 },
        }
    }
}

/// Snapshot index over a fixed map.
#[derive(Default)]
pub struct FakeSnapshots {
    snapshots: HashMap<String, String>,
    failing: bool,
    delay: Duration,
    calls: AtomicUsize,
}

impl FakeSnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_snapshot(mut self, url: &str, snapshot: &str) -> Self {
        self.snapshots.insert(url.to_string(), snapshot.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotIndex for FakeSnapshots {
    async fn nearest_snapshot(&self, url: &str) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing {
            return Err(AppError::archive("snapshot service unavailable"));
        }
        Ok(self.snapshots.get(url).cloned())
    }
}
