// src/services/catalog.rs

//! In-memory post catalog over a JSON post export.
//!
//! Search runs against an inverted index mapping word tokens of each post's
//! title and slug to post positions. Results are ranked by the number of
//! query tokens matched, then by recency.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::models::Post;
use crate::services::PostLookup;
use crate::utils::text::search_tokens;

/// Minimum token length kept in the index.
const MIN_TOKEN_LENGTH: usize = 2;

/// Read-only post catalog implementing [`PostLookup`].
#[derive(Debug, Clone, Default)]
pub struct PostCatalog {
    /// Posts sorted newest first
    posts: Vec<Post>,
    by_slug: HashMap<String, usize>,
    by_id: HashMap<String, usize>,
    index: HashMap<String, HashSet<usize>>,
}

impl PostCatalog {
    /// Build a catalog from posts in any order.
    pub fn new(mut posts: Vec<Post>) -> Self {
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));

        let mut catalog = Self {
            by_slug: HashMap::with_capacity(posts.len()),
            by_id: HashMap::with_capacity(posts.len()),
            index: HashMap::new(),
            posts: Vec::new(),
        };

        for (pos, post) in posts.iter().enumerate() {
            catalog.by_slug.entry(post.slug.to_lowercase()).or_insert(pos);
            catalog.by_id.entry(post.id.clone()).or_insert(pos);

            let mut tokens = search_tokens(&post.title, MIN_TOKEN_LENGTH);
            tokens.extend(search_tokens(&post.slug.replace('-', " "), MIN_TOKEN_LENGTH));
            for token in tokens {
                catalog.index.entry(token).or_default().insert(pos);
            }
        }

        catalog.posts = posts;
        catalog
    }

    /// Load a catalog from a JSON array of posts.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AppError::config(format!("Cannot read post export {}: {}", path.display(), e))
        })?;
        let posts: Vec<Post> = serde_json::from_slice(&bytes)?;
        log::info!("Loaded {} posts from {}", posts.len(), path.display());
        Ok(Self::new(posts))
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Number of distinct tokens in the search index.
    pub fn token_count(&self) -> usize {
        self.index.len()
    }

    fn search(&self, query: &str) -> Vec<Post> {
        let mut hits: HashMap<usize, usize> = HashMap::new();
        let tokens: HashSet<String> = search_tokens(query, MIN_TOKEN_LENGTH).into_iter().collect();
        for token in &tokens {
            if let Some(positions) = self.index.get(token) {
                for &pos in positions {
                    *hits.entry(pos).or_default() += 1;
                }
            }
        }

        let mut ranked: Vec<(usize, usize)> = hits.into_iter().collect();
        // Lower position means more recent
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
            .into_iter()
            .map(|(pos, _)| self.posts[pos].clone())
            .collect()
    }
}

#[async_trait]
impl PostLookup for PostCatalog {
    async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        Ok(self
            .by_slug
            .get(&slug.to_lowercase())
            .map(|&pos| self.posts[pos].clone()))
    }

    async fn post_by_id(&self, id: &str) -> Result<Option<Post>> {
        Ok(self.by_id.get(id).map(|&pos| self.posts[pos].clone()))
    }

    async fn posts_published_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Post>> {
        Ok(self
            .posts
            .iter()
            .filter(|p| {
                let date = p.published_date();
                date >= from && date <= to
            })
            .cloned()
            .collect())
    }

    async fn search_posts(&self, query: &str) -> Result<Vec<Post>> {
        Ok(self.search(query))
    }

    async fn recent_posts(&self, limit: usize) -> Result<Vec<Post>> {
        Ok(self.posts.iter().take(limit).cloned().collect())
    }
}
