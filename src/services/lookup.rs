//! Post lookup collaborator.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::Post;

/// Read access to the content backend.
///
/// Implementations own the translation from the backend's response shape
/// into [`Post`]. "Not found" is `Ok(None)` or an empty list; `Err` is
/// reserved for the backend failing to answer.
#[async_trait]
pub trait PostLookup: Send + Sync {
    /// Find a post by its canonical slug.
    async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>>;

    /// Find a post by backend id.
    async fn post_by_id(&self, id: &str) -> Result<Option<Post>>;

    /// Posts published on any day in `from..=to` (UTC dates).
    async fn posts_published_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Post>>;

    /// Full-text search, best match first.
    async fn search_posts(&self, query: &str) -> Result<Vec<Post>>;

    /// Most recently published posts, newest first.
    async fn recent_posts(&self, limit: usize) -> Result<Vec<Post>>;
}
