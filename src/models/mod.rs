// src/models/mod.rs

//! Domain models for the content integrity library.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod legacy;
mod post;
mod report;

// Re-export all public types
pub use config::{
    ArchiveConfig, CheckerConfig, Config, HttpConfig, RateLimitConfig, ResolverConfig,
};
pub use legacy::{LegacyRedirect, LegacyUrlKey, MatchResult, MatchStrategy};
pub use post::{Post, compare_post_ids};
pub use report::{AggregateReport, LinkCheckResult};
