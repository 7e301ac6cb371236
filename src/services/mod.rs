//! Service layer for the content integrity library.
//!
//! This module contains the business logic for:
//! - Legacy permalink resolution (`LegacyUrlResolver`)
//! - Link probing and retry (`HttpProber`, `probe_with_retry`)
//! - Archive enrichment (`ArchiveEnricher`, `WaybackSnapshotIndex`)
//! - Dead link checking (`DeadLinkChecker`)
//! - The caller-facing facade (`IntegrityService`)

mod archive;
mod catalog;
mod checker;
mod extract;
mod integrity;
mod lookup;
mod mappings;
mod prober;
mod rate_limit;
mod resolver;
mod wayback;

#[cfg(test)]
pub(crate) mod testing;

pub use archive::{ARCHIVE_SUGGESTION, ArchiveEnricher, Enrichment, SnapshotIndex};
pub use catalog::PostCatalog;
pub use checker::{CheckLimits, DeadLinkChecker};
pub use extract::{ExtractedLink, LinkExtractor};
pub use integrity::IntegrityService;
pub use lookup::PostLookup;
pub use mappings::KnownMappings;
pub use prober::{HttpProber, ProbeOutcome, Prober, RetryPolicy, probe_with_retry};
pub use rate_limit::BatchRateLimiter;
pub use resolver::{
    DATE_PROXIMITY_CEILING, EXACT_MAPPING_CONFIDENCE, EXACT_SLUG_CONFIDENCE, LegacyUrlResolver,
};
pub use wayback::WaybackSnapshotIndex;
