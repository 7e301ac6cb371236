// src/pipeline/check.rs

//! Dead link checking pipelines.

use crate::error::Result;
use crate::models::{AggregateReport, LinkCheckResult};
use crate::services::{CheckLimits, IntegrityService};
use crate::utils::log;

/// Check one post and print its dead links.
pub async fn run_check_post(service: &IntegrityService, post_id: &str) -> Vec<LinkCheckResult> {
    log::header(&format!("Checking links in post {}", post_id));

    let results = service.check_single_post(post_id).await;
    if results.is_empty() {
        log::success("No dead links found");
    } else {
        for result in &results {
            log::dead_link(result);
        }
    }

    results
}

/// Check a batch of recent posts and print the aggregate.
pub async fn run_check_batch(
    service: &IntegrityService,
    caller: &str,
    limits: &CheckLimits,
) -> Result<AggregateReport> {
    log::header("Checking links in recent posts");

    let report = service.check_post_batch_with(caller, limits).await?;
    for result in &report.dead_links {
        log::dead_link(result);
    }

    log::summary(
        "Link check",
        &[
            ("Posts checked", report.posts_checked.to_string()),
            ("Total links", report.total_links.to_string()),
            ("Working", report.working_links.to_string()),
            ("Dead", report.dead_links.len().to_string()),
            ("Retryable", report.retryable_count().to_string()),
            ("Skipped", report.skipped_links.to_string()),
            ("Time (ms)", report.processing_time_ms.to_string()),
        ],
    );
    if report.truncated {
        log::warn("Batch stopped at a post or link cap");
    }
    if report.deadline_exceeded {
        log::warn("Batch stopped at the deadline");
    }

    Ok(report)
}
