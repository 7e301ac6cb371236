// src/pipeline/resolve.rs

//! Legacy URL resolution pipeline.

use crate::error::Result;
use crate::models::LegacyRedirect;
use crate::services::IntegrityService;
use crate::utils::log;

/// Resolve one legacy path and print the outcome.
pub async fn run_resolve(service: &IntegrityService, path: &str) -> Result<Option<LegacyRedirect>> {
    log::header(&format!("Resolving {}", path));

    let redirect = service.resolve_legacy_path(path).await?;
    match &redirect {
        Some(r) if r.permanent => {
            log::success(&format!("Redirect to /{}/", r.current_slug));
        }
        Some(r) => {
            log::warn(&format!(
                "Weak match /{}/, offer search instead of redirecting",
                r.current_slug
            ));
        }
        None => log::warn("No matching post, fall back to search"),
    }

    if let Some(r) = &redirect {
        log::summary(
            "Match",
            &[
                ("Slug", r.current_slug.clone()),
                ("Strategy", r.strategy.as_str().to_string()),
                ("Confidence", r.confidence.to_string()),
                ("Permanent", r.permanent.to_string()),
            ],
        );
    }

    Ok(redirect)
}
