// src/pipeline/validate.rs

use std::path::Path;

use crate::error::Result;
use crate::models::Config;
use crate::services::{KnownMappings, PostCatalog};
use crate::utils::log;

/// Validate the configuration and, when given, the post export.
pub async fn run_validate(config: &Config, posts_path: Option<&Path>) -> Result<()> {
    log::header("Validating configuration");

    if let Err(e) = config.validate() {
        log::error(&format!("Config validation failed: {}", e));
        return Err(e);
    }
    log::success("Config OK");
    log::sub_item(&format!("User agent: {}", config.http.user_agent));
    log::sub_item(&format!("Timeout: {}s", config.http.timeout_secs));
    log::sub_item(&format!("Max concurrent: {}", config.checker.max_concurrent));
    log::sub_item(&format!(
        "Acceptance threshold: {}",
        config.resolver.acceptance_threshold
    ));
    log::sub_item(&format!(
        "Known mappings: {}",
        KnownMappings::from_config(config).len()
    ));

    if let Some(path) = posts_path {
        match PostCatalog::load(path).await {
            Ok(catalog) => {
                log::success(&format!("Post export OK ({})", path.display()));
                log::sub_item(&format!("Posts: {}", catalog.len()));
                log::sub_item(&format!("Index tokens: {}", catalog.token_count()));
            }
            Err(e) => {
                log::error(&format!("Post export invalid: {}", e));
                return Err(e);
            }
        }
    }

    Ok(())
}
