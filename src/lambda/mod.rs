// src/lambda/mod.rs

//! AWS Lambda handler for content integrity checks.
//!
//! This module provides the Lambda function entry point that:
//! 1. Builds the service once per container from env config and the bundled
//!    post export
//! 2. Resolves legacy permalinks or runs a batch link check
//! 3. Stops batch checks early enough to answer before the invocation times out

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{error, info, instrument};

use crate::error::Result;
use crate::models::{AggregateReport, Config, LegacyRedirect};
use crate::services::{CheckLimits, IntegrityService, PostCatalog};

/// Time reserved after a batch check for serializing the response.
const DEADLINE_MARGIN: Duration = Duration::from_secs(2);

static SERVICE: OnceCell<IntegrityService> = OnceCell::const_new();

/// Lambda invocation payload.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum IntegrityRequest {
    /// Resolve a legacy `/yyyy/mm/dd/slug/` path
    Resolve { path: String },

    /// Check links in the most recent posts
    CheckBatch {
        #[serde(default = "default_caller")]
        caller: String,
        #[serde(default = "default_max_posts")]
        max_posts: usize,
        #[serde(default = "default_max_links_per_post")]
        max_links_per_post: usize,
        #[serde(default)]
        max_links: Option<usize>,
    },
}

fn default_caller() -> String {
    "lambda".to_string()
}

fn default_max_posts() -> usize {
    10
}

fn default_max_links_per_post() -> usize {
    50
}

/// Lambda response payload.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<LegacyRedirect>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<AggregateReport>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub execution_time_ms: u64,
}

/// Main Lambda handler function.
#[instrument(skip(event), fields(request_id = %event.context.request_id))]
pub async fn handler(
    event: LambdaEvent<IntegrityRequest>,
) -> std::result::Result<IntegrityResponse, LambdaError> {
    let start = std::time::Instant::now();
    let (request, context) = event.into_parts();
    info!("Handling {:?}", request);

    // Fixed before a cold start spends any of the invocation's time
    let deadline = batch_deadline(context.deadline, epoch_millis(), tokio::time::Instant::now());
    let outcome = match SERVICE.get_or_try_init(build_service).await {
        Ok(service) => run_request(service, request, deadline).await,
        Err(e) => Err(e),
    };

    let execution_time_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    match outcome {
        Ok(mut response) => {
            response.success = true;
            response.execution_time_ms = execution_time_ms;
            info!("Request completed in {}ms", execution_time_ms);
            Ok(response)
        }
        Err(e) => {
            error!("Request failed: {}", e);
            Ok(IntegrityResponse {
                error: Some(e.to_string()),
                execution_time_ms,
                ..Default::default()
            })
        }
    }
}

async fn run_request(
    service: &IntegrityService,
    request: IntegrityRequest,
    deadline: Option<tokio::time::Instant>,
) -> Result<IntegrityResponse> {
    match request {
        IntegrityRequest::Resolve { path } => Ok(IntegrityResponse {
            redirect: service.resolve_legacy_path(&path).await?,
            ..Default::default()
        }),
        IntegrityRequest::CheckBatch {
            caller,
            max_posts,
            max_links_per_post,
            max_links,
        } => {
            let limits = CheckLimits {
                max_posts: Some(max_posts),
                max_links,
                max_links_per_post: Some(max_links_per_post),
                deadline,
            };
            let report = service.check_post_batch_with(&caller, &limits).await?;
            if report.deadline_exceeded {
                info!(
                    "Batch for {} cut short after {} posts",
                    caller, report.posts_checked
                );
            }
            Ok(IntegrityResponse {
                report: Some(report),
                ..Default::default()
            })
        }
    }
}

async fn build_service() -> Result<IntegrityService> {
    let config = load_lambda_config()?;
    let posts_path =
        PathBuf::from(std::env::var("POSTS_PATH").unwrap_or_else(|_| "data/posts.json".to_string()));

    let catalog = PostCatalog::load(&posts_path).await?;
    info!(
        "Loaded {} posts from {}",
        catalog.len(),
        posts_path.display()
    );

    IntegrityService::from_config(&config, Arc::new(catalog))
}

/// Load configuration suitable for Lambda environment.
fn load_lambda_config() -> Result<Config> {
    let mut config = match std::env::var("CONFIG_PATH") {
        Ok(path) => Config::load(&path)?,
        Err(_) => Config::default(),
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Time left for batch work given the invocation deadline (epoch millis).
///
/// `None` when the runtime reports no deadline.
fn remaining_budget(deadline_ms: u64, now_ms: u64) -> Option<Duration> {
    if deadline_ms == 0 {
        return None;
    }
    let left = Duration::from_millis(deadline_ms.saturating_sub(now_ms));
    Some(left.saturating_sub(DEADLINE_MARGIN))
}

/// Batch deadline measured from `entered`, the moment the handler started.
fn batch_deadline(
    deadline_ms: u64,
    now_ms: u64,
    entered: tokio::time::Instant,
) -> Option<tokio::time::Instant> {
    remaining_budget(deadline_ms, now_ms).map(|budget| entered + budget)
}
