//! Content integrity CLI
//!
//! Local execution entry point. For AWS Lambda, use `content-integrity-lambda`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use content_integrity::{
    error::Result,
    models::Config,
    pipeline,
    services::{CheckLimits, IntegrityService, PostCatalog},
};
use serde::Serialize;

/// Legacy permalink resolver and dead link checker
#[derive(Parser, Debug)]
#[command(
    name = "content-integrity",
    version,
    about = "Resolve legacy permalinks and find dead links in published posts"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Path to the JSON post export
    #[arg(short, long, default_value = "data/posts.json")]
    posts: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a legacy /yyyy/mm/dd/slug/ path to a current post
    Resolve {
        /// Legacy request path
        path: String,
    },

    /// Check the outbound links of one post
    CheckPost {
        /// Post id
        id: String,
    },

    /// Check the outbound links of the most recent posts
    CheckBatch {
        #[arg(long, default_value_t = 10)]
        max_posts: usize,

        #[arg(long, default_value_t = 50)]
        max_links_per_post: usize,

        /// Cap on links checked across the whole batch
        #[arg(long)]
        max_links: Option<usize>,

        /// Stop and print a partial report after this many seconds
        #[arg(long)]
        deadline_secs: Option<u64>,

        /// Identity charged against the batch rate limit
        #[arg(long, default_value = "cli")]
        caller: String,
    },

    /// Validate configuration and the post export
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env_overrides();
    log::info!("Loaded configuration from {}", cli.config.display());

    if let Command::Validate = cli.command {
        return pipeline::run_validate(&config, Some(&cli.posts)).await;
    }

    let catalog = PostCatalog::load(&cli.posts).await?;
    log::info!("Loaded {} posts from {}", catalog.len(), cli.posts.display());
    let service = IntegrityService::from_config(&config, Arc::new(catalog))?;

    match cli.command {
        Command::Resolve { path } => {
            let redirect = pipeline::run_resolve(&service, &path).await?;
            print_json(&redirect)?;
        }

        Command::CheckPost { id } => {
            let results = pipeline::run_check_post(&service, &id).await;
            print_json(&results)?;
        }

        Command::CheckBatch {
            max_posts,
            max_links_per_post,
            max_links,
            deadline_secs,
            caller,
        } => {
            let limits = CheckLimits {
                max_posts: Some(max_posts),
                max_links,
                max_links_per_post: Some(max_links_per_post),
                deadline: deadline_secs
                    .map(|s| tokio::time::Instant::now() + Duration::from_secs(s)),
            };
            let report = pipeline::run_check_batch(&service, &caller, &limits).await?;
            print_json(&report)?;
        }

        Command::Validate => {}
    }

    Ok(())
}
