//! Pipeline entry points for CLI operations.
//!
//! - `run_resolve`: Resolve a legacy permalink
//! - `run_check_post`: Check the links of one post
//! - `run_check_batch`: Check the links of recent posts
//! - `run_validate`: Validate configuration and the post export

pub mod check;
pub mod resolve;
pub mod validate;

pub use check::{run_check_batch, run_check_post};
pub use resolve::run_resolve;
pub use validate::run_validate;
