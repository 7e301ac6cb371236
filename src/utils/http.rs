// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::HttpConfig;

/// Create a configured asynchronous HTTP client.
///
/// The timeout applies per request attempt.
pub fn create_async_client(config: &HttpConfig) -> Result<reqwest::Client> {
    create_client_with_timeout(config, config.timeout())
}

/// Create a client that shares the user agent but uses its own timeout.
pub fn create_client_with_timeout(
    config: &HttpConfig,
    timeout: Duration,
) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .build()?;
    Ok(client)
}
