// src/services/prober.rs

//! Single-attempt link liveness probing and the retry loop around it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::error::Result;
use crate::models::{CheckerConfig, HttpConfig};
use crate::utils::http::create_async_client;

/// Classified outcome of one probe attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// 2xx or 3xx
    Alive { status: u16 },
    /// 4xx or an unrecoverable request error; retrying will not help
    Permanent {
        status: Option<u16>,
        error: Option<String>,
    },
    /// 5xx, timeout or connection failure
    Retryable {
        status: Option<u16>,
        error: Option<String>,
    },
}

impl ProbeOutcome {
    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=399 => Self::Alive { status },
            400..=499 => Self::Permanent {
                status: Some(status),
                error: None,
            },
            _ => Self::Retryable {
                status: Some(status),
                error: None,
            },
        }
    }

    pub fn is_alive(&self) -> bool {
        matches!(self, Self::Alive { .. })
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Alive { status } => Some(*status),
            Self::Permanent { status, .. } | Self::Retryable { status, .. } => *status,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Alive { .. } => None,
            Self::Permanent { error, .. } | Self::Retryable { error, .. } => error.as_deref(),
        }
    }
}

/// One liveness check against one URL. Implementations must not retry.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// Retry schedule for retryable outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each further retry
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CheckerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_backoff: config.backoff_base(),
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_backoff.saturating_mul(factor)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&CheckerConfig::default())
    }
}

/// Probe until the outcome is final. Returns the outcome and the attempt count.
pub async fn probe_with_retry(
    prober: &dyn Prober,
    url: &str,
    policy: RetryPolicy,
) -> (ProbeOutcome, u32) {
    let mut attempt = 1;
    loop {
        let outcome = prober.probe(url).await;
        if !outcome.is_retryable() || attempt >= policy.max_attempts() {
            return (outcome, attempt);
        }

        let delay = policy.backoff(attempt);
        log::debug!(
            "Attempt {}/{} for {} failed ({:?}), retrying in {:?}",
            attempt,
            policy.max_attempts(),
            url,
            outcome,
            delay
        );
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        attempt += 1;
    }
}

/// [`Prober`] backed by reqwest.
///
/// Sends `HEAD` first and repeats the attempt with `GET` when the server
/// does not support `HEAD`.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn categorize_error(error: &reqwest::Error) -> ProbeOutcome {
        let message = error.to_string();
        if error.is_timeout() {
            ProbeOutcome::Retryable {
                status: None,
                error: Some("Request timed out".to_string()),
            }
        } else if error.is_connect() {
            ProbeOutcome::Retryable {
                status: None,
                error: Some(format!("Connection failed: {message}")),
            }
        } else if error.is_redirect() {
            ProbeOutcome::Permanent {
                status: None,
                error: Some("Too many redirects".to_string()),
            }
        } else if error.is_request() || error.is_body() {
            // Mid-stream resets surface here
            ProbeOutcome::Retryable {
                status: None,
                error: Some(message),
            }
        } else {
            ProbeOutcome::Permanent {
                status: None,
                error: Some(message),
            }
        }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let response = match self.client.head(url).send().await {
            Ok(response)
                if matches!(
                    response.status(),
                    StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
                ) =>
            {
                log::debug!("HEAD not supported by {}, retrying with GET", url);
                self.client.get(url).send().await
            }
            other => other,
        };

        match response {
            Ok(response) => ProbeOutcome::from_status(response.status().as_u16()),
            Err(e) => Self::categorize_error(&e),
        }
    }
}
