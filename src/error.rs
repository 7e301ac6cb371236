// src/error.rs

//! Unified error handling for the content integrity library.
//!
//! Only caller misuse and infrastructure failures end up here. A legacy URL
//! without a match or an unreachable outbound link is reported as data.

use std::fmt;

use thiserror::Error;

/// Result type alias for content integrity operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input supplied by the caller
    #[error("Validation error: {0}")]
    Validation(String),

    /// Post lookup collaborator failed
    #[error("Lookup error for {context}: {message}")]
    Lookup { context: String, message: String },

    /// Snapshot index collaborator failed
    #[error("Archive lookup error: {0}")]
    Archive(String),

    /// Caller exceeded the batch-check allowance
    #[error("Rate limit exceeded for '{caller}', retry in {retry_after_secs}s")]
    RateLimited { caller: String, retry_after_secs: u64 },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a lookup error with context.
    pub fn lookup(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Lookup {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create an archive lookup error.
    pub fn archive(message: impl fmt::Display) -> Self {
        Self::Archive(message.to_string())
    }

    /// Whether this error was caused by invalid caller input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_error_message() {
        let err = AppError::lookup("post_by_slug(hello)", "connection reset");
        assert_eq!(
            err.to_string(),
            "Lookup error for post_by_slug(hello): connection reset"
        );
    }

    #[test]
    fn test_rate_limited_message() {
        let err = AppError::RateLimited {
            caller: "cron".to_string(),
            retry_after_secs: 360,
        };
        assert_eq!(err.to_string(), "Rate limit exceeded for 'cron', retry in 360s");
    }

    #[test]
    fn test_is_validation() {
        assert!(AppError::validation("month 13").is_validation());
        assert!(!AppError::config("missing").is_validation());
    }
}
