// src/utils/log.rs

//! Console output for the CLI pipelines.
//!
//! Library code logs through the `log` facade. These helpers print the
//! human-readable report lines a person running the CLI reads on stderr.

use chrono::Local;

use crate::models::LinkCheckResult;

const RULE_WIDTH: usize = 60;

/// Leading tag on every console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Plain,
    Ok,
    Warn,
    Fail,
}

impl Mark {
    fn tag(self) -> &'static str {
        match self {
            Mark::Plain => "  ",
            Mark::Ok => "✓ ",
            Mark::Warn => "! ",
            Mark::Fail => "✗ ",
        }
    }
}

fn render(mark: Mark, message: &str) -> String {
    format!(
        "[{}] {}{}",
        Local::now().format("%H:%M:%S"),
        mark.tag(),
        message
    )
}

fn emit(mark: Mark, message: &str) {
    eprintln!("{}", render(mark, message));
}

pub fn success(message: &str) {
    emit(Mark::Ok, message);
}

pub fn warn(message: &str) {
    emit(Mark::Warn, message);
}

pub fn error(message: &str) {
    emit(Mark::Fail, message);
}

/// Title between two rules.
pub fn header(title: &str) {
    let rule = "═".repeat(RULE_WIDTH);
    emit(Mark::Plain, &rule);
    emit(Mark::Plain, title);
    emit(Mark::Plain, &rule);
}

pub fn sub_item(message: &str) {
    emit(Mark::Plain, &format!("    {}", message));
}

/// Aligned `key: value` rows under a title.
pub fn summary(title: &str, items: &[(&str, String)]) {
    emit(Mark::Plain, &format!("{}:", title));
    let width = items.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    for (key, value) in items {
        emit(Mark::Plain, &format!("    {:<width$}  {}", key, value));
    }
}

/// Print one dead link found in a post.
pub fn dead_link(result: &LinkCheckResult) {
    emit(Mark::Fail, &dead_link_line(result));
}

/// `url [reason] in /slug/`, with the archive copy appended when known.
pub fn dead_link_line(result: &LinkCheckResult) -> String {
    let reason = match (result.status, &result.error) {
        (Some(status), _) => format!("HTTP {}", status),
        (None, Some(error)) => error.clone(),
        (None, None) => "unreachable".to_string(),
    };
    let mut line = format!("{} [{}] in /{}/", result.url, reason, result.post_slug);
    if result.retryable {
        line.push_str(" (retryable)");
    }
    if let Some(archive) = &result.archive_url {
        line.push_str(&format!(" -> {}", archive));
    }
    line
}
