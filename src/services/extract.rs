// src/services/extract.rs

//! Outbound link extraction from rendered post bodies.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::CheckerConfig;
use crate::utils::text::normalize_whitespace;
use crate::utils::{host_matches, resolve_url};

/// A unique link found in a post body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    pub url: String,
    /// Text around the first occurrence of the link
    pub context: String,
}

/// Finds checkable `<a href>` targets in post HTML.
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    selector: Selector,
    base: Option<Url>,
    ignored_hosts: Vec<String>,
    context_chars: usize,
}

impl LinkExtractor {
    pub fn from_config(config: &CheckerConfig) -> Result<Self> {
        let selector = Selector::parse("a[href]")
            .map_err(|e| AppError::config(format!("invalid link selector: {e:?}")))?;
        let base = config
            .site_base_url
            .as_deref()
            .map(Url::parse)
            .transpose()?;

        Ok(Self {
            selector,
            base,
            ignored_hosts: config.ignored_hosts.clone(),
            context_chars: config.context_chars,
        })
    }

    /// Unique http(s) links in document order, fragments stripped.
    pub fn extract(&self, html: &str) -> Vec<ExtractedLink> {
        let document = Html::parse_fragment(html);
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for anchor in document.select(&self.selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Some(url) = self.normalize(href) else {
                continue;
            };
            if seen.insert(url.clone()) {
                links.push(ExtractedLink {
                    context: self.context_for(anchor),
                    url,
                });
            }
        }

        links
    }

    fn normalize(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        let mut url = match Url::parse(href) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                resolve_url(self.base.as_ref()?, href)?
            }
            Err(e) => {
                log::debug!("Skipping unparseable href {:?}: {}", href, e);
                return None;
            }
        };

        // mailto:, tel:, javascript:, data: and friends
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }

        let host = url.host_str()?.to_lowercase();
        if self.ignored_hosts.iter().any(|d| host_matches(&host, d)) {
            return None;
        }

        url.set_fragment(None);
        Some(url.to_string())
    }

    fn context_for(&self, anchor: ElementRef<'_>) -> String {
        let anchor_text = normalize_whitespace(&anchor.text().collect::<String>());
        let parent_text = anchor
            .parent()
            .and_then(ElementRef::wrap)
            .map(|p| normalize_whitespace(&p.text().collect::<String>()))
            .unwrap_or_default();

        if parent_text.is_empty() {
            return excerpt(&anchor_text, &anchor_text, self.context_chars);
        }
        excerpt(&parent_text, &anchor_text, self.context_chars)
    }
}

/// Window of at most `max_chars` characters of `text`, centred on `needle`.
fn excerpt(text: &str, needle: &str, max_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return text.to_string();
    }

    let needle_start = if needle.is_empty() {
        0
    } else {
        text.find(needle)
            .map(|byte| text[..byte].chars().count())
            .unwrap_or(0)
    };
    let padding = max_chars.saturating_sub(needle.chars().count()) / 2;
    let end = (needle_start.saturating_sub(padding) + max_chars).min(chars.len());
    let start = end.saturating_sub(max_chars);

    let mut out = String::new();
    if start > 0 {
        out.push_str("...");
    }
    out.extend(&chars[start..end]);
    if end < chars.len() {
        out.push_str("...");
    }
    out
}
