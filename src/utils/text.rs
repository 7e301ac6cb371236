// src/utils/text.rs

//! Tokenizing and similarity helpers shared by the resolver and the catalog.

use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;

/// Split a slug on hyphens into lowercase tokens.
pub fn slug_tokens(slug: &str) -> HashSet<String> {
    slug.split('-')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Unicode-aware lowercase word tokens of free text.
pub fn word_tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .unicode_words()
        .map(String::from)
        .collect()
}

/// Word tokens with short words and stopwords removed, in order of appearance.
pub fn search_tokens(text: &str, min_len: usize) -> Vec<String> {
    text.to_lowercase()
        .unicode_words()
        .filter(|word| word.chars().count() >= min_len)
        .filter(|word| !is_stopword(word))
        .map(String::from)
        .collect()
}

/// Jaccard overlap `|a ∩ b| / |a ∪ b|`, zero when both sets are empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Collapse runs of whitespace into single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_stopword(word: &str) -> bool {
    const STOPWORDS: &[&str] = &[
        "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
        "do", "does", "did", "will", "would", "could", "should", "may", "might", "can", "must",
        "shall", "of", "to", "in", "for", "on", "with", "at", "by", "from", "as", "or", "and",
        "but", "if", "then", "so", "than",
    ];
    STOPWORDS.contains(&word)
}
