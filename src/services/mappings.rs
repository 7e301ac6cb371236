// src/services/mappings.rs

//! Curated legacy slug overrides.

use std::collections::HashMap;

use crate::models::Config;

/// Read-only table of human-curated `legacy slug -> current slug` overrides.
///
/// Built once at startup and shared behind an `Arc`; never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct KnownMappings {
    entries: HashMap<String, String>,
}

impl KnownMappings {
    /// Build a table from `(legacy, current)` pairs. Legacy keys are matched
    /// case-insensitively.
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (normalize(k.as_ref()), v.into()))
                .collect(),
        }
    }

    /// Build the table from the `[mappings]` section of the config.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.mappings.iter().map(|(k, v)| (k, v.clone())))
    }

    /// Current slug for a legacy slug, if curated.
    pub fn lookup(&self, legacy_slug: &str) -> Option<&str> {
        self.entries.get(&normalize(legacy_slug)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize(slug: &str) -> String {
    slug.trim().trim_matches('/').to_lowercase()
}
