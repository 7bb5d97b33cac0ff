// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Index naming.
//!
//! ```text
//! alias       craftcms_en                 (index_name prefix + "_" + site handle, lowercase)
//! generation  craftcms_en_1700000000      (alias + "_" + unix seconds)
//! pattern     craftcms_en_*
//! ```
//!
//! The generation suffix must be all digits, so `craftcms_en_gb_1700000000`
//! is not a generation of `craftcms_en` even though the pattern matches it.

use serde::{Deserialize, Serialize};

pub type SiteId = u64;

/// One searchable collection: a site and its locale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionKey {
    pub site_id: SiteId,
    pub handle: String,
    /// Locale, e.g. "en-US" or "de"
    pub language: String,
}

impl CollectionKey {
    pub fn new(site_id: SiteId, handle: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            site_id,
            handle: handle.into(),
            language: language.into(),
        }
    }

    /// ISO-639-1 part of the locale, lowercase ("en-US" → "en").
    #[must_use]
    pub fn language_id(&self) -> String {
        self.language
            .split(|c| c == '-' || c == '_')
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }
}

/// Names beginning with `.` belong to the cluster itself.
#[must_use]
pub fn is_system_name(name: &str) -> bool {
    name.starts_with('.')
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNaming {
    prefix: String,
}

impl IndexNaming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Alias name of a collection.
    #[must_use]
    pub fn index_name(&self, key: &CollectionKey) -> String {
        format!("{}_{}", self.prefix, key.handle).to_lowercase()
    }

    #[must_use]
    pub fn generation_name(&self, key: &CollectionKey, timestamp: u64) -> String {
        format!("{}_{}", self.index_name(key), timestamp)
    }

    #[must_use]
    pub fn generation_pattern(&self, key: &CollectionKey) -> String {
        format!("{}_*", self.index_name(key))
    }

    /// Creation timestamp of a generation of this collection.
    #[must_use]
    pub fn generation_timestamp(&self, key: &CollectionKey, index: &str) -> Option<u64> {
        let alias = self.index_name(key);
        let suffix = index.strip_prefix(&alias)?.strip_prefix('_')?;
        if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        suffix.parse().ok()
    }

    #[must_use]
    pub fn is_generation_of(&self, key: &CollectionKey, index: &str) -> bool {
        self.generation_timestamp(key, index).is_some()
    }
}
