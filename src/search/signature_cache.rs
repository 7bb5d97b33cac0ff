// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Mapping Signature Cache
//!
//! Remembers the field-name signature last pushed to each collection's
//! index so drift checks don't have to fetch the live mapping.
//!
//! # Flow
//!
//! ```text
//! ensure_mapping_in_sync(key)
//!       │
//!       ▼
//! ┌─────────────────────────────┐
//! │  Cache lookup (site id)     │
//! └─────────────────────────────┘
//!       │
//!       ├─→ Hit  → compare with freshly built signature
//!       │
//!       └─→ Miss → GET _mapping, compare
//!
//! update_mapping_in_place / reindex / ensure_exists → insert(new signature)
//! ```
//!
//! Entries never expire; only the mapping-update path refreshes them.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::mapping::MappingSignature;
use super::naming::{CollectionKey, SiteId};
use crate::metrics;

/// Signature cache keyed by collection
#[derive(Debug, Default)]
pub struct SignatureCache {
    entries: DashMap<SiteId, MappingSignature>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct SignatureCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entry_count: usize,
    /// Hit rate (0.0 - 1.0)
    pub hit_rate: f64,
}

impl SignatureCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CollectionKey) -> Option<MappingSignature> {
        match self.entries.get(&key.site_id) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::record_signature_cache(true);
                Some(entry.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                metrics::record_signature_cache(false);
                None
            }
        }
    }

    pub fn insert(&self, key: &CollectionKey, signature: MappingSignature) {
        self.entries.insert(key.site_id, signature);
        metrics::set_signature_cache_entries(self.entries.len());
    }

    pub fn invalidate(&self, key: &CollectionKey) {
        self.entries.remove(&key.site_id);
        metrics::set_signature_cache_entries(self.entries.len());
    }

    pub fn clear(&self) {
        self.entries.clear();
        metrics::set_signature_cache_entries(0);
    }

    pub fn stats(&self) -> SignatureCacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        SignatureCacheStats {
            hits,
            misses,
            entry_count: self.entries.len(),
            hit_rate: if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(site_id: SiteId) -> CollectionKey {
        CollectionKey::new(site_id, format!("site{}", site_id), "en")
    }

    #[test]
    fn test_cache_hit() {
        let cache = SignatureCache::new();
        let sig = MappingSignature::from_names(["craft_attribute_title"]);
        cache.insert(&key(1), sig.clone());

        assert_eq!(cache.get(&key(1)), Some(sig));
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_cache_miss_and_invalidate() {
        let cache = SignatureCache::new();
        assert!(cache.get(&key(1)).is_none());

        cache.insert(&key(1), MappingSignature::default());
        cache.invalidate(&key(1));
        assert!(cache.get(&key(1)).is_none());
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_collections_are_independent() {
        let cache = SignatureCache::new();
        cache.insert(&key(1), MappingSignature::from_names(["a"]));
        cache.insert(&key(2), MappingSignature::from_names(["b"]));

        assert_eq!(cache.get(&key(1)).unwrap().names(), &["a".to_string()]);
        assert_eq!(cache.get(&key(2)).unwrap().names(), &["b".to_string()]);
        assert_eq!(cache.stats().entry_count, 2);

        cache.clear();
        assert_eq!(cache.stats().entry_count, 0);
    }

    #[test]
    fn test_hit_rate() {
        let cache = SignatureCache::new();
        cache.insert(&key(1), MappingSignature::default());
        cache.get(&key(1));
        cache.get(&key(1));
        cache.get(&key(1));
        cache.get(&key(9));

        assert!((cache.stats().hit_rate - 0.75).abs() < 0.01);
    }
}
