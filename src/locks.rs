// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Process-wide keyed try-locks.
//!
//! Indexing one element deletes its document and writes it again; two
//! workers doing that concurrently for the same (element, site) could
//! interleave. The loser of [`KeyedLocks::try_acquire`] skips its write.
//!
//! ```text
//! worker A: try_acquire("searchindex:42:1") ─► Some(guard) ─► delete ─► write ─► drop(guard)
//! worker B: try_acquire("searchindex:42:1") ─► None ─► return Ok(true)
//! ```

use dashmap::DashSet;
use std::sync::Arc;

/// Lock key for indexing one element in one site.
#[must_use]
pub fn document_lock_key(element_id: u64, site_id: u64) -> String {
    format!("searchindex:{}:{}", element_id, site_id)
}

#[derive(Debug, Clone, Default)]
pub struct KeyedLocks {
    held: Arc<DashSet<String>>,
}

/// Releases its key on drop.
#[derive(Debug)]
pub struct KeyedLockGuard {
    held: Arc<DashSet<String>>,
    key: String,
}

impl KeyedLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock without waiting. `None` when someone else holds it.
    #[must_use]
    pub fn try_acquire(&self, key: impl Into<String>) -> Option<KeyedLockGuard> {
        let key = key.into();
        if self.held.insert(key.clone()) {
            Some(KeyedLockGuard {
                held: Arc::clone(&self.held),
                key,
            })
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_held(&self, key: &str) -> bool {
        self.held.contains(key)
    }

    #[must_use]
    pub fn held_count(&self) -> usize {
        self.held.len()
    }
}

impl KeyedLockGuard {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyedLockGuard {
    fn drop(&mut self) {
        self.held.remove(&self.key);
    }
}
