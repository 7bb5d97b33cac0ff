// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Public types for the lifecycle and administration surface.

use serde::Serialize;
use serde_json::Value;

use crate::engine::traits::{CatAlias, CatIndex};
use crate::error::Result;
use crate::search::CollectionKey;

/// A concrete index belonging to a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Generation {
    pub name: String,
    /// Unix seconds from the name suffix
    pub timestamp: u64,
    /// Whether the collection alias points here
    pub bound: bool,
}

/// Outcome of a successful reindex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReindexReport {
    pub alias: String,
    pub old_index: String,
    pub new_index: String,
    /// Documents copied
    pub total: u64,
    /// Milliseconds the copy took
    pub took: u64,
}

/// Outcome of a clone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloneReport {
    /// Generation the data came from
    pub source_index: String,
    pub new_index: String,
    pub destination_alias: String,
}

/// Aliases and indexes visible on the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexListing {
    pub aliases: Vec<CatAlias>,
    pub indexes: Vec<CatIndex>,
}

/// Result of comparing the live mapping with the content model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MappingSync {
    InSync,
    /// New fields were pushed in place.
    Patched { added: Vec<String> },
    /// Fields disappeared from the content model. Only a reindex drops them.
    RequiresReindex { removed: Vec<String>, added: Vec<String> },
}

impl MappingSync {
    #[must_use]
    pub fn requires_reindex(&self) -> bool {
        matches!(self, Self::RequiresReindex { .. })
    }
}

/// Summary of a `_bulk` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    pub took: u64,
    /// Items in the request
    pub items: usize,
    /// Items the engine rejected. Deletes of absent documents are not failures.
    pub failed: usize,
}

impl BulkReport {
    pub(crate) fn from_items(took: u64, items: &[Value]) -> Self {
        let failed = items
            .iter()
            .filter_map(|item| item.as_object().and_then(|obj| obj.values().next()))
            .filter(|outcome| {
                let status = outcome.get("status").and_then(Value::as_u64).unwrap_or(0);
                outcome.get("error").is_some() || (status >= 300 && status != 404)
            })
            .count();
        Self {
            took,
            items: items.len(),
            failed,
        }
    }
}

/// One collection's result inside a batch operation.
#[derive(Debug)]
pub struct SiteOutcome<T> {
    pub collection: CollectionKey,
    pub result: Result<T>,
}

impl<T> SiteOutcome<T> {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}
