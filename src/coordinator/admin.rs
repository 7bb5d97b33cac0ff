// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Per-site administration.
//!
//! Each operation runs over a list of collections and returns one
//! [`SiteOutcome`] per collection. A failing collection is logged and
//! reported; the batch carries on with the next one.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::documents::DocumentWriter;
use super::indexing::ElementIndexer;
use super::lifecycle::IndexLifecycle;
use super::types::{BulkReport, ReindexReport, SiteOutcome};
use crate::engine::traits::IndexStats;
use crate::error::Result;
use crate::metrics;
use crate::schema::{ElementId, ElementSource};
use crate::search::{CollectionKey, FieldNamer, MappingSignature};

pub struct SiteAdmin {
    lifecycle: Arc<IndexLifecycle>,
    writer: Arc<DocumentWriter>,
    indexer: Arc<ElementIndexer>,
    namer: FieldNamer,
}

impl std::fmt::Debug for SiteAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteAdmin").finish_non_exhaustive()
    }
}

impl SiteAdmin {
    pub fn new(
        lifecycle: Arc<IndexLifecycle>,
        writer: Arc<DocumentWriter>,
        indexer: Arc<ElementIndexer>,
        namer: FieldNamer,
    ) -> Self {
        Self {
            lifecycle,
            writer,
            indexer,
            namer,
        }
    }

    async fn for_each<'a, T, F, Fut>(&'a self, operation: &str, keys: &'a [CollectionKey], op: F) -> Vec<SiteOutcome<T>>
    where
        F: Fn(&'a CollectionKey) -> Fut,
        Fut: Future<Output = Result<T>> + 'a,
    {
        let mut outcomes = Vec::with_capacity(keys.len());
        for key in keys {
            let result = op(key).await;
            match &result {
                Ok(_) => info!(operation, site = %key.handle, "Site operation complete"),
                Err(e) => warn!(operation, site = %key.handle, error = %e, "Site operation failed"),
            }
            metrics::record_admin_outcome(operation, result.is_ok());
            outcomes.push(SiteOutcome {
                collection: key.clone(),
                result,
            });
        }
        outcomes
    }

    pub async fn stats(&self, keys: &[CollectionKey]) -> Vec<SiteOutcome<IndexStats>> {
        self.for_each("stats", keys, |key| self.lifecycle.stats(key)).await
    }

    pub async fn reindex(&self, keys: &[CollectionKey]) -> Vec<SiteOutcome<ReindexReport>> {
        self.for_each("reindex", keys, |key| self.lifecycle.reindex(key)).await
    }

    /// Delete whole collections, or only their unbound generations.
    pub async fn delete(&self, keys: &[CollectionKey], orphaned_only: bool) -> Vec<SiteOutcome<Vec<String>>> {
        if orphaned_only {
            self.for_each("delete_orphaned", keys, |key| self.lifecycle.delete_orphaned(key))
                .await
        } else {
            self.for_each("delete", keys, |key| self.lifecycle.delete_collection(key))
                .await
        }
    }

    /// Push the current mapping to every collection.
    pub async fn update_mapping(&self, keys: &[CollectionKey]) -> Vec<SiteOutcome<MappingSignature>> {
        self.for_each("update_mapping", keys, |key| self.lifecycle.update_mapping_in_place(key))
            .await
    }

    /// An indexed document as (attribute handle, value) rows.
    pub async fn source(&self, id: ElementId, keys: &[CollectionKey]) -> Vec<SiteOutcome<Vec<(String, Value)>>> {
        self.for_each("source", keys, move |key| async move {
            let source = self.lifecycle.source_of(id, key).await?;
            Ok(source
                .as_object()
                .map(|fields| {
                    fields
                        .iter()
                        .map(|(field, value)| (self.namer.map_field_to_attribute(field), value.clone()))
                        .collect()
                })
                .unwrap_or_default())
        })
        .await
    }

    /// Index every element of each site, or with `since` only the elements
    /// updated at or after it (catch-up after a migration).
    ///
    /// Elements of unregistered types, and of types with neither titles nor
    /// searchable attributes, are skipped. The outcome is the number indexed;
    /// the first failing element fails that site.
    pub async fn index_elements(
        &self,
        keys: &[CollectionKey],
        elements: &dyn ElementSource,
        since: Option<DateTime<Utc>>,
    ) -> Vec<SiteOutcome<usize>> {
        self.for_each("index_elements", keys, move |key| async move {
            let found = elements.elements(key, since).await?;
            let total = found.len();
            let mut indexed = 0;
            for element in &found {
                if !self.indexer.is_indexable(element) {
                    debug!(id = element.id, element_type = %element.element_type, "Skipping element without searchable content");
                    continue;
                }
                self.indexer.index_element(element, key).await?;
                indexed += 1;
            }
            info!(site = %key.handle, indexed, total, "Indexed site elements");
            Ok(indexed)
        })
        .await
    }

    /// Remove documents whose element no longer exists in `elements`.
    pub async fn delete_orphaned_documents(
        &self,
        keys: &[CollectionKey],
        elements: &dyn ElementSource,
    ) -> Vec<SiteOutcome<Option<BulkReport>>> {
        self.for_each("delete_orphaned_documents", keys, move |key| async move {
            let existing = elements.existing_ids(key).await?;
            let orphaned: Vec<ElementId> = self
                .writer
                .list_all_ids(key)
                .await?
                .into_iter()
                .filter(|id| !existing.contains(id))
                .collect();
            if !orphaned.is_empty() {
                info!(site = %key.handle, count = orphaned.len(), "Deleting orphaned documents");
            }
            self.writer.bulk_delete(&orphaned, key).await
        })
        .await
    }
}
