// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Document writes through the collection alias.
//!
//! `upsert` is the only path that creates a collection implicitly.

use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::lifecycle::IndexLifecycle;
use super::types::BulkReport;
use crate::engine::traits::{BulkOperation, EngineError, SearchEngine};
use crate::error::Result;
use crate::metrics;
use crate::schema::ElementId;
use crate::search::CollectionKey;

/// One element's document: field name → normalized keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchDocument {
    pub id: ElementId,
    pub fields: BTreeMap<String, String>,
}

impl SearchDocument {
    pub fn new(id: ElementId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

pub struct DocumentWriter {
    engine: Arc<dyn SearchEngine>,
    lifecycle: Arc<IndexLifecycle>,
    max_result_window: usize,
}

impl std::fmt::Debug for DocumentWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentWriter")
            .field("max_result_window", &self.max_result_window)
            .finish()
    }
}

impl DocumentWriter {
    pub fn new(engine: Arc<dyn SearchEngine>, lifecycle: Arc<IndexLifecycle>, max_result_window: usize) -> Self {
        Self {
            engine,
            lifecycle,
            max_result_window,
        }
    }

    /// Write a document, creating the collection first if needed.
    pub async fn upsert(&self, document: &SearchDocument, key: &CollectionKey) -> Result<()> {
        self.lifecycle.ensure_exists(key).await?;
        let alias = self.lifecycle.aliases().index_name(key);

        match self
            .engine
            .index_document(&alias, &document.id.to_string(), &json!(document.fields))
            .await
        {
            Ok(()) => {
                debug!(collection = %alias, id = document.id, "Indexed document");
                metrics::record_document_write("upsert", "success");
                Ok(())
            }
            Err(e) => {
                warn!(collection = %alias, id = document.id, error = %e, "Failed to index document");
                metrics::record_document_write("upsert", "error");
                Err(e.into())
            }
        }
    }

    /// Remove a document. An absent document (or collection) counts as removed.
    pub async fn delete(&self, id: ElementId, key: &CollectionKey) -> Result<()> {
        let alias = self.lifecycle.aliases().index_name(key);
        match self.engine.delete_document(&alias, &id.to_string()).await {
            Ok(()) | Err(EngineError::NotFound(_)) => {
                metrics::record_document_write("delete", "success");
                Ok(())
            }
            Err(e) => {
                metrics::record_document_write("delete", "error");
                Err(e.into())
            }
        }
    }

    /// Delete many documents in one `_bulk` request. `None` when `ids` is empty.
    pub async fn bulk_delete(&self, ids: &[ElementId], key: &CollectionKey) -> Result<Option<BulkReport>> {
        if ids.is_empty() {
            return Ok(None);
        }
        let alias = self.lifecycle.aliases().index_name(key);
        let operations: Vec<BulkOperation> = ids
            .iter()
            .map(|id| BulkOperation::Delete {
                index: alias.clone(),
                id: id.to_string(),
            })
            .collect();

        let response = self.engine.bulk(&operations).await.inspect_err(|_| {
            metrics::record_document_write("bulk_delete", "error");
        })?;
        let report = BulkReport::from_items(response.took, &response.items);
        if report.failed > 0 {
            warn!(collection = %alias, failed = report.failed, items = report.items, "Bulk delete partially rejected");
            metrics::record_document_write("bulk_delete", "partial_failure");
        } else {
            metrics::record_document_write("bulk_delete", "success");
        }
        Ok(Some(report))
    }

    /// Every indexed element id, up to `max_result_window` of them.
    ///
    /// This is a single request; larger collections are truncated.
    pub async fn list_all_ids(&self, key: &CollectionKey) -> Result<Vec<ElementId>> {
        let alias = self.lifecycle.aliases().index_name(key);
        let body = json!({
            "query": { "match_all": {} },
            "stored_fields": [],
            "size": self.max_result_window,
        });
        let response = self.engine.search(&alias, &body).await?;
        if response.total > response.hits.len() as u64 {
            warn!(
                collection = %alias,
                total = response.total,
                returned = response.hits.len(),
                "Id listing truncated at the result window"
            );
        }

        Ok(response
            .hits
            .iter()
            .filter_map(|hit| match hit.id.parse::<ElementId>() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!(collection = %alias, id = %hit.id, "Skipping document with non-numeric id");
                    None
                }
            })
            .collect())
    }
}
