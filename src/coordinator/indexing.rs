// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Element indexing.
//!
//! ```text
//! index_element(element)
//!       │
//!       ├─→ try-lock searchindex:<id>:<site>  ── held elsewhere? → Ok(true), nothing written
//!       ├─→ delete current document
//!       ├─→ collect keywords
//!       │     searchable attributes + slug (+ title)   → craft_attribute_<handle>
//!       │     searchable custom fields with a value    → craft_field_<id>
//!       ├─→ normalize keywords
//!       └─→ upsert
//! ```

use std::sync::Arc;
use tracing::debug;

use super::documents::{DocumentWriter, SearchDocument};
use crate::error::{ElasticError, Result};
use crate::locks::{document_lock_key, KeyedLocks};
use crate::metrics;
use crate::schema::{ContentRegistry, Element};
use crate::search::{CollectionKey, FieldNamer};

/// Lowercase, punctuation to spaces, whitespace collapsed.
#[must_use]
pub fn normalize_keywords(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .flat_map(char::to_lowercase)
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub struct ElementIndexer {
    registry: Arc<ContentRegistry>,
    namer: FieldNamer,
    writer: Arc<DocumentWriter>,
    locks: KeyedLocks,
}

impl std::fmt::Debug for ElementIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementIndexer")
            .field("held_locks", &self.locks.held_count())
            .finish()
    }
}

impl ElementIndexer {
    pub fn new(registry: Arc<ContentRegistry>, namer: FieldNamer, writer: Arc<DocumentWriter>, locks: KeyedLocks) -> Self {
        Self {
            registry,
            namer,
            writer,
            locks,
        }
    }

    #[must_use]
    pub fn locks(&self) -> &KeyedLocks {
        &self.locks
    }

    /// Whether the element's type is registered and has anything to index.
    #[must_use]
    pub fn is_indexable(&self, element: &Element) -> bool {
        self.registry
            .element_type(&element.element_type)
            .is_some_and(|t| t.has_titles() || !t.searchable_attributes().is_empty())
    }

    /// The document an element would be indexed as.
    pub fn build_document(&self, element: &Element) -> Result<SearchDocument> {
        let element_type = self
            .registry
            .element_type(&element.element_type)
            .ok_or_else(|| ElasticError::NotFound(format!("element type [{}]", element.element_type)))?;

        let mut attributes = element_type.searchable_attributes();
        attributes.push("slug".to_string());
        if element_type.has_titles() {
            attributes.push("title".to_string());
        }

        let mut document = SearchDocument::new(element.id);
        for handle in attributes {
            let raw = element.attributes.get(&handle).map(String::as_str).unwrap_or_default();
            document
                .fields
                .entry(self.namer.attribute_field(&handle))
                .or_insert_with(|| normalize_keywords(raw));
        }
        for field in self.registry.searchable_fields() {
            if let Some(raw) = element.field_values.get(&field.id) {
                document
                    .fields
                    .insert(self.namer.custom_field(field.id), normalize_keywords(raw));
            }
        }
        Ok(document)
    }

    /// Re-index one element. Returns `true`, also when another worker holds
    /// the element's lock and this call wrote nothing.
    pub async fn index_element(&self, element: &Element, key: &CollectionKey) -> Result<bool> {
        let lock_key = document_lock_key(element.id, element.site_id);
        let Some(_guard) = self.locks.try_acquire(lock_key.as_str()) else {
            debug!(lock = %lock_key, "Element is being indexed elsewhere, skipping");
            metrics::record_lock_contention();
            return Ok(true);
        };

        let document = self.build_document(element)?;
        self.writer.delete(element.id, key).await?;
        self.writer.upsert(&document, key).await?;
        debug!(id = element.id, fields = document.fields.len(), "Indexed element");
        Ok(true)
    }
}
