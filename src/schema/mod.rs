// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Content model registry.
//!
//! The content store owns element types and custom field definitions; this
//! crate only needs to know which attributes and fields are searchable.
//! Element types and fields are registered explicitly; nothing is
//! discovered through globals.
//!
//! # Example
//!
//! ```rust
//! use elastic_sync::schema::{ContentRegistry, ElementTypeSpec, FieldDefinition};
//!
//! let registry = ContentRegistry::new();
//! registry.register_element_type(ElementTypeSpec::new("entry", true, ["summary"]));
//! registry.register_field(FieldDefinition::new(12, "body", true));
//! registry.register_field(FieldDefinition::new(13, "internalNotes", false));
//!
//! assert_eq!(registry.searchable_fields().len(), 1);
//! assert_eq!(registry.field_by_handle("body").map(|f| f.id), Some(12));
//! ```
//!
//! # Design
//!
//! - **Discovery order preserved**: types and fields come back in registration order
//! - **Thread-safe**: Uses `parking_lot::RwLock`; reads vastly outnumber writes

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::error::Result;
use crate::search::naming::CollectionKey;

pub type ElementId = u64;
pub type FieldId = u64;

/// Capabilities of one element type (entries, categories, assets, ...).
pub trait ElementType: Send + Sync {
    fn handle(&self) -> &str;

    /// Whether elements of this type carry a title.
    fn has_titles(&self) -> bool;

    /// Attribute handles whose values are indexed.
    fn searchable_attributes(&self) -> Vec<String>;
}

/// Plain [`ElementType`] for hosts without their own type objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementTypeSpec {
    pub handle: String,
    pub has_titles: bool,
    pub searchable_attributes: Vec<String>,
}

impl ElementTypeSpec {
    pub fn new<I, S>(handle: impl Into<String>, has_titles: bool, searchable_attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            handle: handle.into(),
            has_titles,
            searchable_attributes: searchable_attributes.into_iter().map(Into::into).collect(),
        }
    }
}

impl ElementType for ElementTypeSpec {
    fn handle(&self) -> &str {
        &self.handle
    }

    fn has_titles(&self) -> bool {
        self.has_titles
    }

    fn searchable_attributes(&self) -> Vec<String> {
        self.searchable_attributes.clone()
    }
}

/// A custom field definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub id: FieldId,
    pub handle: String,
    pub searchable: bool,
}

impl FieldDefinition {
    pub fn new(id: FieldId, handle: impl Into<String>, searchable: bool) -> Self {
        Self {
            id,
            handle: handle.into(),
            searchable,
        }
    }
}

/// One element as handed over by the content store for indexing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub id: ElementId,
    pub site_id: u64,
    /// Handle of the registered [`ElementType`]
    pub element_type: String,
    /// Attribute values by handle (`title`, `slug`, ...)
    pub attributes: BTreeMap<String, String>,
    /// Keyword text of the layout's custom fields by field id
    pub field_values: BTreeMap<FieldId, String>,
}

impl Element {
    pub fn new(id: ElementId, site_id: u64, element_type: impl Into<String>) -> Self {
        Self {
            id,
            site_id,
            element_type: element_type.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, handle: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(handle.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, field_id: FieldId, value: impl Into<String>) -> Self {
        self.field_values.insert(field_id, value.into());
        self
    }
}

/// The content store's view of a site's elements.
///
/// Feeds bulk indexing, the catch-up reindex after a migration, and the
/// orphaned-document sweep.
#[async_trait]
pub trait ElementSource: Send + Sync {
    /// Elements of the collection's site. With `updated_since`, only those
    /// updated at or after that instant.
    async fn elements(&self, key: &CollectionKey, updated_since: Option<DateTime<Utc>>) -> Result<Vec<Element>>;

    async fn existing_ids(&self, key: &CollectionKey) -> Result<HashSet<ElementId>> {
        Ok(self.elements(key, None).await?.into_iter().map(|e| e.id).collect())
    }
}

#[derive(Default)]
pub struct ContentRegistry {
    element_types: RwLock<Vec<Arc<dyn ElementType>>>,
    fields: RwLock<Vec<FieldDefinition>>,
}

impl std::fmt::Debug for ContentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentRegistry")
            .field(
                "element_types",
                &self.element_types.read().iter().map(|t| t.handle().to_string()).collect::<Vec<_>>(),
            )
            .field("fields", &*self.fields.read())
            .finish()
    }
}

impl ContentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element type, replacing one with the same handle.
    pub fn register_element_type(&self, element_type: impl ElementType + 'static) {
        let element_type: Arc<dyn ElementType> = Arc::new(element_type);
        let mut types = self.element_types.write();
        match types.iter().position(|t| t.handle() == element_type.handle()) {
            Some(pos) => types[pos] = element_type,
            None => types.push(element_type),
        }
    }

    #[must_use]
    pub fn element_types(&self) -> Vec<Arc<dyn ElementType>> {
        self.element_types.read().clone()
    }

    #[must_use]
    pub fn element_type(&self, handle: &str) -> Option<Arc<dyn ElementType>> {
        self.element_types
            .read()
            .iter()
            .find(|t| t.handle() == handle)
            .cloned()
    }

    /// Register or update a field definition (matched by id).
    pub fn register_field(&self, field: FieldDefinition) {
        let mut fields = self.fields.write();
        match fields.iter().position(|f| f.id == field.id) {
            Some(pos) => fields[pos] = field,
            None => fields.push(field),
        }
    }

    /// Returns `true` if the field was registered.
    pub fn remove_field(&self, id: FieldId) -> bool {
        let mut fields = self.fields.write();
        let before = fields.len();
        fields.retain(|f| f.id != id);
        fields.len() != before
    }

    #[must_use]
    pub fn fields(&self) -> Vec<FieldDefinition> {
        self.fields.read().clone()
    }

    #[must_use]
    pub fn searchable_fields(&self) -> Vec<FieldDefinition> {
        self.fields.read().iter().filter(|f| f.searchable).cloned().collect()
    }

    #[must_use]
    pub fn field_by_id(&self, id: FieldId) -> Option<FieldDefinition> {
        self.fields.read().iter().find(|f| f.id == id).cloned()
    }

    #[must_use]
    pub fn field_by_handle(&self, handle: &str) -> Option<FieldDefinition> {
        self.fields.read().iter().find(|f| f.handle == handle).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_element_type_replaces_by_handle() {
        let registry = ContentRegistry::new();
        registry.register_element_type(ElementTypeSpec::new("entry", true, ["summary"]));
        registry.register_element_type(ElementTypeSpec::new("asset", false, ["filename", "extension"]));
        registry.register_element_type(ElementTypeSpec::new("entry", true, ["summary", "teaser"]));

        let types = registry.element_types();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].handle(), "entry");
        assert_eq!(types[0].searchable_attributes(), vec!["summary", "teaser"]);
        assert!(!registry.element_type("asset").unwrap().has_titles());
    }

    #[test]
    fn test_fields_keep_registration_order() {
        let registry = ContentRegistry::new();
        registry.register_field(FieldDefinition::new(3, "body", true));
        registry.register_field(FieldDefinition::new(1, "intro", true));
        registry.register_field(FieldDefinition::new(2, "secret", false));

        let ids: Vec<_> = registry.searchable_fields().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_update_and_remove_field() {
        let registry = ContentRegistry::new();
        registry.register_field(FieldDefinition::new(7, "body", false));
        registry.register_field(FieldDefinition::new(7, "body", true));
        assert_eq!(registry.fields().len(), 1);
        assert!(registry.field_by_id(7).unwrap().searchable);

        assert!(registry.remove_field(7));
        assert!(!registry.remove_field(7));
        assert!(registry.field_by_handle("body").is_none());
    }

    #[test]
    fn test_element_builder() {
        let element = Element::new(42, 1, "entry")
            .with_attribute("title", "Hello")
            .with_field(12, "Body text");
        assert_eq!(element.attributes["title"], "Hello");
        assert_eq!(element.field_values[&12], "Body text");
    }
}
