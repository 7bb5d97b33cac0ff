// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Document field names.
//!
//! ```text
//! attribute "title"          ─► craft_attribute_title
//! custom field "body" (id 12) ─► craft_field_12
//! ```
//!
//! The reverse lookup is memoized; call [`FieldNamer::clear`] after field
//! definitions change.

use dashmap::DashMap;
use std::sync::Arc;

use crate::schema::{ContentRegistry, FieldId};

#[derive(Debug, Clone)]
pub struct FieldNamer {
    prefix: String,
    registry: Arc<ContentRegistry>,
    reverse: Arc<DashMap<String, String>>,
}

impl FieldNamer {
    pub fn new(prefix: impl Into<String>, registry: Arc<ContentRegistry>) -> Self {
        Self {
            prefix: prefix.into(),
            registry,
            reverse: Arc::new(DashMap::new()),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn attribute_field(&self, handle: &str) -> String {
        format!("{}attribute_{}", self.prefix, handle)
    }

    #[must_use]
    pub fn custom_field(&self, id: FieldId) -> String {
        format!("{}field_{}", self.prefix, id)
    }

    /// Field name for an attribute or custom field handle. Custom fields win.
    #[must_use]
    pub fn map_attribute_to_field(&self, handle: &str) -> String {
        match self.registry.field_by_handle(handle) {
            Some(field) => self.custom_field(field.id),
            None => self.attribute_field(handle),
        }
    }

    /// Attribute or field handle for a document field name.
    #[must_use]
    pub fn map_field_to_attribute(&self, field_name: &str) -> String {
        if let Some(cached) = self.reverse.get(field_name) {
            return cached.clone();
        }

        let attribute_needle = format!("{}attribute_", self.prefix);
        let field_needle = format!("{}field_", self.prefix);

        let resolved = if let Some(handle) = field_name.strip_prefix(&attribute_needle) {
            handle.to_string()
        } else if let Some(raw_id) = field_name.strip_prefix(&field_needle) {
            let id = raw_id.parse::<FieldId>().unwrap_or(0);
            match self.registry.field_by_id(id) {
                Some(field) => field.handle,
                None => format!("field not found for ID {}", id),
            }
        } else {
            format!("Unknown field {}", field_name)
        };

        self.reverse.insert(field_name.to_string(), resolved.clone());
        resolved
    }

    /// Forget memoized reverse lookups.
    pub fn clear(&self) {
        self.reverse.clear();
    }
}
