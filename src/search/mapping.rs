// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Mapping Builder
//!
//! Derives the index mapping from the content model and the per-locale
//! analyzer settings.
//!
//! # Mapping Layout
//!
//! ```text
//! craft_attribute_title     text  (standard)   ┐
//! craft_attribute_slug      text  (standard)   ├ predefined
//! craft_attribute_postDate  date               ┘
//! craft_attribute_<handle>  text  (standard)   ← element types' searchable attributes
//! craft_field_<id>          text  (standard)   ← searchable custom fields
//! ```
//!
//! The mapping signature (sorted field names) is what drift detection
//! compares; types never change in place.

use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::fields::FieldNamer;
use super::naming::CollectionKey;
use crate::schema::ContentRegistry;

/// Analyzer used for every text field.
pub const STANDARD_ANALYZER: &str = "standard";

/// Field type in the mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    /// Full-text field with an analyzer
    Text { analyzer: String },
    Date,
}

impl FieldSpec {
    #[must_use]
    pub fn text() -> Self {
        FieldSpec::Text {
            analyzer: STANDARD_ANALYZER.to_string(),
        }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            FieldSpec::Text { analyzer } => json!({"type": "text", "analyzer": analyzer}),
            FieldSpec::Date => json!({"type": "date"}),
        }
    }
}

/// Ordered field name → type spec. Names are unique; first definition wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    fields: Vec<(String, FieldSpec)>,
}

impl Mapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the name was already present.
    pub fn insert(&mut self, name: impl Into<String>, spec: FieldSpec) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.fields.push((name, spec));
        true
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// Field names in discovery order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `properties` object for create-index and put-mapping bodies.
    #[must_use]
    pub fn to_properties(&self) -> Value {
        let props: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, spec)| (name.clone(), spec.to_json()))
            .collect();
        Value::Object(props)
    }

    #[must_use]
    pub fn signature(&self) -> MappingSignature {
        MappingSignature::from_names(self.names())
    }
}

/// Sorted, deduplicated set of field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MappingSignature(Vec<String>);

impl MappingSignature {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        Self(set.into_iter().collect())
    }

    /// Signature of a live `properties` object.
    #[must_use]
    pub fn from_properties(properties: &Value) -> Self {
        match properties.as_object() {
            Some(obj) => Self::from_names(obj.keys().cloned()),
            None => Self::default(),
        }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.binary_search_by(|n| n.as_str().cmp(name)).is_ok()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// What changes going from `self` (current) to `desired`.
    #[must_use]
    pub fn diff(&self, desired: &MappingSignature) -> SignatureDiff {
        SignatureDiff {
            added: desired.0.iter().filter(|n| !self.contains(n)).cloned().collect(),
            removed: self.0.iter().filter(|n| !desired.contains(n)).cloned().collect(),
        }
    }
}

/// Field-name delta between the indexed and the desired mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureDiff {
    /// In the content model but not yet in the index. Patchable in place.
    pub added: Vec<String>,
    /// In the index but gone from the content model. Needs a reindex.
    pub removed: Vec<String>,
}

impl SignatureDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    #[must_use]
    pub fn requires_reindex(&self) -> bool {
        !self.removed.is_empty()
    }
}

/// ISO-639-1 code → Elasticsearch language name.
#[must_use]
pub fn elastic_language(iso_code: &str) -> Option<&'static str> {
    let language = match iso_code {
        "ar" => "arabic",
        "bg" => "bulgarian",
        "bn" => "bengali",
        "ca" => "catalan",
        "cs" => "czech",
        "da" => "danish",
        "de" => "german",
        "el" => "greek",
        "en" => "english",
        "es" => "spanish",
        "eu" => "basque",
        "fa" => "persian",
        "fi" => "finnish",
        "fr" => "french",
        "ga" => "irish",
        "gl" => "galician",
        "hi" => "hindi",
        "hu" => "hungarian",
        "hy" => "armenian",
        "id" => "indonesian",
        "it" => "italian",
        "ja" | "ko" | "zh" => "cjk",
        "lt" => "lithuanian",
        "lv" => "latvian",
        "nb" => "norwegian",
        "nl" => "dutch",
        "pt" => "portuguese",
        "ro" => "romanian",
        "ru" => "russian",
        "sv" => "swedish",
        "th" => "thai",
        "tr" => "turkish",
        _ => return None,
    };
    Some(language)
}

#[derive(Debug, Clone)]
pub struct MappingBuilder {
    registry: Arc<ContentRegistry>,
    namer: FieldNamer,
}

impl MappingBuilder {
    pub fn new(registry: Arc<ContentRegistry>, namer: FieldNamer) -> Self {
        Self { registry, namer }
    }

    /// Mapping for the current content model.
    #[must_use]
    pub fn build_mapping(&self) -> Mapping {
        let mut mapping = Mapping::new();

        mapping.insert(self.namer.attribute_field("title"), FieldSpec::text());
        mapping.insert(self.namer.attribute_field("slug"), FieldSpec::text());
        mapping.insert(self.namer.attribute_field("postDate"), FieldSpec::Date);

        for element_type in self.registry.element_types() {
            for attribute in element_type.searchable_attributes() {
                mapping.insert(self.namer.attribute_field(&attribute), FieldSpec::text());
            }
        }

        for field in self.registry.searchable_fields() {
            mapping.insert(self.namer.custom_field(field.id), FieldSpec::text());
        }

        mapping
    }

    /// Stopword list for the collection's locale, e.g. `_english_`.
    #[must_use]
    pub fn stopwords(&self, key: &CollectionKey) -> String {
        format!("_{}_", elastic_language(&key.language_id()).unwrap_or("none"))
    }

    /// Index settings with the `standard_stopwords` analyzer.
    #[must_use]
    pub fn build_analyzer_settings(&self, key: &CollectionKey) -> Value {
        json!({
            "analysis": {
                "analyzer": {
                    "standard_stopwords": {
                        "type": "standard",
                        "stopwords": self.stopwords(key),
                    }
                }
            }
        })
    }

    /// Language analyzer name for the collection's locale, `standard` when unmapped.
    #[must_use]
    pub fn analyzer_language(&self, key: &CollectionKey) -> &'static str {
        elastic_language(&key.language_id()).unwrap_or(STANDARD_ANALYZER)
    }

    /// Body for creating a generation: settings plus mapping.
    #[must_use]
    pub fn create_index_body(&self, key: &CollectionKey, mapping: &Mapping) -> Value {
        json!({
            "settings": self.build_analyzer_settings(key),
            "mappings": { "properties": mapping.to_properties() },
        })
    }
}

/// Signature of a mapping.
#[must_use]
pub fn signature_of(mapping: &Mapping) -> MappingSignature {
    mapping.signature()
}
