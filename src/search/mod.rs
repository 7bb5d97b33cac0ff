// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search Infrastructure
//!
//! Naming, mapping and query translation for Elasticsearch collections.
//!
//! # Architecture
//!
//! ```text
//! ContentRegistry ──► MappingBuilder ──► Mapping / MappingSignature ──► SignatureCache
//!                          │
//!                     FieldNamer (attribute ⇄ field name)
//!                          │
//! "user query" ──► SearchQuery::parse ──► QueryTranslator ──► SearchRequest ──► QueryHook*
//! ```
//!
//! # Query Language
//!
//! ```text
//! +salad            - Required term
//! -salad            - Excluded term
//! field:salad       - Field-scoped term
//! "green salad"     - Phrase
//! *sal*             - Wildcards
//! field^3           - Boosted field (in the fields list)
//! ```

pub mod fields;
pub mod hooks;
pub mod mapping;
pub mod naming;
pub mod signature_cache;
pub mod tokens;
pub mod translator;

pub use fields::FieldNamer;
pub use hooks::{QueryHook, SearchEvent, SearchObserver};
pub use mapping::{
    elastic_language, signature_of, FieldSpec, Mapping, MappingBuilder, MappingSignature, SignatureDiff,
};
pub use naming::{is_system_name, CollectionKey, IndexNaming, SiteId};
pub use signature_cache::{SignatureCache, SignatureCacheStats};
pub use tokens::{QueryToken, SearchQuery, SearchTerm, TermOptions};
pub use translator::{QueryTranslator, ScoredHit, SearchRequest};
