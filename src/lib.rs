// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! # Elastic Sync
//!
//! Keeps a content store's search documents in Elasticsearch, one alias per
//! site, and answers searches against them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Content Store                          │
//! │  • ContentRegistry: element types, custom fields            │
//! │  • Element: attributes + field keywords                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                     (index_element, lock per element)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Coordinator (ElasticSync)                   │
//! │  • IndexLifecycle: alias → generation, reindex, clone       │
//! │  • DocumentWriter: upsert / delete / bulk delete            │
//! │  • SearchExecutor: tokens → query_string → ranked ids       │
//! │  • SiteAdmin: per-site batch operations                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                     (Arc<dyn SearchEngine>)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Search Engine                         │
//! │  • HttpEngine: REST over reqwest, basic auth or AWS SigV4   │
//! │  • InMemoryEngine: tests and demos                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use elastic_sync::{Authentication, ElasticConfig, ElasticSync};
//! use elastic_sync::schema::{ContentRegistry, Element, ElementTypeSpec};
//! use elastic_sync::search::CollectionKey;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ElasticConfig {
//!         endpoint: "http://localhost:9200".into(),
//!         authentication: Some(Authentication::BasicAuth),
//!         username: "elastic".into(),
//!         password: "changeme".into(),
//!         ..Default::default()
//!     };
//!
//!     let registry = Arc::new(ContentRegistry::new());
//!     registry.register_element_type(ElementTypeSpec::new("entry", true, ["summary"]));
//!
//!     let service = ElasticSync::connect(config, registry).await.expect("Failed to connect");
//!     let site = CollectionKey::new(1, "default", "en-US");
//!
//!     let element = Element::new(42, 1, "entry").with_attribute("title", "Green salad");
//!     service.indexer().index_element(&element, &site).await.expect("Failed to index");
//!
//!     for hit in service.search().search_text("salad", Some(&site), None).await.unwrap() {
//!         println!("{} scored {}", hit.id, hit.score);
//!     }
//! }
//! ```
//!
//! ## Features
//!
//! - **Alias indirection**: readers and writers only ever see `prefix_handle`
//! - **Zero-downtime migrations**: reindex and clone into a new generation, rebind last
//! - **Drift detection**: cached mapping signatures, additive patches in place
//! - **Orphan sweeps**: unbound generations and documents of deleted elements
//! - **Retry Logic**: transient transport failures are retried with backoff
//!
//! ## Modules
//!
//! - [`coordinator`]: [`ElasticSync`] and its components
//! - [`engine`]: the [`SearchEngine`] facade and its backends
//! - [`search`]: naming, mapping, tokenizer, translator
//! - [`schema`]: content model registry
//! - [`resilience`]: retry policies

pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod locks;
pub mod metrics;
pub mod resilience;
pub mod schema;
pub mod search;

// Note: We don't expose a `tracing` module to avoid conflict with the tracing crate

pub use config::{Authentication, ElasticConfig, FieldBoost};
pub use coordinator::{
    AliasRegistry, BulkReport, CloneReport, DocumentWriter, ElasticSync, ElementIndexer, IndexLifecycle,
    IndexListing, MappingSync, ReindexReport, SearchDocument, SearchExecutor, SiteAdmin, SiteOutcome,
};
pub use engine::{EngineError, HttpEngine, InMemoryEngine, SearchEngine};
pub use error::{ElasticError, Result};
pub use resilience::retry::RetryConfig;
pub use search::{CollectionKey, QueryHook, ScoredHit, SearchObserver, SearchQuery, TermOptions};
