// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Service coordinator.
//!
//! [`ElasticSync`] wires the components together around one injected
//! [`SearchEngine`]:
//! - [`IndexLifecycle`]: aliases, generations, reindex, clone, cleanup
//! - [`DocumentWriter`]: document writes through the alias
//! - [`ElementIndexer`]: keyword extraction under a per-element lock
//! - [`SearchExecutor`]: query translation, dispatch, ranking
//! - [`SiteAdmin`]: batch operations across sites
//!
//! # Lifecycle
//!
//! ```text
//! Absent → Active(N) → Migrating(N, N+1) → Active(N+1)
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use elastic_sync::{ElasticConfig, ElasticSync, InMemoryEngine};
//! use elastic_sync::schema::{ContentRegistry, Element, ElementTypeSpec};
//! use elastic_sync::search::CollectionKey;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let registry = Arc::new(ContentRegistry::new());
//! registry.register_element_type(ElementTypeSpec::new("entry", true, Vec::<String>::new()));
//!
//! let service = ElasticSync::new(ElasticConfig::default(), Arc::new(InMemoryEngine::new()), registry);
//! let en = CollectionKey::new(1, "en", "en-US");
//!
//! let element = Element::new(42, 1, "entry").with_attribute("title", "Green salad");
//! service.indexer().index_element(&element, &en).await.unwrap();
//!
//! let hits = service.search().search_text("salad", Some(&en), None).await.unwrap();
//! assert_eq!(hits[0].id, 42);
//! # }
//! ```

mod admin;
mod aliases;
mod documents;
mod indexing;
mod lifecycle;
mod search_api;
mod types;

pub use admin::SiteAdmin;
pub use aliases::AliasRegistry;
pub use documents::{DocumentWriter, SearchDocument};
pub use indexing::{normalize_keywords, ElementIndexer};
pub use lifecycle::IndexLifecycle;
pub use search_api::SearchExecutor;
pub use types::{BulkReport, CloneReport, Generation, IndexListing, MappingSync, ReindexReport, SiteOutcome};

use std::sync::Arc;
use tracing::info;

use crate::config::ElasticConfig;
use crate::engine::{HttpEngine, SearchEngine};
use crate::error::Result;
use crate::locks::KeyedLocks;
use crate::schema::ContentRegistry;
use crate::search::{FieldNamer, IndexNaming, MappingBuilder, QueryTranslator, SignatureCache};

/// Main service object.
///
/// Every component shares the same engine, registry and signature cache.
/// Nothing is global; two services in one process are independent.
pub struct ElasticSync {
    config: ElasticConfig,
    registry: Arc<ContentRegistry>,
    namer: FieldNamer,
    lifecycle: Arc<IndexLifecycle>,
    writer: Arc<DocumentWriter>,
    indexer: Arc<ElementIndexer>,
    search: SearchExecutor,
    admin: SiteAdmin,
}

impl std::fmt::Debug for ElasticSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticSync")
            .field("index_name", &self.config.index_name)
            .field("registry", &self.registry)
            .field("lifecycle", &self.lifecycle)
            .field("search", &self.search)
            .finish()
    }
}

impl ElasticSync {
    /// Build the service around an engine.
    ///
    /// The configuration is not validated here; that is the HTTP client's job.
    pub fn new(config: ElasticConfig, engine: Arc<dyn SearchEngine>, registry: Arc<ContentRegistry>) -> Self {
        let naming = IndexNaming::new(config.index_name.clone());
        let namer = FieldNamer::new(config.field_prefix.clone(), registry.clone());

        let lifecycle = Arc::new(IndexLifecycle::new(
            engine.clone(),
            AliasRegistry::new(engine.clone(), naming.clone()),
            MappingBuilder::new(registry.clone(), namer.clone()),
            Arc::new(SignatureCache::new()),
        ));
        let writer = Arc::new(DocumentWriter::new(
            engine.clone(),
            lifecycle.clone(),
            config.max_result_window,
        ));
        let indexer = Arc::new(ElementIndexer::new(
            registry.clone(),
            namer.clone(),
            writer.clone(),
            KeyedLocks::new(),
        ));
        let translator = QueryTranslator::new(namer.clone(), config.field_boosts.clone(), config.max_result_window);
        let search = SearchExecutor::new(engine, naming, translator, config.default_term_options);
        let admin = SiteAdmin::new(lifecycle.clone(), writer.clone(), indexer.clone(), namer.clone());

        Self {
            config,
            registry,
            namer,
            lifecycle,
            writer,
            indexer,
            search,
            admin,
        }
    }

    /// Validate the configuration, reach the cluster, and build the service.
    pub async fn connect(config: ElasticConfig, registry: Arc<ContentRegistry>) -> Result<Self> {
        let engine = HttpEngine::connect(&config).await?;
        info!(index_name = %config.index_name, field_prefix = %config.field_prefix, "Search service ready");
        Ok(Self::new(config, Arc::new(engine), registry))
    }

    #[must_use]
    pub fn config(&self) -> &ElasticConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ContentRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn namer(&self) -> &FieldNamer {
        &self.namer
    }

    #[must_use]
    pub fn lifecycle(&self) -> &IndexLifecycle {
        &self.lifecycle
    }

    #[must_use]
    pub fn writer(&self) -> &DocumentWriter {
        &self.writer
    }

    #[must_use]
    pub fn indexer(&self) -> &ElementIndexer {
        &self.indexer
    }

    #[must_use]
    pub fn search(&self) -> &SearchExecutor {
        &self.search
    }

    /// For registering hooks and observers.
    pub fn search_mut(&mut self) -> &mut SearchExecutor {
        &mut self.search
    }

    #[must_use]
    pub fn admin(&self) -> &SiteAdmin {
        &self.admin
    }

    /// Field definitions changed: drop memoized field-name lookups.
    pub fn fields_changed(&self) {
        self.namer.clear();
    }
}
