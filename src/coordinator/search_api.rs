// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search API
//!
//! # Flow
//!
//! ```text
//! search(query, collection?, scope?)
//!       │
//!       ├─→ observers: before_search
//!       ├─→ QueryTranslator::translate (+ hooks)
//!       ├─→ engine.search(alias)
//!       │        │
//!       │        └─→ BadQuery? → empty result
//!       ├─→ rank by score
//!       └─→ observers: after_search
//! ```

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::engine::traits::SearchEngine;
use crate::error::{ElasticError, Result};
use crate::metrics;
use crate::schema::ElementId;
use crate::search::{
    CollectionKey, IndexNaming, QueryHook, QueryTranslator, ScoredHit, SearchEvent, SearchObserver, SearchQuery,
    TermOptions,
};

pub struct SearchExecutor {
    engine: Arc<dyn SearchEngine>,
    naming: IndexNaming,
    translator: QueryTranslator,
    default_options: TermOptions,
    default_collection: Option<CollectionKey>,
    observers: Vec<Arc<dyn SearchObserver>>,
}

impl std::fmt::Debug for SearchExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchExecutor")
            .field("naming", &self.naming)
            .field("translator", &self.translator)
            .field("default_collection", &self.default_collection)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl SearchExecutor {
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        naming: IndexNaming,
        translator: QueryTranslator,
        default_options: TermOptions,
    ) -> Self {
        Self {
            engine,
            naming,
            translator,
            default_options,
            default_collection: None,
            observers: Vec::new(),
        }
    }

    /// Collection searched when a call names none.
    #[must_use]
    pub fn with_default_collection(mut self, key: CollectionKey) -> Self {
        self.default_collection = Some(key);
        self
    }

    pub fn add_hook(&mut self, hook: Arc<dyn QueryHook>) {
        self.translator.add_hook(hook);
    }

    pub fn add_observer(&mut self, observer: Arc<dyn SearchObserver>) {
        self.observers.push(observer);
    }

    #[must_use]
    pub fn translator(&self) -> &QueryTranslator {
        &self.translator
    }

    /// Tokenize `text` with the default term options and search.
    pub async fn search_text(
        &self,
        text: &str,
        collection: Option<&CollectionKey>,
        scope: Option<&[ElementId]>,
    ) -> Result<Vec<ScoredHit>> {
        let query = SearchQuery::parse(text, self.default_options);
        self.search(&query, collection, scope).await
    }

    /// Ids ranked by score, highest first.
    ///
    /// A query the engine rejects yields an empty list, not an error.
    pub async fn search(
        &self,
        query: &SearchQuery,
        collection: Option<&CollectionKey>,
        scope: Option<&[ElementId]>,
    ) -> Result<Vec<ScoredHit>> {
        let collection = collection
            .or(self.default_collection.as_ref())
            .ok_or_else(|| ElasticError::Configuration("no collection to search".into()))?;
        let event = SearchEvent {
            collection,
            query,
            scope,
        };
        for observer in &self.observers {
            observer.before_search(&event);
        }

        let start = Instant::now();
        let request = self
            .translator
            .translate(&self.naming.index_name(collection), query.tokens(), scope);

        let results = match self.engine.search(&request.index, &request.body).await {
            Ok(response) => {
                let ranked = QueryTranslator::rank(&response);
                debug!(index = %request.index, hits = ranked.len(), took_ms = response.took, "Search complete");
                metrics::record_search_query("success");
                ranked
            }
            Err(e) => match ElasticError::from(e) {
                ElasticError::BadQuery(reason) => {
                    warn!(index = %request.index, reason = %reason, "Engine rejected search query");
                    metrics::record_search_query("bad_query");
                    Vec::new()
                }
                other => {
                    metrics::record_search_query("error");
                    return Err(other);
                }
            },
        };
        metrics::record_search_latency(start.elapsed());
        metrics::record_search_results(results.len());

        for observer in &self.observers {
            observer.after_search(&event, &results);
        }
        Ok(results)
    }
}
