// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Alias registry.
//!
//! Resolves collection aliases to their bound generation and enumerates a
//! collection's generations. Read-only: binding and unbinding happen in the
//! lifecycle manager.

use std::sync::Arc;

use super::types::Generation;
use crate::engine::traits::{EngineError, SearchEngine};
use crate::error::{ElasticError, Result};
use crate::search::{CollectionKey, IndexNaming};

#[derive(Clone)]
pub struct AliasRegistry {
    engine: Arc<dyn SearchEngine>,
    naming: IndexNaming,
}

impl std::fmt::Debug for AliasRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliasRegistry").field("naming", &self.naming).finish()
    }
}

impl AliasRegistry {
    pub fn new(engine: Arc<dyn SearchEngine>, naming: IndexNaming) -> Self {
        Self { engine, naming }
    }

    #[must_use]
    pub fn naming(&self) -> &IndexNaming {
        &self.naming
    }

    /// Alias name of a collection.
    #[must_use]
    pub fn index_name(&self, key: &CollectionKey) -> String {
        self.naming.index_name(key)
    }

    pub async fn alias_exists(&self, name: &str) -> Result<bool> {
        Ok(self.engine.alias_exists(name).await?)
    }

    /// The generation an alias is bound to.
    ///
    /// While a rebind is in flight the alias briefly points at two
    /// generations; the newest one wins.
    pub async fn resolve_alias(&self, name: &str) -> Result<String> {
        let mut bound = self.engine.get_alias(name).await?;
        bound.sort_by_key(|index| (generation_suffix(index), index.clone()));
        bound
            .pop()
            .ok_or_else(|| ElasticError::NotFound(format!("alias [{}] is not bound", name)))
    }

    /// Resolve a name that may be either an alias or a concrete index.
    pub async fn resolve_index(&self, name: &str) -> Result<String> {
        match self.resolve_alias(name).await {
            Err(ElasticError::NotFound(_)) => {
                let found = self.engine.get_indices(name).await?;
                found
                    .into_iter()
                    .map(|index| index.name)
                    .next()
                    .ok_or_else(|| ElasticError::NotFound(format!("no such index or alias [{}]", name)))
            }
            other => other,
        }
    }

    /// The collection's generations, oldest first.
    pub async fn generations(&self, key: &CollectionKey) -> Result<Vec<Generation>> {
        let alias = self.naming.index_name(key);
        let found = match self.engine.get_indices(&self.naming.generation_pattern(key)).await {
            Ok(found) => found,
            Err(EngineError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let mut generations: Vec<Generation> = found
            .into_iter()
            .filter_map(|index| {
                let timestamp = self.naming.generation_timestamp(key, &index.name)?;
                Some(Generation {
                    bound: index.aliases.iter().any(|a| a == &alias),
                    name: index.name,
                    timestamp,
                })
            })
            .collect();
        generations.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.name.cmp(&b.name)));
        Ok(generations)
    }
}

/// Trailing all-digit suffix of an index name, 0 when absent.
fn generation_suffix(index: &str) -> u64 {
    index
        .rsplit_once('_')
        .and_then(|(_, suffix)| suffix.parse().ok())
        .unwrap_or(0)
}
