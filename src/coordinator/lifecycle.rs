// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Index lifecycle for one collection.
//!
//! Every collection is reached through its alias. The concrete indexes
//! behind it are generations named `alias_<unix seconds>`.
//!
//! ```text
//! Absent ──ensure_exists──► Active(N) ──reindex──► Migrating(N, N+1) ──► Active(N+1)
//!                              │                        │
//!                              │                        └─ copy failed: Active(N), N+1 orphaned
//!                              └─ clone: N write-blocked while copying
//! ```
//!
//! During a migration the source generation is write-blocked, so a write
//! through the alias is rejected rather than landing on a generation that is
//! about to lose the alias. The block is put back the way it was afterwards.
//!
//! # Protocol
//!
//! 1. Create the new generation (settings + mapping)
//! 2. Fill it (`_reindex` or `_clone`)
//! 3. Bind the alias to it
//! 4. Unbind the alias from the old generation
//!
//! The alias rebind is always the last step. An interruption before it leaves
//! an unbound generation behind, which `delete_orphaned` sweeps.

use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::aliases::AliasRegistry;
use super::types::{CloneReport, IndexListing, MappingSync, ReindexReport};
use crate::engine::traits::{AnalyzeToken, EngineError, IndexStats, ReindexResponse, SearchEngine};
use crate::error::{ElasticError, Result};
use crate::metrics;
use crate::schema::ElementId;
use crate::search::{is_system_name, CollectionKey, MappingBuilder, MappingSignature, SignatureCache, SignatureDiff};

pub struct IndexLifecycle {
    engine: Arc<dyn SearchEngine>,
    aliases: AliasRegistry,
    mappings: MappingBuilder,
    signatures: Arc<SignatureCache>,
}

impl std::fmt::Debug for IndexLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexLifecycle")
            .field("aliases", &self.aliases)
            .field("signatures", &self.signatures)
            .finish()
    }
}

impl IndexLifecycle {
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        aliases: AliasRegistry,
        mappings: MappingBuilder,
        signatures: Arc<SignatureCache>,
    ) -> Self {
        Self {
            engine,
            aliases,
            mappings,
            signatures,
        }
    }

    #[must_use]
    pub fn aliases(&self) -> &AliasRegistry {
        &self.aliases
    }

    #[must_use]
    pub fn mappings(&self) -> &MappingBuilder {
        &self.mappings
    }

    #[must_use]
    pub fn signatures(&self) -> &SignatureCache {
        &self.signatures
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Creation and migration
    // ═══════════════════════════════════════════════════════════════════════════

    /// Create the collection's first generation and alias if the alias is absent.
    ///
    /// Returns `true` when a generation was created.
    #[tracing::instrument(skip(self), fields(collection = %self.aliases.index_name(key)))]
    pub async fn ensure_exists(&self, key: &CollectionKey) -> Result<bool> {
        let alias = self.aliases.index_name(key);
        if self.aliases.alias_exists(&alias).await? {
            return Ok(false);
        }

        let start = Instant::now();
        let mapping = self.mappings.build_mapping();
        let generation = self.next_generation(key).await?;

        if let Err(e) = self
            .engine
            .create_index(&generation, &self.mappings.create_index_body(key, &mapping))
            .await
        {
            // Lost a race with another creator
            if self.aliases.alias_exists(&alias).await.unwrap_or(false) {
                debug!(index = %generation, "Alias appeared while creating, keeping existing generation");
                return Ok(false);
            }
            metrics::record_lifecycle_operation("ensure_exists", "error");
            return Err(e.into());
        }

        if let Err(e) = self.engine.put_alias(&generation, &alias).await {
            error!(index = %generation, error = %e, "Created generation but failed to bind alias");
            metrics::record_lifecycle_operation("ensure_exists", "error");
            return Err(e.into());
        }

        self.signatures.insert(key, mapping.signature());
        info!(index = %generation, fields = mapping.len(), "Created collection index");
        metrics::record_lifecycle_operation("ensure_exists", "success");
        metrics::record_lifecycle_latency("ensure_exists", start.elapsed());
        Ok(true)
    }

    /// Copy the bound generation into a fresh one built from the current
    /// content model, then move the alias.
    ///
    /// The old generation is write-blocked from the start of the copy until
    /// the alias has moved; writers see rejections in that window.
    #[tracing::instrument(skip(self), fields(collection = %self.aliases.index_name(key)))]
    pub async fn reindex(&self, key: &CollectionKey) -> Result<ReindexReport> {
        let start = Instant::now();
        let alias = self.aliases.index_name(key);
        let old_index = self.aliases.resolve_alias(&alias).await?;

        let mapping = self.mappings.build_mapping();
        let new_index = self.next_generation(key).await?;
        self.engine
            .create_index(&new_index, &self.mappings.create_index_body(key, &mapping))
            .await?;

        let fields: Vec<&str> = mapping.names().collect();
        let body = json!({
            "source": { "index": old_index, "_source": fields },
            "dest": { "index": new_index },
        });
        info!(from = %old_index, to = %new_index, "Reindexing collection");

        let response = self
            .while_write_blocked(&old_index, || self.copy_and_rebind(&alias, &old_index, &new_index, &body))
            .await?;
        self.signatures.insert(key, mapping.signature());

        info!(
            from = %old_index,
            to = %new_index,
            total = response.total,
            took_ms = response.took,
            "Reindex complete"
        );
        metrics::record_reindexed_documents(response.total);
        metrics::record_lifecycle_operation("reindex", "success");
        metrics::record_lifecycle_latency("reindex", start.elapsed());

        Ok(ReindexReport {
            alias,
            old_index,
            new_index,
            total: response.total,
            took: response.took,
        })
    }

    /// Clone another collection's data into a new generation for `key`.
    ///
    /// `source` may be an alias or a concrete index. The destination alias
    /// must not exist yet. A source that was already read-only stays so.
    #[tracing::instrument(skip(self), fields(collection = %self.aliases.index_name(key)))]
    pub async fn clone(&self, key: &CollectionKey, source: &str) -> Result<CloneReport> {
        let start = Instant::now();
        let destination_alias = self.aliases.index_name(key);
        if self.aliases.alias_exists(&destination_alias).await? {
            metrics::record_lifecycle_operation("clone", "destination_exists");
            return Err(ElasticError::DestinationExists(destination_alias));
        }

        let source_index = self.aliases.resolve_index(source).await?;
        let new_index = self.next_generation(key).await?;

        let cloned = self
            .while_write_blocked(&source_index, || {
                self.clone_blocked(&source_index, &new_index, &destination_alias)
            })
            .await;

        match cloned {
            Err(e) => {
                error!(source = %source_index, target = %new_index, error = %e, "Clone failed");
                metrics::record_lifecycle_operation("clone", "error");
                Err(e)
            }
            Ok(()) => {
                // The clone carries the source's mapping, not necessarily ours
                self.signatures.invalidate(key);
                info!(source = %source_index, index = %new_index, "Cloned collection index");
                metrics::record_lifecycle_operation("clone", "success");
                metrics::record_lifecycle_latency("clone", start.elapsed());
                Ok(CloneReport {
                    source_index,
                    new_index,
                    destination_alias,
                })
            }
        }
    }

    /// Copy N into N+1 and move the alias. Runs with N write-blocked.
    async fn copy_and_rebind(
        &self,
        alias: &str,
        old_index: &str,
        new_index: &str,
        body: &Value,
    ) -> Result<ReindexResponse> {
        let response = match self.engine.reindex(body).await {
            Ok(response) => response,
            Err(e) => {
                error!(from = %old_index, to = %new_index, error = %e, "Reindex request failed");
                metrics::record_lifecycle_operation("reindex", "error");
                return Err(e.into());
            }
        };

        if !response.failures.is_empty() {
            error!(
                from = %old_index,
                to = %new_index,
                failures = response.failures.len(),
                "Reindex reported failures, alias left on old generation"
            );
            metrics::record_lifecycle_operation("reindex", "partial_failure");
            return Err(ElasticError::PartialFailure {
                old_index: old_index.to_string(),
                new_index: new_index.to_string(),
                failures: response.failures.len(),
            });
        }

        self.rebind(alias, old_index, new_index).await?;
        Ok(response)
    }

    async fn clone_blocked(&self, source_index: &str, new_index: &str, alias: &str) -> Result<()> {
        let body = json!({
            "aliases": { alias: { "is_write_index": true } },
        });
        self.engine.clone_index(source_index, new_index, &body).await?;
        // The clone inherits the source's write block
        self.set_write_block(new_index, false).await
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Mapping maintenance
    // ═══════════════════════════════════════════════════════════════════════════

    /// Push the current mapping to the bound generation. Additive only.
    #[tracing::instrument(skip(self), fields(collection = %self.aliases.index_name(key)))]
    pub async fn update_mapping_in_place(&self, key: &CollectionKey) -> Result<MappingSignature> {
        let alias = self.aliases.index_name(key);
        let mapping = self.mappings.build_mapping();

        if let Err(e) = self.engine.put_mapping(&alias, &mapping.to_properties()).await {
            warn!(error = %e, "Mapping update rejected");
            metrics::record_lifecycle_operation("update_mapping", "error");
            return Err(e.into());
        }

        let signature = mapping.signature();
        self.signatures.insert(key, signature.clone());
        info!(fields = signature.len(), "Updated mapping in place");
        metrics::record_lifecycle_operation("update_mapping", "success");
        Ok(signature)
    }

    /// Difference between what the index holds and what the content model wants.
    ///
    /// Uses the cached signature, falling back to the live mapping.
    pub async fn signature_diff(&self, key: &CollectionKey) -> Result<SignatureDiff> {
        let current = match self.signatures.get(key) {
            Some(signature) => signature,
            None => {
                let live = MappingSignature::from_properties(&self.current_mapping(key).await?);
                self.signatures.insert(key, live.clone());
                live
            }
        };
        Ok(current.diff(&self.mappings.build_mapping().signature()))
    }

    /// Patch added fields in place. Removed fields are reported, never
    /// reindexed automatically.
    pub async fn ensure_mapping_in_sync(&self, key: &CollectionKey) -> Result<MappingSync> {
        let diff = self.signature_diff(key).await?;
        if diff.requires_reindex() {
            warn!(
                collection = %self.aliases.index_name(key),
                removed = ?diff.removed,
                "Mapping drift needs a reindex"
            );
            return Ok(MappingSync::RequiresReindex {
                removed: diff.removed,
                added: diff.added,
            });
        }
        if diff.is_empty() {
            return Ok(MappingSync::InSync);
        }
        self.update_mapping_in_place(key).await?;
        Ok(MappingSync::Patched { added: diff.added })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Cleanup
    // ═══════════════════════════════════════════════════════════════════════════

    /// Delete every generation of the collection together with its aliases.
    #[tracing::instrument(skip(self), fields(collection = %self.aliases.index_name(key)))]
    pub async fn delete_collection(&self, key: &CollectionKey) -> Result<Vec<String>> {
        let found = match self.engine.get_indices(&self.aliases.naming().generation_pattern(key)).await {
            Ok(found) => found,
            Err(EngineError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let mut deleted = Vec::new();
        for index in found {
            if !self.aliases.naming().is_generation_of(key, &index.name) {
                continue;
            }
            for alias in &index.aliases {
                self.engine.delete_alias(&index.name, alias).await?;
            }
            self.engine.delete_index(&index.name).await?;
            info!(index = %index.name, "Deleted generation");
            deleted.push(index.name);
        }

        self.signatures.invalidate(key);
        metrics::record_indices_deleted("collection", deleted.len());
        metrics::record_lifecycle_operation("delete", "success");
        Ok(deleted)
    }

    /// Delete every generation the alias is not bound to.
    #[tracing::instrument(skip(self), fields(collection = %self.aliases.index_name(key)))]
    pub async fn delete_orphaned(&self, key: &CollectionKey) -> Result<Vec<String>> {
        let alias = self.aliases.index_name(key);
        let current = match self.aliases.resolve_alias(&alias).await {
            Ok(current) => Some(current),
            Err(ElasticError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        let mut deleted = Vec::new();
        for generation in self.aliases.generations(key).await? {
            if generation.bound || current.as_deref() == Some(generation.name.as_str()) {
                continue;
            }
            self.engine.delete_index(&generation.name).await?;
            info!(index = %generation.name, "Deleted orphaned generation");
            deleted.push(generation.name);
        }

        metrics::record_indices_deleted("orphaned", deleted.len());
        metrics::record_lifecycle_operation("delete_orphaned", "success");
        Ok(deleted)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Inspection
    // ═══════════════════════════════════════════════════════════════════════════

    pub async fn list_all(&self, include_system: bool) -> Result<IndexListing> {
        let keep = |name: &str| include_system || !is_system_name(name);
        let aliases = self
            .engine
            .cat_aliases()
            .await?
            .into_iter()
            .filter(|row| keep(&row.alias))
            .collect();
        let indexes = self
            .engine
            .cat_indices()
            .await?
            .into_iter()
            .filter(|row| keep(&row.index))
            .collect();
        Ok(IndexListing { aliases, indexes })
    }

    pub async fn stats(&self, key: &CollectionKey) -> Result<IndexStats> {
        let alias = self.aliases.index_name(key);
        let current = self.aliases.resolve_alias(&alias).await?;
        Ok(self.engine.index_stats(&current).await?)
    }

    /// Live `properties` of the bound generation.
    pub async fn current_mapping(&self, key: &CollectionKey) -> Result<Value> {
        Ok(self.engine.get_mapping(&self.aliases.index_name(key)).await?)
    }

    /// Stored document of an element.
    pub async fn source_of(&self, id: ElementId, key: &CollectionKey) -> Result<Value> {
        Ok(self
            .engine
            .get_source(&self.aliases.index_name(key), &id.to_string())
            .await?)
    }

    /// Tokens the collection's stopword analyzer produces for `text`.
    pub async fn analyze(&self, text: &str, key: &CollectionKey) -> Result<Vec<AnalyzeToken>> {
        let body = json!({ "analyzer": "standard_stopwords", "text": text });
        Ok(self.engine.analyze(&self.aliases.index_name(key), &body).await?)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Internals
    // ═══════════════════════════════════════════════════════════════════════════

    /// Name for a new generation, strictly newer than any existing one.
    async fn next_generation(&self, key: &CollectionKey) -> Result<String> {
        let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
        let timestamp = self
            .aliases
            .generations(key)
            .await?
            .iter()
            .map(|g| g.timestamp.saturating_add(1))
            .fold(now, u64::max);
        Ok(self.aliases.naming().generation_name(key, timestamp))
    }

    /// Bind first, then unbind, so the alias is never empty.
    async fn rebind(&self, alias: &str, old_index: &str, new_index: &str) -> Result<()> {
        if let Err(e) = self.engine.put_alias(new_index, alias).await {
            error!(index = %new_index, error = %e, "Failed to bind alias to new generation");
            metrics::record_lifecycle_operation("reindex", "error");
            return Err(e.into());
        }
        if let Err(e) = self.engine.delete_alias(old_index, alias).await {
            warn!(index = %old_index, error = %e, "Alias still bound to old generation");
            return Err(e.into());
        }
        debug!(alias = %alias, from = %old_index, to = %new_index, "Alias rebound");
        Ok(())
    }

    /// Run `operation` with `index` write-blocked, then restore the block
    /// state it had before. An index that was already blocked stays blocked.
    /// The operation's error wins over a failed restore.
    async fn while_write_blocked<T, F, Fut>(&self, index: &str, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let was_blocked = self.is_write_blocked(index).await?;
        if !was_blocked {
            self.set_write_block(index, true).await?;
        }

        let outcome = operation().await;
        if was_blocked {
            debug!(index = %index, "Index was already write-blocked, leaving block in place");
            return outcome;
        }

        match (outcome, self.set_write_block(index, false).await) {
            (Ok(value), Ok(())) => Ok(value),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(restore_err)) => {
                error!(index = %index, error = %restore_err, "Failed to lift write block after failure");
                Err(e)
            }
            (Ok(_), Err(e)) => {
                error!(index = %index, error = %e, "Operation succeeded but index is still write-blocked");
                Err(e)
            }
        }
    }

    async fn is_write_blocked(&self, index: &str) -> Result<bool> {
        let settings = self.engine.get_settings(index).await?;
        Ok(match settings.get("index.blocks.write") {
            Some(Value::Bool(blocked)) => *blocked,
            Some(Value::String(blocked)) => blocked == "true",
            _ => false,
        })
    }

    async fn set_write_block(&self, index: &str, blocked: bool) -> Result<()> {
        self.engine
            .put_settings(index, &json!({ "index.blocks.write": blocked }))
            .await?;
        debug!(index = %index, blocked, "Write block changed");
        Ok(())
    }
}
