// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search engine facade.
//!
//! The core never talks HTTP directly. Every component receives an
//! `Arc<dyn SearchEngine>` and issues index, alias, document and search
//! operations through it. Request and response bodies stay close to the
//! Elasticsearch REST shapes so the HTTP implementation is a thin mapping.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Typically a write block (`index.blocks.write`) on the target index.
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Engine backend error: {0}")]
    Backend(String),
}

impl EngineError {
    /// Connection-level failures worth retrying.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// A concrete index and the aliases bound to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDescription {
    pub name: String,
    pub aliases: Vec<String>,
}

/// Outcome of a server-side `_reindex`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReindexResponse {
    /// Milliseconds the copy took
    #[serde(default)]
    pub took: u64,
    /// Documents processed
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub failures: Vec<Value>,
}

/// One operation inside a `_bulk` request.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOperation {
    Index {
        index: String,
        id: String,
        document: Value,
    },
    Delete {
        index: String,
        id: String,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub took: u64,
    #[serde(default)]
    pub errors: bool,
    #[serde(default)]
    pub items: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub score: Option<f64>,
    pub source: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResponse {
    pub took: u64,
    pub total: u64,
    pub hits: Vec<SearchHit>,
}

/// Primary-plus-replica totals for one index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub index: String,
    pub docs_count: u64,
    pub store_size_bytes: u64,
}

/// Row of `_cat/aliases`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatAlias {
    pub alias: String,
    pub index: String,
}

/// Row of `_cat/indices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatIndex {
    #[serde(default)]
    pub health: String,
    #[serde(default)]
    pub status: String,
    pub index: String,
    #[serde(rename = "docs.count", default)]
    pub docs_count: Option<String>,
    #[serde(rename = "store.size", default)]
    pub store_size: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeToken {
    pub token: String,
    pub start_offset: u64,
    pub end_offset: u64,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub position: u64,
}

/// Engine client facade.
///
/// `index` arguments accept either a concrete index or an alias wherever the
/// engine itself does (document CRUD, search, mapping updates).
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Check the cluster is reachable.
    async fn ping(&self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn create_index(&self, name: &str, body: &Value) -> Result<(), EngineError>;
    async fn delete_index(&self, name: &str) -> Result<(), EngineError>;

    /// Indexes matching a name or `prefix*` pattern. No match is an empty list.
    async fn get_indices(&self, pattern: &str) -> Result<Vec<IndexDescription>, EngineError>;

    async fn alias_exists(&self, alias: &str) -> Result<bool, EngineError>;

    /// Indexes the alias is bound to. `NotFound` when unbound.
    async fn get_alias(&self, alias: &str) -> Result<Vec<String>, EngineError>;

    async fn put_alias(&self, index: &str, alias: &str) -> Result<(), EngineError>;
    async fn delete_alias(&self, index: &str, alias: &str) -> Result<(), EngineError>;

    async fn put_settings(&self, index: &str, settings: &Value) -> Result<(), EngineError>;

    /// Flat settings of a concrete index (`{"index.blocks.write": "true", ...}`).
    async fn get_settings(&self, index: &str) -> Result<Value, EngineError>;

    /// The `properties` object of an index mapping.
    async fn get_mapping(&self, index: &str) -> Result<Value, EngineError>;

    /// Additive mapping update with a `properties` object.
    async fn put_mapping(&self, index: &str, properties: &Value) -> Result<(), EngineError>;

    /// Block-level copy. The source must be write-blocked.
    async fn clone_index(&self, source: &str, target: &str, body: &Value) -> Result<(), EngineError>;

    async fn reindex(&self, body: &Value) -> Result<ReindexResponse, EngineError>;

    async fn index_document(&self, index: &str, id: &str, document: &Value) -> Result<(), EngineError>;
    async fn delete_document(&self, index: &str, id: &str) -> Result<(), EngineError>;
    async fn get_source(&self, index: &str, id: &str) -> Result<Value, EngineError>;

    async fn bulk(&self, operations: &[BulkOperation]) -> Result<BulkResponse, EngineError>;

    async fn search(&self, index: &str, body: &Value) -> Result<SearchResponse, EngineError>;

    async fn index_stats(&self, index: &str) -> Result<IndexStats, EngineError>;
    async fn cat_aliases(&self) -> Result<Vec<CatAlias>, EngineError>;
    async fn cat_indices(&self) -> Result<Vec<CatIndex>, EngineError>;

    async fn analyze(&self, index: &str, body: &Value) -> Result<Vec<AnalyzeToken>, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transient_errors() {
        assert!(EngineError::Transport("connection refused".into()).is_transient());
        assert!(!EngineError::BadRequest("x".into()).is_transient());
        assert!(!EngineError::NotFound("x".into()).is_transient());
    }

    #[test]
    fn test_cat_index_deserializes_dotted_columns() {
        let row: CatIndex = serde_json::from_value(json!({
            "health": "green",
            "status": "open",
            "index": "craftcms_en_1700000000",
            "docs.count": "42",
            "store.size": "12kb"
        }))
        .unwrap();
        assert_eq!(row.docs_count.as_deref(), Some("42"));
        assert_eq!(row.store_size.as_deref(), Some("12kb"));
    }

    #[test]
    fn test_reindex_response_defaults() {
        let resp: ReindexResponse = serde_json::from_value(json!({"took": 12})).unwrap();
        assert_eq!(resp.took, 12);
        assert_eq!(resp.total, 0);
        assert!(resp.failures.is_empty());
    }
}
