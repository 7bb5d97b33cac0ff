// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-memory search engine.
//!
//! Models the parts of Elasticsearch the lifecycle protocol depends on:
//! aliases with write-index flags, write blocks, additive mappings,
//! `_reindex` with `_source` filtering, `_clone`, and a small `query_string`
//! evaluator (`+term`, `-term`, `field:term`, `"phrase"`, `*` wildcards,
//! `field^boost`). Used by tests and demos; also exposes counters and failure
//! injection so the protocol's failure paths can be exercised.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::traits::{
    AnalyzeToken, BulkOperation, BulkResponse, CatAlias, CatIndex, EngineError, IndexDescription,
    IndexStats, ReindexResponse, SearchEngine, SearchHit, SearchResponse,
};

#[derive(Debug, Default, Clone)]
struct MemIndex {
    settings: Map<String, Value>,
    properties: Map<String, Value>,
    documents: BTreeMap<String, Value>,
    /// alias -> is_write_index
    aliases: BTreeMap<String, bool>,
    write_blocked: bool,
}

impl MemIndex {
    fn store_size(&self) -> u64 {
        self.documents
            .values()
            .map(|doc| doc.to_string().len() as u64)
            .sum()
    }
}

pub struct InMemoryEngine {
    indices: RwLock<BTreeMap<String, MemIndex>>,
    requests: AtomicUsize,
    create_calls: AtomicUsize,
    pending_reindex_failures: AtomicUsize,
    reject_searches: AtomicBool,
}

impl InMemoryEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            indices: RwLock::new(BTreeMap::new()),
            requests: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            pending_reindex_failures: AtomicUsize::new(0),
            reject_searches: AtomicBool::new(false),
        }
    }

    /// Total requests served since creation.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Number of `create_index` calls, successful or not.
    #[must_use]
    pub fn create_index_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Make the next `_reindex` report `failures` failed documents.
    pub fn fail_next_reindex(&self, failures: usize) {
        self.pending_reindex_failures.store(failures, Ordering::SeqCst);
    }

    /// Reject every search with a bad-request error while enabled.
    pub fn reject_searches(&self, reject: bool) {
        self.reject_searches.store(reject, Ordering::SeqCst);
    }

    /// Concrete index names, sorted.
    #[must_use]
    pub fn index_names(&self) -> Vec<String> {
        self.indices.read().keys().cloned().collect()
    }

    #[must_use]
    pub fn is_write_blocked(&self, index: &str) -> bool {
        self.indices
            .read()
            .get(index)
            .map(|idx| idx.write_blocked)
            .unwrap_or(false)
    }

    /// Documents of an index or alias, sorted by id.
    #[must_use]
    pub fn documents(&self, name: &str) -> Vec<(String, Value)> {
        let indices = self.indices.read();
        let Ok(targets) = resolve_read(&indices, name) else {
            return Vec::new();
        };
        targets
            .iter()
            .filter_map(|t| indices.get(t))
            .flat_map(|idx| idx.documents.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect()
    }

    /// Insert a document directly, bypassing aliases and blocks.
    pub fn seed_document(&self, index: &str, id: &str, document: Value) {
        let mut indices = self.indices.write();
        indices
            .entry(index.to_string())
            .or_default()
            .documents
            .insert(id.to_string(), document);
    }

    fn hit(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn alias_targets(indices: &BTreeMap<String, MemIndex>, alias: &str) -> Vec<String> {
    indices
        .iter()
        .filter(|(_, idx)| idx.aliases.contains_key(alias))
        .map(|(name, _)| name.clone())
        .collect()
}

fn resolve_read(indices: &BTreeMap<String, MemIndex>, name: &str) -> Result<Vec<String>, EngineError> {
    if indices.contains_key(name) {
        return Ok(vec![name.to_string()]);
    }
    let targets = alias_targets(indices, name);
    if targets.is_empty() {
        return Err(EngineError::NotFound(format!("no such index [{}]", name)));
    }
    Ok(targets)
}

fn resolve_write(indices: &BTreeMap<String, MemIndex>, name: &str) -> Result<String, EngineError> {
    let targets = resolve_read(indices, name)?;
    if targets.len() == 1 {
        return Ok(targets[0].clone());
    }
    targets
        .into_iter()
        .find(|t| {
            indices
                .get(t)
                .and_then(|idx| idx.aliases.get(name))
                .copied()
                .unwrap_or(false)
        })
        .ok_or_else(|| {
            EngineError::BadRequest(format!(
                "no write index is defined for alias [{}] pointing to multiple indices",
                name
            ))
        })
}

fn write_block_error(index: &str) -> EngineError {
    EngineError::Forbidden(format!(
        "index [{}] blocked by: [FORBIDDEN/8/index write (api)]",
        index
    ))
}

fn blocks_write(settings: &Value) -> Option<bool> {
    settings
        .get("index.blocks.write")
        .or_else(|| settings.pointer("/index/blocks/write"))
        .and_then(Value::as_bool)
}

fn matches_pattern(pattern: &str, name: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => name.starts_with(prefix),
        None => pattern == name,
    }
}

#[async_trait]
impl SearchEngine for InMemoryEngine {
    async fn create_index(&self, name: &str, body: &Value) -> Result<(), EngineError> {
        self.hit();
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut indices = self.indices.write();
        if indices.contains_key(name) {
            return Err(EngineError::BadRequest(format!(
                "resource_already_exists_exception: index [{}] already exists",
                name
            )));
        }
        if !alias_targets(&indices, name).is_empty() {
            return Err(EngineError::BadRequest(format!(
                "invalid_index_name_exception: [{}] already exists as alias",
                name
            )));
        }

        let mut index = MemIndex::default();
        if let Some(settings) = body.get("settings").and_then(Value::as_object) {
            index.settings = settings.clone();
            index.write_blocked = blocks_write(&Value::Object(settings.clone())).unwrap_or(false);
        }
        if let Some(props) = body.pointer("/mappings/properties").and_then(Value::as_object) {
            index.properties = props.clone();
        }
        if let Some(aliases) = body.get("aliases").and_then(Value::as_object) {
            for (alias, spec) in aliases {
                let is_write = spec.get("is_write_index").and_then(Value::as_bool).unwrap_or(false);
                index.aliases.insert(alias.clone(), is_write);
            }
        }
        indices.insert(name.to_string(), index);
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> Result<(), EngineError> {
        self.hit();
        self.indices
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| EngineError::NotFound(format!("no such index [{}]", name)))
    }

    async fn get_indices(&self, pattern: &str) -> Result<Vec<IndexDescription>, EngineError> {
        self.hit();
        let indices = self.indices.read();
        let names: Vec<String> = if pattern.ends_with('*') {
            indices
                .keys()
                .filter(|name| matches_pattern(pattern, name))
                .cloned()
                .collect()
        } else {
            resolve_read(&indices, pattern)?
        };
        Ok(names
            .into_iter()
            .filter_map(|name| {
                indices.get(&name).map(|idx| IndexDescription {
                    aliases: idx.aliases.keys().cloned().collect(),
                    name,
                })
            })
            .collect())
    }

    async fn alias_exists(&self, alias: &str) -> Result<bool, EngineError> {
        self.hit();
        Ok(!alias_targets(&self.indices.read(), alias).is_empty())
    }

    async fn get_alias(&self, alias: &str) -> Result<Vec<String>, EngineError> {
        self.hit();
        let targets = alias_targets(&self.indices.read(), alias);
        if targets.is_empty() {
            return Err(EngineError::NotFound(format!("alias [{}] missing", alias)));
        }
        Ok(targets)
    }

    async fn put_alias(&self, index: &str, alias: &str) -> Result<(), EngineError> {
        self.hit();
        let mut indices = self.indices.write();
        if indices.contains_key(alias) {
            return Err(EngineError::BadRequest(format!(
                "invalid_alias_name_exception: an index exists with the same name as the alias [{}]",
                alias
            )));
        }
        let idx = indices
            .get_mut(index)
            .ok_or_else(|| EngineError::NotFound(format!("no such index [{}]", index)))?;
        idx.aliases.entry(alias.to_string()).or_insert(false);
        Ok(())
    }

    async fn delete_alias(&self, index: &str, alias: &str) -> Result<(), EngineError> {
        self.hit();
        let mut indices = self.indices.write();
        let idx = indices
            .get_mut(index)
            .ok_or_else(|| EngineError::NotFound(format!("no such index [{}]", index)))?;
        idx.aliases
            .remove(alias)
            .map(|_| ())
            .ok_or_else(|| EngineError::NotFound(format!("aliases [{}] missing", alias)))
    }

    async fn put_settings(&self, index: &str, settings: &Value) -> Result<(), EngineError> {
        self.hit();
        let mut indices = self.indices.write();
        let targets = resolve_read(&indices, index)?;
        for target in targets {
            if let Some(idx) = indices.get_mut(&target) {
                if let Some(block) = blocks_write(settings) {
                    idx.write_blocked = block;
                }
                if let Some(obj) = settings.as_object() {
                    for (k, v) in obj {
                        idx.settings.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        Ok(())
    }

    async fn get_settings(&self, index: &str) -> Result<Value, EngineError> {
        self.hit();
        let indices = self.indices.read();
        let idx = indices
            .get(index)
            .ok_or_else(|| EngineError::NotFound(format!("no such index [{}]", index)))?;
        let mut flat = idx.settings.clone();
        flat.insert(
            "index.blocks.write".to_string(),
            Value::String(idx.write_blocked.to_string()),
        );
        Ok(Value::Object(flat))
    }

    async fn get_mapping(&self, index: &str) -> Result<Value, EngineError> {
        self.hit();
        let indices = self.indices.read();
        let targets = resolve_read(&indices, index)?;
        Ok(targets
            .first()
            .and_then(|t| indices.get(t))
            .map(|idx| Value::Object(idx.properties.clone()))
            .unwrap_or_else(|| json!({})))
    }

    async fn put_mapping(&self, index: &str, properties: &Value) -> Result<(), EngineError> {
        self.hit();
        let props = properties
            .as_object()
            .ok_or_else(|| EngineError::BadRequest("mapping properties must be an object".into()))?;
        let mut indices = self.indices.write();
        let targets = resolve_read(&indices, index)?;
        for target in &targets {
            if let Some(idx) = indices.get(target) {
                for (field, spec) in props {
                    if let Some(existing) = idx.properties.get(field) {
                        if existing.get("type") != spec.get("type") {
                            return Err(EngineError::BadRequest(format!(
                                "illegal_argument_exception: mapper [{}] cannot be changed from type [{}] to [{}]",
                                field,
                                existing.get("type").unwrap_or(&Value::Null),
                                spec.get("type").unwrap_or(&Value::Null)
                            )));
                        }
                    }
                }
            }
        }
        for target in targets {
            if let Some(idx) = indices.get_mut(&target) {
                for (field, spec) in props {
                    idx.properties.insert(field.clone(), spec.clone());
                }
            }
        }
        Ok(())
    }

    async fn clone_index(&self, source: &str, target: &str, body: &Value) -> Result<(), EngineError> {
        self.hit();
        let mut indices = self.indices.write();
        let src = indices
            .get(source)
            .ok_or_else(|| EngineError::NotFound(format!("no such index [{}]", source)))?;
        if !src.write_blocked {
            return Err(EngineError::BadRequest(format!(
                "index {} must be read-only to resize index. use \"index.blocks.write=true\"",
                source
            )));
        }
        if indices.contains_key(target) {
            return Err(EngineError::BadRequest(format!(
                "resource_already_exists_exception: index [{}] already exists",
                target
            )));
        }

        let mut cloned = MemIndex {
            settings: src.settings.clone(),
            properties: src.properties.clone(),
            documents: src.documents.clone(),
            aliases: BTreeMap::new(),
            write_blocked: false,
        };
        if let Some(aliases) = body.get("aliases").and_then(Value::as_object) {
            for (alias, spec) in aliases {
                let is_write = spec.get("is_write_index").and_then(Value::as_bool).unwrap_or(false);
                cloned.aliases.insert(alias.clone(), is_write);
            }
        }
        indices.insert(target.to_string(), cloned);
        Ok(())
    }

    async fn reindex(&self, body: &Value) -> Result<ReindexResponse, EngineError> {
        self.hit();
        let source = body
            .pointer("/source/index")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::BadRequest("reindex requires source.index".into()))?;
        let dest = body
            .pointer("/dest/index")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::BadRequest("reindex requires dest.index".into()))?;
        let includes: Option<Vec<String>> = body
            .pointer("/source/_source")
            .and_then(Value::as_array)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|f| f.as_str().map(str::to_string))
                    .collect()
            });

        let mut indices = self.indices.write();
        let source_names = resolve_read(&indices, source)?;
        let dest_name = resolve_write(&indices, dest)?;

        let mut copied = Vec::new();
        for name in &source_names {
            if let Some(idx) = indices.get(name) {
                for (id, doc) in &idx.documents {
                    let filtered = match (&includes, doc.as_object()) {
                        (Some(fields), Some(obj)) => Value::Object(
                            obj.iter()
                                .filter(|(k, _)| fields.iter().any(|f| f == *k))
                                .map(|(k, v)| (k.clone(), v.clone()))
                                .collect(),
                        ),
                        _ => doc.clone(),
                    };
                    copied.push((id.clone(), filtered));
                }
            }
        }

        let dest_idx = indices
            .get_mut(&dest_name)
            .ok_or_else(|| EngineError::NotFound(format!("no such index [{}]", dest_name)))?;
        if dest_idx.write_blocked {
            return Err(write_block_error(&dest_name));
        }
        let total = copied.len() as u64;
        for (id, doc) in copied {
            dest_idx.documents.insert(id, doc);
        }

        let injected = self.pending_reindex_failures.swap(0, Ordering::SeqCst);
        let failures = (0..injected)
            .map(|i| json!({"index": dest_name, "id": i.to_string(), "cause": {"type": "injected"}}))
            .collect();

        Ok(ReindexResponse {
            took: 0,
            total,
            failures,
        })
    }

    async fn index_document(&self, index: &str, id: &str, document: &Value) -> Result<(), EngineError> {
        self.hit();
        let mut indices = self.indices.write();
        let target = resolve_write(&indices, index)?;
        let idx = indices
            .get_mut(&target)
            .ok_or_else(|| EngineError::NotFound(format!("no such index [{}]", target)))?;
        if idx.write_blocked {
            return Err(write_block_error(&target));
        }
        idx.documents.insert(id.to_string(), document.clone());
        Ok(())
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<(), EngineError> {
        self.hit();
        let mut indices = self.indices.write();
        let target = resolve_write(&indices, index)?;
        let idx = indices
            .get_mut(&target)
            .ok_or_else(|| EngineError::NotFound(format!("no such index [{}]", target)))?;
        if idx.write_blocked {
            return Err(write_block_error(&target));
        }
        idx.documents
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| EngineError::NotFound(format!("document [{}] not found", id)))
    }

    async fn get_source(&self, index: &str, id: &str) -> Result<Value, EngineError> {
        self.hit();
        let indices = self.indices.read();
        resolve_read(&indices, index)?
            .iter()
            .filter_map(|t| indices.get(t))
            .find_map(|idx| idx.documents.get(id).cloned())
            .ok_or_else(|| EngineError::NotFound(format!("document [{}] not found", id)))
    }

    async fn bulk(&self, operations: &[BulkOperation]) -> Result<BulkResponse, EngineError> {
        self.hit();
        let mut indices = self.indices.write();
        let mut items = Vec::with_capacity(operations.len());
        let mut errors = false;

        for op in operations {
            let (action, index, id) = match op {
                BulkOperation::Index { index, id, .. } => ("index", index, id),
                BulkOperation::Delete { index, id } => ("delete", index, id),
            };
            let outcome = resolve_write(&indices, index).and_then(|target| {
                let idx = indices
                    .get_mut(&target)
                    .ok_or_else(|| EngineError::NotFound(target.clone()))?;
                if idx.write_blocked {
                    return Err(write_block_error(&target));
                }
                Ok(match op {
                    BulkOperation::Index { document, .. } => {
                        idx.documents.insert(id.clone(), document.clone());
                        (201, "created")
                    }
                    BulkOperation::Delete { .. } => match idx.documents.remove(id) {
                        Some(_) => (200, "deleted"),
                        None => (404, "not_found"),
                    },
                })
            });
            let item = match outcome {
                Ok((status, result)) => json!({action: {"_index": index, "_id": id, "status": status, "result": result}}),
                Err(e) => {
                    errors = true;
                    json!({action: {"_index": index, "_id": id, "status": 400, "error": e.to_string()}})
                }
            };
            items.push(item);
        }

        Ok(BulkResponse {
            took: 0,
            errors,
            items,
        })
    }

    async fn search(&self, index: &str, body: &Value) -> Result<SearchResponse, EngineError> {
        self.hit();
        if self.reject_searches.load(Ordering::SeqCst) {
            return Err(EngineError::BadRequest(
                "search_phase_execution_exception: rejected".into(),
            ));
        }
        let indices = self.indices.read();
        let targets = resolve_read(&indices, index)?;
        let query = body.get("query").cloned().unwrap_or_else(|| json!({"match_all": {}}));
        let size = body.get("size").and_then(Value::as_u64).unwrap_or(10) as usize;
        let with_source = !matches!(body.get("stored_fields"), Some(Value::Array(f)) if f.is_empty());

        let mut hits = Vec::new();
        for target in &targets {
            let Some(idx) = indices.get(target) else { continue };
            for (id, doc) in &idx.documents {
                if let Some(score) = query_eval::score(&query, id, doc)? {
                    hits.push(SearchHit {
                        id: id.clone(),
                        score: Some(score),
                        source: with_source.then(|| doc.clone()),
                    });
                }
            }
        }
        // Stable sort keeps id order for equal scores
        hits.sort_by(|a, b| {
            b.score
                .unwrap_or(0.0)
                .partial_cmp(&a.score.unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let total = hits.len() as u64;
        hits.truncate(size);

        Ok(SearchResponse { took: 0, total, hits })
    }

    async fn index_stats(&self, index: &str) -> Result<IndexStats, EngineError> {
        self.hit();
        let indices = self.indices.read();
        let target = resolve_read(&indices, index)?
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::NotFound(index.to_string()))?;
        let idx = indices
            .get(&target)
            .ok_or_else(|| EngineError::NotFound(target.clone()))?;
        Ok(IndexStats {
            docs_count: idx.documents.len() as u64,
            store_size_bytes: idx.store_size(),
            index: target,
        })
    }

    async fn cat_aliases(&self) -> Result<Vec<CatAlias>, EngineError> {
        self.hit();
        Ok(self
            .indices
            .read()
            .iter()
            .flat_map(|(name, idx)| {
                idx.aliases.keys().map(move |alias| CatAlias {
                    alias: alias.clone(),
                    index: name.clone(),
                })
            })
            .collect())
    }

    async fn cat_indices(&self) -> Result<Vec<CatIndex>, EngineError> {
        self.hit();
        Ok(self
            .indices
            .read()
            .iter()
            .map(|(name, idx)| CatIndex {
                health: "green".into(),
                status: "open".into(),
                index: name.clone(),
                docs_count: Some(idx.documents.len().to_string()),
                store_size: Some(format!("{}b", idx.store_size())),
            })
            .collect())
    }

    async fn analyze(&self, index: &str, body: &Value) -> Result<Vec<AnalyzeToken>, EngineError> {
        self.hit();
        resolve_read(&self.indices.read(), index)?;
        let text = body.get("text").and_then(Value::as_str).unwrap_or("");

        let mut tokens = Vec::new();
        let mut start: Option<usize> = None;
        for (pos, ch) in text.char_indices().chain(std::iter::once((text.len(), ' '))) {
            if ch.is_alphanumeric() {
                start.get_or_insert(pos);
            } else if let Some(s) = start.take() {
                tokens.push(AnalyzeToken {
                    token: text[s..pos].to_lowercase(),
                    start_offset: s as u64,
                    end_offset: pos as u64,
                    kind: "<ALPHANUM>".into(),
                    position: tokens.len() as u64,
                });
            }
        }
        Ok(tokens)
    }
}

/// Minimal query DSL evaluator: `match_all`, `ids`, `bool`, `query_string`.
mod query_eval {
    use serde_json::Value;

    use crate::engine::traits::EngineError;

    #[derive(Debug, PartialEq)]
    enum Occur {
        Must,
        MustNot,
        Should,
    }

    #[derive(Debug)]
    struct Clause {
        occur: Occur,
        field: Option<String>,
        text: String,
        phrase: bool,
    }

    fn as_list(value: Option<&Value>) -> Vec<&Value> {
        match value {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(other) => vec![other],
            None => Vec::new(),
        }
    }

    /// `Some(score)` when the document matches.
    pub(super) fn score(query: &Value, id: &str, doc: &Value) -> Result<Option<f64>, EngineError> {
        let obj = query
            .as_object()
            .ok_or_else(|| EngineError::BadRequest("query must be an object".into()))?;
        let (kind, spec) = obj
            .iter()
            .next()
            .ok_or_else(|| EngineError::BadRequest("empty query".into()))?;

        match kind.as_str() {
            "match_all" => Ok(Some(1.0)),
            "ids" => {
                let matched = as_list(spec.get("values")).iter().any(|v| match v {
                    Value::String(s) => s == id,
                    other => other.to_string() == id,
                });
                Ok(matched.then_some(0.0))
            }
            "bool" => {
                let mut total = 0.0;
                for must in as_list(spec.get("must")) {
                    match score(must, id, doc)? {
                        Some(s) => total += s,
                        None => return Ok(None),
                    }
                }
                for filter in as_list(spec.get("filter")) {
                    if score(filter, id, doc)?.is_none() {
                        return Ok(None);
                    }
                }
                for must_not in as_list(spec.get("must_not")) {
                    if score(must_not, id, doc)?.is_some() {
                        return Ok(None);
                    }
                }
                Ok(Some(total))
            }
            "query_string" => query_string(spec, doc),
            other => Err(EngineError::BadRequest(format!("unknown query [{}]", other))),
        }
    }

    fn parse(query: &str) -> Result<Vec<Clause>, EngineError> {
        let mut clauses = Vec::new();
        let mut chars = query.chars().peekable();

        loop {
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
            let Some(&first) = chars.peek() else { break };
            let occur = match first {
                '+' => {
                    chars.next();
                    Occur::Must
                }
                '-' => {
                    chars.next();
                    Occur::MustNot
                }
                _ => Occur::Should,
            };

            let mut raw = String::new();
            let mut in_quotes = false;
            let mut quoted = false;
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() && !in_quotes {
                    break;
                }
                if c == '"' {
                    in_quotes = !in_quotes;
                    quoted = true;
                }
                if (c == '(' || c == ')') && !in_quotes {
                    return Err(EngineError::BadRequest(format!(
                        "parse_exception: Cannot parse '{}'",
                        query
                    )));
                }
                raw.push(c);
                chars.next();
            }
            if in_quotes {
                return Err(EngineError::BadRequest(format!(
                    "parse_exception: Cannot parse '{}': Lexical error, unterminated phrase",
                    query
                )));
            }

            let (field, value) = match raw.find(':') {
                Some(pos) if raw.find('"').map_or(true, |q| pos < q) => {
                    (Some(raw[..pos].to_string()), raw[pos + 1..].to_string())
                }
                _ => (None, raw),
            };
            let text = if quoted { value.trim_matches('"').to_string() } else { value };
            if text.is_empty() {
                return Err(EngineError::BadRequest(format!(
                    "parse_exception: Cannot parse '{}': Encountered <EOF>",
                    query
                )));
            }
            clauses.push(Clause {
                occur,
                field,
                text: text.to_lowercase(),
                phrase: quoted,
            });
        }
        Ok(clauses)
    }

    fn wildcard_match(pattern: &str, word: &str) -> bool {
        let parts: Vec<&str> = pattern.split('*').collect();
        if parts.len() == 1 {
            return pattern == word;
        }
        let mut rest = word;
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() {
                continue;
            }
            if i == 0 {
                match rest.strip_prefix(part) {
                    Some(r) => rest = r,
                    None => return false,
                }
            } else if i == parts.len() - 1 {
                return rest.ends_with(part);
            } else {
                match rest.find(part) {
                    Some(pos) => rest = &rest[pos + part.len()..],
                    None => return false,
                }
            }
        }
        true
    }

    fn words(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| c.is_whitespace())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn clause_matches(clause: &Clause, value: &str) -> bool {
        let doc_words = words(value);
        if clause.phrase {
            let phrase = words(&clause.text);
            !phrase.is_empty() && doc_words.windows(phrase.len()).any(|w| w == phrase.as_slice())
        } else {
            doc_words.iter().any(|w| wildcard_match(&clause.text, w))
        }
    }

    fn query_string(spec: &Value, doc: &Value) -> Result<Option<f64>, EngineError> {
        let query = spec.get("query").and_then(Value::as_str).unwrap_or("");
        let clauses = parse(query)?;
        let boosts: Vec<(String, f64)> = as_list(spec.get("fields"))
            .iter()
            .filter_map(|f| f.as_str())
            .map(|f| match f.split_once('^') {
                Some((name, boost)) => (name.to_string(), boost.parse().unwrap_or(1.0)),
                None => (f.to_string(), 1.0),
            })
            .collect();
        let boost_for = |field: &str| -> f64 {
            boosts
                .iter()
                .filter(|(name, _)| name == field || name == "*")
                .map(|(_, b)| *b)
                .fold(0.0, f64::max)
        };

        let fields: Vec<(&String, &str)> = doc
            .as_object()
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k, s)))
                    .collect()
            })
            .unwrap_or_default();

        let clause_score = |clause: &Clause| -> Option<f64> {
            fields
                .iter()
                .filter(|(name, _)| clause.field.as_deref().map_or(true, |f| f == name.as_str()))
                .filter(|(_, value)| clause_matches(clause, value))
                .map(|(name, _)| boost_for(name).max(if clause.field.is_some() { 1.0 } else { 0.0 }))
                .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))))
        };

        let has_must = clauses.iter().any(|c| c.occur == Occur::Must);
        let mut total = 0.0;
        let mut any_should = false;
        for clause in &clauses {
            let scored = clause_score(clause);
            match clause.occur {
                Occur::Must => match scored {
                    Some(s) => total += s,
                    None => return Ok(None),
                },
                Occur::MustNot => {
                    if scored.is_some() {
                        return Ok(None);
                    }
                }
                Occur::Should => {
                    if let Some(s) = scored {
                        total += s;
                        any_should = true;
                    }
                }
            }
        }
        let has_should = clauses.iter().any(|c| c.occur == Occur::Should);
        if !has_must && has_should && !any_should {
            return Ok(None);
        }
        if clauses.is_empty() {
            return Ok(None);
        }
        Ok(Some(total))
    }

}
