// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Elasticsearch REST client.
//!
//! A thin mapping from [`SearchEngine`] calls onto the REST endpoints.
//! Hosts are tried in configuration order; transport failures move on to
//! the next host and the whole request is retried with
//! [`RetryConfig::request()`]. Requests that start work on the cluster
//! (`_reindex`, `_clone`, index creation) are sent at most once: no retry,
//! and no next host after a timeout, since the first node may still be
//! running them. HTTP status codes map onto [`EngineError`]:
//!
//! | status | error |
//! |--------|-------|
//! | 400 | `BadRequest` |
//! | 401 | `Configuration` |
//! | 403 | `Forbidden` |
//! | 404 | `NotFound` |
//! | 409 | `Conflict` |
//! | other | `Backend` |

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::sigv4::AwsSigner;
use super::traits::{
    AnalyzeToken, BulkOperation, BulkResponse, CatAlias, CatIndex, EngineError, IndexDescription,
    IndexStats, ReindexResponse, SearchEngine, SearchHit, SearchResponse,
};
use crate::config::{Authentication, ElasticConfig};
use crate::error::{ElasticError, Result};
use crate::resilience::retry::{retry_if, RetryConfig};

#[derive(Clone)]
enum Credentials {
    Basic { username: String, password: String },
    Aws(AwsSigner),
}

enum Payload {
    Json(Value),
    NdJson(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    /// Safe to resend: reads, alias and settings updates, document writes by id.
    Retryable,
    /// Starts server-side work; a resend would start it again.
    AtMostOnce,
}

impl Payload {
    fn bytes(&self) -> Vec<u8> {
        match self {
            Payload::Json(v) => v.to_string().into_bytes(),
            Payload::NdJson(s) => s.clone().into_bytes(),
        }
    }

    fn content_type(&self) -> &'static str {
        match self {
            Payload::Json(_) => "application/json",
            Payload::NdJson(_) => "application/x-ndjson",
        }
    }
}

pub struct HttpEngine {
    client: Client,
    hosts: Vec<Url>,
    credentials: Credentials,
    retry: RetryConfig,
}

impl fmt::Debug for HttpEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let auth = match &self.credentials {
            Credentials::Basic { .. } => "basicauth",
            Credentials::Aws(_) => "aws",
        };
        f.debug_struct("HttpEngine")
            .field("hosts", &self.hosts.iter().map(Url::as_str).collect::<Vec<_>>())
            .field("authentication", &auth)
            .finish()
    }
}

impl HttpEngine {
    /// Build a client without contacting the cluster.
    pub fn from_config(config: &ElasticConfig) -> Result<Self> {
        config.validate()?;

        let hosts = config
            .hosts()
            .iter()
            .map(|h| {
                Url::parse(h).map_err(|e| ElasticError::Configuration(format!("Invalid endpoint '{}': {}", h, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        let credentials = match config.authentication {
            Some(Authentication::Aws) => Credentials::Aws(AwsSigner::new(
                config.username.clone(),
                config.password.clone(),
                config.session_token.clone(),
                config.region.clone().unwrap_or_default(),
            )),
            Some(Authentication::BasicAuth) => Credentials::Basic {
                username: config.username.clone(),
                password: config.password.clone(),
            },
            None => {
                return Err(ElasticError::Configuration(
                    "No valid authentication method set".into(),
                ))
            }
        };

        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| ElasticError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            hosts,
            credentials,
            retry: RetryConfig::request(),
        })
    }

    /// Build a client and wait for the cluster to answer a ping.
    pub async fn connect(config: &ElasticConfig) -> Result<Self> {
        let engine = Self::from_config(config)?;
        retry_if("elasticsearch_ping", &RetryConfig::startup(), EngineError::is_transient, || engine.ping()).await?;
        info!(hosts = engine.hosts.len(), "Connected to Elasticsearch");
        Ok(engine)
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn url_for(host: &Url, segments: &[&str], query: &[(&str, &str)]) -> std::result::Result<Url, EngineError> {
        let mut url = host.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| EngineError::Configuration(format!("Endpoint '{}' cannot be a base URL", host)))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn send_once(
        &self,
        method: &Method,
        segments: &[&str],
        query: &[(&str, &str)],
        payload: Option<&Payload>,
        delivery: Delivery,
    ) -> std::result::Result<(StatusCode, Vec<u8>), EngineError> {
        let mut last_error = EngineError::Transport("no hosts configured".into());

        for host in &self.hosts {
            let url = Self::url_for(host, segments, query)?;
            let body = payload.map(Payload::bytes).unwrap_or_default();

            let mut request = self.client.request(method.clone(), url.clone());
            if let Some(p) = payload {
                request = request.header("content-type", p.content_type()).body(body.clone());
            }
            request = match &self.credentials {
                Credentials::Basic { username, password } => request.basic_auth(username, Some(password)),
                Credentials::Aws(signer) => {
                    for (name, value) in signer.sign(method.as_str(), &url, &body, chrono::Utc::now())? {
                        request = request.header(name, value);
                    }
                    request
                }
            };

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    let bytes = response
                        .bytes()
                        .await
                        .map_err(|e| EngineError::Transport(format!("Failed to read response: {}", e)))?;
                    return Ok((status, bytes.to_vec()));
                }
                Err(e) => {
                    debug!(host = %host, error = %e, "Elasticsearch host unreachable");
                    if e.is_connect() {
                        last_error = EngineError::Transport(format!("Failed to connect: {}", e));
                        continue;
                    }
                    last_error = if e.is_timeout() {
                        EngineError::Transport(format!("Request timeout: {}", e))
                    } else {
                        EngineError::Transport(format!("Request failed: {}", e))
                    };
                    // The request may have reached this node
                    if delivery == Delivery::AtMostOnce {
                        warn!(host = %host, path = %url.path(), "Request outcome unknown, not resending");
                        return Err(last_error);
                    }
                }
            }
        }
        Err(last_error)
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, &str)],
        payload: Option<Payload>,
    ) -> std::result::Result<(StatusCode, Vec<u8>), EngineError> {
        self.send_with(Delivery::Retryable, method, segments, query, payload).await
    }

    async fn send_with(
        &self,
        delivery: Delivery,
        method: Method,
        segments: &[&str],
        query: &[(&str, &str)],
        payload: Option<Payload>,
    ) -> std::result::Result<(StatusCode, Vec<u8>), EngineError> {
        let payload = payload.as_ref();
        let method = &method;
        let single = RetryConfig::none();
        let policy = match delivery {
            Delivery::Retryable => &self.retry,
            Delivery::AtMostOnce => &single,
        };
        retry_if("elasticsearch_request", policy, EngineError::is_transient, || {
            self.send_once(method, segments, query, payload, delivery)
        })
        .await
    }

    /// Send and decode a JSON response, mapping error statuses.
    async fn request(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, &str)],
        payload: Option<Payload>,
    ) -> std::result::Result<Value, EngineError> {
        self.request_with(Delivery::Retryable, method, segments, query, payload).await
    }

    /// [`request`](Self::request) for calls that must not be repeated.
    async fn request_once(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, &str)],
        payload: Option<Payload>,
    ) -> std::result::Result<Value, EngineError> {
        self.request_with(Delivery::AtMostOnce, method, segments, query, payload).await
    }

    async fn request_with(
        &self,
        delivery: Delivery,
        method: Method,
        segments: &[&str],
        query: &[(&str, &str)],
        payload: Option<Payload>,
    ) -> std::result::Result<Value, EngineError> {
        let (status, body) = self.send_with(delivery, method, segments, query, payload).await?;
        if !status.is_success() {
            return Err(error_from_status(status.as_u16(), &String::from_utf8_lossy(&body)));
        }
        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&body)
            .map_err(|e| EngineError::Backend(format!("Failed to parse response: {}", e)))
    }
}

/// Map a non-success status and its body onto an [`EngineError`].
pub(crate) fn error_from_status(status: u16, body: &str) -> EngineError {
    let reason = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            let err = v.get("error")?;
            match err {
                Value::String(s) => Some(s.clone()),
                _ => Some(format!(
                    "{}: {}",
                    err.get("type").and_then(Value::as_str).unwrap_or("error"),
                    err.get("reason").and_then(Value::as_str).unwrap_or("")
                )),
            }
        })
        .unwrap_or_else(|| format!("HTTP {}: {}", status, body));

    match status {
        400 => EngineError::BadRequest(reason),
        401 => EngineError::Configuration(format!("Authentication rejected: {}", reason)),
        403 => EngineError::Forbidden(reason),
        404 => EngineError::NotFound(reason),
        409 => EngineError::Conflict(reason),
        _ => EngineError::Backend(reason),
    }
}

pub(crate) fn bulk_body(operations: &[BulkOperation]) -> String {
    let mut out = String::new();
    for op in operations {
        match op {
            BulkOperation::Index { index, id, document } => {
                out.push_str(&json!({"index": {"_index": index, "_id": id}}).to_string());
                out.push('\n');
                out.push_str(&document.to_string());
                out.push('\n');
            }
            BulkOperation::Delete { index, id } => {
                out.push_str(&json!({"delete": {"_index": index, "_id": id}}).to_string());
                out.push('\n');
            }
        }
    }
    out
}

pub(crate) fn parse_search_response(body: &Value) -> SearchResponse {
    let total = match body.pointer("/hits/total") {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(obj) => obj.get("value").and_then(Value::as_u64).unwrap_or(0),
        None => 0,
    };
    let hits = body
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| {
                    Some(SearchHit {
                        id: hit.get("_id")?.as_str()?.to_string(),
                        score: hit.get("_score").and_then(Value::as_f64),
                        source: hit.get("_source").cloned(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    SearchResponse {
        took: body.get("took").and_then(Value::as_u64).unwrap_or(0),
        total,
        hits,
    }
}

/// `GET /<pattern>` answers with an object keyed by concrete index name.
pub(crate) fn parse_index_map(body: &Value) -> Vec<IndexDescription> {
    let mut out: Vec<IndexDescription> = body
        .as_object()
        .map(|indices| {
            indices
                .iter()
                .map(|(name, spec)| IndexDescription {
                    name: name.clone(),
                    aliases: spec
                        .get("aliases")
                        .and_then(Value::as_object)
                        .map(|a| a.keys().cloned().collect())
                        .unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

#[async_trait]
impl SearchEngine for HttpEngine {
    async fn ping(&self) -> std::result::Result<(), EngineError> {
        self.request(Method::GET, &[], &[], None).await.map(|_| ())
    }

    async fn create_index(&self, name: &str, body: &Value) -> std::result::Result<(), EngineError> {
        self.request_once(Method::PUT, &[name], &[], Some(Payload::Json(body.clone())))
            .await
            .map(|_| ())
    }

    async fn delete_index(&self, name: &str) -> std::result::Result<(), EngineError> {
        self.request(Method::DELETE, &[name], &[], None).await.map(|_| ())
    }

    async fn get_indices(&self, pattern: &str) -> std::result::Result<Vec<IndexDescription>, EngineError> {
        let body = self.request(Method::GET, &[pattern], &[], None).await?;
        Ok(parse_index_map(&body))
    }

    async fn alias_exists(&self, alias: &str) -> std::result::Result<bool, EngineError> {
        let (status, body) = self.send(Method::HEAD, &["_alias", alias], &[], None).await?;
        match status.as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            other => Err(error_from_status(other, &String::from_utf8_lossy(&body))),
        }
    }

    async fn get_alias(&self, alias: &str) -> std::result::Result<Vec<String>, EngineError> {
        let body = self.request(Method::GET, &["_alias", alias], &[], None).await?;
        let mut indices: Vec<String> = body
            .as_object()
            .map(|o| o.keys().cloned().collect())
            .unwrap_or_default();
        if indices.is_empty() {
            return Err(EngineError::NotFound(format!("alias [{}] missing", alias)));
        }
        indices.sort();
        Ok(indices)
    }

    async fn put_alias(&self, index: &str, alias: &str) -> std::result::Result<(), EngineError> {
        self.request(Method::PUT, &[index, "_alias", alias], &[], None).await.map(|_| ())
    }

    async fn delete_alias(&self, index: &str, alias: &str) -> std::result::Result<(), EngineError> {
        self.request(Method::DELETE, &[index, "_alias", alias], &[], None).await.map(|_| ())
    }

    async fn put_settings(&self, index: &str, settings: &Value) -> std::result::Result<(), EngineError> {
        self.request(
            Method::PUT,
            &[index, "_settings"],
            &[],
            Some(Payload::Json(json!({ "settings": settings }))),
        )
        .await
        .map(|_| ())
    }

    async fn get_settings(&self, index: &str) -> std::result::Result<Value, EngineError> {
        let body = self
            .request(Method::GET, &[index, "_settings"], &[("flat_settings", "true")], None)
            .await?;
        body.get(index)
            .and_then(|i| i.get("settings"))
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("no settings for [{}]", index)))
    }

    async fn get_mapping(&self, index: &str) -> std::result::Result<Value, EngineError> {
        let body = self.request(Method::GET, &[index, "_mapping"], &[], None).await?;
        Ok(body
            .as_object()
            .and_then(|o| o.values().next())
            .and_then(|m| m.pointer("/mappings/properties"))
            .cloned()
            .unwrap_or_else(|| json!({})))
    }

    async fn put_mapping(&self, index: &str, properties: &Value) -> std::result::Result<(), EngineError> {
        self.request(
            Method::PUT,
            &[index, "_mapping"],
            &[],
            Some(Payload::Json(json!({ "properties": properties }))),
        )
        .await
        .map(|_| ())
    }

    async fn clone_index(&self, source: &str, target: &str, body: &Value) -> std::result::Result<(), EngineError> {
        self.request_once(Method::PUT, &[source, "_clone", target], &[], Some(Payload::Json(body.clone())))
            .await
            .map(|_| ())
    }

    async fn reindex(&self, body: &Value) -> std::result::Result<ReindexResponse, EngineError> {
        let resp = self
            .request_once(Method::POST, &["_reindex"], &[("refresh", "true")], Some(Payload::Json(body.clone())))
            .await?;
        serde_json::from_value(resp).map_err(|e| EngineError::Backend(format!("Unexpected reindex response: {}", e)))
    }

    async fn index_document(&self, index: &str, id: &str, document: &Value) -> std::result::Result<(), EngineError> {
        self.request(Method::PUT, &[index, "_doc", id], &[], Some(Payload::Json(document.clone())))
            .await
            .map(|_| ())
    }

    async fn delete_document(&self, index: &str, id: &str) -> std::result::Result<(), EngineError> {
        self.request(Method::DELETE, &[index, "_doc", id], &[], None).await.map(|_| ())
    }

    async fn get_source(&self, index: &str, id: &str) -> std::result::Result<Value, EngineError> {
        self.request(Method::GET, &[index, "_source", id], &[], None).await
    }

    async fn bulk(&self, operations: &[BulkOperation]) -> std::result::Result<BulkResponse, EngineError> {
        let resp = self
            .request(Method::POST, &["_bulk"], &[], Some(Payload::NdJson(bulk_body(operations))))
            .await?;
        serde_json::from_value(resp).map_err(|e| EngineError::Backend(format!("Unexpected bulk response: {}", e)))
    }

    async fn search(&self, index: &str, body: &Value) -> std::result::Result<SearchResponse, EngineError> {
        let resp = self
            .request(Method::POST, &[index, "_search"], &[], Some(Payload::Json(body.clone())))
            .await?;
        Ok(parse_search_response(&resp))
    }

    async fn index_stats(&self, index: &str) -> std::result::Result<IndexStats, EngineError> {
        let resp = self.request(Method::GET, &[index, "_stats"], &[], None).await?;
        let (name, stats) = resp
            .get("indices")
            .and_then(Value::as_object)
            .and_then(|o| o.iter().next())
            .ok_or_else(|| EngineError::NotFound(format!("no stats for [{}]", index)))?;
        Ok(IndexStats {
            index: name.clone(),
            docs_count: stats.pointer("/total/docs/count").and_then(Value::as_u64).unwrap_or(0),
            store_size_bytes: stats
                .pointer("/total/store/size_in_bytes")
                .and_then(Value::as_u64)
                .unwrap_or(0),
        })
    }

    async fn cat_aliases(&self) -> std::result::Result<Vec<CatAlias>, EngineError> {
        let resp = self
            .request(Method::GET, &["_cat", "aliases"], &[("format", "json")], None)
            .await?;
        serde_json::from_value(resp).map_err(|e| EngineError::Backend(format!("Unexpected _cat response: {}", e)))
    }

    async fn cat_indices(&self) -> std::result::Result<Vec<CatIndex>, EngineError> {
        let resp = self
            .request(Method::GET, &["_cat", "indices"], &[("format", "json")], None)
            .await?;
        serde_json::from_value(resp).map_err(|e| EngineError::Backend(format!("Unexpected _cat response: {}", e)))
    }

    async fn analyze(&self, index: &str, body: &Value) -> std::result::Result<Vec<AnalyzeToken>, EngineError> {
        let resp = self
            .request(Method::POST, &[index, "_analyze"], &[], Some(Payload::Json(body.clone())))
            .await?;
        let tokens = resp.get("tokens").cloned().unwrap_or_else(|| json!([]));
        serde_json::from_value(tokens).map_err(|e| EngineError::Backend(format!("Unexpected _analyze response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn config() -> ElasticConfig {
        ElasticConfig {
            endpoint: "http://localhost:9200".into(),
            authentication: Some(Authentication::BasicAuth),
            username: "elastic".into(),
            password: "secret-password".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_config_requires_authentication() {
        let result = HttpEngine::from_config(&ElasticConfig {
            authentication: None,
            ..config()
        });
        assert!(matches!(result, Err(ElasticError::Configuration(_))));
    }

    #[test]
    fn test_debug_hides_password() {
        let engine = HttpEngine::from_config(&config()).unwrap();
        let debug_output = format!("{:?}", engine);
        assert!(debug_output.contains("basicauth"));
        assert!(!debug_output.contains("secret-password"));
    }

    #[test]
    fn test_url_for_encodes_segments() {
        let host = Url::parse("http://localhost:9200").unwrap();
        let url = HttpEngine::url_for(&host, &["craftcms_en_*"], &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/craftcms_en_*");

        let url = HttpEngine::url_for(&host, &["_cat", "indices"], &[("format", "json")]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/_cat/indices?format=json");

        let url = HttpEngine::url_for(&host, &["idx", "_doc", "a/b"], &[]).unwrap();
        assert_eq!(url.path(), "/idx/_doc/a%2Fb");
    }

    #[test]
    fn test_status_mapping() {
        let body = r#"{"error":{"type":"index_not_found_exception","reason":"no such index [x]"},"status":404}"#;
        match error_from_status(404, body) {
            EngineError::NotFound(msg) => assert!(msg.contains("index_not_found_exception")),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(error_from_status(400, "{}"), EngineError::BadRequest(_)));
        assert!(matches!(error_from_status(409, ""), EngineError::Conflict(_)));
        assert!(matches!(error_from_status(403, ""), EngineError::Forbidden(_)));
        assert!(matches!(error_from_status(401, ""), EngineError::Configuration(_)));
        assert!(matches!(error_from_status(503, "down"), EngineError::Backend(_)));
    }

    #[test]
    fn test_bulk_body_is_ndjson() {
        let body = bulk_body(&[
            BulkOperation::Delete { index: "craftcms_en".into(), id: "1".into() },
            BulkOperation::Index {
                index: "craftcms_en".into(),
                id: "2".into(),
                document: json!({"craft_attribute_title": "hello"}),
            },
        ]);
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(body.ends_with('\n'));
        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["delete"]["_id"], "1");
    }

    #[test]
    fn test_parse_search_response() {
        let resp = parse_search_response(&json!({
            "took": 3,
            "hits": {
                "total": {"value": 2, "relation": "eq"},
                "hits": [
                    {"_id": "10", "_score": 2.5, "_source": {"a": "b"}},
                    {"_id": "11", "_score": null}
                ]
            }
        }));
        assert_eq!(resp.took, 3);
        assert_eq!(resp.total, 2);
        assert_eq!(resp.hits[0].score, Some(2.5));
        assert_eq!(resp.hits[1].score, None);
        assert_eq!(resp.hits[1].source, None);
    }

    /// Accepts connections and hangs up without answering.
    async fn hang_up_server() -> (String, Arc<AtomicUsize>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = accepted.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                drop(stream);
            }
        });
        (format!("http://{}", addr), accepted)
    }

    fn engine_for(endpoint: String) -> HttpEngine {
        HttpEngine::from_config(&ElasticConfig { endpoint, ..config() })
            .unwrap()
            .with_retry(RetryConfig::test())
    }

    #[tokio::test]
    async fn test_reads_are_retried_on_transport_errors() {
        let (endpoint, accepted) = hang_up_server().await;
        let engine = engine_for(endpoint);

        let err = engine.get_indices("craftcms_en_*").await.unwrap_err();
        assert!(matches!(err, EngineError::Transport(_)));
        assert_eq!(accepted.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_work_starting_requests_are_sent_once() {
        let (endpoint, accepted) = hang_up_server().await;
        let engine = engine_for(endpoint);

        let body = json!({"source": {"index": "a"}, "dest": {"index": "b"}});
        assert!(matches!(engine.reindex(&body).await, Err(EngineError::Transport(_))));
        assert_eq!(accepted.load(Ordering::SeqCst), 1);

        assert!(engine.clone_index("a", "b", &json!({})).await.is_err());
        assert!(engine.create_index("b", &json!({})).await.is_err());
        assert_eq!(accepted.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_parse_index_map() {
        let indices = parse_index_map(&json!({
            "craftcms_en_2": {"aliases": {}},
            "craftcms_en_1": {"aliases": {"craftcms_en": {}}}
        }));
        assert_eq!(indices.len(), 2);
        assert_eq!(indices[0].name, "craftcms_en_1");
        assert_eq!(indices[0].aliases, vec!["craftcms_en"]);
        assert!(indices[1].aliases.is_empty());
    }
}
