// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for elastic-sync.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The host process is responsible for choosing the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `elastic_sync_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `operation`: ensure_exists, reindex, clone, update_mapping, delete, delete_orphaned, upsert, ...
//! - `status`: success, error, partial_failure, bad_query, skipped

use metrics::{counter, gauge, histogram};
use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════
// LIFECYCLE - Index creation, migration and cleanup
// ═══════════════════════════════════════════════════════════════════════════

/// Record a lifecycle operation outcome
pub fn record_lifecycle_operation(operation: &str, status: &str) {
    counter!(
        "elastic_sync_lifecycle_operations_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record lifecycle operation latency
pub fn record_lifecycle_latency(operation: &str, duration: Duration) {
    histogram!(
        "elastic_sync_lifecycle_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record documents copied by a reindex
pub fn record_reindexed_documents(count: u64) {
    counter!("elastic_sync_reindexed_documents_total").increment(count);
}

/// Record generations removed by cleanup
pub fn record_indices_deleted(reason: &str, count: usize) {
    counter!(
        "elastic_sync_indices_deleted_total",
        "reason" => reason.to_string()
    )
    .increment(count as u64);
}

// ═══════════════════════════════════════════════════════════════════════════
// DOCUMENTS - Writes through the alias
// ═══════════════════════════════════════════════════════════════════════════

/// Record a document write (upsert, delete, bulk_delete)
pub fn record_document_write(operation: &str, status: &str) {
    counter!(
        "elastic_sync_document_writes_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a per-document lock that was already held
pub fn record_lock_contention() {
    counter!("elastic_sync_lock_contention_total").increment(1);
}

// ═══════════════════════════════════════════════════════════════════════════
// SEARCH - Query execution
// ═══════════════════════════════════════════════════════════════════════════

/// Record a search query execution
pub fn record_search_query(status: &str) {
    counter!(
        "elastic_sync_search_queries_total",
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record search query latency
pub fn record_search_latency(duration: Duration) {
    histogram!("elastic_sync_search_seconds").record(duration.as_secs_f64());
}

/// Record search result count
pub fn record_search_results(count: usize) {
    histogram!("elastic_sync_search_results").record(count as f64);
}

// ═══════════════════════════════════════════════════════════════════════════
// SIGNATURE CACHE - Mapping drift detection
// ═══════════════════════════════════════════════════════════════════════════

/// Record signature cache hit/miss
pub fn record_signature_cache(hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    counter!(
        "elastic_sync_signature_cache_total",
        "outcome" => outcome
    )
    .increment(1);
}

/// Set number of cached signatures
pub fn set_signature_cache_entries(entries: usize) {
    gauge!("elastic_sync_signature_cache_entries").set(entries as f64);
}

// ═══════════════════════════════════════════════════════════════════════════
// ADMIN - Per-site batch outcomes
// ═══════════════════════════════════════════════════════════════════════════

/// Record one collection's outcome inside an admin batch
pub fn record_admin_outcome(operation: &str, success: bool) {
    let status = if success { "success" } else { "error" };
    counter!(
        "elastic_sync_admin_operations_total",
        "operation" => operation.to_string(),
        "status" => status
    )
    .increment(1);
}
