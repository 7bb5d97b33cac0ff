// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic elastic-sync usage example.
//!
//! Demonstrates:
//! 1. Registering a content model
//! 2. Indexing a handful of elements into a site collection
//! 3. Searching with required, excluded and scoped terms
//! 4. Migrating to a new generation and sweeping the old one
//! 5. Detecting and patching mapping drift
//! 6. Displaying metrics
//!
//! Runs against the in-memory engine, so no cluster is needed. Point
//! `ElasticSync::connect` at a real node to do the same over HTTP.
//!
//! # Run
//!
//! ```bash
//! cargo run --example basic_usage
//! RUST_LOG=elastic_sync=debug cargo run --example basic_usage
//! ```

use std::sync::Arc;

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use tracing_subscriber::EnvFilter;

use elastic_sync::schema::{ContentRegistry, Element, ElementTypeSpec, FieldDefinition};
use elastic_sync::search::CollectionKey;
use elastic_sync::{ElasticConfig, ElasticSync, FieldBoost, InMemoryEngine};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("failed to install metrics recorder");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("elastic_sync=info")))
        .with_target(false)
        .compact()
        .init();

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║           elastic-sync: Basic Usage Example                   ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    // ─────────────────────────────────────────────────────────────────────────
    // 1. Content model and service
    // ─────────────────────────────────────────────────────────────────────────
    println!("📦 Registering content model...");
    let registry = Arc::new(ContentRegistry::new());
    registry.register_element_type(ElementTypeSpec::new("entry", true, ["summary"]));
    registry.register_field(FieldDefinition::new(12, "ingredients", true));
    registry.register_field(FieldDefinition::new(13, "internalNotes", false));

    let config = ElasticConfig {
        field_boosts: vec![FieldBoost {
            handle: "title".into(),
            boost: 2.0,
        }],
        ..Default::default()
    };
    let service = ElasticSync::new(config, Arc::new(InMemoryEngine::new()), registry.clone());
    let site = CollectionKey::new(1, "default", "en-US");
    println!("   └─ Collection alias: {}", service.lifecycle().aliases().index_name(&site));

    // ─────────────────────────────────────────────────────────────────────────
    // 2. Index elements
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📝 Indexing 5 recipes...");
    let recipes = [
        (1, "Green Salad", "A quick weeknight salad", "lettuce, cucumber, lemon"),
        (2, "Tomato Soup", "Served with a side salad", "tomato, basil, cream"),
        (3, "Lemon Tart", "Sharp and sweet", "lemon, butter, sugar"),
        (4, "Caesar Salad", "The classic", "romaine, anchovy, parmesan"),
        (5, "Apple Pie", "Autumn favourite", "apple, cinnamon, butter"),
    ];
    for (id, title, summary, ingredients) in recipes {
        let element = Element::new(id, site.site_id, "entry")
            .with_attribute("title", title)
            .with_attribute("summary", summary)
            .with_field(12, ingredients)
            .with_field(13, "not searchable");
        service.indexer().index_element(&element, &site).await?;
        println!("   └─ Indexed #{} {}", id, title);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 3. Search
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🔍 Searching...");
    for text in ["salad", "salad -soup", "lemon", "title:apple", "\"side salad\""] {
        let hits = service.search().search_text(text, Some(&site), None).await?;
        let ranked: Vec<String> = hits.iter().map(|h| format!("#{} ({:.1})", h.id, h.score)).collect();
        println!("   └─ {:<16} → {}", text, ranked.join(", "));
    }
    let scoped = service.search().search_text("salad", Some(&site), Some(&[2, 4])).await?;
    println!("   └─ salad in [2, 4]   → {:?}", scoped.iter().map(|h| h.id).collect::<Vec<_>>());

    // ─────────────────────────────────────────────────────────────────────────
    // 4. Migrate to a new generation
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🔁 Reindexing into a new generation...");
    let report = service.lifecycle().reindex(&site).await?;
    println!("   └─ {} → {} ({} documents)", report.old_index, report.new_index, report.total);
    let swept = service.lifecycle().delete_orphaned(&site).await?;
    println!("   └─ Swept orphaned generations: {:?}", swept);

    // ─────────────────────────────────────────────────────────────────────────
    // 5. Mapping drift
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🧭 Adding a searchable field...");
    registry.register_field(FieldDefinition::new(14, "cuisine", true));
    service.fields_changed();
    println!("   └─ Drift: {:?}", service.lifecycle().signature_diff(&site).await?);
    println!("   └─ Sync:  {:?}", service.lifecycle().ensure_mapping_in_sync(&site).await?);

    println!("\n📍 Collections:");
    for outcome in service.admin().stats(std::slice::from_ref(&site)).await {
        match outcome.result {
            Ok(stats) => println!(
                "   └─ {}: {} documents in {}",
                outcome.collection.handle, stats.docs_count, stats.index
            ),
            Err(e) => println!("   └─ {}: {}", outcome.collection.handle, e),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 6. Metrics
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📈 Metrics:");
    dump_metrics(&snapshotter);

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║                    Example complete!                          ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    Ok(())
}

/// Print captured counters and histograms, sorted by name.
fn dump_metrics(snapshotter: &Snapshotter) {
    let mut lines: Vec<String> = Vec::new();

    for (composite_key, _, _, value) in snapshotter.snapshot().into_vec() {
        let (_, key) = composite_key.into_parts();
        let labels: Vec<_> = key.labels().map(|l| format!("{}={}", l.key(), l.value())).collect();
        let name = if labels.is_empty() {
            key.name().to_string()
        } else {
            format!("{}{{{}}}", key.name(), labels.join(","))
        };

        lines.push(match value {
            DebugValue::Counter(v) => format!("{} = {}", name, v),
            DebugValue::Gauge(v) => format!("{} = {:.2}", name, v.into_inner()),
            DebugValue::Histogram(samples) => {
                let sum: f64 = samples.iter().map(|v| v.into_inner()).sum();
                format!("{} count={} sum={:.6}", name, samples.len(), sum)
            }
        });
    }

    lines.sort();
    if lines.is_empty() {
        println!("   └─ (no metrics recorded)");
    }
    for line in lines {
        println!("   └─ {}", line);
    }
}
