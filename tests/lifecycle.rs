//! Lifecycle properties against the in-memory engine.
//!
//! Covers the alias/generation protocol end to end through [`ElasticSync`]:
//! creation, migration, cleanup, document writes and search.
//!
//! Run with: `cargo test --test lifecycle`

use std::sync::Arc;

use serde_json::json;

use elastic_sync::schema::{ContentRegistry, Element, ElementTypeSpec, FieldDefinition};
use elastic_sync::search::{CollectionKey, FieldNamer, QueryToken, SearchQuery, SearchTerm};
use elastic_sync::{ElasticConfig, ElasticError, ElasticSync, InMemoryEngine, SearchDocument, SearchEngine};

// =============================================================================
// Helpers
// =============================================================================

fn registry() -> Arc<ContentRegistry> {
    let registry = Arc::new(ContentRegistry::new());
    registry.register_element_type(ElementTypeSpec::new("entry", true, ["summary"]));
    registry.register_element_type(ElementTypeSpec::new("asset", false, ["filename", "extension"]));
    registry.register_field(FieldDefinition::new(12, "body", true));
    registry.register_field(FieldDefinition::new(14, "notes", false));
    registry
}

fn setup() -> (Arc<InMemoryEngine>, ElasticSync) {
    let engine = Arc::new(InMemoryEngine::new());
    let service = ElasticSync::new(ElasticConfig::default(), engine.clone(), registry());
    (engine, service)
}

fn en() -> CollectionKey {
    CollectionKey::new(1, "en", "en-US")
}

fn de() -> CollectionKey {
    CollectionKey::new(2, "de", "de-DE")
}

async fn bound(engine: &InMemoryEngine, alias: &str) -> Vec<String> {
    engine.get_alias(alias).await.unwrap_or_default()
}

// =============================================================================
// Creation
// =============================================================================

#[tokio::test]
async fn ensure_exists_binds_exactly_one_generation() {
    let (engine, service) = setup();
    let lifecycle = service.lifecycle();

    assert!(lifecycle.ensure_exists(&en()).await.unwrap());
    let alias = lifecycle.aliases().index_name(&en());
    assert_eq!(alias, "craftcms_en");
    assert!(lifecycle.aliases().alias_exists(&alias).await.unwrap());
    assert_eq!(bound(&engine, &alias).await.len(), 1);
}

#[tokio::test]
async fn ensure_exists_twice_creates_once() {
    let (engine, service) = setup();
    service.lifecycle().ensure_exists(&en()).await.unwrap();
    service.lifecycle().ensure_exists(&en()).await.unwrap();
    assert_eq!(engine.create_index_calls(), 1);
    assert_eq!(engine.index_names().len(), 1);
}

#[tokio::test]
async fn alias_name_is_lowercase_and_stable() {
    let (_, service) = setup();
    let mixed = CollectionKey::new(3, "MySite", "fr");
    assert_eq!(service.lifecycle().aliases().index_name(&mixed), "craftcms_mysite");
    assert_eq!(
        service.lifecycle().aliases().index_name(&mixed),
        service.lifecycle().aliases().index_name(&mixed.clone())
    );
}

#[tokio::test]
async fn new_generation_carries_locale_stopwords() {
    let (_, service) = setup();
    let body = service
        .lifecycle()
        .mappings()
        .create_index_body(&de(), &service.lifecycle().mappings().build_mapping());
    assert_eq!(
        body["settings"]["analysis"]["analyzer"]["standard_stopwords"]["stopwords"],
        "_german_"
    );
    assert_eq!(body["mappings"]["properties"]["craft_attribute_postDate"]["type"], "date");
}

// =============================================================================
// Migration
// =============================================================================

#[tokio::test]
async fn reindex_never_leaves_alias_unbound() {
    let (engine, service) = setup();
    let lifecycle = service.lifecycle();
    lifecycle.ensure_exists(&en()).await.unwrap();
    let original = bound(&engine, "craftcms_en").await;

    engine.fail_next_reindex(1);
    assert!(matches!(
        lifecycle.reindex(&en()).await,
        Err(ElasticError::PartialFailure { .. })
    ));
    assert_eq!(bound(&engine, "craftcms_en").await, original);

    let report = lifecycle.reindex(&en()).await.unwrap();
    assert_eq!(bound(&engine, "craftcms_en").await, vec![report.new_index.clone()]);
    assert_eq!(report.old_index, original[0]);
}

#[tokio::test]
async fn reindex_preserves_documents() {
    let (engine, service) = setup();
    for id in 1..=5 {
        let element = Element::new(id, 1, "entry").with_attribute("title", format!("Entry {id}"));
        service.indexer().index_element(&element, &en()).await.unwrap();
    }

    let report = service.lifecycle().reindex(&en()).await.unwrap();
    assert_eq!(report.total, 5);
    assert_eq!(engine.documents(&report.new_index).len(), 5);

    let mut ids = service.writer().list_all_ids(&en()).await.unwrap();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn delete_orphaned_after_reindex_keeps_only_bound() {
    let (engine, service) = setup();
    let lifecycle = service.lifecycle();
    lifecycle.ensure_exists(&en()).await.unwrap();
    lifecycle.reindex(&en()).await.unwrap();
    let report = lifecycle.reindex(&en()).await.unwrap();

    let deleted = lifecycle.delete_orphaned(&en()).await.unwrap();
    assert_eq!(deleted.len(), 2);
    assert_eq!(engine.index_names(), vec![report.new_index]);

    // Idempotent
    assert!(lifecycle.delete_orphaned(&en()).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_orphaned_leaves_other_collections_alone() {
    let (engine, service) = setup();
    let lifecycle = service.lifecycle();
    let en_gb = CollectionKey::new(5, "en_gb", "en-GB");
    lifecycle.ensure_exists(&en()).await.unwrap();
    lifecycle.ensure_exists(&en_gb).await.unwrap();
    lifecycle.reindex(&en()).await.unwrap();

    let deleted = lifecycle.delete_orphaned(&en()).await.unwrap();
    assert_eq!(deleted.len(), 1);
    assert_eq!(engine.index_names().len(), 2);
    assert_eq!(bound(&engine, "craftcms_en_gb").await.len(), 1);
}

#[tokio::test]
async fn clone_copies_into_new_collection() {
    let (engine, service) = setup();
    let element = Element::new(9, 1, "entry").with_attribute("title", "Cloned entry");
    service.indexer().index_element(&element, &en()).await.unwrap();

    let report = service.lifecycle().clone(&de(), "craftcms_en").await.unwrap();
    assert_eq!(bound(&engine, "craftcms_de").await, vec![report.new_index.clone()]);
    assert!(!engine.is_write_blocked(&report.source_index));

    let source = service.lifecycle().source_of(9, &de()).await.unwrap();
    assert_eq!(source["craft_attribute_title"], "cloned entry");

    let again = service.lifecycle().clone(&de(), "craftcms_en").await;
    assert!(matches!(again, Err(ElasticError::DestinationExists(_))));
}

// =============================================================================
// Mapping
// =============================================================================

#[tokio::test]
async fn mapping_drift_is_patched_or_escalated() {
    let (_, service) = setup();
    let lifecycle = service.lifecycle();
    lifecycle.ensure_exists(&en()).await.unwrap();
    assert!(lifecycle.signature_diff(&en()).await.unwrap().is_empty());

    service.registry().register_field(FieldDefinition::new(15, "teaser", true));
    let diff = lifecycle.signature_diff(&en()).await.unwrap();
    assert_eq!(diff.added, vec!["craft_field_15"]);
    assert!(!lifecycle.ensure_mapping_in_sync(&en()).await.unwrap().requires_reindex());
    assert!(lifecycle.signature_diff(&en()).await.unwrap().is_empty());

    service.registry().remove_field(12);
    assert!(lifecycle.ensure_mapping_in_sync(&en()).await.unwrap().requires_reindex());

    // A reindex drops the stale field
    lifecycle.reindex(&en()).await.unwrap();
    let mapping = lifecycle.current_mapping(&en()).await.unwrap();
    assert!(mapping.get("craft_field_12").is_none());
    assert!(lifecycle.signature_diff(&en()).await.unwrap().is_empty());
}

#[tokio::test]
async fn field_names_round_trip() {
    let registry = registry();
    let namer = FieldNamer::new("craft_", registry);
    for handle in ["title", "slug", "summary", "filename"] {
        assert_eq!(namer.map_field_to_attribute(&namer.map_attribute_to_field(handle)), handle);
    }
    assert_eq!(namer.map_attribute_to_field("body"), "craft_field_12");
    assert_eq!(namer.map_field_to_attribute("craft_field_12"), "body");
    assert_eq!(namer.map_field_to_attribute("craft_field_99"), "field not found for ID 99");
    assert_eq!(namer.map_field_to_attribute("other"), "Unknown field other");
}

// =============================================================================
// Documents
// =============================================================================

#[tokio::test]
async fn upsert_is_the_only_implicit_creation() {
    let (engine, service) = setup();
    service.writer().delete(1, &en()).await.unwrap();
    assert!(service.writer().bulk_delete(&[1, 2], &en()).await.is_ok());
    assert!(engine.index_names().is_empty());

    service
        .writer()
        .upsert(&SearchDocument::new(1).with_field("craft_attribute_title", "x"), &en())
        .await
        .unwrap();
    assert_eq!(engine.index_names().len(), 1);
}

#[tokio::test]
async fn bulk_delete_of_nothing_sends_nothing() {
    let (engine, service) = setup();
    let before = engine.request_count();
    assert!(service.writer().bulk_delete(&[], &en()).await.unwrap().is_none());
    assert_eq!(engine.request_count(), before);
}

#[tokio::test]
async fn indexer_loser_returns_without_writing() {
    let (engine, service) = setup();
    let guard = service
        .indexer()
        .locks()
        .try_acquire(elastic_sync::locks::document_lock_key(3, 1))
        .unwrap();

    let element = Element::new(3, 1, "entry").with_attribute("title", "Contended");
    assert!(service.indexer().index_element(&element, &en()).await.unwrap());
    assert!(engine.index_names().is_empty());

    drop(guard);
    assert!(service.indexer().index_element(&element, &en()).await.unwrap());
    assert_eq!(engine.documents("craftcms_en").len(), 1);
}

// =============================================================================
// Search
// =============================================================================

async fn seed_recipes(service: &ElasticSync) {
    let recipes = [
        (1, "Red car wash", "soap"),
        (2, "Blue car", "paint"),
        (3, "Red bike", "chain"),
        (4, "my-slug page", "misc"),
    ];
    for (id, title, body) in recipes {
        let element = Element::new(id, 1, "entry")
            .with_attribute("title", title)
            .with_field(12, body);
        service.indexer().index_element(&element, &en()).await.unwrap();
    }
}

fn ids(hits: &[elastic_sync::ScoredHit]) -> Vec<u64> {
    let mut ids: Vec<u64> = hits.iter().map(|h| h.id).collect();
    ids.sort_unstable();
    ids
}

#[tokio::test]
async fn required_and_excluded_terms() {
    let (_, service) = setup();
    seed_recipes(&service).await;

    let query = SearchQuery::from_tokens([
        QueryToken::from(SearchTerm::term("red")),
        QueryToken::from(SearchTerm::term("bike").excluded()),
    ]);
    let request = service.search().translator().translate("craftcms_en", query.tokens(), None);
    assert_eq!(request.body["query"]["bool"]["must"]["query_string"]["query"], "+red -bike");

    let hits = service.search().search(&query, Some(&en()), None).await.unwrap();
    assert_eq!(ids(&hits), vec![1]);
}

#[tokio::test]
async fn phrase_and_hyphen_queries() {
    let (_, service) = setup();
    seed_recipes(&service).await;

    let phrase = SearchQuery::from_tokens([QueryToken::from(SearchTerm::phrase("red car"))]);
    let hits = service.search().search(&phrase, Some(&en()), None).await.unwrap();
    assert_eq!(ids(&hits), vec![1]);

    let hyphen = SearchQuery::from_tokens([QueryToken::from(SearchTerm::term("my-slug"))]);
    let request = service.search().translator().translate("craftcms_en", hyphen.tokens(), None);
    assert_eq!(request.body["query"]["bool"]["must"]["query_string"]["query"], "\"my-slug\"");
}

#[tokio::test]
async fn scope_adds_ids_filter_only() {
    let (_, service) = setup();
    seed_recipes(&service).await;

    let query = SearchQuery::from_tokens([QueryToken::from(SearchTerm::term("car"))]);
    let unscoped = service.search().translator().translate("craftcms_en", query.tokens(), None);
    let scoped = service
        .search()
        .translator()
        .translate("craftcms_en", query.tokens(), Some(&[1, 2, 3]));
    assert_eq!(
        scoped.body["query"]["bool"]["must"],
        unscoped.body["query"]["bool"]["must"]
    );
    assert_eq!(scoped.body["query"]["bool"]["filter"], json!({"ids": {"values": [1, 2, 3]}}));

    let hits = service.search().search(&query, Some(&en()), Some(&[2, 3])).await.unwrap();
    assert_eq!(ids(&hits), vec![2]);
}

#[tokio::test]
async fn rejected_query_yields_empty_list() {
    let (engine, service) = setup();
    seed_recipes(&service).await;
    engine.reject_searches(true);
    assert!(service
        .search()
        .search_text("red", Some(&en()), None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn string_queries_use_default_wildcards() {
    let (_, service) = setup();
    seed_recipes(&service).await;

    // Default term options append a wildcard: "bik" matches "bike"
    let hits = service.search().search_text("bik", Some(&en()), None).await.unwrap();
    assert_eq!(ids(&hits), vec![3]);

    let hits = service.search().search_text("title:red -bike", Some(&en()), None).await.unwrap();
    assert_eq!(ids(&hits), vec![1]);
}

// =============================================================================
// Administration
// =============================================================================

#[tokio::test]
async fn listing_and_stats() {
    let (engine, service) = setup();
    seed_recipes(&service).await;
    engine.create_index(".tasks", &json!({})).await.unwrap();

    let listing = service.lifecycle().list_all(false).await.unwrap();
    assert_eq!(listing.indexes.len(), 1);
    assert_eq!(listing.indexes[0].docs_count.as_deref(), Some("4"));

    let outcomes = service.admin().stats(&[en(), de()]).await;
    assert_eq!(outcomes[0].result.as_ref().unwrap().docs_count, 4);
    assert!(outcomes[1].result.as_ref().unwrap_err().is_not_found());
}
