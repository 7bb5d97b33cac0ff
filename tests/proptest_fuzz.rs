//! Property-based tests (fuzzing) for query handling and naming.
//!
//! Uses proptest to generate random/malformed inputs and verify the
//! tokenizer, translator and naming helpers never panic and keep their
//! invariants.
//!
//! Run with: `cargo test --test proptest_fuzz`

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;

use elastic_sync::config::FieldBoost;
use elastic_sync::coordinator::normalize_keywords;
use elastic_sync::engine::{SearchHit, SearchResponse};
use elastic_sync::schema::{ContentRegistry, FieldDefinition};
use elastic_sync::search::{
    CollectionKey, FieldNamer, IndexNaming, MappingSignature, QueryToken, QueryTranslator, SearchQuery, SearchTerm,
    TermOptions,
};

// =============================================================================
// Strategies for generating test data
// =============================================================================

fn term_options_strategy() -> impl Strategy<Value = TermOptions> {
    (any::<bool>(), any::<bool>()).prop_map(|(sub_left, sub_right)| TermOptions { sub_left, sub_right })
}

/// Plain lowercase words, never the `OR` operator.
fn word_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,12}"
}

fn handle_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,15}"
}

fn search_term_strategy() -> impl Strategy<Value = SearchTerm> {
    (
        "[a-zA-Z0-9 -]{1,20}",
        prop::option::of(handle_strategy()),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(term, attribute, exclude, phrase, sub_left, sub_right)| SearchTerm {
            term,
            attribute,
            exclude,
            phrase,
            sub_left,
            sub_right,
        })
}

fn token_strategy() -> impl Strategy<Value = QueryToken> {
    prop_oneof![
        3 => search_term_strategy().prop_map(QueryToken::Term),
        1 => prop::collection::vec(search_term_strategy(), 2..4).prop_map(QueryToken::Group),
    ]
}

fn translator(boosts: Vec<FieldBoost>) -> QueryTranslator {
    let namer = FieldNamer::new("craft_", Arc::new(ContentRegistry::new()));
    QueryTranslator::new(namer, boosts, 10_000)
}

fn is_group(token: &QueryToken) -> bool {
    matches!(token, QueryToken::Group(_))
}

// =============================================================================
// Tokenizer and Translator Fuzz Tests
// =============================================================================

proptest! {
    /// Tokenizing arbitrary user input should never panic
    #[test]
    fn fuzz_parse_arbitrary_text(text in ".*", options in term_options_strategy()) {
        let query = SearchQuery::parse(&text, options);
        for token in query.tokens() {
            if let QueryToken::Term(term) = token {
                prop_assert!(!term.term.is_empty(), "Empty terms are dropped");
            }
        }
    }

    /// Unbalanced quotes and operator soup should tokenize without panicking
    #[test]
    fn fuzz_parse_operator_soup(text in "[\"\\-*: ORa-z]{0,40}") {
        let query = SearchQuery::parse(&text, TermOptions::default());
        let request = translator(Vec::new()).translate("craftcms_en", query.tokens(), None);
        prop_assert!(request.body["query"]["bool"]["must"]["query_string"]["query"].is_string());
    }

    /// Translating any token list should never panic and always target the alias
    #[test]
    fn fuzz_translate_tokens(
        tokens in prop::collection::vec(token_strategy(), 0..8),
        scope in prop::option::of(prop::collection::vec(any::<u64>(), 0..20)),
    ) {
        let request = translator(Vec::new()).translate("craftcms_en", &tokens, scope.as_deref());
        prop_assert_eq!(request.index.as_str(), "craftcms_en");
        prop_assert_eq!(request.body["query"]["bool"].get("filter").is_some(), scope.is_some());
    }

    /// Plain words become one required fragment each, in order
    #[test]
    fn prop_plain_words_are_required(words in prop::collection::vec(word_strategy(), 1..10)) {
        let query = SearchQuery::parse(&words.join(" "), TermOptions::exact());
        prop_assert_eq!(query.tokens().len(), words.len());

        let expected = words.iter().map(|w| format!("+{w}")).collect::<Vec<_>>().join(" ");
        prop_assert_eq!(translator(Vec::new()).build_query_string(query.tokens()), expected);
    }

    /// Term groups contribute nothing to the query string
    #[test]
    fn prop_groups_are_skipped(tokens in prop::collection::vec(token_strategy(), 0..8)) {
        let t = translator(Vec::new());
        let terms_only: Vec<QueryToken> = tokens.iter().filter(|tok| !is_group(tok)).cloned().collect();
        prop_assert_eq!(t.build_query_string(&tokens), t.build_query_string(&terms_only));
    }

    /// Hyphenated terms are always quoted
    #[test]
    fn prop_hyphenated_terms_are_phrases(left in word_strategy(), right in word_strategy()) {
        let term = SearchTerm::term(format!("{left}-{right}")).suffix_wildcard();
        let rendered = translator(Vec::new()).build_query_string(&[term.into()]);
        prop_assert_eq!(rendered, format!("\"{left}-{right}\""));
    }

    /// Field list always starts with the catch-all
    #[test]
    fn prop_fields_start_with_catch_all(
        boosts in prop::collection::vec((handle_strategy(), 0.1f64..10.0), 0..5),
    ) {
        let boosts: Vec<FieldBoost> = boosts.into_iter().map(|(handle, boost)| FieldBoost { handle, boost }).collect();
        let fields = translator(boosts.clone()).fields();
        prop_assert_eq!(fields.len(), boosts.len() + 1);
        prop_assert_eq!(fields[0].as_str(), "*");
        for field in &fields[1..] {
            prop_assert!(field.starts_with("craft_attribute_") && field.contains('^'));
        }
    }
}

// =============================================================================
// Ranking Fuzz Tests
// =============================================================================

proptest! {
    /// Ranking arbitrary hits never panics, drops non-numeric ids, keeps one
    /// entry per id, sorts by score
    #[test]
    fn prop_rank_sorted_descending(
        hits in prop::collection::vec(
            (prop_oneof!["[0-9]{1,9}", ".{0,8}"], prop::option::of(-1.0e6f64..1.0e6)),
            0..30,
        ),
    ) {
        let distinct: HashSet<u64> = hits.iter().filter_map(|(id, _)| id.parse::<u64>().ok()).collect();
        let response = SearchResponse {
            took: 1,
            total: hits.len() as u64,
            hits: hits
                .into_iter()
                .map(|(id, score)| SearchHit { id, score, source: None })
                .collect(),
        };

        let ranked = QueryTranslator::rank(&response);
        prop_assert_eq!(ranked.len(), distinct.len());
        prop_assert_eq!(ranked.iter().map(|h| h.id).collect::<HashSet<_>>(), distinct);
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }
}

// =============================================================================
// Naming Property Tests
// =============================================================================

proptest! {
    /// Attribute names survive the round trip through field names
    #[test]
    fn prop_attribute_round_trip(handle in handle_strategy()) {
        let namer = FieldNamer::new("craft_", Arc::new(ContentRegistry::new()));
        let field = namer.map_attribute_to_field(&handle);
        prop_assert_eq!(namer.map_field_to_attribute(&field), handle);
    }

    /// Custom field handles survive the round trip through field ids
    #[test]
    fn prop_custom_field_round_trip(id in 1u64..100_000, handle in handle_strategy()) {
        let registry = Arc::new(ContentRegistry::new());
        registry.register_field(FieldDefinition::new(id, handle.clone(), true));
        let namer = FieldNamer::new("craft_", registry);

        let field = namer.map_attribute_to_field(&handle);
        prop_assert_eq!(&field, &format!("craft_field_{id}"));
        prop_assert_eq!(namer.map_field_to_attribute(&field), handle);
    }

    /// Generation names encode their timestamp and nothing else claims them
    #[test]
    fn prop_generation_names(
        handle in "[a-z][a-z0-9]{0,10}",
        suffix in "[a-z]{1,5}",
        timestamp in any::<u64>(),
    ) {
        let naming = IndexNaming::new("craftcms");
        let key = CollectionKey::new(1, handle.clone(), "en");
        let sibling = CollectionKey::new(2, format!("{handle}_{suffix}"), "en");

        let generation = naming.generation_name(&key, timestamp);
        prop_assert_eq!(naming.generation_timestamp(&key, &generation), Some(timestamp));
        prop_assert!(!naming.is_generation_of(&key, &naming.generation_name(&sibling, timestamp)));
        prop_assert!(!naming.is_generation_of(&key, &naming.index_name(&key)));
    }

    /// Alias names are lowercase whatever the handle's case
    #[test]
    fn prop_alias_is_lowercase(handle in "[A-Za-z0-9_]{1,20}") {
        let naming = IndexNaming::new("CraftCMS");
        let alias = naming.index_name(&CollectionKey::new(1, handle, "en"));
        prop_assert_eq!(alias.to_lowercase(), alias);
    }
}

// =============================================================================
// Keyword and Signature Property Tests
// =============================================================================

proptest! {
    /// Normalized keywords are idempotent and tidy
    #[test]
    fn prop_normalize_keywords(text in "[A-Za-z0-9 ,.!?'\\-_/\t\n]{0,64}") {
        let once = normalize_keywords(&text);
        prop_assert_eq!(normalize_keywords(&once), once.clone());
        prop_assert!(!once.contains("  "));
        prop_assert_eq!(once.trim(), once.as_str());
        prop_assert!(once.chars().all(|c| c == ' ' || (c.is_alphanumeric() && !c.is_uppercase())));
    }

    /// Applying a diff to the current signature yields the desired one
    #[test]
    fn prop_signature_diff_applies(
        current in prop::collection::btree_set("[a-z_]{1,12}", 0..12),
        desired in prop::collection::btree_set("[a-z_]{1,12}", 0..12),
    ) {
        let current_sig = MappingSignature::from_names(current.iter().cloned());
        let desired_sig = MappingSignature::from_names(desired.iter().cloned());
        let diff = current_sig.diff(&desired_sig);

        let applied = MappingSignature::from_names(
            current
                .iter()
                .filter(|n| !diff.removed.contains(n))
                .cloned()
                .chain(diff.added.iter().cloned()),
        );
        prop_assert_eq!(applied, desired_sig.clone());
        prop_assert!(desired_sig.diff(&desired_sig).is_empty());
        prop_assert_eq!(diff.requires_reindex(), !diff.removed.is_empty());
    }
}
