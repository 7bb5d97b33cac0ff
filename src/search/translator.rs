// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Elasticsearch Translator
//!
//! Translates search tokens to a `query_string` request.
//!
//! # Term Rendering
//!
//! ```text
//! foo              +foo
//! -foo             -foo
//! title:foo        +craft_attribute_title:foo
//! foo (sub right)  +foo*
//! *foo             *+foo
//! "red car"        "red car"
//! my-slug          "my-slug"          (hyphen forces a phrase)
//! body:"a b"       craft_field_12:"a b"
//! ```
//!
//! Fragments are joined with a single space. Groups (`a OR b`) are not
//! translated yet and are skipped.
//!
//! # Request Shape
//!
//! ```text
//! { "size": 10000,
//!   "query": { "bool": {
//!       "must":   { "query_string": { "fields": ["*", "<field>^<boost>"], "query": "..." } },
//!       "filter": { "ids": { "values": [..] } } } } }     ← only with a scope
//! ```

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::fields::FieldNamer;
use super::hooks::QueryHook;
use super::tokens::{QueryToken, SearchTerm};
use crate::config::FieldBoost;
use crate::engine::traits::SearchResponse;
use crate::schema::ElementId;

/// A request ready for dispatch. Hooks may change both parts.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Alias (or index) to search
    pub index: String,
    pub body: Value,
}

/// One ranked result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredHit {
    pub id: ElementId,
    pub score: f64,
}

pub struct QueryTranslator {
    namer: FieldNamer,
    boosts: Vec<FieldBoost>,
    max_window: usize,
    hooks: Vec<Arc<dyn QueryHook>>,
}

impl std::fmt::Debug for QueryTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryTranslator")
            .field("boosts", &self.boosts)
            .field("max_window", &self.max_window)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl QueryTranslator {
    pub fn new(namer: FieldNamer, boosts: Vec<FieldBoost>, max_window: usize) -> Self {
        Self {
            namer,
            boosts,
            max_window,
            hooks: Vec::new(),
        }
    }

    /// Append a pre-dispatch hook. Hooks run in registration order.
    pub fn add_hook(&mut self, hook: Arc<dyn QueryHook>) {
        self.hooks.push(hook);
    }

    fn render_term(&self, token: &SearchTerm) -> String {
        let phrase = token.phrase || token.term.contains('-');
        let term = token.term.trim();
        let mut out = String::new();

        if token.sub_left && !phrase {
            out.push('*');
        }
        if phrase {
            if let Some(attribute) = &token.attribute {
                out.push_str(&self.namer.map_attribute_to_field(attribute));
                out.push(':');
            }
            out.push('"');
            out.push_str(term);
            out.push('"');
        } else {
            out.push(if token.exclude { '-' } else { '+' });
            if let Some(attribute) = &token.attribute {
                out.push_str(&self.namer.map_attribute_to_field(attribute));
                out.push(':');
            }
            out.push_str(term);
        }
        if token.sub_right && !phrase {
            out.push('*');
        }
        out
    }

    /// The `query_string` query text.
    #[must_use]
    pub fn build_query_string(&self, tokens: &[QueryToken]) -> String {
        tokens
            .iter()
            .filter_map(|token| match token {
                QueryToken::Term(term) => Some(self.render_term(term)),
                QueryToken::Group(group) => {
                    debug!(terms = group.len(), "Skipping term group in search query");
                    None
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `["*", "<field>^<boost>", ...]`
    #[must_use]
    pub fn fields(&self) -> Vec<String> {
        std::iter::once("*".to_string())
            .chain(
                self.boosts
                    .iter()
                    .map(|b| format!("{}^{}", self.namer.map_attribute_to_field(&b.handle), b.boost)),
            )
            .collect()
    }

    /// Build the request and run the hooks over it.
    ///
    /// `scope: None` searches the whole collection. `Some(ids)` adds an `ids`
    /// filter, so `Some(&[])` matches nothing.
    #[must_use]
    pub fn translate(&self, index: &str, tokens: &[QueryToken], scope: Option<&[ElementId]>) -> SearchRequest {
        let query = self.build_query_string(tokens);

        let mut bool_query = json!({
            "must": {
                "query_string": {
                    "fields": self.fields(),
                    "query": query,
                }
            }
        });
        if let Some(ids) = scope {
            bool_query["filter"] = json!({ "ids": { "values": ids } });
        }

        let mut request = SearchRequest {
            index: index.to_string(),
            body: json!({
                "size": self.max_window,
                "query": { "bool": bool_query },
            }),
        };
        for hook in &self.hooks {
            hook.before_query(&mut request);
        }

        debug!(index = %request.index, query = %query, "Translated search query");
        request
    }

    /// Hits ordered by score, highest first. Ties keep engine order.
    ///
    /// One entry per element: an alias bound to several generations returns
    /// the same id more than once, and the highest score is kept.
    #[must_use]
    pub fn rank(response: &SearchResponse) -> Vec<ScoredHit> {
        let mut hits: Vec<ScoredHit> = Vec::with_capacity(response.hits.len());
        let mut positions: HashMap<ElementId, usize> = HashMap::new();

        for hit in &response.hits {
            let Ok(id) = hit.id.parse::<ElementId>() else {
                warn!(id = %hit.id, "Ignoring search hit with non-numeric id");
                continue;
            };
            let score = hit.score.unwrap_or(0.0);
            match positions.get(&id) {
                Some(&at) => {
                    if score > hits[at].score {
                        hits[at].score = score;
                    }
                }
                None => {
                    positions.insert(id, hits.len());
                    hits.push(ScoredHit { id, score });
                }
            }
        }
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::traits::SearchHit;
    use crate::schema::{ContentRegistry, FieldDefinition};

    fn translator(boosts: Vec<FieldBoost>) -> QueryTranslator {
        let registry = Arc::new(ContentRegistry::new());
        registry.register_field(FieldDefinition::new(12, "body", true));
        QueryTranslator::new(FieldNamer::new("craft_", registry), boosts, 10_000)
    }

    fn terms(terms: Vec<SearchTerm>) -> Vec<QueryToken> {
        terms.into_iter().map(QueryToken::from).collect()
    }

    #[test]
    fn test_required_and_excluded_terms() {
        let t = translator(vec![]);
        let q = t.build_query_string(&terms(vec![
            SearchTerm::term("foo"),
            SearchTerm::term("bar").excluded(),
        ]));
        assert_eq!(q, "+foo -bar");
    }

    #[test]
    fn test_phrase_is_quoted_without_sign() {
        let t = translator(vec![]);
        assert_eq!(t.build_query_string(&terms(vec![SearchTerm::phrase("red car")])), "\"red car\"");
        assert_eq!(
            t.build_query_string(&terms(vec![SearchTerm::phrase(" red car ").excluded()])),
            "\"red car\""
        );
    }

    #[test]
    fn test_hyphen_forces_phrase() {
        let t = translator(vec![]);
        let q = t.build_query_string(&terms(vec![SearchTerm::term("my-slug").suffix_wildcard()]));
        assert_eq!(q, "\"my-slug\"");
    }

    #[test]
    fn test_wildcards_and_attribute_scope() {
        let t = translator(vec![]);
        let q = t.build_query_string(&terms(vec![
            SearchTerm::term("car").prefix_wildcard().suffix_wildcard(),
            SearchTerm::term("hello").attribute("title").suffix_wildcard(),
            SearchTerm::phrase("a b").attribute("body"),
        ]));
        assert_eq!(q, "*+car* +craft_attribute_title:hello* craft_field_12:\"a b\"");
    }

    #[test]
    fn test_groups_are_skipped() {
        let t = translator(vec![]);
        let tokens = vec![
            QueryToken::Group(vec![SearchTerm::term("a"), SearchTerm::term("b")]),
            QueryToken::Term(SearchTerm::term("c")),
        ];
        assert_eq!(t.build_query_string(&tokens), "+c");
    }

    #[test]
    fn test_boosted_fields() {
        let t = translator(vec![
            FieldBoost { handle: "title".into(), boost: 3.0 },
            FieldBoost { handle: "body".into(), boost: 1.5 },
        ]);
        assert_eq!(t.fields(), vec!["*", "craft_attribute_title^3", "craft_field_12^1.5"]);
    }

    #[test]
    fn test_scope_adds_ids_filter_only() {
        let t = translator(vec![]);
        let tokens = terms(vec![SearchTerm::term("foo")]);
        let unscoped = t.translate("craftcms_en", &tokens, None);
        let scoped = t.translate("craftcms_en", &tokens, Some(&[1, 2, 3]));

        assert_eq!(scoped.body["query"]["bool"]["filter"], json!({"ids": {"values": [1, 2, 3]}}));
        assert_eq!(scoped.body["query"]["bool"]["must"], unscoped.body["query"]["bool"]["must"]);
        assert!(unscoped.body["query"]["bool"].get("filter").is_none());
        assert_eq!(scoped.body["size"], 10_000);
    }

    #[test]
    fn test_hooks_run_in_order() {
        let mut t = translator(vec![]);
        t.add_hook(Arc::new(|req: &mut SearchRequest| {
            req.body["size"] = json!(5);
        }));
        t.add_hook(Arc::new(|req: &mut SearchRequest| {
            let size = req.body["size"].as_u64().unwrap_or(0);
            req.body["size"] = json!(size * 2);
        }));

        let req = t.translate("craftcms_en", &terms(vec![SearchTerm::term("x")]), None);
        assert_eq!(req.body["size"], 10);
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let hit = |id: &str, score: f64| SearchHit { id: id.into(), score: Some(score), source: None };
        let response = SearchResponse {
            took: 1,
            total: 4,
            hits: vec![hit("1", 1.0), hit("2", 3.0), hit("3", 1.0), hit("x", 9.0)],
        };
        let ranked = QueryTranslator::rank(&response);
        let ids: Vec<ElementId> = ranked.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_rank_collapses_duplicate_ids() {
        let hit = |id: &str, score: f64| SearchHit { id: id.into(), score: Some(score), source: None };
        let response = SearchResponse {
            took: 1,
            total: 5,
            hits: vec![hit("1", 1.0), hit("2", 2.0), hit("1", 4.0), hit("2", 2.0), hit("3", 0.5)],
        };
        let ranked = QueryTranslator::rank(&response);
        assert_eq!(
            ranked,
            vec![
                ScoredHit { id: 1, score: 4.0 },
                ScoredHit { id: 2, score: 2.0 },
                ScoredHit { id: 3, score: 0.5 },
            ]
        );
    }

    #[test]
    fn test_empty_scope_filters_everything_out() {
        let t = translator(Vec::new());
        let tokens = terms(vec![SearchTerm::term("salad")]);

        let unscoped = t.translate("craftcms_en", &tokens, None);
        assert!(unscoped.body["query"]["bool"].get("filter").is_none());

        let empty = t.translate("craftcms_en", &tokens, Some(&[]));
        assert_eq!(empty.body["query"]["bool"]["filter"]["ids"]["values"], json!([]));
    }
}
