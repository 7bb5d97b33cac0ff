// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search query tokens.
//!
//! # Query Syntax
//!
//! ```text
//! salad                 - term (default wildcard flags apply)
//! -salad                - excluded term
//! title:salad           - attribute-scoped term
//! "green salad"         - phrase (no wildcards)
//! *salad / salad*       - explicit left / right wildcard
//! salad OR soup         - group (recognized, not translated)
//! ```
//!
//! # Example
//!
//! ```rust
//! use elastic_sync::search::{QueryToken, SearchQuery, TermOptions};
//!
//! let query = SearchQuery::parse("-draft title:\"red car\"", TermOptions::default());
//! assert_eq!(query.tokens().len(), 2);
//! match &query.tokens()[1] {
//!     QueryToken::Term(term) => {
//!         assert!(term.phrase);
//!         assert_eq!(term.attribute.as_deref(), Some("title"));
//!     }
//!     QueryToken::Group(_) => unreachable!(),
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Wildcard flags applied to unmarked, unquoted terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermOptions {
    #[serde(default)]
    pub sub_left: bool,
    #[serde(default = "default_sub_right")]
    pub sub_right: bool,
}

fn default_sub_right() -> bool { true }

impl Default for TermOptions {
    fn default() -> Self {
        Self {
            sub_left: false,
            sub_right: default_sub_right(),
        }
    }
}

impl TermOptions {
    /// No implicit wildcards.
    #[must_use]
    pub fn exact() -> Self {
        Self {
            sub_left: false,
            sub_right: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTerm {
    pub term: String,
    /// Attribute or field handle the term is scoped to
    pub attribute: Option<String>,
    pub exclude: bool,
    pub phrase: bool,
    /// Match anything before the term
    pub sub_left: bool,
    /// Match anything after the term
    pub sub_right: bool,
}

impl SearchTerm {
    /// A plain term with no wildcards.
    pub fn term(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Default::default()
        }
    }

    pub fn phrase(text: impl Into<String>) -> Self {
        Self {
            term: text.into(),
            phrase: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn attribute(mut self, handle: impl Into<String>) -> Self {
        self.attribute = Some(handle.into());
        self
    }

    #[must_use]
    pub fn excluded(mut self) -> Self {
        self.exclude = true;
        self
    }

    #[must_use]
    pub fn prefix_wildcard(mut self) -> Self {
        self.sub_left = true;
        self
    }

    #[must_use]
    pub fn suffix_wildcard(mut self) -> Self {
        self.sub_right = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryToken {
    Term(SearchTerm),
    /// Alternatives joined with `OR`
    Group(Vec<SearchTerm>),
}

impl From<SearchTerm> for QueryToken {
    fn from(term: SearchTerm) -> Self {
        QueryToken::Term(term)
    }
}

/// Tokenized search query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    tokens: Vec<QueryToken>,
}

impl SearchQuery {
    pub fn from_tokens(tokens: impl IntoIterator<Item = QueryToken>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    /// Tokenize a user query string.
    #[must_use]
    pub fn parse(text: &str, options: TermOptions) -> Self {
        let mut tokens: Vec<QueryToken> = Vec::new();
        let mut join_next = false;

        for raw in split_raw(text) {
            if raw == "OR" {
                join_next = !tokens.is_empty();
                continue;
            }
            let Some(term) = parse_term(&raw, options) else {
                continue;
            };

            if join_next {
                join_next = false;
                match tokens.pop() {
                    Some(QueryToken::Term(prev)) => tokens.push(QueryToken::Group(vec![prev, term])),
                    Some(QueryToken::Group(mut group)) => {
                        group.push(term);
                        tokens.push(QueryToken::Group(group));
                    }
                    None => tokens.push(QueryToken::Term(term)),
                }
            } else {
                tokens.push(QueryToken::Term(term));
            }
        }

        Self { tokens }
    }

    #[must_use]
    pub fn tokens(&self) -> &[QueryToken] {
        &self.tokens
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Split on whitespace outside double quotes. Unterminated quotes run to the end.
fn split_raw(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in text.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
            current.push(ch);
        } else if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn parse_term(raw: &str, options: TermOptions) -> Option<SearchTerm> {
    let mut rest = raw;
    let mut term = SearchTerm::default();

    if rest.len() > 1 && rest.starts_with('-') {
        term.exclude = true;
        rest = &rest[1..];
    }

    let quote_at = rest.find('"').unwrap_or(rest.len());
    if let Some(colon) = rest[..quote_at].find(':') {
        let handle = &rest[..colon];
        if !handle.is_empty() && handle.chars().all(|c| c.is_alphanumeric() || c == '_') {
            term.attribute = Some(handle.to_string());
            rest = &rest[colon + 1..];
            // `attr::value` marks an exact match; treated like a plain scope
            rest = rest.strip_prefix(':').unwrap_or(rest);
        }
    }

    if rest.starts_with('"') {
        term.phrase = true;
        term.term = rest.trim_matches('"').trim().to_string();
    } else {
        term.sub_left = options.sub_left;
        term.sub_right = options.sub_right;
        if rest.starts_with('*') {
            term.sub_left = true;
            rest = rest.trim_start_matches('*');
        }
        if rest.ends_with('*') {
            term.sub_right = true;
            rest = rest.trim_end_matches('*');
        }
        term.term = rest.to_string();
    }

    if term.term.is_empty() {
        return None;
    }
    Some(term)
}
