// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Extension points around search.
//!
//! - [`QueryHook`]: mutates the translated request right before dispatch.
//!   Hooks run synchronously in registration order.
//! - [`SearchObserver`]: notified before and after a search; cannot change it.

use super::naming::CollectionKey;
use super::tokens::SearchQuery;
use super::translator::{ScoredHit, SearchRequest};
use crate::schema::ElementId;

pub trait QueryHook: Send + Sync {
    fn before_query(&self, request: &mut SearchRequest);
}

impl<F> QueryHook for F
where
    F: Fn(&mut SearchRequest) + Send + Sync,
{
    fn before_query(&self, request: &mut SearchRequest) {
        self(request)
    }
}

/// What is being searched.
#[derive(Debug, Clone, Copy)]
pub struct SearchEvent<'a> {
    pub collection: &'a CollectionKey,
    pub query: &'a SearchQuery,
    pub scope: Option<&'a [ElementId]>,
}

pub trait SearchObserver: Send + Sync {
    fn before_search(&self, _event: &SearchEvent<'_>) {}

    fn after_search(&self, _event: &SearchEvent<'_>, _results: &[ScoredHit]) {}
}
