// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Core error taxonomy.
//!
//! Engine-level failures ([`EngineError`]) are folded into [`ElasticError`]
//! at the component boundary. The interesting mapping is
//! `EngineError::BadRequest` → [`ElasticError::BadQuery`], which the search
//! executor recovers into an empty result.

use thiserror::Error;

use crate::engine::traits::EngineError;

#[derive(Error, Debug)]
pub enum ElasticError {
    /// Alias, index or document absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing required settings or no usable authentication method.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The engine rejected the request as malformed.
    #[error("Bad query: {0}")]
    BadQuery(String),

    /// The reindex copy reported failures. The alias was not moved and
    /// `new_index` is left behind as an orphaned generation.
    #[error("Reindex of '{old_index}' into '{new_index}' reported {failures} failures")]
    PartialFailure {
        old_index: String,
        new_index: String,
        failures: usize,
    },

    /// Clone destination alias already exists and must be deleted first.
    #[error("Destination alias '{0}' already exists")]
    DestinationExists(String),

    /// The engine acknowledged nothing or returned an unexpected shape.
    #[error("Engine backend error: {0}")]
    Backend(String),

    /// Connection, timeout or protocol failure talking to the engine.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ElasticError {
    /// Whether this is a typed miss rather than a failure.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<EngineError> for ElasticError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound(what) => Self::NotFound(what),
            EngineError::BadRequest(msg) => Self::BadQuery(msg),
            EngineError::Configuration(msg) => Self::Configuration(msg),
            EngineError::Transport(msg) => Self::Transport(msg),
            EngineError::Conflict(msg) | EngineError::Forbidden(msg) | EngineError::Backend(msg) => {
                Self::Backend(msg)
            }
        }
    }
}

pub type Result<T, E = ElasticError> = std::result::Result<T, E>;
