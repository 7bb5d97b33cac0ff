// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search engine backends.
//!
//! ```text
//! ┌──────────────────────┐
//! │ dyn SearchEngine     │◄── lifecycle, writer, search executor
//! └──────────┬───────────┘
//!      ┌─────┴──────┐
//!  HttpEngine   InMemoryEngine
//!  (reqwest,    (tests, demos)
//!   SigV4)
//! ```

pub mod http;
pub mod memory;
pub mod sigv4;
pub mod traits;

pub use http::HttpEngine;
pub use memory::InMemoryEngine;
pub use sigv4::AwsSigner;
pub use traits::{
    AnalyzeToken, BulkOperation, BulkResponse, CatAlias, CatIndex, EngineError, IndexDescription,
    IndexStats, ReindexResponse, SearchEngine, SearchHit, SearchResponse,
};
