// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the Elasticsearch connection and index layout.
//!
//! # Example
//!
//! ```
//! use elastic_sync::{Authentication, ElasticConfig};
//!
//! // Defaults: index prefix "craftcms", field prefix "craft_"
//! let config = ElasticConfig::default();
//! assert_eq!(config.index_name, "craftcms");
//! assert_eq!(config.max_result_window, 10_000);
//!
//! // A basic-auth cluster
//! let config = ElasticConfig {
//!     endpoint: "http://localhost:9200".into(),
//!     authentication: Some(Authentication::BasicAuth),
//!     username: "elastic".into(),
//!     password: "changeme".into(),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use serde::Deserialize;

use crate::error::{ElasticError, Result};
use crate::search::tokens::TermOptions;

/// How requests authenticate against the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Authentication {
    #[serde(rename = "basicauth")]
    BasicAuth,
    /// AWS SigV4. `username` / `password` carry the access key id and secret.
    #[serde(rename = "aws")]
    Aws,
}

/// Boost applied to one attribute or field handle in queries.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldBoost {
    pub handle: String,
    pub boost: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElasticConfig {
    /// Cluster URL(s), comma separated (e.g., "http://es1:9200,http://es2:9200")
    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub authentication: Option<Authentication>,

    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,

    /// AWS region of the managed domain. Required with [`Authentication::Aws`].
    #[serde(default)]
    pub region: Option<String>,

    /// Session token for temporary AWS credentials.
    #[serde(default)]
    pub session_token: Option<String>,

    /// Alias prefix, combined with the site handle (default: "craftcms")
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Namespace for document field names (default: "craft_")
    #[serde(default = "default_field_prefix")]
    pub field_prefix: String,

    #[serde(default)]
    pub field_boosts: Vec<FieldBoost>,

    /// Largest result window one request may return
    #[serde(default = "default_max_result_window")]
    pub max_result_window: usize,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Wildcard flags for unmarked terms in string queries
    #[serde(default = "default_term_options")]
    pub default_term_options: TermOptions,
}

fn default_index_name() -> String { "craftcms".to_string() }
fn default_field_prefix() -> String { "craft_".to_string() }
fn default_max_result_window() -> usize { 10_000 }
fn default_connect_timeout_ms() -> u64 { 5_000 }
fn default_request_timeout_ms() -> u64 { 30_000 }
fn default_term_options() -> TermOptions { TermOptions { sub_left: false, sub_right: true } }

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            authentication: None,
            username: String::new(),
            password: String::new(),
            region: None,
            session_token: None,
            index_name: default_index_name(),
            field_prefix: default_field_prefix(),
            field_boosts: Vec::new(),
            max_result_window: default_max_result_window(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            default_term_options: default_term_options(),
        }
    }
}

impl ElasticConfig {
    /// Configured hosts, trimmed, empty entries dropped.
    #[must_use]
    pub fn hosts(&self) -> Vec<String> {
        self.endpoint
            .split(',')
            .map(|h| h.trim().trim_end_matches('/'))
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Check everything a client needs before it is built.
    pub fn validate(&self) -> Result<()> {
        if self.hosts().is_empty() {
            return Err(ElasticError::Configuration("endpoint is not set".into()));
        }
        if self.index_name.trim().is_empty() {
            return Err(ElasticError::Configuration("index_name is not set".into()));
        }
        if self.field_prefix.trim().is_empty() {
            return Err(ElasticError::Configuration("field_prefix is not set".into()));
        }
        match self.authentication {
            None => Err(ElasticError::Configuration(
                "No valid authentication method set".into(),
            )),
            Some(Authentication::BasicAuth) => Ok(()),
            Some(Authentication::Aws) => {
                if self.region.as_deref().map_or(true, |r| r.trim().is_empty()) {
                    return Err(ElasticError::Configuration(
                        "AWS authentication requires a region".into(),
                    ));
                }
                if self.username.is_empty() || self.password.is_empty() {
                    return Err(ElasticError::Configuration(
                        "AWS authentication requires an access key and secret".into(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Boost configured for a handle, if any.
    #[must_use]
    pub fn boost_for(&self, handle: &str) -> Option<f64> {
        self.field_boosts
            .iter()
            .find(|b| b.handle == handle)
            .map(|b| b.boost)
    }
}
