//! Transport configuration
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! accept = "application/hal+json"
//! timeout_ms = 5000
//! user_agent = "my-app/1.0"
//!
//! [headers]
//! Authorization = "Bearer abc123"
//!
//! [retry]
//! max_tries = 3
//! base_delay_ms = 1000
//! max_delay_ms = 10000
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const DEFAULT_ACCEPT: &str = "application/hal+json";

/// Settings for [`crate::HttpTransport`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// `Accept` header sent with every request
    pub accept: String,
    /// Whole-request timeout; none by default
    pub timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
    /// Extra headers sent with every request
    pub headers: BTreeMap<String, String>,
    pub retry: RetryConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            accept: DEFAULT_ACCEPT.to_string(),
            timeout_ms: None,
            user_agent: None,
            headers: BTreeMap::new(),
            retry: RetryConfig::default(),
        }
    }
}

impl HttpConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }
}

/// Retry policy for server errors and network failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_tries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_tries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
        }
    }
}

impl RetryConfig {
    /// A single attempt, never retried.
    pub fn disabled() -> Self {
        Self {
            max_tries: 1,
            ..Self::default()
        }
    }
}
