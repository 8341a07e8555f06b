//! Transport collaborator contract
//!
//! The engine never talks to the network itself. Everything that needs a
//! document goes through a [`Transport`]: `hal-client-http` provides one over
//! HTTP, and [`MemoryTransport`] serves canned documents for tests.

use crate::error::TransportError;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Request headers for writes
pub type Headers = BTreeMap<String, String>;

/// Write verbs accepted by [`Transport::write`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed response document
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub body: JsonValue,
    /// Absolute `Content-Location` of the response, if the server sent one
    pub content_location: Option<String>,
}

impl ParsedDocument {
    pub fn new(body: JsonValue) -> Self {
        Self {
            body,
            content_location: None,
        }
    }

    pub fn with_content_location(mut self, location: impl Into<String>) -> Self {
        self.content_location = Some(location.into());
        self
    }
}

/// Fetches and writes documents on behalf of the engine.
///
/// Calls block until the collaborator answers; timeout and retry policy
/// belong to the implementation.
pub trait Transport: Send + Sync {
    fn fetch(&self, url: &str) -> Result<ParsedDocument, TransportError>;

    fn write(
        &self,
        verb: Verb,
        url: &str,
        body: Option<&JsonValue>,
        headers: &Headers,
    ) -> Result<ParsedDocument, TransportError>;
}

/// A write recorded by [`MemoryTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    pub verb: Verb,
    pub url: String,
    pub body: Option<JsonValue>,
    pub headers: Headers,
}

/// In-memory transport for testing.
///
/// Serves registered documents, answers unknown URLs with a 404
/// [`TransportError::Client`], and records every request.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    resources: RwLock<HashMap<String, JsonValue>>,
    failures: RwLock<HashMap<String, TransportError>>,
    write_responses: RwLock<HashMap<String, JsonValue>>,
    content_locations: RwLock<HashMap<String, String>>,
    fetches: Mutex<Vec<String>>,
    writes: Mutex<Vec<RecordedWrite>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for GETs of `url`.
    pub fn with_resource(self, url: impl Into<String>, body: JsonValue) -> Self {
        self.insert_resource(url, body);
        self
    }

    pub fn insert_resource(&self, url: impl Into<String>, body: JsonValue) {
        self.resources.write().insert(url.into(), body);
    }

    /// Fail every request to `url` with `error`.
    pub fn with_failure(self, url: impl Into<String>, error: TransportError) -> Self {
        self.failures.write().insert(url.into(), error);
        self
    }

    /// Report `location` as the `Content-Location` of GETs of `url`.
    pub fn with_content_location(self, url: impl Into<String>, location: impl Into<String>) -> Self {
        self.content_locations
            .write()
            .insert(url.into(), location.into());
        self
    }

    /// Answer writes to `url` with `body` instead of an empty document.
    pub fn with_write_response(self, url: impl Into<String>, body: JsonValue) -> Self {
        self.write_responses.write().insert(url.into(), body);
        self
    }

    /// Number of fetches issued for `url`.
    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches.lock().iter().filter(|u| *u == url).count()
    }

    /// Total number of fetches issued.
    pub fn total_fetches(&self) -> usize {
        self.fetches.lock().len()
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().clone()
    }
}

impl Transport for MemoryTransport {
    fn fetch(&self, url: &str) -> Result<ParsedDocument, TransportError> {
        self.fetches.lock().push(url.to_string());

        if let Some(err) = self.failures.read().get(url) {
            return Err(err.clone());
        }
        match self.resources.read().get(url) {
            Some(body) => {
                let doc = ParsedDocument::new(body.clone());
                Ok(match self.content_locations.read().get(url) {
                    Some(location) => doc.with_content_location(location.as_str()),
                    None => doc,
                })
            }
            None => Err(TransportError::Client {
                status: 404,
                url: url.to_string(),
                body: String::new(),
            }),
        }
    }

    fn write(
        &self,
        verb: Verb,
        url: &str,
        body: Option<&JsonValue>,
        headers: &Headers,
    ) -> Result<ParsedDocument, TransportError> {
        self.writes.lock().push(RecordedWrite {
            verb,
            url: url.to_string(),
            body: body.cloned(),
            headers: headers.clone(),
        });

        if let Some(err) = self.failures.read().get(url) {
            return Err(err.clone());
        }
        let response = self
            .write_responses
            .read()
            .get(url)
            .cloned()
            .unwrap_or_else(|| JsonValue::Object(Map::new()));
        Ok(ParsedDocument::new(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_transport_serves_and_counts() {
        let transport =
            MemoryTransport::new().with_resource("http://example.com/a", json!({"n": 1}));

        let doc = transport.fetch("http://example.com/a").unwrap();
        assert_eq!(doc.body, json!({"n": 1}));
        assert_eq!(doc.content_location, None);
        assert_eq!(transport.fetch_count("http://example.com/a"), 1);
    }

    #[test]
    fn test_memory_transport_content_location() {
        let transport = MemoryTransport::new()
            .with_resource("http://example.com/latest", json!({}))
            .with_content_location("http://example.com/latest", "http://example.com/v/9");

        let doc = transport.fetch("http://example.com/latest").unwrap();
        assert_eq!(doc.content_location.as_deref(), Some("http://example.com/v/9"));
    }

    #[test]
    fn test_memory_transport_unknown_is_404() {
        let transport = MemoryTransport::new();
        let err = transport.fetch("http://example.com/missing").unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_memory_transport_records_writes() {
        let transport = MemoryTransport::new();
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        let doc = transport
            .write(Verb::Put, "http://example.com/a", Some(&json!({"x": 1})), &headers)
            .unwrap();
        assert_eq!(doc.body, json!({}));

        let writes = transport.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].verb, Verb::Put);
        assert_eq!(writes[0].body, Some(json!({"x": 1})));
    }
}
