//! The client handle threaded through every representation

use crate::error::Result;
use crate::interpreter::{interpret_with_options, InterpretOptions};
use crate::location::Location;
use crate::representation::Representation;
use crate::transport::{Headers, ParsedDocument, Transport, Verb};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Capability to fetch and write representations.
///
/// Cloning is cheap; clones share the underlying transport.
#[derive(Clone)]
pub struct HalClient {
    transport: Arc<dyn Transport>,
}

impl HalClient {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn from_arc(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Fetch and interpret the representation at `url`.
    ///
    /// The result is located by the response's `Content-Location`, then by
    /// its `self` link; relative references resolve against `url`.
    pub fn get(&self, url: &str) -> Result<Representation> {
        debug!(url = %url, "fetching representation");
        let doc = self.transport.fetch(url)?;
        self.interpret_response(url, doc)
    }

    pub fn post(&self, url: &str, body: &JsonValue, headers: &Headers) -> Result<Representation> {
        self.write(Verb::Post, url, Some(body), headers)
    }

    pub fn put(&self, url: &str, body: &JsonValue, headers: &Headers) -> Result<Representation> {
        self.write(Verb::Put, url, Some(body), headers)
    }

    pub fn patch(&self, url: &str, body: &JsonValue, headers: &Headers) -> Result<Representation> {
        self.write(Verb::Patch, url, Some(body), headers)
    }

    pub fn delete(&self, url: &str, headers: &Headers) -> Result<Representation> {
        self.write(Verb::Delete, url, None, headers)
    }

    /// Issue a write and interpret the response document.
    ///
    /// The response is located by its `Content-Location` or `self` link;
    /// without either it is anonymous.
    pub fn write(
        &self,
        verb: Verb,
        url: &str,
        body: Option<&JsonValue>,
        headers: &Headers,
    ) -> Result<Representation> {
        debug!(url = %url, verb = %verb, "writing representation");
        let doc = self.transport.write(verb, url, body, headers)?;
        self.interpret_response(url, doc)
    }

    fn interpret_response(&self, url: &str, doc: ParsedDocument) -> Result<Representation> {
        let body = match doc.body {
            JsonValue::Null => JsonValue::Object(Map::new()),
            body => body,
        };
        let opts = InterpretOptions {
            base: Location::href(url),
            content_location: doc.content_location,
        };
        interpret_with_options(&body, &opts, self)
    }
}

impl fmt::Debug for HalClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HalClient").finish_non_exhaustive()
    }
}
