//! Blocking HTTP implementation of [`hal_client::Transport`]

use crate::config::HttpConfig;
use crate::error::{HttpError, Result};
use crate::retry::RetryPolicy;
use hal_client::location;
use hal_client::{Headers, ParsedDocument, Transport, TransportError, Verb};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_LOCATION, CONTENT_TYPE};
use reqwest::Method;
use serde_json::{Map, Value as JsonValue};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const JSON_CONTENT_TYPE: &str = "application/json";

/// HAL transport over HTTP(S)
///
/// Server errors, timeouts and network failures are retried according to
/// [`crate::RetryConfig`]; client errors never are.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    config: HttpConfig,
}

impl HttpTransport {
    pub fn new(config: HttpConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| HttpError::Config(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| HttpError::Config(format!("invalid value for header '{name}': {e}")))?;
            default_headers.insert(name, value);
        }
        HeaderValue::from_str(&config.accept)
            .map_err(|e| HttpError::Config(format!("invalid accept value: {e}")))?;

        let mut builder = Client::builder().default_headers(default_headers);
        if let Some(ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }

        Ok(Self {
            http: builder.build()?,
            config,
        })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Send a request, retrying retryable failures with backoff.
    fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<&JsonValue>,
        headers: &Headers,
    ) -> std::result::Result<ParsedDocument, TransportError> {
        let mut policy = RetryPolicy::new(self.config.retry);

        loop {
            let err = match self.send_once(method.clone(), url, body, headers) {
                Ok(doc) => return Ok(doc),
                Err(err) => err,
            };
            let attempt = policy.tries();
            let Some(delay) = policy.retry_after(&err) else {
                return Err(err);
            };
            warn!(
                url = %url,
                attempt,
                max_tries = self.config.retry.max_tries,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "request failed, retrying"
            );
            thread::sleep(delay);
        }
    }

    fn send_once(
        &self,
        method: Method,
        url: &str,
        body: Option<&JsonValue>,
        headers: &Headers,
    ) -> std::result::Result<ParsedDocument, TransportError> {
        debug!(url = %url, method = %method, "sending request");

        let mut request = self
            .http
            .request(method, url)
            .header(ACCEPT, self.config.accept.as_str());
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            let has_content_type = headers
                .keys()
                .any(|name| name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));
            if !has_content_type {
                request = request.header(CONTENT_TYPE, JSON_CONTENT_TYPE);
            }
            request = request.body(body.to_string());
        }

        let response = request.send().map_err(|e| classify(url, e))?;
        let status = response.status();
        let final_url = response.url().to_string();
        let content_location = response
            .headers()
            .get(CONTENT_LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(|value| location::resolve(&final_url, value))
            .or_else(|| (final_url != url).then(|| final_url.clone()));
        let text = response.text().map_err(|e| classify(url, e))?;

        if status.is_client_error() {
            return Err(TransportError::Client {
                status: status.as_u16(),
                url: url.to_string(),
                body: text,
            });
        }
        if status.is_server_error() {
            return Err(TransportError::Server {
                status: status.as_u16(),
                url: url.to_string(),
                body: text,
            });
        }

        let body = if text.trim().is_empty() {
            JsonValue::Object(Map::new())
        } else {
            serde_json::from_str(&text).map_err(|e| TransportError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })?
        };

        Ok(ParsedDocument {
            body,
            content_location,
        })
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, url: &str) -> std::result::Result<ParsedDocument, TransportError> {
        self.execute(Method::GET, url, None, &Headers::new())
    }

    fn write(
        &self,
        verb: Verb,
        url: &str,
        body: Option<&JsonValue>,
        headers: &Headers,
    ) -> std::result::Result<ParsedDocument, TransportError> {
        self.execute(method_for(verb), url, body, headers)
    }
}

fn method_for(verb: Verb) -> Method {
    match verb {
        Verb::Post => Method::POST,
        Verb::Put => Method::PUT,
        Verb::Patch => Method::PATCH,
        Verb::Delete => Method::DELETE,
    }
}

fn classify(url: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else {
        TransportError::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}
