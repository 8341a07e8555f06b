//! Error types for HAL navigation
//!
//! [`HalError`] covers everything the engine itself can report. Failures of
//! the transport collaborator arrive as [`TransportError`] and are wrapped
//! unchanged in [`HalError::Transport`].

use thiserror::Error;

/// Errors reported by the transport collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Server answered with a 4xx status
    #[error("HTTP {status} from {url}")]
    Client {
        status: u16,
        url: String,
        body: String,
    },

    /// Server answered with a 5xx status
    #[error("HTTP {status} from {url}")]
    Server {
        status: u16,
        url: String,
        body: String,
    },

    /// Request did not complete in time
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// Connection-level failure
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    /// Response body was not a JSON document
    #[error("Undecodable response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl TransportError {
    /// URL of the request that failed.
    pub fn url(&self) -> &str {
        match self {
            TransportError::Client { url, .. }
            | TransportError::Server { url, .. }
            | TransportError::Timeout { url }
            | TransportError::Network { url, .. }
            | TransportError::Decode { url, .. } => url,
        }
    }

    /// HTTP status, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Client { status, .. } | TransportError::Server { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// Errors from interpreting and navigating representations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HalError {
    /// Document (or one link/embed of it) is not valid HAL.
    /// `path` is a JSON pointer to the offending value.
    #[error("Invalid representation at '{path}': {message}")]
    InvalidRepresentation { path: String, message: String },

    /// Representation does not have an `item` relation
    #[error("Not a collection: {0}")]
    NotACollection(String),

    /// Missing property or relation
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Representation was invalidated by a write through it
    #[error("Representation of {location} is stale; use the representation returned by the write")]
    Stale { location: String },

    /// Bad caller input
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Operation refused because it is unsupported in this state
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl HalError {
    pub(crate) fn invalid(path: impl Into<String>, message: impl Into<String>) -> Self {
        HalError::InvalidRepresentation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for errors raised by the transport collaborator.
    pub fn is_transport(&self) -> bool {
        matches!(self, HalError::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, HalError>;
