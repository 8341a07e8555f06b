//! Error types for building the HTTP transport
//!
//! Request-time failures are reported as [`hal_client::TransportError`];
//! this type only covers configuration and client construction.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The underlying HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl From<reqwest::Error> for HttpError {
    fn from(e: reqwest::Error) -> Self {
        HttpError::Client(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HttpError>;
