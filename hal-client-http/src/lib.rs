//! # hal-client-http
//!
//! Blocking HTTP transport for `hal-client`.
//!
//! ```ignore
//! use hal_client_http::{client, HttpConfig};
//!
//! let client = client(HttpConfig::from_path("halc.toml")?)?;
//! let root = client.get("https://api.example.com/")?;
//! ```

pub mod config;
pub mod error;
pub mod retry;
pub mod transport;

pub use config::{HttpConfig, RetryConfig, DEFAULT_ACCEPT};
pub use error::{HttpError, Result};
pub use retry::RetryPolicy;
pub use transport::HttpTransport;

use hal_client::HalClient;

/// A [`HalClient`] backed by an [`HttpTransport`] built from `config`.
pub fn client(config: HttpConfig) -> Result<HalClient> {
    Ok(HalClient::new(HttpTransport::new(config)?))
}
