//! Lazily fetched representations
//!
//! A [`RepresentationFuture`] fetches its document on first use and caches
//! the outcome. The fetch happens at most once per future: later callers
//! observe the cached representation, or a clone of the cached error.

use crate::client::HalClient;
use crate::error::{HalError, Result};
use crate::representation::Representation;
use parking_lot::Mutex;
use std::fmt;
use tracing::debug;

/// Memoized outcome of the fetch
#[derive(Debug, Clone)]
pub enum FetchState {
    Unfetched,
    Fetched(Representation),
    Failed(HalError),
}

/// Deferred fetch of the representation at a URL
pub struct RepresentationFuture {
    url: String,
    client: HalClient,
    state: Mutex<FetchState>,
}

impl RepresentationFuture {
    pub fn new(url: impl Into<String>, client: HalClient) -> Self {
        Self {
            url: url.into(),
            client,
            state: Mutex::new(FetchState::Unfetched),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// True once a fetch has been attempted, successful or not.
    pub fn is_reified(&self) -> bool {
        !matches!(*self.state.lock(), FetchState::Unfetched)
    }

    /// Snapshot of the fetch state.
    pub fn state(&self) -> FetchState {
        self.state.lock().clone()
    }

    /// Fetch on first call, then return the cached outcome.
    ///
    /// The lock is held across the fetch so concurrent callers wait for the
    /// single in-flight request instead of issuing their own.
    pub fn resolve(&self) -> Result<Representation> {
        let mut state = self.state.lock();
        match &*state {
            FetchState::Fetched(repr) => return Ok(repr.clone()),
            FetchState::Failed(err) => return Err(err.clone()),
            FetchState::Unfetched => {}
        }

        debug!(url = %self.url, "reifying representation");
        let outcome = self.client.get(&self.url);
        *state = match &outcome {
            Ok(repr) => FetchState::Fetched(repr.clone()),
            Err(err) => FetchState::Failed(err.clone()),
        };
        outcome
    }

    /// Copy with an independent cache. A fetched representation is forked
    /// along with it.
    pub(crate) fn fork(&self) -> Self {
        let state = match &*self.state.lock() {
            FetchState::Unfetched => FetchState::Unfetched,
            FetchState::Fetched(repr) => FetchState::Fetched(repr.fork()),
            FetchState::Failed(err) => FetchState::Failed(err.clone()),
        };
        Self {
            url: self.url.clone(),
            client: self.client.clone(),
            state: Mutex::new(state),
        }
    }
}

impl fmt::Debug for RepresentationFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // try_lock: never block on (or trigger) an in-flight fetch
        let status = match self.state.try_lock().as_deref() {
            Some(FetchState::Unfetched) => "unreified",
            Some(FetchState::Fetched(_)) => "reified",
            Some(FetchState::Failed(_)) => "failed",
            None => "fetching",
        };
        f.debug_struct("RepresentationFuture")
            .field("url", &self.url)
            .field("status", &status)
            .finish()
    }
}
