//! When and how long to wait before retrying a failed request

use crate::config::RetryConfig;
use hal_client::TransportError;
use rand::Rng;
use std::time::Duration;

/// Per-request retry state.
///
/// The transport creates one policy per logical request and asks it, after
/// each failure, whether another attempt is due. Delays grow exponentially
/// from `base_delay_ms`, are capped at `max_delay_ms`, and carry up to a
/// quarter of extra jitter.
#[derive(Debug)]
pub struct RetryPolicy {
    config: RetryConfig,
    tries: u32,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config, tries: 1 }
    }

    /// Attempts made so far, the one that just failed included.
    pub fn tries(&self) -> u32 {
        self.tries
    }

    /// Pause before the next attempt after `err`, or `None` if `err` is
    /// final (not retryable, or `max_tries` used up).
    pub fn retry_after(&mut self, err: &TransportError) -> Option<Duration> {
        if !is_retryable(err) || self.tries >= self.config.max_tries.max(1) {
            return None;
        }
        let delay = self.delay_for(self.tries - 1);
        self.tries += 1;
        Some(delay)
    }

    fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u64.checked_shl(retry).unwrap_or(u64::MAX);
        let capped = self
            .config
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.config.max_delay_ms);
        let jitter = rand::thread_rng().gen_range(0..=capped / 4);
        Duration::from_millis(capped + jitter)
    }
}

/// Server errors, timeouts and network failures; never client errors or
/// undecodable bodies.
pub fn is_retryable(err: &TransportError) -> bool {
    matches!(
        err,
        TransportError::Server { .. } | TransportError::Network { .. } | TransportError::Timeout { .. }
    )
}
