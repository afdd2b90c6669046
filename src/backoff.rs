//! Rate-limit backoff policy
//!
//! The GitHub API signals rate limiting with 429 (and historically 403).
//! The original behavior is a fixed ten-minute sleep and an unbounded
//! retry of the same request; tests substitute a zero-duration policy.

use crate::error::{SyncError, SyncResult};
use std::time::Duration;
use tracing::warn;

/// Fixed delay between retries when the API reports rate limiting
pub const RATE_LIMIT_DELAY: Duration = Duration::from_secs(600);

/// Fixed-delay retry policy for rate-limit signals
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    /// How long to sleep between attempts
    pub delay: Duration,
    /// Maximum number of retries, or `None` for unbounded
    pub max_retries: Option<u32>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            delay: RATE_LIMIT_DELAY,
            max_retries: None,
        }
    }
}

impl BackoffPolicy {
    /// Zero-delay, bounded policy for tests
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            delay: Duration::ZERO,
            max_retries: Some(max_retries),
        }
    }

    /// Run `op`, sleeping and retrying while it reports a rate limit.
    ///
    /// Any other outcome, success or failure, is returned as-is.
    pub fn retry<T>(&self, mut op: impl FnMut() -> SyncResult<T>) -> SyncResult<T> {
        let mut retries = 0u32;
        loop {
            match op() {
                Err(err) if err.is_rate_limit() => {
                    if let Some(max) = self.max_retries {
                        if retries >= max {
                            return Err(SyncError::RateLimited);
                        }
                    }
                    retries += 1;
                    warn!(
                        delay_secs = self.delay.as_secs(),
                        "API rate limit likely exceeded, sleeping before retry"
                    );
                    std::thread::sleep(self.delay);
                }
                other => return other,
            }
        }
    }
}
