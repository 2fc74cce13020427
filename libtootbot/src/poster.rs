//! Status publication with bounded exponential backoff
//!
//! Only status creation is retried, and only for transient HTTP statuses
//! (see [`crate::error::RETRYABLE_STATUS_CODES`]). Media must already be
//! uploaded so a retry never re-uploads it.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::PostConfig;
use crate::error::{Result, TootbotError};
use crate::platforms::TootPlatform;
use crate::types::{PostPayload, PostResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each following one
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

impl From<&PostConfig> for RetryPolicy {
    fn from(config: &PostConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay before the `retry`-th retry (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

fn is_transient(error: &TootbotError) -> bool {
    matches!(error, TootbotError::Upstream(e) if e.is_transient_post_error())
}

/// Create a status, retrying transient failures
///
/// Makes at most `policy.max_attempts()` calls. The returned value is the
/// outcome of the last attempt: the first success, the first non-transient
/// failure, or the failure that exhausted the retry budget.
pub async fn publish(
    platform: &dyn TootPlatform,
    payload: &PostPayload,
    policy: &RetryPolicy,
) -> Result<PostResult> {
    let max_attempts = policy.max_attempts();
    let mut retry = 0;

    loop {
        let attempt = retry + 1;

        let error = match platform.post_status(payload).await {
            Ok(result) => {
                if attempt > 1 {
                    info!(
                        "Successfully posted to {} on attempt {}",
                        platform.name(),
                        attempt
                    );
                }
                return Ok(result);
            }
            Err(e) => e,
        };

        if !is_transient(&error) {
            warn!(
                "Permanent error posting to {} (attempt {}/{}): {}",
                platform.name(),
                attempt,
                max_attempts,
                error
            );
            return Err(error);
        }

        if retry >= policy.max_retries {
            warn!(
                "Failed to post to {} after {} attempts: {}",
                platform.name(),
                attempt,
                error
            );
            return Err(error);
        }

        retry += 1;
        let delay = policy.delay_for(retry);
        let status = match &error {
            TootbotError::Upstream(e) => e.status(),
            _ => None,
        };
        warn!(
            status = ?status,
            "Transient error posting to {} (attempt {}/{}): {}. Retrying in {}ms...",
            platform.name(),
            attempt,
            max_attempts,
            error,
            delay.as_millis()
        );
        sleep(delay).await;
    }
}
