//! Bounded retry with cubic backoff around vendor calls

use crate::config::PluginConfig;
use crate::error::{Result, SessyError};
use crate::logging::StructuredLogger;
use std::future::Future;
use std::time::Duration;

/// How often and how patiently a vendor call is repeated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &PluginConfig) -> Self {
        Self::new(
            config.retry_attempts,
            Duration::from_millis(config.retry_base_delay_ms),
        )
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Wait after failed attempt `attempt` (1-based): `attempt^3` base units
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt.saturating_pow(3)
    }

    /// Run `op` until it succeeds or the attempts run out
    ///
    /// Request and transport errors are retried after the backoff delay.
    /// Any other error is returned immediately. When every attempt fails the
    /// result is [`SessyError::TooManyRetries`].
    pub async fn run<T, F, Fut>(&self, what: &str, logger: &StructuredLogger, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        for attempt in 1..=self.attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => {
                    let delay = self.delay_for(attempt);
                    logger.warn(&format!(
                        "{} failed (attempt {}/{}): {}; waiting {:?}",
                        what, attempt, self.attempts, e, delay
                    ));
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
        logger.error(&format!("{} failed after {} attempts", what, self.attempts));
        Err(SessyError::TooManyRetries)
    }
}
