//! Exponential backoff for provider calls.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, the first call included. Never zero.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Three attempts, waiting 1s then 2s.
    pub fn api_call() -> Self {
        Self::new(3, Duration::from_secs(1)).with_max_delay(Duration::from_secs(5))
    }

    /// Wait before retry number `retry` (1-based), capped at `max_delay`.
    fn delay_before(&self, retry: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(retry.saturating_sub(1) as i32);
        self.initial_delay.mul_f64(factor).min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::api_call()
    }
}

/// Run `operation` until it succeeds, fails with an error `should_retry`
/// rejects, or `config.max_attempts` is reached. The last error is returned.
pub async fn with_retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    label: &str,
    mut operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !should_retry(&error) {
            debug!("{}: not retrying: {}", label, error);
            return Err(error);
        }
        if attempt >= max_attempts {
            warn!("{}: giving up after {} attempts: {}", label, attempt, error);
            return Err(error);
        }

        let delay = config.delay_before(attempt);
        warn!(
            "{}: attempt {}/{} failed ({}), retrying in {:?}",
            label, attempt, max_attempts, error, delay
        );
        sleep(delay).await;
        attempt += 1;
    }
}
