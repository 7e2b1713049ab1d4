//! Bounded retries with exponential backoff for external calls

use std::thread::sleep;
use std::time::Duration;

/// How many times to attempt an operation and how long to wait in between
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failure; doubled after each further failure
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff: Duration::from_millis(initial_backoff_ms),
        }
    }

    /// `retries` further attempts after the first one
    pub fn with_retries(retries: u32, initial_backoff_ms: u64) -> Self {
        Self::new(retries.saturating_add(1), initial_backoff_ms)
    }

    /// Delay before attempt `attempt + 1` (attempt is 0-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Run `op` until it succeeds or the policy runs out of attempts.
///
/// Returns the last error together with the number of attempts made.
pub fn with_backoff<T, E, F>(policy: RetryPolicy, what: &str, mut op: F) -> Result<T, (E, u32)>
where
    E: std::fmt::Display,
    F: FnMut() -> Result<T, E>,
{
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;
                tracing::warn!(
                    "{} attempt {}/{} failed: {}",
                    what,
                    attempt,
                    policy.max_attempts,
                    e
                );

                if attempt >= policy.max_attempts {
                    return Err((e, attempt));
                }

                let wait = policy.backoff(attempt - 1);
                tracing::info!("Retrying {} in {:?}", what, wait);
                sleep(wait);
            }
        }
    }
}
