//! Retry with exponential backoff for remote API calls

use std::time::Duration;

use crate::error::FetchError;

/// Exponential backoff: `base * 2^attempt` (with a 1s base: 2s, 4s, 8s, ...)
pub fn backoff_duration(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Retry a fallible request with exponential backoff.
///
/// Retryable errors (see [`FetchError::is_retryable`]) are retried up to
/// `max_retries` times; anything else is returned immediately.
pub fn retry_with_backoff<T>(
    label: &str,
    max_retries: u32,
    base: Duration,
    mut attempt_fn: impl FnMut() -> Result<T, FetchError>,
) -> Result<T, FetchError> {
    let mut attempt = 0u32;
    loop {
        match attempt_fn() {
            Ok(v) => return Ok(v),
            Err(e) if attempt < max_retries && e.is_retryable() => {
                attempt += 1;
                let delay = backoff_duration(base, attempt);
                log::debug!(
                    "{label}: attempt {attempt}/{max_retries} failed: {e}, retrying in {delay:?}"
                );
                std::thread::sleep(delay);
            }
            Err(e) => {
                if e.is_retryable() {
                    log::error!("{label}: giving up after {attempt} retries: {e}");
                }
                return Err(e);
            }
        }
    }
}
