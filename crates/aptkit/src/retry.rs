//! Backoff for apt calls that hit a held dpkg lock or a flaky mirror.

use crate::error::{Error, Result};
use crate::types::RetryConfig;
use std::thread;
use std::time::Duration;

/// A failed attempt that is about to be retried.
#[derive(Debug)]
pub struct Retry<'e> {
    /// 1-based number of the attempt that failed
    pub attempt: u32,
    pub max_attempts: u32,
    pub error: &'e Error,
    pub wait: Duration,
}

/// Default observer: one warning per retry.
pub fn log_retry(retry: &Retry<'_>) {
    log::warn!(
        "apt attempt {}/{} failed: {}; retrying in {}s",
        retry.attempt,
        retry.max_attempts,
        retry.error,
        retry.wait.as_secs()
    );
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// runs out of attempts. `on_retry` sees each failure before the sleep.
pub fn with_retry<T>(
    config: &RetryConfig,
    mut on_retry: impl FnMut(&Retry<'_>),
    mut operation: impl FnMut() -> Result<T>,
) -> Result<T> {
    let max_attempts = config.max_attempts.max(1);
    let mut waits = (0..max_attempts - 1).map(|n| config.delay_for_attempt(n));

    let mut attempt = 0;
    loop {
        attempt += 1;
        let error = match operation() {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        if !error.is_retryable() {
            return Err(error);
        }
        let Some(wait) = waits.next() else {
            return Err(error);
        };

        on_retry(&Retry {
            attempt,
            max_attempts,
            error: &error,
            wait,
        });
        thread::sleep(wait);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay: Duration::from_millis(1),
            backoff_factor: 1.0,
            max_delay: Duration::from_millis(10),
        }
    }

    fn locked() -> Error {
        Error::Locked {
            message: "Could not get lock /var/lib/dpkg/lock-frontend".to_string(),
        }
    }

    #[test]
    fn test_first_try() {
        let value = with_retry(&RetryConfig::no_retry(), |_| {}, || Ok(7)).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_not_found_is_final() {
        let mut calls = 0;
        let result: Result<()> = with_retry(&quick(5), |_| {}, || {
            calls += 1;
            Err(Error::NotFound {
                name: "notapackage".to_string(),
            })
        });
        assert!(matches!(result, Err(Error::NotFound { .. })));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_lock_clears_on_third_attempt() {
        let mut calls = 0;
        let mut seen = Vec::new();
        let result = with_retry(
            &quick(3),
            |r| seen.push((r.attempt, r.max_attempts)),
            || {
                calls += 1;
                if calls < 3 { Err(locked()) } else { Ok("done") }
            },
        );
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls, 3);
        assert_eq!(seen, [(1, 3), (2, 3)]);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let mut calls = 0;
        let result: Result<()> = with_retry(&quick(2), |_| {}, || {
            calls += 1;
            Err(Error::Network {
                message: "Temporary failure resolving 'archive.ubuntu.com'".to_string(),
            })
        });
        assert!(matches!(result, Err(Error::Network { .. })));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_no_retry_config_fails_fast() {
        let mut retries = 0;
        let result: Result<()> = with_retry(&RetryConfig::no_retry(), |_| retries += 1, || {
            Err(locked())
        });
        assert!(result.is_err());
        assert_eq!(retries, 0);
    }
}
