//! Retry mechanism with linear backoff
//!
//! Wraps a backend operation with a bounded number of attempts, sleeping
//! `attempt × base_delay` between them. Retry applies to whole operations,
//! never to individual bytes inside a stream.

use std::time::Duration;

use crate::error::{Error, Result};

/// Attempt budget and backoff slope for one backend operation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

impl RetryPolicy {
    pub const fn new(attempts: u32) -> Self {
        Self {
            attempts,
            base_delay: Duration::from_secs(1),
        }
    }

    /// Delay to sleep after the 1-based `attempt` has failed.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Retry a fallible async operation with linear backoff
///
/// # Arguments
/// * `policy` - Attempt budget and backoff slope
/// * `operation` - Async closure that returns `Result<T>`
/// * `is_retryable` - Closure that determines if an error should trigger retry
pub async fn with_retry<T, F, Fut, R>(
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: R,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    R: Fn(&Error) -> bool,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt >= policy.attempts || !is_retryable(&e) {
                    return Err(e);
                }

                let delay = policy.delay(attempt);
                tracing::debug!(
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying after transient error"
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Check if an error is retryable (transient)
pub fn is_transient(error: &Error) -> bool {
    match error {
        Error::Network(msg) => {
            let msg_lower = msg.to_lowercase();
            msg_lower.contains("timeout")
                || msg_lower.contains("timed out")
                || msg_lower.contains("connection reset")
                || msg_lower.contains("connection refused")
                || msg_lower.contains("connection aborted")
                || msg_lower.contains("broken pipe")
                || msg_lower.contains("dispatch")
                || msg_lower.contains("500")
                || msg_lower.contains("502")
                || msg_lower.contains("503")
                || msg_lower.contains("504")
                || msg_lower.contains("internal error")
                || msg_lower.contains("service unavailable")
                || msg_lower.contains("unavailable")
                || msg_lower.contains("too many requests")
                || msg_lower.contains("429")
                || msg_lower.contains("request rate")
                || msg_lower.contains("slow down")
        }
        // A command that wrote to stderr inside the container may have hit a
        // transient condition; the attempt budget bounds the damage.
        Error::Command(_) => true,
        Error::Io(e) => {
            matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::Interrupted
            )
        }
        // Non-retryable errors
        Error::Usage(_)
        | Error::InvalidPath(_)
        | Error::Connect(_)
        | Error::NotFound(_)
        | Error::List(_)
        | Error::Transfer { .. }
        | Error::Invariant(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_grows_linearly() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(1), Duration::from_secs(1));
        assert_eq!(policy.delay(2), Duration::from_secs(2));
        assert_eq!(policy.delay(3), Duration::from_secs(3));
    }

    #[test]
    fn test_is_transient() {
        // Network errors with transient markers are retryable
        assert!(is_transient(&Error::Network("connection timeout".to_string())));
        assert!(is_transient(&Error::Network(
            "503 Service Unavailable".to_string()
        )));
        assert!(is_transient(&Error::Network(
            "429 Too Many Requests".to_string()
        )));

        // Command failures inside the container are retried
        assert!(is_transient(&Error::Command(
            "STDERR: cat: /data/f: Input/output error".to_string()
        )));

        // Credential and grammar problems are not
        assert!(!is_transient(&Error::Connect("access denied".to_string())));
        assert!(!is_transient(&Error::NotFound("no such key".to_string())));
        assert!(!is_transient(&Error::InvalidPath("bkt".to_string())));

        // Service errors without a transient marker are not retried
        assert!(!is_transient(&Error::Network(
            "Service error: NoSuchKey".to_string()
        )));
    }

    #[tokio::test]
    async fn test_retry_success_first_attempt() {
        let policy = RetryPolicy::default();
        let mut calls = 0;

        let result = with_retry(
            &policy,
            || {
                calls += 1;
                async { Ok::<_, Error>(42) }
            },
            |_| true,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_retry_success_after_failure() {
        let policy = RetryPolicy {
            attempts: 3,
            base_delay: Duration::from_millis(1), // Fast for tests
        };
        let call_count = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        let result = with_retry(
            &policy,
            || {
                let cc = call_count_clone.clone();
                async move {
                    let count = cc.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    if count < 2 {
                        Err(Error::Network("timeout".to_string()))
                    } else {
                        Ok(42)
                    }
                }
            },
            is_transient,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhausted() {
        let policy = RetryPolicy {
            attempts: 2,
            base_delay: Duration::from_millis(1),
        };
        let mut calls = 0;

        let result: Result<()> = with_retry(
            &policy,
            || {
                calls += 1;
                async { Err(Error::Network("timeout".to_string())) }
            },
            |_| true,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_retry_non_retryable() {
        let policy = RetryPolicy {
            attempts: 3,
            base_delay: Duration::from_millis(1),
        };
        let mut calls = 0;

        let result: Result<()> = with_retry(
            &policy,
            || {
                calls += 1;
                async { Err(Error::NotFound("not found".to_string())) }
            },
            is_transient,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls, 1); // Should not retry
    }
}
