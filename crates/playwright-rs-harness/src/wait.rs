// Bounded polling
//
// Every wait in the harness goes through `poll_until`, so expiry always
// surfaces as `Error::Timeout` rather than an assertion failure.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Default polling interval (100ms, matching playwright-rs assertions)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Polls `check` until it yields `Some`, an error, or `timeout` elapses.
///
/// `check` always runs at least once, even with a zero timeout.
///
/// # Errors
///
/// Propagates errors from `check`; returns [`Error::Timeout`] describing
/// `what` when the bound expires.
pub async fn poll_until<T, F, Fut>(what: &str, timeout: Duration, mut check: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    poll_with_interval(what, timeout, DEFAULT_POLL_INTERVAL, &mut check).await
}

/// Like [`poll_until`] with an explicit interval.
pub async fn poll_with_interval<T, F, Fut>(
    what: &str,
    timeout: Duration,
    interval: Duration,
    mut check: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let start = Instant::now();
    loop {
        if let Some(value) = check().await? {
            return Ok(value);
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(Error::timeout(what, timeout));
        }
        tokio::time::sleep(interval.min(timeout - elapsed)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_returns_first_some() {
        let calls = AtomicUsize::new(0);
        let value = poll_with_interval("counter", Duration::from_secs(1), Duration::from_millis(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok((n == 3).then_some(n)) }
        })
        .await
        .unwrap();
        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_expiry_is_a_timeout() {
        let err = poll_with_interval::<(), _, _>(
            "nothing",
            Duration::from_millis(30),
            Duration::from_millis(5),
            || async { Ok(None) },
        )
        .await
        .unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("nothing"));
    }

    #[tokio::test]
    async fn test_zero_timeout_checks_once() {
        let calls = AtomicUsize::new(0);
        let result = poll_until("once", Duration::ZERO, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(Some(())) }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_propagate_immediately() {
        let err = poll_until::<(), _, _>("broken", Duration::from_secs(5), || async {
            Err(Error::Assertion("boom".into()))
        })
        .await
        .unwrap_err();
        assert!(!err.is_timeout());
    }
}
