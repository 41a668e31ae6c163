//! Shared test-process setup.

use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Install a `tracing` subscriber at `debug` level for the current test
/// binary, once. Safe to call from every test — subsequent calls are no-ops.
///
/// Uses `try_init` internally so a test binary that already installed its
/// own subscriber (or runs this twice across test modules) doesn't panic.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
            .with_test_writer()
            .try_init();
    });
}

/// Run a future to completion, panicking with a clear message if it doesn't
/// finish within `duration`.
///
/// # Panics
///
/// Panics if `future` does not complete within `duration`.
pub async fn with_timeout<F: std::future::Future>(
    duration: std::time::Duration,
    future: F,
) -> F::Output {
    tokio::time::timeout(duration, future)
        .await
        .expect("test future did not complete within the timeout")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn with_timeout_returns_the_inner_value() {
        let value = with_timeout(Duration::from_secs(1), async { 42 }).await;
        assert_eq!(value, 42);
    }

    #[tokio::test]
    #[should_panic(expected = "did not complete")]
    async fn with_timeout_panics_when_exceeded() {
        with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
        })
        .await;
    }

    #[test]
    fn init_test_logging_is_idempotent() {
        init_test_logging();
        init_test_logging();
    }
}
