//! Exponential backoff harness shared by the extractor's connection setup
//! and the search index HTTP client.
//!
//! Only connection-class failures should be retried here; callers are
//! responsible for classifying their own errors into
//! [`backoff::Error::Transient`] (keep retrying) or
//! [`backoff::Error::Permanent`] (give up immediately) before handing the
//! future to [`retry_connect`].

use crate::config::RetryConfig;
use backoff::ExponentialBackoffBuilder;
use std::future::Future;
use std::time::Duration;

/// Run `op`, retrying with exponential backoff until it succeeds, the retry
/// budget (elapsed time or attempt count, whichever is hit first) is
/// exhausted, or `op` reports a [`backoff::Error::Permanent`] failure.
pub async fn retry_connect<Op, Fut, T, E>(config: RetryConfig, mut op: Op) -> Result<T, E>
where
  Op: FnMut() -> Fut,
  Fut: Future<Output = Result<T, backoff::Error<E>>>,
{
  let policy = ExponentialBackoffBuilder::new()
    .with_initial_interval(Duration::from_millis(200))
    .with_max_interval(Duration::from_secs(10))
    .with_max_elapsed_time(Some(config.max_elapsed))
    .build();

  let mut attempts = 0u32;
  backoff::future::retry(policy, move || {
    attempts += 1;
    let exhausted = attempts >= config.max_attempts;
    let fut = op();
    async move {
      match fut.await {
        Err(backoff::Error::Transient { err, .. }) if exhausted => Err(backoff::Error::Permanent(err)),
        other => other,
      }
    }
  })
  .await
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};

  #[tokio::test]
  async fn retries_transient_errors_until_success() {
    let attempts = AtomicU32::new(0);
    let result: Result<&str, &str> = retry_connect(RetryConfig::default(), || {
      let count = attempts.fetch_add(1, Ordering::SeqCst);
      async move {
        if count < 2 {
          Err(backoff::Error::transient("not yet"))
        } else {
          Ok("connected")
        }
      }
    })
    .await;

    assert_eq!(result, Ok("connected"));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn gives_up_immediately_on_permanent_error() {
    let attempts = AtomicU32::new(0);
    let result: Result<&str, &str> = retry_connect(RetryConfig::default(), || {
      attempts.fetch_add(1, Ordering::SeqCst);
      async move { Err(backoff::Error::permanent("bad credentials")) }
    })
    .await;

    assert_eq!(result, Err("bad credentials"));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn exhausts_budget_and_returns_last_error() {
    let config = RetryConfig {
      max_attempts: 10,
      max_elapsed: Duration::from_millis(300),
    };
    let attempts = AtomicU32::new(0);
    let result: Result<&str, &str> = retry_connect(config, || {
      attempts.fetch_add(1, Ordering::SeqCst);
      async move { Err(backoff::Error::transient("still down")) }
    })
    .await;

    assert_eq!(result, Err("still down"));
    assert!(attempts.load(Ordering::SeqCst) >= 1);
  }
}
