//! Retry Executor - Bounded Retries with Exponential Backoff + Jitter
//!
//! Runs a fallible remote call up to `max_attempts` times. After a
//! failed attempt `k` (when `k < max_attempts`) the caller waits
//! `base^(k-1) + U(0, max_jitter)` seconds before the next attempt.
//! The wait is not cancellable.
//!
//! The last error is returned as-is once attempts run out; it is never
//! wrapped or replaced. Whether a failure may be retried at all is
//! decided by `Retryable` and nothing else.
//!
//! The executor knows nothing about whether a failed attempt's effect
//! landed remotely. Callers retrying non-idempotent calls (placement)
//! must supply their own deduplication key.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::RetryConfig;
use crate::domain::error::Retryable;
use crate::domain::random::RandomSource;

/// Backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
  /// Attempts including the first (at least 1).
  pub max_attempts: u32,
  /// Exponential base in seconds.
  pub backoff_base: f64,
  /// Jitter ceiling in seconds.
  pub max_jitter_secs: f64,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self::from(&RetryConfig::default())
  }
}

impl From<&RetryConfig> for RetryPolicy {
  fn from(config: &RetryConfig) -> Self {
    Self {
      max_attempts: config.max_attempts.max(1),
      backoff_base: config.backoff_base,
      max_jitter_secs: config.max_jitter_secs,
    }
  }
}

impl RetryPolicy {
  /// Deterministic part of the delay after failed attempt `attempt`.
  pub fn base_delay_secs(&self, attempt: u32) -> f64 {
    let exp = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
    self.backoff_base.powi(exp)
  }
}

/// Outcome of a single attempt, reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
  /// The attempt returned a value.
  Succeeded,
  /// The attempt failed and another will follow.
  Retrying,
  /// The attempt failed and no further attempt will be made.
  GaveUp,
}

/// Receives per-attempt telemetry (metrics, test recorders).
pub trait RetryObserver: Send + Sync {
  /// Called once per attempt of the operation named `label`.
  fn on_attempt(&self, label: &str, attempt: u32, outcome: AttemptOutcome);
}

/// Executes remote calls under a `RetryPolicy`.
///
/// One executor per session: it owns its jitter source and is driven
/// through `&mut self`, so calls are strictly sequential.
pub struct RetryExecutor {
  /// Backoff parameters.
  policy: RetryPolicy,
  /// Jitter source.
  rng: Box<dyn RandomSource>,
  /// Optional telemetry sink.
  observer: Option<Arc<dyn RetryObserver>>,
}

impl std::fmt::Debug for RetryExecutor {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RetryExecutor")
      .field("policy", &self.policy)
      .field("observed", &self.observer.is_some())
      .finish_non_exhaustive()
  }
}

impl RetryExecutor {
  /// Create an executor with the given policy and jitter source.
  pub fn new(policy: RetryPolicy, rng: Box<dyn RandomSource>) -> Self {
    Self {
      policy,
      rng,
      observer: None,
    }
  }

  /// Attach a telemetry observer.
  #[must_use]
  pub fn with_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
    self.observer = Some(observer);
    self
  }

  /// Active policy.
  pub fn policy(&self) -> RetryPolicy {
    self.policy
  }

  /// Full delay (base + jitter) to wait after failed attempt `attempt`.
  pub fn backoff_delay(&mut self, attempt: u32) -> Duration {
    let jitter = self.rng.next_f64() * self.policy.max_jitter_secs;
    let secs = self.policy.base_delay_secs(attempt) + jitter;
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
  }

  /// Run `operation` until it succeeds, fails non-retryably, or
  /// attempts run out.
  ///
  /// `label` names the operation in logs and telemetry.
  ///
  /// # Errors
  /// Returns the error of the last attempt, unchanged.
  pub async fn execute<T, E, F, Fut>(&mut self, label: &str, mut operation: F) -> Result<T, E>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
  {
    let max_attempts = self.policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
      match operation().await {
        Ok(value) => {
          self.observe(label, attempt, AttemptOutcome::Succeeded);
          if attempt > 1 {
            info!(operation = label, attempt, "Recovered after retry");
          }
          return Ok(value);
        }
        Err(err) => {
          let retry = attempt < max_attempts && err.is_retryable();

          if !retry {
            warn!(
              operation = label,
              attempt,
              max_attempts,
              error = %err,
              "Attempt failed"
            );
            self.observe(label, attempt, AttemptOutcome::GaveUp);
            error!(
              operation = label,
              attempts = attempt,
              retryable = err.is_retryable(),
              error = %err,
              "All attempts failed"
            );
            return Err(err);
          }

          let delay = self.backoff_delay(attempt);
          warn!(
            operation = label,
            attempt,
            max_attempts,
            error = %err,
            backoff_secs = delay.as_secs_f64(),
            "Attempt failed, backing off"
          );
          self.observe(label, attempt, AttemptOutcome::Retrying);
          sleep(delay).await;
          attempt += 1;
        }
      }
    }
  }

  fn observe(&self, label: &str, attempt: u32, outcome: AttemptOutcome) {
    if let Some(observer) = &self.observer {
      observer.on_attempt(label, attempt, outcome);
    }
  }
}
