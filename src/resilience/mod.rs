//! Resilience wrapper around downstream dependencies.
//!
//! Every persistent-store or enrichment call goes through a
//! [`DependencyGuard`], which applies a bounded timeout, a bounded
//! retry policy for operations that are safe to re-issue, and a
//! circuit breaker. Guards are per dependency: an open circuit on the
//! brand store must not fail catalog reads that never touch it.

pub mod breaker;

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::application::repos::RepoError;

pub use breaker::{BreakerSettings, CircuitBreaker, Permit};

#[derive(Debug, Clone, Copy)]
pub struct GuardSettings {
    /// Per-attempt deadline for a downstream call.
    pub timeout: Duration,
    /// Total attempts for retryable operations, first call included.
    pub max_attempts: u32,
    /// First retry delay; doubles on every further attempt.
    pub backoff_base: Duration,
    pub breaker: BreakerSettings,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            max_attempts: 3,
            backoff_base: Duration::from_millis(50),
            breaker: BreakerSettings::default(),
        }
    }
}

/// Whether an operation may be re-issued on transient failure.
///
/// Only reads and idempotent writes qualify; anything else gets a
/// single attempt regardless of the configured policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retry {
    Idempotent,
    None,
}

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("circuit open for `{dependency}`")]
    CircuitOpen { dependency: &'static str },
    #[error("`{dependency}` timed out after {timeout:?}")]
    Timeout {
        dependency: &'static str,
        timeout: Duration,
    },
    #[error("`{dependency}` unavailable after {attempts} attempt(s)")]
    Unavailable {
        dependency: &'static str,
        attempts: u32,
        #[source]
        source: RepoError,
    },
    /// Terminal, non-transient downstream outcome (not found, duplicate,
    /// bad input). Passed through untouched and never retried.
    #[error(transparent)]
    Rejected(RepoError),
}

pub struct DependencyGuard {
    dependency: &'static str,
    settings: GuardSettings,
    breaker: CircuitBreaker,
}

impl DependencyGuard {
    pub fn new(dependency: &'static str, settings: GuardSettings) -> Self {
        Self {
            dependency,
            settings,
            breaker: CircuitBreaker::new(dependency, settings.breaker),
        }
    }

    pub fn dependency(&self) -> &'static str {
        self.dependency
    }

    /// Run `op` under this guard's timeout, retry, and breaker policy.
    ///
    /// `op` is invoked once per attempt; it must capture everything it
    /// needs by value so a fresh future can be built for each retry.
    pub async fn call<T, F, Fut>(&self, retry: Retry, op: F) -> Result<T, GuardError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, RepoError>>,
    {
        let max_attempts = match retry {
            Retry::Idempotent => self.settings.max_attempts.max(1),
            Retry::None => 1,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            if self.breaker.acquire(Instant::now()) == Permit::Rejected {
                return Err(GuardError::CircuitOpen {
                    dependency: self.dependency,
                });
            }

            let outcome = tokio::time::timeout(self.settings.timeout, op()).await;
            let failure = match outcome {
                Ok(Ok(value)) => {
                    self.breaker.record_success();
                    return Ok(value);
                }
                Ok(Err(err)) if !err.is_transient() => {
                    // The downstream answered; a terminal outcome is not
                    // a dependency failure.
                    self.breaker.record_success();
                    return Err(GuardError::Rejected(err));
                }
                Ok(Err(err)) => Some(err),
                Err(_) => None,
            };

            self.breaker.record_failure(Instant::now());

            if attempt >= max_attempts {
                return Err(match failure {
                    Some(source) => GuardError::Unavailable {
                        dependency: self.dependency,
                        attempts: attempt,
                        source,
                    },
                    None => GuardError::Timeout {
                        dependency: self.dependency,
                        timeout: self.settings.timeout,
                    },
                });
            }

            let backoff = self.settings.backoff_base * 2u32.pow(attempt - 1);
            match &failure {
                Some(err) => warn!(
                    dependency = self.dependency,
                    attempt,
                    error = %err,
                    backoff_ms = backoff.as_millis() as u64,
                    "transient downstream failure, retrying"
                ),
                None => warn!(
                    dependency = self.dependency,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "downstream call timed out, retrying"
                ),
            }
            tokio::time::sleep(backoff).await;
            debug!(dependency = self.dependency, attempt = attempt + 1, "retrying");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn settings(max_attempts: u32, threshold: u32) -> GuardSettings {
        GuardSettings {
            timeout: Duration::from_millis(200),
            max_attempts,
            backoff_base: Duration::from_millis(1),
            breaker: BreakerSettings {
                failure_threshold: threshold,
                cooldown: Duration::from_secs(60),
            },
        }
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let guard = DependencyGuard::new("flaky-db", settings(3, 10));
        let calls = AtomicU32::new(0);

        let value = guard
            .call(Retry::Idempotent, || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(RepoError::Timeout)
                } else {
                    Ok(7)
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_surfaces_a_single_aggregated_failure() {
        let guard = DependencyGuard::new("down-db", settings(3, 10));
        let calls = AtomicU32::new(0);

        let err = guard
            .call(Retry::Idempotent, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(RepoError::Persistence("connection refused".into()))
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            err,
            GuardError::Unavailable { attempts: 3, .. }
        ));
    }

    #[tokio::test]
    async fn terminal_errors_are_not_retried_and_do_not_trip_the_breaker() {
        let guard = DependencyGuard::new("ok-db", settings(3, 1));
        let calls = AtomicU32::new(0);

        let err = guard
            .call(Retry::Idempotent, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(RepoError::NotFound)
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, GuardError::Rejected(RepoError::NotFound)));

        // Threshold is 1, yet the circuit must still be closed.
        let ok = guard.call(Retry::None, || async { Ok(1) }).await.unwrap();
        assert_eq!(ok, 1);
    }

    #[tokio::test]
    async fn non_idempotent_calls_get_a_single_attempt() {
        let guard = DependencyGuard::new("write-db", settings(5, 10));
        let calls = AtomicU32::new(0);

        let err = guard
            .call(Retry::None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(RepoError::Timeout)
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, GuardError::Unavailable { attempts: 1, .. }));
    }

    #[tokio::test]
    async fn open_circuit_fails_fast_without_calling_downstream() {
        let guard = DependencyGuard::new("dead-db", settings(1, 2));
        let calls = AtomicU32::new(0);

        for _ in 0..2 {
            let _ = guard
                .call(Retry::None, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(RepoError::Timeout)
                })
                .await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let err = guard
            .call(Retry::None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, GuardError::CircuitOpen { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn slow_calls_hit_the_per_attempt_timeout() {
        let guard = DependencyGuard::new("slow-db", settings(1, 10));

        let err = guard
            .call(Retry::None, || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, GuardError::Timeout { .. }));
    }
}
