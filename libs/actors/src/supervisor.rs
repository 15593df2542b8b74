//! Supervision
//!
//! A `Supervisor` is a failure policy: when a handler invocation fails with a
//! retryable error, the supervisor re-invokes the same work on the same
//! message according to its retry schedule. Once the schedule is exhausted the
//! optional fallback runs and the *original* error propagates.
//!
//! Retries re-execute side-effecting handlers, so handlers must tolerate
//! at-least-once execution.

use crate::error::Retryable;
use futures::future::BoxFuture;
use std::fmt::{self, Display};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Delay between consecutive retries
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    Immediate,
    Fixed(Duration),
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
    },
}

/// How many times, and how quickly, a failing invocation is retried
#[derive(Debug, Clone, PartialEq)]
pub struct RetrySchedule {
    max_retries: u32,
    backoff: Backoff,
    within: Option<Duration>,
}

impl RetrySchedule {
    pub fn new(max_retries: u32, backoff: Backoff) -> Self {
        Self {
            max_retries,
            backoff,
            within: None,
        }
    }

    /// Stop retrying once this much time has passed since the first failure
    pub fn within(mut self, budget: Duration) -> Self {
        self.within = Some(budget);
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `retry` (zero-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        match &self.backoff {
            Backoff::Immediate => Duration::ZERO,
            Backoff::Fixed(interval) => *interval,
            Backoff::Exponential { base, factor, max } => {
                let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
                let nanos = base.as_nanos() as f64 * factor.powi(exponent);
                if !nanos.is_finite() || nanos >= max.as_nanos() as f64 {
                    *max
                } else {
                    Duration::from_nanos(nanos.max(0.0).round() as u64)
                }
            }
        }
    }

    fn allows(&self, retry: u32, elapsed: Duration) -> bool {
        retry < self.max_retries && self.within.map_or(true, |budget| elapsed < budget)
    }
}

/// What a fallback learns about an exhausted supervision
#[derive(Debug, Clone, PartialEq)]
pub struct FailureReport {
    /// The error that triggered supervision
    pub error: String,
    /// Error of the last retry, if any retry ran
    pub last_error: Option<String>,
    pub retries: u32,
}

type Fallback = Arc<dyn Fn(FailureReport) -> BoxFuture<'static, ()> + Send + Sync>;

/// Failure policy applied to handler invocations
#[derive(Clone)]
pub struct Supervisor {
    schedule: RetrySchedule,
    fallback: Option<Fallback>,
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("schedule", &self.schedule)
            .field("has_fallback", &self.fallback.is_some())
            .finish()
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::none()
    }
}

impl Supervisor {
    /// Fail fast: the triggering error propagates without re-invocation
    pub fn none() -> Self {
        Self::from_schedule(RetrySchedule::new(0, Backoff::Immediate))
    }

    /// Retry immediately up to `max_retries` times
    pub fn retry(max_retries: u32) -> Self {
        Self::from_schedule(RetrySchedule::new(max_retries, Backoff::Immediate))
    }

    /// Retry up to `max_retries` times, `interval` apart
    pub fn fixed(max_retries: u32, interval: Duration) -> Self {
        Self::from_schedule(RetrySchedule::new(max_retries, Backoff::Fixed(interval)))
    }

    /// Retry up to `max_retries` times with exponentially growing delays
    pub fn exponential(max_retries: u32, base: Duration, factor: f64, max: Duration) -> Self {
        Self::from_schedule(RetrySchedule::new(
            max_retries,
            Backoff::Exponential { base, factor, max },
        ))
    }

    pub fn from_schedule(schedule: RetrySchedule) -> Self {
        Self {
            schedule,
            fallback: None,
        }
    }

    /// Bound the total time spent retrying
    pub fn within(mut self, budget: Duration) -> Self {
        self.schedule = self.schedule.within(budget);
        self
    }

    /// Side effect run once retries are exhausted
    pub fn with_fallback<F, Fut>(mut self, fallback: F) -> Self
    where
        F: Fn(FailureReport) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.fallback = Some(Arc::new(move |report| Box::pin(fallback(report))));
        self
    }

    pub fn schedule(&self) -> &RetrySchedule {
        &self.schedule
    }

    /// Recover from `error` by re-running `work`
    ///
    /// Non-retryable errors (runtime failures) propagate untouched, whether
    /// they triggered supervision or surfaced during a retry.
    pub async fn supervise<T, E, F, Fut>(&self, error: E, mut work: F) -> Result<T, E>
    where
        E: Retryable + Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !error.is_retryable() {
            return Err(error);
        }

        let started = Instant::now();
        let mut last_error: Option<E> = None;
        let mut retries = 0;

        while self.schedule.allows(retries, started.elapsed()) {
            let delay = self.schedule.delay_for(retries);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            retries += 1;

            debug!(
                attempt = retries,
                max_retries = self.schedule.max_retries,
                error = %error,
                "Retrying failed handler invocation"
            );

            match work().await {
                Ok(value) => {
                    info!(attempt = retries, "Handler recovered under supervision");
                    return Ok(value);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => last_error = Some(e),
            }
        }

        if retries > 0 {
            warn!(
                retries,
                error = %error,
                "Supervisor exhausted retries"
            );
        }

        if let Some(fallback) = &self.fallback {
            fallback(FailureReport {
                error: error.to_string(),
                last_error: last_error.map(|e| e.to_string()),
                retries,
            })
            .await;
        }

        Err(error)
    }
}
