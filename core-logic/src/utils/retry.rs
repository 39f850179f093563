use crate::config::RetrySettings;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Classification of a single attempt.
#[derive(Debug)]
pub enum Attempt<T> {
    Success(T),
    /// Try again after the configured delay.
    Retryable(anyhow::Error),
    /// Stop immediately; further attempts cannot succeed.
    Fatal(anyhow::Error),
}

#[derive(Debug, Error)]
pub enum RetryError {
    #[error("cancelled")]
    Cancelled,

    #[error("deadline of {}s exceeded", .0.as_secs())]
    DeadlineExceeded(Duration),

    #[error("failed after {attempts} attempts: {last_error:#}")]
    Exhausted {
        attempts: u32,
        last_error: anyhow::Error,
    },

    #[error("{0:#}")]
    Fatal(anyhow::Error),
}

impl RetryError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    /// Overall budget for one `run` call, attempts and delays included.
    pub deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(3),
            deadline: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            ..Default::default()
        }
    }

    /// One attempt, no delay.
    pub fn single() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(s: RetrySettings) -> Self {
        Self::new(s.max_attempts, Duration::from_secs(s.delay_secs))
            .with_deadline(Duration::from_secs(s.deadline_secs))
    }
}

/// Roughly 30 years, the same horizon tokio treats as "never".
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline_from_now(budget: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(budget).unwrap_or(now + FAR_FUTURE)
}

/// Bounded, fixed-delay retry/poll loop.
///
/// Every attempt and every delay races against the run-wide cancellation
/// token and the per-call deadline, so a shutdown request stops in-flight
/// retries without waiting for them to exhaust.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy, cancel: CancellationToken) -> Self {
        Self { policy, cancel }
    }

    /// Runs `operation` until it succeeds, fails fatally, or attempts run out.
    ///
    /// `operation` receives the 1-based attempt number. `label` prefixes
    /// every log line emitted for this call.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, RetryError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Attempt<T>>,
    {
        let max = self.policy.max_attempts.max(1);
        let deadline = deadline_from_now(self.policy.deadline);
        let mut last_error = None;

        for attempt in 1..=max {
            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(RetryError::Cancelled),
                _ = sleep_until(deadline) => {
                    return Err(RetryError::DeadlineExceeded(self.policy.deadline))
                }
                outcome = operation(attempt) => outcome,
            };

            match outcome {
                Attempt::Success(value) => {
                    if attempt > 1 {
                        debug!("{} | succeeded on attempt {}/{}", label, attempt, max);
                    }
                    return Ok(value);
                }
                Attempt::Fatal(e) => {
                    warn!("{} | Attempt: [{}/{}] | {:#}", label, attempt, max, e);
                    return Err(RetryError::Fatal(e));
                }
                Attempt::Retryable(e) => {
                    warn!("{} | Attempt: [{}/{}] | {:#}", label, attempt, max, e);
                    last_error = Some(e);
                }
            }

            if attempt < max {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return Err(RetryError::Cancelled),
                    _ = sleep_until(deadline) => {
                        return Err(RetryError::DeadlineExceeded(self.policy.deadline))
                    }
                    _ = sleep(self.policy.delay) => {}
                }
            }
        }

        Err(RetryError::Exhausted {
            attempts: max,
            last_error: last_error.unwrap_or_else(|| anyhow::anyhow!("no attempt was made")),
        })
    }
}
