//! Bounded, cancellable polling for remote state transitions
//!
//! The control plane has no push channel, so both the database availability check
//! and the deploy outcome check are driven by [`poll_until`]: wait, check, repeat
//! until the check reports [`PollStep::Ready`], the attempt ceiling is reached, or
//! the cancellation token fires.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

/// Delay between polls
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Same delay before every poll
    Fixed(Duration),
    /// `base * multiplier^(attempt - 1)`, capped at `max`
    Exponential {
        base: Duration,
        multiplier: f64,
        max: Duration,
    },
}

/// How often and how long to poll
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// `None` polls until a terminal state or cancellation
    pub max_attempts: Option<u32>,
    pub backoff: BackoffStrategy,
    /// Fraction of each delay added or removed at random, in `0.0..=1.0`
    pub jitter: f64,
}

impl PollPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            backoff: BackoffStrategy::Fixed(Self::DEFAULT_INTERVAL),
            jitter: 0.0,
        }
    }

    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            ..Self::new(0)
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Delay before the given 1-based attempt, without jitter
    pub fn base_delay(&self, attempt: u32) -> Duration {
        match &self.backoff {
            BackoffStrategy::Fixed(delay) => *delay,
            BackoffStrategy::Exponential {
                base,
                multiplier,
                max,
            } => {
                let exponent = attempt.saturating_sub(1).min(64) as i32;
                let secs = base.as_secs_f64() * multiplier.max(1.0).powi(exponent);
                if !secs.is_finite() || secs >= max.as_secs_f64() {
                    *max
                } else {
                    Duration::from_secs_f64(secs)
                }
            }
        }
    }

    /// Delay before the given 1-based attempt, with jitter applied
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if self.jitter <= 0.0 || base.is_zero() {
            return base;
        }
        let factor = 1.0 + rand::thread_rng().gen_range(-self.jitter..=self.jitter);
        Duration::try_from_secs_f64(base.as_secs_f64() * factor.max(0.0)).unwrap_or(base)
    }

    fn exhausted(&self, attempt: u32) -> bool {
        matches!(self.max_attempts, Some(max) if attempt >= max)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(180).with_jitter(0.1)
    }
}

/// Result of one check
#[derive(Debug, Clone, PartialEq)]
pub enum PollStep<T> {
    Pending,
    Ready(T),
}

/// Why polling stopped without a terminal value
#[derive(Debug, Clone, PartialEq)]
pub enum PollFailure<E> {
    /// The check itself failed; polling stops immediately
    Check(E),
    TimedOut { attempts: u32 },
    Cancelled,
}

/// Wait, check, repeat
///
/// Every check is preceded by a delay from `policy`. The check receives the
/// 1-based attempt number.
pub async fn poll_until<T, E, F, Fut>(
    policy: &PollPolicy,
    cancel: &CancellationToken,
    mut check: F,
) -> Result<T, PollFailure<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<PollStep<T>, E>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let delay = policy.delay(attempt);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PollFailure::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }

        match check(attempt).await {
            Ok(PollStep::Ready(value)) => return Ok(value),
            Ok(PollStep::Pending) => {
                if policy.exhausted(attempt) {
                    return Err(PollFailure::TimedOut { attempts: attempt });
                }
            }
            Err(err) => return Err(PollFailure::Check(err)),
        }
    }
}
