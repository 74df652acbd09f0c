//! Cancellable, deadline-bound waiting between poll attempts.
//!
//! [`PollPolicy`] describes how many attempts a poller makes and how long it
//! waits after each miss. [`Waiter`] performs those waits, returning early
//! when its [`CancellationToken`] fires or when the overall deadline is hit.
//!
//! # Schedules
//!
//! - [`Backoff::Fixed`]: every wait is `interval`. The worst-case observation
//!   window is exactly `max_attempts * interval`.
//! - [`Backoff::Exponential`]: the n-th wait is `interval * factor^(n-1)`,
//!   capped at `max_interval`.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Delay growth between consecutive attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    Fixed,
    Exponential { factor: f64, max_interval: Duration },
}

/// Retry budget for a bounded poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    /// Maximum number of observations.
    pub max_attempts: u32,
    /// Base wait after a miss.
    pub interval: Duration,
    pub backoff: Backoff,
    /// Optional wall-clock bound for the whole poll, measured from its start.
    pub deadline: Option<Duration>,
}

impl PollPolicy {
    /// Fixed-interval policy with no deadline.
    pub fn fixed(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            backoff: Backoff::Fixed,
            deadline: None,
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Wait that follows the `attempt`-th miss (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.interval,
            Backoff::Exponential {
                factor,
                max_interval,
            } => {
                let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
                let secs = self.interval.as_secs_f64() * factor.powi(exponent);
                Duration::try_from_secs_f64(secs)
                    .map(|d| d.min(max_interval))
                    .unwrap_or(max_interval)
            }
        }
    }

    /// Longest time a poll under this policy can spend waiting.
    pub fn worst_case_window(&self) -> Duration {
        let total = (1..=self.max_attempts)
            .map(|attempt| self.delay_after(attempt))
            .fold(Duration::ZERO, Duration::saturating_add);
        match self.deadline {
            Some(deadline) => total.min(deadline),
            None => total,
        }
    }
}

/// Why a [`Waiter::sleep`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full duration elapsed.
    Elapsed,
    /// The cancellation token fired first.
    Cancelled,
    /// The overall deadline was reached before the duration elapsed.
    DeadlineReached,
}

/// Sleeps that honour cancellation and an absolute deadline.
#[derive(Debug, Clone)]
pub struct Waiter {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Waiter {
    /// Create a waiter whose deadline (if any) starts counting now.
    ///
    /// A deadline too far out to be represented as an instant is treated as
    /// no deadline.
    pub fn new(cancel: CancellationToken, deadline: Option<Duration>) -> Self {
        Self {
            cancel,
            deadline: deadline.and_then(|d| Instant::now().checked_add(d)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Sleep for `duration`, returning early on cancellation or deadline.
    pub async fn sleep(&self, duration: Duration) -> WaitOutcome {
        if self.cancel.is_cancelled() {
            return WaitOutcome::Cancelled;
        }

        let wake_at = Instant::now().checked_add(duration);
        match (self.deadline, wake_at) {
            (Some(deadline), Some(wake_at)) if deadline <= wake_at => {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => WaitOutcome::DeadlineReached,
                    _ = self.cancel.cancelled() => WaitOutcome::Cancelled,
                }
            }
            (Some(deadline), None) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => WaitOutcome::DeadlineReached,
                    _ = self.cancel.cancelled() => WaitOutcome::Cancelled,
                }
            }
            (_, Some(wake_at)) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(wake_at) => WaitOutcome::Elapsed,
                    _ = self.cancel.cancelled() => WaitOutcome::Cancelled,
                }
            }
            // unrepresentable wake-up and no deadline: only cancellation ends it
            (None, None) => {
                self.cancel.cancelled().await;
                WaitOutcome::Cancelled
            }
        }
    }
}
