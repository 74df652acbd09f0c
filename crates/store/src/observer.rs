//! Bounded observation of an order's status.
//!
//! The order service updates the store asynchronously after accepting an
//! order. [`StatusObserver`] polls a [`StatusSource`] until the order reaches
//! the expected status, the attempt budget runs out, the deadline passes, or
//! the run is cancelled.
//!
//! # Poll loop
//!
//! ```text
//! attempt 1..=max_attempts:
//!     fetch status ──► matches expected? ──yes──► Reached
//!          │                  │no
//!          │ error            ▼
//!          └──────────► wait delay_after(attempt)   (cancellable, deadline-bound)
//! ──► Exhausted
//! ```
//!
//! A missing row, a non-matching status and a failed query are all misses.
//! Every miss is followed by a wait, including the last one, so a fixed
//! schedule spends exactly `max_attempts * interval` before giving up.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use orderprobe_core::config::StoreConfig;
use orderprobe_core::types::{OrderId, OrderStatus};
use orderprobe_core::wait::{PollPolicy, WaitOutcome, Waiter};

use crate::error::StoreError;
use crate::handle::{StoreHandle, with_store};

/// Read access to an order's current status.
///
/// # Implementations
///
/// - [`PgStatusSource`]: opens a fresh [`StoreHandle`] per call
/// - test sources with scripted answers
pub trait StatusSource: Send + Sync {
    /// Current status of `order_id`, or `None` when the order is not visible yet.
    fn fetch_status(
        &self,
        order_id: &OrderId,
    ) -> impl Future<Output = Result<Option<OrderStatus>, StoreError>> + Send;

    /// Verify the source is reachable before any observation starts.
    fn check_connectivity(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// [`StatusSource`] backed by the PostgreSQL order store.
#[derive(Debug, Clone)]
pub struct PgStatusSource {
    config: StoreConfig,
}

impl PgStatusSource {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl StatusSource for PgStatusSource {
    async fn fetch_status(&self, order_id: &OrderId) -> Result<Option<OrderStatus>, StoreError> {
        let id = order_id.clone();
        let code = with_store(&self.config, move |handle| {
            Box::pin(async move { handle.fetch_status(&id).await })
        })
        .await?;
        Ok(code.map(OrderStatus::from_code))
    }

    /// Acquire, `SELECT 1`, release.
    async fn check_connectivity(&self) -> Result<(), StoreError> {
        StoreHandle::ping(&self.config).await
    }
}

/// How a status observation ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    /// The expected status was read on attempt `attempts`.
    Reached { attempts: u32 },
    /// Every attempt missed.
    Exhausted {
        attempts: u32,
        /// Last status actually read, if any row was ever found.
        last_seen: Option<OrderStatus>,
        /// Last store error, if any attempt failed.
        last_error: Option<String>,
    },
    /// The wall-clock deadline passed before the expected status was read.
    DeadlineElapsed {
        attempts: u32,
        last_seen: Option<OrderStatus>,
    },
    /// The run was cancelled mid-observation.
    Cancelled { attempts: u32 },
}

impl Observation {
    pub fn is_reached(&self) -> bool {
        matches!(self, Self::Reached { .. })
    }

    /// Number of status reads performed.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Reached { attempts }
            | Self::Exhausted { attempts, .. }
            | Self::DeadlineElapsed { attempts, .. }
            | Self::Cancelled { attempts } => *attempts,
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seen = |s: &Option<OrderStatus>| match s {
            Some(status) => status.to_string(),
            None => "no row".to_owned(),
        };
        match self {
            Self::Reached { attempts } => write!(f, "reached after {attempts} attempt(s)"),
            Self::Exhausted {
                attempts,
                last_seen,
                last_error,
            } => {
                write!(
                    f,
                    "not reached after {attempts} attempt(s), last seen: {}",
                    seen(last_seen)
                )?;
                if let Some(err) = last_error {
                    write!(f, ", last error: {err}")?;
                }
                Ok(())
            }
            Self::DeadlineElapsed {
                attempts,
                last_seen,
            } => write!(
                f,
                "deadline elapsed after {attempts} attempt(s), last seen: {}",
                seen(last_seen)
            ),
            Self::Cancelled { attempts } => write!(f, "cancelled after {attempts} attempt(s)"),
        }
    }
}

/// Polls a [`StatusSource`] under a [`PollPolicy`].
pub struct StatusObserver<S> {
    source: S,
}

impl<S: StatusSource> StatusObserver<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Delegates to the source's connectivity check.
    pub async fn check_connectivity(&self) -> Result<(), StoreError> {
        self.source.check_connectivity().await
    }

    /// Poll until `order_id` reaches `expected` or the policy gives up.
    ///
    /// Only an exact match counts: reaching the other terminal status is a
    /// miss like any other.
    pub async fn await_status(
        &self,
        order_id: &OrderId,
        expected: OrderStatus,
        policy: &PollPolicy,
        cancel: &CancellationToken,
    ) -> Observation {
        let waiter = Waiter::new(cancel.clone(), policy.deadline);
        let mut last_seen = None;
        let mut last_error = None;

        for attempt in 1..=policy.max_attempts {
            let done = attempt - 1;
            if waiter.is_cancelled() {
                return Observation::Cancelled { attempts: done };
            }
            if waiter.deadline_passed() {
                return Observation::DeadlineElapsed {
                    attempts: done,
                    last_seen,
                };
            }

            let fetched = tokio::select! {
                result = self.source.fetch_status(order_id) => result,
                _ = cancel.cancelled() => return Observation::Cancelled { attempts: done },
            };

            match fetched {
                Ok(Some(status)) if status.matches(expected) => {
                    info!(
                        order_id = %order_id,
                        status = %status,
                        attempt,
                        "order reached expected status"
                    );
                    return Observation::Reached { attempts: attempt };
                }
                Ok(Some(status)) => {
                    debug!(
                        order_id = %order_id,
                        expected = %expected,
                        observed = %status,
                        attempt,
                        "status not reached yet"
                    );
                    last_seen = Some(status);
                }
                Ok(None) => {
                    debug!(order_id = %order_id, attempt, "order not visible yet");
                }
                Err(e) => {
                    warn!(
                        order_id = %order_id,
                        attempt,
                        error = %e,
                        "status query failed, counting as a miss"
                    );
                    last_error = Some(e.to_string());
                }
            }

            match waiter.sleep(policy.delay_after(attempt)).await {
                WaitOutcome::Elapsed => {}
                WaitOutcome::Cancelled => return Observation::Cancelled { attempts: attempt },
                WaitOutcome::DeadlineReached => {
                    return Observation::DeadlineElapsed {
                        attempts: attempt,
                        last_seen,
                    };
                }
            }
        }

        Observation::Exhausted {
            attempts: policy.max_attempts,
            last_seen,
            last_error,
        }
    }

    /// Fixed-interval poll without deadline or cancellation.
    pub async fn await_status_simple(
        &self,
        order_id: &OrderId,
        expected: OrderStatus,
        max_attempts: u32,
        interval: Duration,
    ) -> bool {
        let policy = PollPolicy::fixed(max_attempts, interval);
        self.await_status(order_id, expected, &policy, &CancellationToken::new())
            .await
            .is_reached()
    }
}
