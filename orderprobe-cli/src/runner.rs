//! Sequential, fail-fast scenario execution.
//!
//! [`ScenarioRunner`] drives each scenario through submit -> observe ->
//! reconcile, strictly one after another. The three collaborators sit behind
//! traits so the runner can be exercised without live services:
//!
//! ```text
//!                  ┌────────────────┐
//!                  │ ScenarioRunner │
//!                  └───────┬────────┘
//!        ┌─────────────────┼──────────────────┐
//!        ▼                 ▼                  ▼
//!  OrderGateway       StatusProbe      InventoryGateway
//!  (SubmissionClient) (StatusObserver) (InventoryReconciler)
//! ```
//!
//! The runner never exits the process. It returns a [`RunReport`]; the binary
//! maps the verdict to an exit code.

use std::fmt;
use std::future::Future;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};

use orderprobe_core::config::ProbeConfig;
use orderprobe_core::types::{LineItem, OrderId, OrderRequest, OrderStatus, Scenario};
use orderprobe_core::wait::PollPolicy;
use orderprobe_services::{InventoryReconciler, Reconciliation, SubmissionClient, SubmissionError};
use orderprobe_store::{Observation, StatusObserver, StatusSource, StoreError};

/// Submits orders.
pub trait OrderGateway: Send + Sync {
    fn submit(
        &self,
        request: &OrderRequest,
    ) -> impl Future<Output = Result<OrderId, SubmissionError>> + Send;
}

/// Observes order status in the store.
pub trait StatusProbe: Send + Sync {
    /// Run once before any scenario; failure aborts the run.
    fn check_connectivity(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn await_status(
        &self,
        order_id: &OrderId,
        expected: OrderStatus,
        policy: &PollPolicy,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Observation> + Send;
}

/// Cross-checks requested items against the inventory service.
pub trait InventoryGateway: Send + Sync {
    fn reconcile(&self, items: &[LineItem]) -> impl Future<Output = Reconciliation> + Send;
}

impl OrderGateway for SubmissionClient {
    async fn submit(&self, request: &OrderRequest) -> Result<OrderId, SubmissionError> {
        SubmissionClient::submit(self, request).await
    }
}

impl<S: StatusSource> StatusProbe for StatusObserver<S> {
    async fn check_connectivity(&self) -> Result<(), StoreError> {
        StatusObserver::check_connectivity(self).await
    }

    async fn await_status(
        &self,
        order_id: &OrderId,
        expected: OrderStatus,
        policy: &PollPolicy,
        cancel: &CancellationToken,
    ) -> Observation {
        StatusObserver::await_status(self, order_id, expected, policy, cancel).await
    }
}

impl InventoryGateway for InventoryReconciler {
    async fn reconcile(&self, items: &[LineItem]) -> Reconciliation {
        InventoryReconciler::reconcile(self, items).await
    }
}

/// Per-run knobs taken from [`ProbeConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub policy: PollPolicy,
    /// Fail a scenario whose reconciliation is not `Verified`.
    pub require_verified: bool,
}

impl RunSettings {
    pub fn from_config(config: &ProbeConfig) -> Self {
        Self {
            policy: config.poll_policy(),
            require_verified: config.inventory_service.require_verified,
        }
    }
}

/// What happened to one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ScenarioOutcome {
    Passed {
        order_id: OrderId,
        attempts: u32,
        reconciliation: Reconciliation,
    },
    SubmissionFailed {
        reason: String,
    },
    ObservationFailed {
        order_id: OrderId,
        expected: OrderStatus,
        observation: Observation,
    },
    /// Only produced when `require_verified` is set.
    ReconciliationFailed {
        order_id: OrderId,
        reconciliation: Reconciliation,
    },
    /// Not attempted: an earlier scenario failed, connectivity failed, or the
    /// run was cancelled.
    Skipped,
}

impl ScenarioOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }
}

/// A scenario's name and expectation next to its outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub expected: OrderStatus,
    pub outcome: ScenarioOutcome,
}

/// Overall result of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum RunVerdict {
    Passed,
    ScenarioFailed { scenario: String },
    ConnectivityFailed { reason: String },
    Cancelled,
}

impl fmt::Display for RunVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "all scenarios passed"),
            Self::ScenarioFailed { scenario } => write!(f, "scenario '{scenario}' failed"),
            Self::ConnectivityFailed { reason } => {
                write!(f, "order store connectivity check failed: {reason}")
            }
            Self::Cancelled => write!(f, "run cancelled"),
        }
    }
}

/// Verdict plus one report per scenario, in declared order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub verdict: RunVerdict,
    pub outcomes: Vec<ScenarioReport>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.verdict == RunVerdict::Passed
    }

    pub fn passed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|report| report.outcome.is_passed())
            .count()
    }
}

/// Runs scenarios one at a time, halting at the first failure.
pub struct ScenarioRunner<O, P, I> {
    orders: O,
    probe: P,
    inventory: I,
    settings: RunSettings,
}

impl<O, P, I> ScenarioRunner<O, P, I>
where
    O: OrderGateway,
    P: StatusProbe,
    I: InventoryGateway,
{
    pub fn new(orders: O, probe: P, inventory: I, settings: RunSettings) -> Self {
        Self {
            orders,
            probe,
            inventory,
            settings,
        }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Execute `scenarios` in order.
    ///
    /// Scenario N+1 is only submitted after scenario N passed.
    pub async fn run(&self, scenarios: &[Scenario], cancel: &CancellationToken) -> RunReport {
        info!(
            scenarios = scenarios.len(),
            max_attempts = self.settings.policy.max_attempts,
            require_verified = self.settings.require_verified,
            "starting run"
        );

        if let Err(e) = self.probe.check_connectivity().await {
            error!(error = %e, "order store unreachable, no scenario will run");
            return RunReport {
                verdict: RunVerdict::ConnectivityFailed {
                    reason: e.to_string(),
                },
                outcomes: skip_all(scenarios),
            };
        }

        let mut outcomes = Vec::with_capacity(scenarios.len());
        let mut verdict = RunVerdict::Passed;

        for scenario in scenarios {
            if verdict != RunVerdict::Passed {
                outcomes.push(report(scenario, ScenarioOutcome::Skipped));
                continue;
            }
            if cancel.is_cancelled() {
                warn!(scenario = %scenario.name, "run cancelled before scenario started");
                verdict = RunVerdict::Cancelled;
                outcomes.push(report(scenario, ScenarioOutcome::Skipped));
                continue;
            }

            let span = info_span!("scenario", name = %scenario.name);
            let outcome = self.run_one(scenario, cancel).instrument(span).await;

            if !outcome.is_passed() {
                verdict = if cancel.is_cancelled() {
                    RunVerdict::Cancelled
                } else {
                    RunVerdict::ScenarioFailed {
                        scenario: scenario.name.clone(),
                    }
                };
            }
            outcomes.push(report(scenario, outcome));
        }

        match &verdict {
            RunVerdict::Passed => info!(scenarios = outcomes.len(), "all scenarios passed"),
            other => error!(verdict = %other, "run halted"),
        }
        RunReport { verdict, outcomes }
    }

    async fn run_one(&self, scenario: &Scenario, cancel: &CancellationToken) -> ScenarioOutcome {
        let expected = scenario.expected_status;
        info!(expected = %expected, "submitting order");

        let order_id = match self.orders.submit(&scenario.payload).await {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "order submission failed");
                return ScenarioOutcome::SubmissionFailed {
                    reason: e.to_string(),
                };
            }
        };

        let observation = self
            .probe
            .await_status(&order_id, expected, &self.settings.policy, cancel)
            .await;
        let attempts = match observation {
            Observation::Reached { attempts } => attempts,
            observation => {
                error!(
                    order_id = %order_id,
                    expected = %expected,
                    observation = %observation,
                    "order did not reach expected status"
                );
                return ScenarioOutcome::ObservationFailed {
                    order_id,
                    expected,
                    observation,
                };
            }
        };

        let reconciliation = self.inventory.reconcile(&scenario.payload.items).await;
        if !reconciliation.is_verified() {
            warn!(
                order_id = %order_id,
                outcome = %reconciliation.outcome,
                "inventory reconciliation not verified"
            );
            if self.settings.require_verified {
                return ScenarioOutcome::ReconciliationFailed {
                    order_id,
                    reconciliation,
                };
            }
        }

        info!(order_id = %order_id, attempts, "scenario passed");
        ScenarioOutcome::Passed {
            order_id,
            attempts,
            reconciliation,
        }
    }
}

fn report(scenario: &Scenario, outcome: ScenarioOutcome) -> ScenarioReport {
    ScenarioReport {
        scenario: scenario.name.clone(),
        expected: scenario.expected_status,
        outcome,
    }
}

fn skip_all(scenarios: &[Scenario]) -> Vec<ScenarioReport> {
    scenarios
        .iter()
        .map(|scenario| report(scenario, ScenarioOutcome::Skipped))
        .collect()
}
