//! A failed scenario halts the run: later scenarios are never submitted.

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use orderprobe_cli::{RunVerdict, ScenarioOutcome, ScenarioRunner};
use orderprobe_core::types::OrderStatus;
use orderprobe_store::{Observation, StatusObserver};

use crate::helpers::fakes::{Behaviour, FakeInventory, FakeOrderService, FakeOrderStore};
use crate::helpers::fixtures;

#[tokio::test(start_paused = true)]
async fn test_rejected_submission_skips_remaining_scenarios() {
    // Given: The first order is rejected by the service
    let store = FakeOrderStore::new();
    let service = FakeOrderService::new(&store)
        .on("rejected", Behaviour::Reject(503))
        .converging("never", OrderStatus::Completed);
    let submitted = service.submitted.clone();
    let runner = ScenarioRunner::new(
        service,
        StatusObserver::new(store.clone()),
        FakeInventory::stocking(&[Uuid::from_u128(1)]),
        fixtures::settings(),
    );
    let scenarios = vec![
        fixtures::scenario("first", "rejected", OrderStatus::Completed, 1),
        fixtures::scenario("second", "never", OrderStatus::Completed, 1),
    ];

    // When
    let report = runner.run(&scenarios, &CancellationToken::new()).await;

    // Then: Only the first scenario was submitted, the second skipped
    assert_eq!(
        report.verdict,
        RunVerdict::ScenarioFailed {
            scenario: "first".to_owned()
        }
    );
    match &report.outcomes[0].outcome {
        ScenarioOutcome::SubmissionFailed { reason } => {
            assert!(reason.contains("503"), "reason: {reason}");
        }
        other => panic!("expected SubmissionFailed, got {other:?}"),
    }
    assert_eq!(report.outcomes[1].outcome, ScenarioOutcome::Skipped);
    assert_eq!(*submitted.lock().unwrap(), vec!["rejected".to_owned()]);
    assert_eq!(store.total_reads(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_wrong_terminal_status_halts_run() {
    // Given: An order expected to complete ends up Failed
    let store = FakeOrderStore::new();
    let service = FakeOrderService::new(&store)
        .converging("unlucky", OrderStatus::Failed)
        .converging("next", OrderStatus::Completed);
    let submitted = service.submitted.clone();
    let inventory = FakeInventory::stocking(&[Uuid::from_u128(1)]);
    let runner = ScenarioRunner::new(
        service,
        StatusObserver::new(store.clone()),
        inventory,
        fixtures::settings(),
    );
    let scenarios = vec![
        fixtures::scenario("expects completion", "unlucky", OrderStatus::Completed, 1),
        fixtures::scenario("next", "next", OrderStatus::Completed, 1),
    ];

    // When
    let report = runner.run(&scenarios, &CancellationToken::new()).await;

    // Then: The whole budget is spent, last seen Failed
    match &report.outcomes[0].outcome {
        ScenarioOutcome::ObservationFailed {
            order_id,
            expected,
            observation,
        } => {
            assert_eq!(order_id.as_str(), "ord-1");
            assert_eq!(*expected, OrderStatus::Completed);
            assert_eq!(
                *observation,
                Observation::Exhausted {
                    attempts: 5,
                    last_seen: Some(OrderStatus::Failed),
                    last_error: None,
                }
            );
        }
        other => panic!("expected ObservationFailed, got {other:?}"),
    }
    assert_eq!(report.outcomes[1].outcome, ScenarioOutcome::Skipped);
    assert_eq!(submitted.lock().unwrap().len(), 1);
    assert!(!report.is_success());
}

#[tokio::test(start_paused = true)]
async fn test_store_errors_count_as_misses() {
    // Given: Connectivity passes but every status query fails
    let store = FakeOrderStore::failing_reads();
    let service = FakeOrderService::new(&store).converging("alice", OrderStatus::Completed);
    let runner = ScenarioRunner::new(
        service,
        StatusObserver::new(store.clone()),
        FakeInventory::stocking(&[]),
        fixtures::settings(),
    );
    let scenarios = vec![fixtures::scenario("alice", "alice", OrderStatus::Completed, 1)];

    // When
    let report = runner.run(&scenarios, &CancellationToken::new()).await;

    // Then: All five attempts are spent and the last error is kept
    assert_eq!(store.total_reads(), 5);
    match &report.outcomes[0].outcome {
        ScenarioOutcome::ObservationFailed { observation, .. } => match observation {
            Observation::Exhausted {
                attempts,
                last_seen,
                last_error,
            } => {
                assert_eq!(*attempts, 5);
                assert!(last_seen.is_none());
                let err = last_error.as_deref().unwrap_or_default();
                assert!(err.contains("ord-1"), "last error: {err}");
            }
            other => panic!("expected Exhausted, got {other:?}"),
        },
        other => panic!("expected ObservationFailed, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_unknown_customer_fails_at_submission() {
    // Given: The service has no behaviour for this customer
    let store = FakeOrderStore::new();
    let runner = ScenarioRunner::new(
        FakeOrderService::new(&store),
        StatusObserver::new(store.clone()),
        FakeInventory::stocking(&[]),
        fixtures::settings(),
    );
    let scenarios = vec![fixtures::scenario("unknown", "nobody", OrderStatus::Completed, 1)];

    // When
    let report = runner.run(&scenarios, &CancellationToken::new()).await;

    // Then: Transport failure surfaces as a submission failure
    match &report.outcomes[0].outcome {
        ScenarioOutcome::SubmissionFailed { reason } => {
            assert!(reason.contains("nobody"), "reason: {reason}");
        }
        other => panic!("expected SubmissionFailed, got {other:?}"),
    }
    assert_eq!(store.total_reads(), 0);
}
