//! Happy path: every scenario converges and is reconciled.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use orderprobe_cli::{RunVerdict, ScenarioOutcome, ScenarioRunner};
use orderprobe_core::types::{OrderStatus, builtin_scenarios};
use orderprobe_services::ReconcileOutcome;
use orderprobe_store::{Observation, StatusObserver};

use crate::helpers::fakes::{Behaviour, FakeInventory, FakeOrderService, FakeOrderStore};
use crate::helpers::fixtures;

#[tokio::test(start_paused = true)]
async fn test_builtin_scenarios_pass_against_converging_services() {
    // Given: A service that completes the success order and fails the other
    let store = FakeOrderStore::new();
    let service = FakeOrderService::new(&store)
        .converging("Test User Success", OrderStatus::Completed)
        .converging("Test User Fail", OrderStatus::Failed);
    let submitted = service.submitted.clone();
    let inventory = FakeInventory::stocking(&[
        Uuid::from_u128(0x11111111_1111_1111_1111_111111111111),
        Uuid::from_u128(0x22222222_2222_2222_2222_222222222222),
    ]);
    let runner = ScenarioRunner::new(
        service,
        StatusObserver::new(store.clone()),
        inventory,
        fixtures::settings(),
    );

    // When: Running the builtin scenarios
    let report = runner
        .run(&builtin_scenarios(), &CancellationToken::new())
        .await;

    // Then: Both pass, in declared order
    assert_eq!(report.verdict, RunVerdict::Passed);
    assert!(report.is_success());
    assert_eq!(report.passed_count(), 2);
    assert_eq!(report.outcomes[0].scenario, "Successful Order");
    assert_eq!(report.outcomes[1].scenario, "Failed Order");
    assert_eq!(
        *submitted.lock().unwrap(),
        vec!["Test User Success".to_owned(), "Test User Fail".to_owned()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_attempts_count_reads_until_expected_status() {
    // Given: Pending, Processing, Completed
    let store = FakeOrderStore::new();
    let service = FakeOrderService::new(&store).converging("alice", OrderStatus::Completed);
    let runner = ScenarioRunner::new(
        service,
        StatusObserver::new(store.clone()),
        FakeInventory::stocking(&[Uuid::from_u128(1)]),
        fixtures::settings(),
    );
    let scenarios = vec![fixtures::scenario("alice", "alice", OrderStatus::Completed, 1)];

    // When
    let start = tokio::time::Instant::now();
    let report = runner.run(&scenarios, &CancellationToken::new()).await;

    // Then: Reached on the third read after two one-second waits
    match &report.outcomes[0].outcome {
        ScenarioOutcome::Passed {
            order_id,
            attempts,
            reconciliation,
        } => {
            assert_eq!(order_id.as_str(), "ord-1");
            assert_eq!(*attempts, 3);
            assert_eq!(reconciliation.outcome, ReconcileOutcome::Verified);
        }
        other => panic!("expected Passed, got {other:?}"),
    }
    assert_eq!(store.reads_for("ord-1"), 3);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_inventory_checked_once_per_passing_scenario() {
    // Given: Three accepted orders
    let store = FakeOrderStore::new();
    let service = FakeOrderService::new(&store)
        .converging("a", OrderStatus::Completed)
        .converging("b", OrderStatus::Failed)
        .converging("c", OrderStatus::Completed);
    let inventory = FakeInventory::stocking(&[Uuid::from_u128(1)]);
    let runner = ScenarioRunner::new(
        service,
        StatusObserver::new(store.clone()),
        inventory,
        fixtures::settings(),
    );
    let scenarios = vec![
        fixtures::scenario("first", "a", OrderStatus::Completed, 1),
        fixtures::scenario("second", "b", OrderStatus::Failed, 1),
        fixtures::scenario("third", "c", OrderStatus::Completed, 1),
    ];

    // When
    let report = runner.run(&scenarios, &CancellationToken::new()).await;

    // Then
    assert!(report.is_success());
    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(store.total_reads(), 9);
}

#[tokio::test(start_paused = true)]
async fn test_order_never_visible_exhausts_attempts() {
    // Given: An accepted order whose row never reaches the store
    let store = FakeOrderStore::new();
    let service = FakeOrderService::new(&store).on("late", Behaviour::Accept(Vec::new()));
    let runner = ScenarioRunner::new(
        service,
        StatusObserver::new(store.clone()),
        FakeInventory::stocking(&[Uuid::from_u128(7)]),
        fixtures::settings(),
    );
    let scenarios = vec![fixtures::scenario("late", "late", OrderStatus::Completed, 7)];

    // When
    let report = runner.run(&scenarios, &CancellationToken::new()).await;

    // Then: Every read is a miss and the scenario fails
    match &report.outcomes[0].outcome {
        ScenarioOutcome::ObservationFailed { observation, .. } => {
            assert_eq!(
                *observation,
                Observation::Exhausted {
                    attempts: 5,
                    last_seen: None,
                    last_error: None,
                }
            );
        }
        other => panic!("expected ObservationFailed, got {other:?}"),
    }
    assert_eq!(
        report.verdict,
        RunVerdict::ScenarioFailed {
            scenario: "late".to_owned()
        }
    );
    assert_eq!(store.reads_for("ord-1"), 5);
}
