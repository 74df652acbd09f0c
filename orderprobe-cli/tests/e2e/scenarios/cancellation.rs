//! Cancellation stops the run at the next await point.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use orderprobe_cli::{RunVerdict, ScenarioOutcome, ScenarioRunner};
use orderprobe_core::types::OrderStatus;
use orderprobe_store::{Observation, StatusObserver};

use crate::helpers::fakes::{Behaviour, FakeInventory, FakeOrderService, FakeOrderStore};
use crate::helpers::fixtures;

#[tokio::test(start_paused = true)]
async fn test_cancel_during_observation_skips_remaining_scenarios() {
    // Given: An order stuck in Pending and a second scenario queued behind it
    let store = FakeOrderStore::new();
    let service = FakeOrderService::new(&store)
        .on("stuck", Behaviour::Accept(vec![OrderStatus::Pending]))
        .converging("next", OrderStatus::Completed);
    let submitted = service.submitted.clone();
    let runner = ScenarioRunner::new(
        service,
        StatusObserver::new(store.clone()),
        FakeInventory::stocking(&[]),
        fixtures::settings(),
    );
    let scenarios = vec![
        fixtures::scenario("stuck", "stuck", OrderStatus::Completed, 1),
        fixtures::scenario("next", "next", OrderStatus::Completed, 1),
    ];
    let cancel = CancellationToken::new();

    // When: Cancelling 1.5s in, during the second wait
    let (report, ()) = tokio::join!(runner.run(&scenarios, &cancel), async {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        cancel.cancel();
    });

    // Then
    assert_eq!(report.verdict, RunVerdict::Cancelled);
    match &report.outcomes[0].outcome {
        ScenarioOutcome::ObservationFailed { observation, .. } => {
            assert_eq!(*observation, Observation::Cancelled { attempts: 2 });
        }
        other => panic!("expected ObservationFailed, got {other:?}"),
    }
    assert_eq!(report.outcomes[1].outcome, ScenarioOutcome::Skipped);
    assert_eq!(*submitted.lock().unwrap(), vec!["stuck".to_owned()]);
}

#[tokio::test(start_paused = true)]
async fn test_pre_cancelled_run_submits_nothing() {
    // Given: A token cancelled before the run starts
    let store = FakeOrderStore::new();
    let service = FakeOrderService::new(&store).converging("alice", OrderStatus::Completed);
    let submitted = service.submitted.clone();
    let runner = ScenarioRunner::new(
        service,
        StatusObserver::new(store.clone()),
        FakeInventory::stocking(&[]),
        fixtures::settings(),
    );
    let scenarios = vec![fixtures::scenario("alice", "alice", OrderStatus::Completed, 1)];
    let cancel = CancellationToken::new();
    cancel.cancel();

    // When
    let report = runner.run(&scenarios, &cancel).await;

    // Then
    assert_eq!(report.verdict, RunVerdict::Cancelled);
    assert_eq!(report.outcomes[0].outcome, ScenarioOutcome::Skipped);
    assert!(submitted.lock().unwrap().is_empty());
}
