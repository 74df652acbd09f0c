//! `orderprobe run` command handler

use std::io::Write;
use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::info;

use orderprobe_core::config::ProbeConfig;
use orderprobe_services::{InventoryReconciler, ReconcileOutcome, SubmissionClient};
use orderprobe_store::{PgStatusSource, StatusObserver};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};
use crate::runner::{RunReport, RunSettings, RunVerdict, ScenarioOutcome, ScenarioRunner};

/// Runner wired to the live services.
pub type LiveRunner =
    ScenarioRunner<SubmissionClient, StatusObserver<PgStatusSource>, InventoryReconciler>;

/// Execute the `run` command.
///
/// Returns `CliError::RunFailed` when the verdict is anything but `Passed`,
/// after the report has been rendered.
pub async fn execute(
    args: RunArgs,
    config_path: Option<&Path>,
    writer: &OutputWriter,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let mut config = ProbeConfig::resolve(config_path).await?;
    args.apply(&mut config);
    config.validate()?;

    let runner = build_runner(&config)?;
    let scenarios = config.effective_scenarios();
    info!(
        order_service = %config.order_service.url,
        inventory_service = %config.inventory_service.url,
        store = %config.store.target(),
        "configuration loaded"
    );

    let report = runner.run(&scenarios, cancel).await;
    writer.render(&report)?;

    match report.verdict {
        RunVerdict::Passed => Ok(()),
        verdict => Err(CliError::RunFailed(verdict.to_string())),
    }
}

/// Construct the production runner from a validated configuration.
pub fn build_runner(config: &ProbeConfig) -> Result<LiveRunner, CliError> {
    let orders = SubmissionClient::new(&config.order_service)
        .map_err(|e| CliError::Command(e.to_string()))?;
    let inventory = InventoryReconciler::new(&config.inventory_service)
        .map_err(|e| CliError::Command(e.to_string()))?;
    let probe = StatusObserver::new(PgStatusSource::new(&config.store));

    Ok(ScenarioRunner::new(
        orders,
        probe,
        inventory,
        RunSettings::from_config(config),
    ))
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        for report in &self.outcomes {
            let (label, detail) = describe(&report.outcome);
            writeln!(
                w,
                "[{label:<7}] {} (expected {})",
                report.scenario, report.expected
            )?;
            if let Some(detail) = detail {
                writeln!(w, "          {detail}")?;
            }
        }

        writeln!(w)?;
        writeln!(
            w,
            "{}/{} scenario(s) passed: {}",
            self.passed_count(),
            self.outcomes.len(),
            self.verdict
        )?;
        Ok(())
    }
}

fn describe(outcome: &ScenarioOutcome) -> (&'static str, Option<String>) {
    match outcome {
        ScenarioOutcome::Passed {
            order_id,
            attempts,
            reconciliation,
        } => {
            let inventory = match &reconciliation.outcome {
                ReconcileOutcome::Verified => "inventory verified".to_owned(),
                other => format!("inventory {other} (warning)"),
            };
            (
                "PASS",
                Some(format!(
                    "order {order_id} after {attempts} attempt(s), {inventory}"
                )),
            )
        }
        ScenarioOutcome::SubmissionFailed { reason } => {
            ("FAIL", Some(format!("submission failed: {reason}")))
        }
        ScenarioOutcome::ObservationFailed {
            order_id,
            expected,
            observation,
        } => (
            "FAIL",
            Some(format!(
                "order {order_id} never reached {expected}: {observation}"
            )),
        ),
        ScenarioOutcome::ReconciliationFailed {
            order_id,
            reconciliation,
        } => (
            "FAIL",
            Some(format!(
                "order {order_id} converged but inventory is {}",
                reconciliation.outcome
            )),
        ),
        ScenarioOutcome::Skipped => ("SKIP", None),
    }
}
