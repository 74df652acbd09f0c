//! `orderprobe scenarios` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use orderprobe_core::config::ProbeConfig;
use orderprobe_core::types::{OrderStatus, Scenario};

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `scenarios` command.
pub async fn execute(config_path: Option<&Path>, writer: &OutputWriter) -> Result<(), CliError> {
    let config = ProbeConfig::load_optional(config_path).await?;
    let list = ScenarioList::from_config(&config);
    writer.render(&list)?;
    Ok(())
}

/// Scenarios a run would execute, in order.
#[derive(Debug, Serialize)]
pub struct ScenarioList {
    /// `builtin` or `config`
    pub source: &'static str,
    pub scenarios: Vec<ScenarioSummary>,
}

/// One scenario with the card number masked.
#[derive(Debug, Serialize)]
pub struct ScenarioSummary {
    pub name: String,
    pub expected_status: OrderStatus,
    pub customer_name: String,
    pub total_amount: f64,
    pub card_number: String,
    pub items: usize,
}

impl ScenarioList {
    pub fn from_config(config: &ProbeConfig) -> Self {
        let source = if config.scenarios.is_empty() {
            "builtin"
        } else {
            "config"
        };
        Self {
            source,
            scenarios: config
                .effective_scenarios()
                .iter()
                .map(ScenarioSummary::from)
                .collect(),
        }
    }
}

impl From<&Scenario> for ScenarioSummary {
    fn from(scenario: &Scenario) -> Self {
        Self {
            name: scenario.name.clone(),
            expected_status: scenario.expected_status,
            customer_name: scenario.payload.customer_name.clone(),
            total_amount: scenario.payload.total_amount,
            card_number: scenario.payload.masked_card_number(),
            items: scenario.payload.items.len(),
        }
    }
}

impl Render for ScenarioList {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Scenarios ({}):", self.source)?;
        writeln!(
            w,
            "{:<4} {:<28} {:<10} {:>12} {:>6}",
            "#", "Name", "Expect", "Total", "Items"
        )?;
        writeln!(w, "{}", "-".repeat(64))?;
        for (index, scenario) in self.scenarios.iter().enumerate() {
            writeln!(
                w,
                "{:<4} {:<28} {:<10} {:>12.2} {:>6}",
                index + 1,
                scenario.name,
                scenario.expected_status.to_string(),
                scenario.total_amount,
                scenario.items
            )?;
        }
        Ok(())
    }
}
