//! `orderprobe config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use orderprobe_core::config::{DEFAULT_CONFIG_PATH, ProbeConfig};

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

const REDACTED: &str = "***REDACTED***";

const SECTIONS: [&str; 6] = [
    "general",
    "order_service",
    "inventory_service",
    "store",
    "observer",
    "scenarios",
];

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: Option<&Path>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
    }
}

/// Where the configuration came from, for display.
fn source_label(config_path: Option<&Path>) -> String {
    match config_path {
        Some(path) => path.display().to_string(),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => DEFAULT_CONFIG_PATH.to_owned(),
        None => "(defaults)".to_owned(),
    }
}

/// Load and validate the configuration, reporting any error.
///
/// # Errors
///
/// Returns `CliError::Config` when the configuration is invalid, after the
/// report has been rendered.
async fn execute_validate(
    config_path: Option<&Path>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let source = source_label(config_path);
    info!(source = %source, "validating configuration");

    let report = match ProbeConfig::load_optional(config_path).await {
        Ok(config) => ConfigValidationReport {
            source,
            valid: true,
            scenarios: config.effective_scenarios().len(),
            errors: Vec::new(),
        },
        Err(e) => ConfigValidationReport {
            source,
            valid: false,
            scenarios: 0,
            errors: vec![e.to_string()],
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }

    Ok(())
}

/// Show the effective configuration with credentials redacted.
async fn execute_show(
    config_path: Option<&Path>,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let source = source_label(config_path);
    info!(source = %source, "loading configuration");

    let mut config = ProbeConfig::load_optional(config_path).await?;
    redact_credentials(&mut config);

    let report = build_report(&config, source, section)?;
    writer.render(&report)?;
    Ok(())
}

fn build_report(
    config: &ProbeConfig,
    source: String,
    section: Option<String>,
) -> Result<ConfigReport, CliError> {
    let (config_toml, config_json) = match section.as_deref() {
        None => encode(config)?,
        Some("general") => encode(&config.general)?,
        Some("order_service") => encode(&config.order_service)?,
        Some("inventory_service") => encode(&config.inventory_service)?,
        Some("store") => encode(&config.store)?,
        Some("observer") => encode(&config.observer)?,
        Some("scenarios") => {
            #[derive(Serialize)]
            struct Scenarios<'a> {
                scenarios: &'a [orderprobe_core::types::Scenario],
            }
            encode(&Scenarios {
                scenarios: &config.scenarios,
            })?
        }
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section: {} (expected: {})",
                other,
                SECTIONS.join(", ")
            )));
        }
    };

    Ok(ConfigReport {
        source,
        section,
        config: config_json,
        config_toml,
    })
}

/// TOML text for the text renderer, JSON value for the JSON renderer.
fn encode<T: Serialize>(value: &T) -> Result<(String, serde_json::Value), CliError> {
    Ok((to_toml(value), serde_json::to_value(value)?))
}

fn to_toml<T: Serialize>(value: &T) -> String {
    toml::to_string_pretty(value).unwrap_or_else(|e| format!("(serialization error: {})", e))
}

/// Replace the store password and scenario card numbers.
fn redact_credentials(config: &mut ProbeConfig) {
    if !config.store.password.is_empty() {
        config.store.password = REDACTED.to_owned();
    }
    for scenario in &mut config.scenarios {
        scenario.payload.card_number = scenario.payload.masked_card_number();
    }
}

/// Configuration display report, credentials already redacted.
///
/// Text output prints `config_toml`; JSON output carries `config`.
#[derive(Serialize)]
pub struct ConfigReport {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub config: serde_json::Value,
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        match &self.section {
            Some(section) => writeln!(
                w,
                "Configuration [{}] (source: {})",
                section, self.source
            )?,
            None => writeln!(w, "Configuration (source: {})", self.source)?,
        }
        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;
        Ok(())
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    pub source: String,
    pub valid: bool,
    /// Number of scenarios a run would execute.
    pub scenarios: usize,
    /// Validation error messages (empty if valid).
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Config Validation: {}", self.source)?;
        if self.valid {
            writeln!(w, "  Result: VALID ({} scenario(s))", self.scenarios)?;
        } else {
            writeln!(w, "  Result: INVALID")?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err)?;
            }
        }
        Ok(())
    }
}
