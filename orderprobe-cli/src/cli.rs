//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use orderprobe_core::config::ProbeConfig;

/// orderprobe -- end-to-end convergence checker for order processing.
///
/// Use `orderprobe <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "orderprobe", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file (default: ./orderprobe.toml if present).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level.
    #[arg(long, global = true, value_parser = ["trace", "debug", "info", "warn", "error"])]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit every scenario and verify it converges.
    Run(RunArgs),

    /// List the scenarios a run would execute.
    Scenarios,

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- run ----

/// Overrides applied on top of file and environment configuration.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Maximum status reads per scenario.
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Base wait between status reads, in milliseconds.
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Wall-clock bound per observation, in seconds (0 disables).
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    /// Fail a scenario whose inventory check is not verified.
    #[arg(long)]
    pub strict_inventory: bool,
}

impl RunArgs {
    /// Apply the given overrides to `config`. Callers re-validate afterwards.
    pub fn apply(&self, config: &mut ProbeConfig) {
        if let Some(max_attempts) = self.max_attempts {
            config.observer.max_attempts = max_attempts;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.observer.interval_ms = interval_ms;
        }
        if let Some(deadline_secs) = self.deadline_secs {
            config.observer.deadline_secs = deadline_secs;
        }
        if self.strict_inventory {
            config.inventory_service.require_verified = true;
        }
    }
}

// ---- config ----

/// Manage orderprobe configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only one section (general, order_service, inventory_service, store, observer, scenarios).
        #[arg(long)]
        section: Option<String>,
    },
}
