//! orderprobe-cli: command-line front end and scenario runner.
//!
//! # Module Structure
//!
//! - [`cli`]: clap argument definitions
//! - [`commands`]: one handler per subcommand (`run`, `scenarios`, `config`)
//! - [`runner`]: `ScenarioRunner` and the gateway traits it drives
//! - [`output`]: text / JSON rendering (`OutputWriter`, `Render`)
//! - [`logging`]: tracing subscriber setup
//! - [`error`]: `CliError` and exit codes

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
pub mod runner;

pub use error::CliError;
pub use runner::{
    InventoryGateway, OrderGateway, RunReport, RunSettings, RunVerdict, ScenarioOutcome,
    ScenarioReport, ScenarioRunner, StatusProbe,
};
