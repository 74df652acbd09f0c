//! orderprobe binary entry point.
//!
//! Parses arguments, sets up logging, wires Ctrl-C to cancellation and maps
//! the command result to the process exit code.

use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use orderprobe_cli::cli::{Cli, Commands};
use orderprobe_cli::commands;
use orderprobe_cli::logging::init_tracing;
use orderprobe_cli::output::OutputWriter;
use orderprobe_core::config::ProbeConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging comes up before the command runs, so take [general] from the
    // configuration when it loads and fall back to defaults otherwise. The
    // command reports the configuration error itself.
    let mut general = ProbeConfig::load_optional(cli.config.as_deref())
        .await
        .map(|config| config.general)
        .unwrap_or_default();
    if let Some(level) = &cli.log_level {
        general.log_level = level.clone();
    }
    if let Err(e) = init_tracing(&general) {
        eprintln!("warning: {e}");
    }

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling run");
                cancel.cancel();
            }
        }
    });

    let writer = OutputWriter::new(cli.output);
    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args, config_path, &writer, &cancel).await,
        Commands::Scenarios => commands::scenarios::execute(config_path, &writer).await,
        Commands::Config(args) => commands::config::execute(args, config_path, &writer).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, exit_code = e.exit_code(), "command failed");
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
