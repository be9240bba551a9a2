use gdlsp_cli::{Cli, CliError, execute, load_config, logging};

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            if let Some(hint) = e.recovery_hint() {
                eprintln!("{hint}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    // Load and validate configuration
    let (config, config_dir) = load_config(cli.config_dir.as_deref())?;

    // Initialize logging before anything else logs
    logging::setup_logging(&config.logging, &config_dir.join(&config.logging.dir))?;

    info!("Starting gdlsp v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    execute(cli.command, config, &config_dir).await
}
