//! logforward -- offline ClusterLogForwarder compiler.
//!
//! Parses arguments, loads `logforward.toml`, sets up logging and
//! dispatches to the subcommand handlers.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;

use cli::{Cli, Commands};
use error::CliError;
use output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);

    // `config` reports on the file itself, so it must not fail before the handler runs.
    if let Commands::Config(args) = cli.command {
        init_logging(&Default::default(), cli.log_level.as_deref());
        return commands::config::execute(args, &cli.config, &writer).await;
    }

    let operator = commands::load_operator_config(&cli.config).await?;
    init_logging(&operator.general, cli.log_level.as_deref());
    logforward_core::metrics::describe_all();
    tracing::debug!(config = %cli.config.display(), "logforward starting");

    match cli.command {
        Commands::Migrate(args) => commands::migrate::execute(args, &operator, &writer).await,
        Commands::Validate(args) => commands::validate::execute(args, &operator, &writer).await,
        Commands::Render(args) => commands::render::execute(args, &operator, &writer).await,
        Commands::Config(_) => Ok(()),
    }
}

fn init_logging(general: &logforward_core::config::GeneralConfig, level: Option<&str>) {
    if let Err(e) = logging::init_tracing(general, level) {
        eprintln!("warning: {e}");
    }
}
