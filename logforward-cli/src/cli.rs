//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// logforward -- compile ClusterLogForwarder documents into collector configuration.
///
/// Use `logforward <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "logforward", version, about, long_about = None)]
pub struct Cli {
    /// Path to the logforward.toml operator configuration file.
    #[arg(short, long, default_value = "logforward.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the migrated forwarder and the Migrate conditions.
    Migrate(MigrateArgs),

    /// Run migrations and validators and report every condition.
    Validate(ValidateArgs),

    /// Run a full reconcile and write the collector configuration.
    Render(RenderArgs),

    /// Manage operator configuration.
    Config(ConfigArgs),
}

// ---- migrate ----

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// ClusterLogForwarder document (YAML or JSON).
    pub forwarder: PathBuf,
}

// ---- validate / render ----

/// Offline cluster state shared by `validate` and `render`.
#[derive(Args, Debug, Clone, Default)]
pub struct ClusterArgs {
    /// Directory holding `secrets/<name>/<key>` and `configmaps/<name>/<key>`.
    #[arg(long)]
    pub secrets: Option<PathBuf>,

    /// Input types the service account may collect (default: all).
    #[arg(long = "allow", value_name = "INPUT_TYPE")]
    pub allow: Vec<String>,

    /// Treat the forwarder's service account as missing.
    #[arg(long)]
    pub no_service_account: bool,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// ClusterLogForwarder document (YAML or JSON).
    pub forwarder: PathBuf,

    #[command(flatten)]
    pub cluster: ClusterArgs,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// ClusterLogForwarder document (YAML or JSON).
    pub forwarder: PathBuf,

    #[command(flatten)]
    pub cluster: ClusterArgs,

    /// Write the collector TOML here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

// ---- config ----

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only one section (general, collector, tls).
        #[arg(long)]
        section: Option<String>,
    },
}
