//! `logforward migrate` command handler

use std::io::Write;

use colored::Colorize;
use serde::Serialize;
use tracing::info;

use logforward_compiler::migrate::migrate;
use logforward_core::api::{ClusterLogForwarder, Condition};
use logforward_core::config::OperatorConfig;

use super::{compiler_config, qualified_name, read_forwarder};
use crate::cli::MigrateArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render, write_condition};

/// Execute the `migrate` command.
pub async fn execute(
    args: MigrateArgs,
    operator: &OperatorConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let forwarder = read_forwarder(&args.forwarder).await?;
    info!(forwarder = %qualified_name(&forwarder), "applying migrations");

    let config = compiler_config(operator);
    let (migrated, conditions) = migrate(forwarder, &config);
    let report = MigrationReport {
        forwarder_yaml: migrated.to_yaml()?,
        forwarder: migrated,
        conditions,
    };
    writer.render(&report)
}

/// Migrated forwarder plus the Migrate conditions that explain the rewrite.
#[derive(Serialize)]
pub struct MigrationReport {
    pub forwarder: ClusterLogForwarder,
    pub conditions: Vec<Condition>,
    /// Pre-rendered YAML for text output
    #[serde(skip)]
    pub forwarder_yaml: String,
}

impl Render for MigrationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        write!(w, "{}", self.forwarder_yaml)?;
        if !self.conditions.is_empty() {
            writeln!(w)?;
            writeln!(w, "# {}", "Migrations".bold())?;
            for condition in &self.conditions {
                write!(w, "# ")?;
                write_condition(w, condition)?;
            }
        }
        Ok(())
    }
}
