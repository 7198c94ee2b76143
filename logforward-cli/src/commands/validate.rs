//! `logforward validate` command handler

use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use logforward_core::api::ForwarderStatus;
use logforward_core::config::OperatorConfig;

use super::{compiler_config, qualified_name, read_forwarder, reconcile_offline};
use crate::cli::ValidateArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render, write_condition};

/// Execute the `validate` command.
///
/// Reports every condition and fails with [`CliError::NotReady`] when the
/// forwarder would not be deployed.
pub async fn execute(
    args: ValidateArgs,
    operator: &OperatorConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let forwarder = read_forwarder(&args.forwarder).await?;
    let name = qualified_name(&forwarder);
    let config = compiler_config(operator);
    let outcome = reconcile_offline(forwarder, &args.cluster, &config).await?;

    let report = StatusReport {
        forwarder: name.clone(),
        ready: outcome.is_ready(),
        undeploy: outcome.undeploy,
        status: outcome.status,
    };
    writer.render(&report)?;

    if !report.ready {
        return Err(CliError::NotReady(name));
    }
    Ok(())
}

/// Synthesized status of one forwarder.
#[derive(Serialize)]
pub struct StatusReport {
    pub forwarder: String,
    pub ready: bool,
    /// The collector would be removed (authorization failure)
    pub undeploy: bool,
    pub status: ForwarderStatus,
}

impl Render for StatusReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        let verdict = if self.ready {
            "READY".green().bold()
        } else {
            "NOT READY".red().bold()
        };
        writeln!(w, "Forwarder {}: {}", self.forwarder.bold(), verdict)?;
        if self.undeploy {
            writeln!(w, "  {}", "collector would be undeployed".yellow())?;
        }

        let sections = [
            ("Conditions", &self.status.conditions),
            ("Inputs", &self.status.inputs),
            ("Outputs", &self.status.outputs),
            ("Filters", &self.status.filters),
            ("Pipelines", &self.status.pipelines),
        ];
        for (title, conditions) in sections {
            if conditions.is_empty() {
                continue;
            }
            writeln!(w)?;
            writeln!(w, "{title}:")?;
            for condition in conditions {
                write_condition(w, condition)?;
            }
        }
        Ok(())
    }
}
