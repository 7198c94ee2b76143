//! `logforward render` command handler

use std::io::Write;
use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::Serialize;
use tracing::{info, warn};

use logforward_core::config::OperatorConfig;
use logforward_core::store::RenderedConfig;

use super::{compiler_config, qualified_name, read_forwarder, reconcile_offline};
use super::validate::StatusReport;
use crate::cli::RenderArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Extension of the AWS credentials file written next to `--out`.
pub const CREDENTIALS_EXTENSION: &str = "aws-credentials";

/// Execute the `render` command.
///
/// A forwarder that is not Ready renders nothing; its status is printed instead.
pub async fn execute(
    args: RenderArgs,
    operator: &OperatorConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let forwarder = read_forwarder(&args.forwarder).await?;
    let name = qualified_name(&forwarder);
    let config = compiler_config(operator);
    let outcome = reconcile_offline(forwarder, &args.cluster, &config).await?;

    let Some(rendered) = outcome.rendered else {
        writer.render(&StatusReport {
            forwarder: name.clone(),
            ready: false,
            undeploy: outcome.undeploy,
            status: outcome.status,
        })?;
        return Err(CliError::NotReady(name));
    };

    match &args.out {
        Some(out) => {
            let report = write_files(out, &rendered).await?;
            writer.render(&report)
        }
        None => {
            if rendered.aws_credentials.is_some() {
                warn!("forwarder needs an AWS credentials file; use --out to write it");
            }
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.collector_toml.as_bytes())?;
            Ok(())
        }
    }
}

/// Path of the credentials file that accompanies `out`.
pub fn credentials_path(out: &Path) -> PathBuf {
    out.with_extension(CREDENTIALS_EXTENSION)
}

async fn write_files(out: &Path, rendered: &RenderedConfig) -> Result<RenderReport, CliError> {
    tokio::fs::write(out, &rendered.collector_toml).await?;
    info!(path = %out.display(), bytes = rendered.collector_toml.len(), "wrote collector configuration");

    let credentials = match &rendered.aws_credentials {
        Some(content) => {
            let path = credentials_path(out);
            tokio::fs::write(&path, content).await?;
            info!(path = %path.display(), "wrote AWS credentials file");
            Some(path.display().to_string())
        }
        None => None,
    };

    Ok(RenderReport {
        forwarder: format!("{}/{}", rendered.namespace, rendered.name),
        config_path: out.display().to_string(),
        credentials_path: credentials,
        bytes: rendered.collector_toml.len(),
        secret_names: rendered.secret_names.clone(),
        config_map_names: rendered.config_map_names.clone(),
    })
}

/// Summary of the files written by `render --out`.
#[derive(Serialize)]
pub struct RenderReport {
    pub forwarder: String,
    pub config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<String>,
    pub bytes: usize,
    /// Secrets the collector pod must mount
    pub secret_names: Vec<String>,
    /// Config maps the collector pod must mount
    pub config_map_names: Vec<String>,
}

impl Render for RenderReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(
            w,
            "{} {} -> {} ({} bytes)",
            "Rendered".green().bold(),
            self.forwarder,
            self.config_path,
            self.bytes
        )?;
        if let Some(path) = &self.credentials_path {
            writeln!(w, "  AWS credentials: {path}")?;
        }
        if !self.secret_names.is_empty() {
            writeln!(w, "  Secrets: {}", self.secret_names.join(", "))?;
        }
        if !self.config_map_names.is_empty() {
            writeln!(w, "  ConfigMaps: {}", self.config_map_names.join(", "))?;
        }
        Ok(())
    }
}
