//! Command handlers -- one module per subcommand

pub mod config;
pub mod migrate;
pub mod render;
pub mod validate;

use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use logforward_compiler::capabilities::read_capabilities;
use logforward_compiler::{CompilerConfig, MemoryStore, ReconcileOutcome, StaticReviewer, reconcile};
use logforward_core::api::ClusterLogForwarder;
use logforward_core::config::OperatorConfig;
use logforward_core::error::{ConfigError, LogForwardError};

use crate::cli::ClusterArgs;
use crate::error::CliError;

/// Load the operator configuration, falling back to defaults when the file
/// does not exist. Env overrides apply either way.
pub async fn load_operator_config(path: &Path) -> Result<OperatorConfig, CliError> {
    match OperatorConfig::load(path).await {
        Ok(config) => Ok(config),
        Err(LogForwardError::Config(ConfigError::FileNotFound { .. })) => {
            debug!(path = %path.display(), "config file not found; using defaults");
            let mut config = OperatorConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
        Err(e) => Err(e.into()),
    }
}

/// Compiler settings derived from the operator config and the capability file.
pub fn compiler_config(operator: &OperatorConfig) -> CompilerConfig {
    let capabilities = read_capabilities(Path::new(&operator.collector.capabilities_path));
    CompilerConfig::from_core(operator).with_capabilities(capabilities)
}

/// Read a forwarder document. `.json` files are parsed as JSON, anything else as YAML.
pub async fn read_forwarder(path: &Path) -> Result<ClusterLogForwarder, CliError> {
    let text = tokio::fs::read_to_string(path).await?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let parsed = if is_json {
        ClusterLogForwarder::from_json(&text).map_err(|e| e.to_string())
    } else {
        ClusterLogForwarder::from_yaml(&text).map_err(|e| e.to_string())
    };
    parsed.map_err(|reason| CliError::Document {
        path: path.display().to_string(),
        reason,
    })
}

/// Run one reconcile pass against an in-memory cluster built from the arguments.
pub async fn reconcile_offline(
    forwarder: ClusterLogForwarder,
    cluster: &ClusterArgs,
    config: &CompilerConfig,
) -> Result<ReconcileOutcome, CliError> {
    let namespace = forwarder.namespace().to_owned();
    let name = forwarder.name().to_owned();
    let service_account = forwarder.spec.service_account.name.clone();

    let mut store = MemoryStore::new().with_forwarder(forwarder);
    if let Some(dir) = &cluster.secrets {
        store = store.load_dir(dir, &namespace)?;
    }
    if !cluster.no_service_account && !service_account.is_empty() {
        store = store.with_service_account(&namespace, &service_account);
    }

    let reviewer = if cluster.allow.is_empty() {
        StaticReviewer::allow_all()
    } else {
        StaticReviewer::allowing(cluster.allow.iter().map(String::as_str))
    };

    info!(namespace = %namespace, name = %name, "reconciling forwarder offline");
    let cancel = CancellationToken::new();
    let outcome = reconcile(&store, &reviewer, config, &namespace, &name, &cancel).await?;
    Ok(outcome)
}

/// `namespace/name` for messages.
pub fn qualified_name(forwarder: &ClusterLogForwarder) -> String {
    format!("{}/{}", forwarder.namespace(), forwarder.name())
}
