//! Azure Monitor, Google Cloud Logging 싱크

use logforward_core::api::output::{AzureMonitor, GoogleCloudLogging};

use super::{SinkContext, SinkParts, secret_value, template_field};
use crate::error::CompilerError;
use crate::generator::component::Component;

pub fn azure_monitor(
    _ctx: &SinkContext<'_>,
    azure: &AzureMonitor,
    inputs: &[String],
) -> Result<SinkParts, CompilerError> {
    let sink = Component::new("azure_monitor_logs", inputs)
        .set("customer_id", azure.customer_id.as_str())
        .set("log_type", azure.log_type.as_str())
        .set_opt("azure_resource_id", azure.azure_resource_id.as_deref().filter(|s| !s.is_empty()))
        .set_opt("host", azure.host.as_deref().filter(|s| !s.is_empty()))
        .set_opt(
            "shared_key",
            azure
                .authentication
                .as_ref()
                .and_then(|a| a.shared_key.as_ref())
                .map(secret_value),
        );
    Ok(SinkParts::new(sink))
}

pub fn google_cloud_logging(
    ctx: &SinkContext<'_>,
    gcl: &GoogleCloudLogging,
    inputs: &[String],
) -> Result<SinkParts, CompilerError> {
    let mut remap = Vec::new();
    let log_id = template_field(&mut remap, "gcl_log_id", &gcl.log_id)?;
    let sink = Component::new("gcp_stackdriver_logs", inputs)
        .set(gcl.id.id_type.sink_key(), gcl.id.value.as_str())
        .set("log_id", log_id)
        .set("severity_key", "._internal.severity")
        .set("resource.type", "k8s_node")
        .set_opt(
            "credentials_path",
            gcl.authentication
                .as_ref()
                .and_then(|a| a.credentials.as_ref())
                .map(|c| ctx.config.secret_path(&c.secret_name, &c.key)),
        );
    Ok(SinkParts {
        remap,
        ..SinkParts::new(sink)
    })
}
