//! Splunk HEC 싱크

use logforward_core::api::output::Splunk;

use super::{SinkContext, SinkParts, secret_value, template_field};
use crate::error::CompilerError;
use crate::generator::component::Component;

pub fn sink(_ctx: &SinkContext<'_>, splunk: &Splunk, inputs: &[String]) -> Result<SinkParts, CompilerError> {
    let mut remap = Vec::new();
    let mut sink = Component::new("splunk_hec_logs", inputs)
        .set("endpoint", splunk.url.as_str())
        .set("timestamp_key", "._internal.timestamp")
        .set("host_key", "._internal.hostname")
        .set("encoding.codec", "json")
        .set_opt(
            "default_token",
            splunk
                .authentication
                .as_ref()
                .and_then(|a| a.token.as_ref())
                .map(secret_value),
        );
    if let Some(index) = splunk.index.as_deref().filter(|i| !i.is_empty()) {
        sink = sink.set("index", template_field(&mut remap, "splunk_index", index)?);
    }
    if let Some(source) = splunk.source.as_deref().filter(|s| !s.is_empty()) {
        sink = sink.set("source", template_field(&mut remap, "splunk_source", source)?);
    }
    Ok(SinkParts {
        remap,
        ..SinkParts::new(sink)
    })
}
