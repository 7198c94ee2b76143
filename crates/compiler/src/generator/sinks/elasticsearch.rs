//! Elasticsearch 싱크

use logforward_core::api::output::Elasticsearch;

use super::{SinkContext, SinkParts, http_auth, template_field};
use crate::error::CompilerError;
use crate::generator::component::{Component, string_array};

/// 버전이 없을 때의 API 버전
pub const DEFAULT_VERSION: u32 = 8;

pub fn sink(
    ctx: &SinkContext<'_>,
    es: &Elasticsearch,
    inputs: &[String],
) -> Result<SinkParts, CompilerError> {
    let mut remap = Vec::new();
    let index = template_field(&mut remap, "es_index", &es.index)?;
    let mut sink = Component::new("elasticsearch", inputs)
        .set("endpoints", string_array(&[es.url.as_str()]))
        .set("bulk.index", index)
        .set("bulk.action", "create")
        .set("id_key", "_id")
        .set("api_version", format!("v{}", es.version.unwrap_or(DEFAULT_VERSION)));
    for (name, value) in &es.headers {
        sink = sink.set_at(&["request", "headers", name.as_str()], value.as_str());
    }
    let sink = http_auth(sink, "", es.authentication.as_ref(), ctx.service_account);
    Ok(SinkParts {
        remap,
        ..SinkParts::new(sink)
    })
}
