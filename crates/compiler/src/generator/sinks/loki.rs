//! Loki 싱크

use logforward_core::api::output::Loki;

use super::{SinkContext, SinkParts, http_auth, template_field};
use crate::error::CompilerError;
use crate::generator::component::Component;
use crate::migrate::lokistack::DEFAULT_LABEL_KEYS;

/// 레이블 이름: `.`, `/`, `-`를 `_`로 바꿉니다.
pub fn label_name(key: &str) -> String {
    key.trim_start_matches('.').replace(['.', '/', '-'], "_")
}

pub fn sink(ctx: &SinkContext<'_>, loki: &Loki, inputs: &[String]) -> Result<SinkParts, CompilerError> {
    let mut remap = Vec::new();
    let mut sink = Component::new("loki", inputs)
        .set("endpoint", loki.url.trim_end_matches('/'))
        .set("out_of_order_action", "accept")
        .set("healthcheck.enabled", false)
        .set("encoding.codec", "json");
    if let Some(tenant) = loki.tenant_key.as_deref().filter(|t| !t.is_empty()) {
        sink = sink.set("tenant_id", template_field(&mut remap, "loki_tenant", tenant)?);
    }

    let keys: Vec<&str> = if loki.label_keys.is_empty() {
        DEFAULT_LABEL_KEYS.to_vec()
    } else {
        loki.label_keys.iter().map(String::as_str).collect()
    };
    for key in keys {
        let key = key.trim_start_matches('.');
        sink = sink.set_at(
            &["labels", label_name(key).as_str()],
            format!("{{{{ _internal.{key} }}}}"),
        );
    }
    sink = sink.set_at(&["labels", "kubernetes_host"], "${VECTOR_SELF_NODE_NAME}");

    let sink = http_auth(sink, "", loki.authentication.as_ref(), ctx.service_account);
    Ok(SinkParts {
        remap,
        ..SinkParts::new(sink)
    })
}
