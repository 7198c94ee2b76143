//! HTTP, OTLP 싱크

use logforward_core::api::output::{Http, Otlp};

use super::{SinkContext, SinkParts, http_auth};
use crate::error::CompilerError;
use crate::generator::component::Component;

pub const DEFAULT_METHOD: &str = "post";
pub const DEFAULT_TIMEOUT_SECS: u32 = 10;

const NDJSON: &str = "application/x-ndjson";

pub fn http(ctx: &SinkContext<'_>, spec: &Http, inputs: &[String]) -> Result<SinkParts, CompilerError> {
    let method = spec
        .method
        .as_deref()
        .filter(|m| !m.is_empty())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| DEFAULT_METHOD.to_owned());
    let mut sink = Component::new("http", inputs)
        .set("uri", spec.url.as_str())
        .set("method", method)
        .set("request.timeout_secs", spec.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS))
        .set("encoding.codec", "json");
    for (name, value) in &spec.headers {
        sink = sink.set_at(&["request", "headers", name.as_str()], value.as_str());
    }
    let ndjson = spec
        .headers
        .iter()
        .any(|(k, v)| k.eq_ignore_ascii_case("content-type") && v.trim().eq_ignore_ascii_case(NDJSON));
    if ndjson {
        sink = sink.set("framing.method", "newline_delimited");
    }
    let sink = http_auth(sink, "", spec.authentication.as_ref(), ctx.service_account);
    Ok(SinkParts::new(sink))
}

/// OTLP/HTTP: 전송 설정은 모두 `protocol` 아래에 둡니다.
pub fn otlp(ctx: &SinkContext<'_>, spec: &Otlp, inputs: &[String]) -> Result<SinkParts, CompilerError> {
    let sink = Component::new("opentelemetry", inputs)
        .set("protocol.type", "http")
        .set("protocol.uri", spec.url.as_str())
        .set("protocol.method", DEFAULT_METHOD)
        .set("protocol.encoding.codec", "json")
        .set("protocol.request.headers.Content-Type", "application/json");
    let sink = http_auth(sink, "protocol.", spec.authentication.as_ref(), ctx.service_account);
    Ok(SinkParts {
        nested: Some("protocol"),
        ..SinkParts::new(sink)
    })
}
