//! 출력 싱크
//!
//! 출력 하나는 다음 체인으로 렌더링됩니다.
//!
//! ```text
//! [output_<name>_throttle] -> output_<name>_remap -> output_<name>
//! ```
//!
//! `_remap`은 `._internal`을 최상위로 되돌리고(필터 결과 반영), 싱크가 참조할 라우팅
//! 템플릿 값을 `._internal.<key>`에 계산합니다. 싱크는 인코딩에서 `_internal`을 뺍니다.

mod aws;
mod cloud;
mod elasticsearch;
mod http;
mod kafka;
mod loki;
mod splunk;
mod syslog;

use logforward_core::api::output::HttpAuthentication;
use logforward_core::api::{DeliveryMode, OutputKind, OutputSpec, OutputType, SecretReference};
use tracing::debug;
use url::Url;

use super::ConfigDocument;
use super::component::{Component, integer, string_array};
use crate::config::CompilerConfig;
use crate::error::CompilerError;
use crate::model::{ForwarderModel, SinkTuning, output_id};
use crate::secrets::{bearer_token_ref, secret_ref};
use crate::template::Template;
use crate::tls;

/// AtLeastOnce 디스크 버퍼 크기 하한 (바이트)
pub const DISK_BUFFER_MIN_BYTES: u64 = 268_435_488;

const NORMALIZE_VRL: &str = "_internal = del(._internal)\n. = _internal\n._internal = _internal";

/// 싱크 생성 입력
pub struct SinkContext<'a> {
    pub output: &'a OutputSpec,
    pub forwarder_name: &'a str,
    pub service_account: &'a str,
    pub config: &'a CompilerConfig,
}

/// 유형별 싱크 결과
pub struct SinkParts {
    pub sink: Component,
    /// `_remap`에 덧붙일 VRL 줄
    pub remap: Vec<String>,
    /// 공통 블록(tls, auth, batch, request, compression)을 넣을 상위 경로
    pub nested: Option<&'static str>,
    /// TLS 블록이 있으면 `tls.enabled = true`를 명시할지
    pub explicit_tls: bool,
}

impl SinkParts {
    fn new(sink: Component) -> Self {
        Self {
            sink,
            remap: Vec::new(),
            nested: None,
            explicit_tls: false,
        }
    }
}

/// 출력 체인을 문서에 추가합니다.
pub fn add_output(
    doc: &mut ConfigDocument,
    model: &ForwarderModel<'_>,
    output: &OutputSpec,
    inputs: Vec<String>,
    config: &CompilerConfig,
) -> Result<(), CompilerError> {
    let id = output_id(&output.name);
    let mut upstream = inputs;

    if let Some(limit) = &output.rate_limit {
        let throttle_id = format!("{id}_throttle");
        doc.add_transform(
            &throttle_id,
            Component::new("throttle", &upstream)
                .set("threshold", limit.max_records_per_second)
                .set("window_secs", 1),
        );
        upstream = vec![throttle_id];
    }

    let ctx = SinkContext {
        output,
        forwarder_name: model.forwarder.name(),
        service_account: model.service_account(),
        config,
    };
    let remap_id = format!("{id}_remap");
    let parts = sink_parts(&ctx, &[remap_id.clone()])?;

    let mut source = vec![NORMALIZE_VRL.to_owned()];
    source.extend(parts.remap.iter().cloned());
    doc.add_transform(
        &remap_id,
        Component::new("remap", &upstream).set("source", source.join("\n")),
    );

    let tuning = model.tuning.get(output.name.as_str()).cloned().unwrap_or_default();
    let sink = apply_common(&ctx, parts, &tuning)?;
    debug!(output = %output.name, sink = %id, "rendered output sink");
    doc.add_sink(&id, sink);
    Ok(())
}

fn sink_parts(ctx: &SinkContext<'_>, inputs: &[String]) -> Result<SinkParts, CompilerError> {
    match &ctx.output.kind {
        OutputKind::AzureMonitor(o) => cloud::azure_monitor(ctx, o, inputs),
        OutputKind::Cloudwatch(o) => aws::cloudwatch(ctx, o, inputs),
        OutputKind::Elasticsearch(o) => elasticsearch::sink(ctx, o, inputs),
        OutputKind::GoogleCloudLogging(o) => cloud::google_cloud_logging(ctx, o, inputs),
        OutputKind::Http(o) => http::http(ctx, o, inputs),
        OutputKind::Kafka(o) => kafka::sink(ctx, o, inputs),
        OutputKind::Loki(o) => loki::sink(ctx, o, inputs),
        OutputKind::Otlp(o) => http::otlp(ctx, o, inputs),
        OutputKind::S3(o) => aws::s3(ctx, o, inputs),
        OutputKind::Splunk(o) => splunk::sink(ctx, o, inputs),
        OutputKind::Syslog(o) => syslog::sink(ctx, o, inputs),
        OutputKind::LokiStack(_) => Err(CompilerError::Generate {
            output: ctx.output.name.clone(),
            reason: "lokiStack outputs must be migrated before generation".to_owned(),
        }),
    }
}

/// TLS, 버퍼, 배치, 재시도, 압축, 인코딩 공통 블록
fn apply_common(
    ctx: &SinkContext<'_>,
    parts: SinkParts,
    tuning: &SinkTuning,
) -> Result<Component, CompilerError> {
    let prefix = |key: &str| match parts.nested {
        Some(nested) => format!("{nested}.{key}"),
        None => key.to_owned(),
    };
    let mut sink = parts.sink;

    if let Some(block) = tls::materialize(ctx.output.tls.as_ref(), tls_url(ctx.output), ctx.config)
    {
        if let toml::Value::Table(table) = toml::Value::try_from(&block)? {
            sink = sink.merge(&prefix("tls"), table);
        }
        if parts.explicit_tls {
            sink = sink.set(&prefix("tls.enabled"), true);
        }
    }

    match tuning.delivery {
        Some(DeliveryMode::AtLeastOnce) => {
            sink = sink
                .set("buffer.type", "disk")
                .set("buffer.when_full", "block")
                .set("buffer.max_size", integer(DISK_BUFFER_MIN_BYTES))
                .set("acknowledgements.enabled", true);
        }
        Some(DeliveryMode::AtMostOnce) => {
            sink = sink.set("buffer.when_full", "drop_newest");
        }
        None => {}
    }
    sink = sink
        .set_opt(&prefix("batch.max_bytes"), tuning.max_bytes.map(integer))
        .set_opt(
            &prefix("request.retry_initial_backoff_secs"),
            tuning.retry_initial_backoff_secs.map(integer),
        )
        .set_opt(
            &prefix("request.retry_max_duration_secs"),
            tuning.retry_max_duration_secs.map(integer),
        );
    if supports_compression(ctx.output.output_type()) {
        sink = sink.set_opt(&prefix("compression"), tuning.compression.as_deref());
    }
    Ok(sink.set(&prefix("encoding.except_fields"), string_array(&["_internal"])))
}

fn supports_compression(output_type: OutputType) -> bool {
    !matches!(
        output_type,
        OutputType::Syslog | OutputType::AzureMonitor | OutputType::GoogleCloudLogging
    )
}

/// TLS 사용 여부를 판단할 URL. kafka는 URL이 없으면 첫 브로커를 봅니다.
fn tls_url(output: &OutputSpec) -> Option<&str> {
    match &output.kind {
        OutputKind::Kafka(kafka) if output.url().is_none() => {
            kafka.brokers.first().map(String::as_str)
        }
        _ => output.url(),
    }
}

// ─── 공통 헬퍼 ───────────────────────────────────────────────────────

/// 라우팅 템플릿 값
///
/// 정적 템플릿은 문자열 그대로, 동적 템플릿은 `_remap`에서 `._internal.<key>`에
/// 계산한 뒤 `{{ _internal.<key> }}`로 참조합니다.
pub fn template_field(
    remap: &mut Vec<String>,
    key: &str,
    template: &str,
) -> Result<String, CompilerError> {
    let compiled = Template::compile(template)?;
    if compiled.is_static() {
        return Ok(template.to_owned());
    }
    remap.push(format!("._internal.{key} = {}", compiled.to_vrl()));
    Ok(format!("{{{{ _internal.{key} }}}}"))
}

/// 기본/베어러 HTTP 인증
pub fn http_auth(
    mut sink: Component,
    prefix: &str,
    auth: Option<&HttpAuthentication>,
    service_account: &str,
) -> Component {
    let Some(auth) = auth else {
        return sink;
    };
    let key = |k: &str| format!("{prefix}auth.{k}");
    if let (Some(user), Some(password)) = (&auth.username, &auth.password) {
        sink = sink
            .set(&key("strategy"), "basic")
            .set(&key("user"), secret_value(user))
            .set(&key("password"), secret_value(password));
    } else if let Some(token) = auth.token.as_ref().and_then(|t| bearer_token_ref(t, service_account))
    {
        sink = sink
            .set(&key("strategy"), "bearer")
            .set(&key("token"), secret_value(&token));
    }
    sink
}

pub fn secret_value(reference: &SecretReference) -> String {
    secret_ref(&reference.secret_name, &reference.key)
}

/// `scheme://host[:port]/path` 분해 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    /// 소문자 스킴
    pub scheme: String,
    /// `host[:port]`
    pub authority: String,
    /// 앞뒤 `/` 제외
    pub path: String,
}

/// 검증을 통과한 URL을 분해합니다. 파싱할 수 없거나 호스트가 없으면 `None`입니다.
pub fn split_url(raw: &str) -> Option<UrlParts> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str().filter(|h| !h.is_empty())?;
    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    };
    Some(UrlParts {
        scheme: url.scheme().to_owned(),
        authority,
        path: url.path().trim_matches('/').to_owned(),
    })
}
