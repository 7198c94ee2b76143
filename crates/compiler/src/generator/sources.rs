//! 입력 소스와 유입 트랜스폼
//!
//! 입력 하나가 하나 이상의 소스를 만들고, 각 소스 뒤에 메타데이터 remap이 붙습니다.
//! 메타데이터 remap은 `log_type`, `log_source`, `hostname`을 채운 뒤 레코드 전체를
//! `._internal`에 보관합니다. 필터와 템플릿은 `._internal` 아래 값을 읽습니다.
//!
//! | 입력 | 소스 유형 |
//! |------|-----------|
//! | application, infrastructure(container) | `kubernetes_logs` |
//! | infrastructure(node) | `journald` |
//! | audit | `file` (소스별) |
//! | receiver(http) | `http_server` |
//! | receiver(syslog) | `syslog` |

use logforward_core::api::input::{
    Application, AuditSource, INPUT_APPLICATION, INPUT_AUDIT,
    INPUT_INFRASTRUCTURE, InfrastructureSource, LabelSelector, NamespaceContainer, Receiver,
    ReceiverType,
};
use logforward_core::api::{InputKind, InputSpec, LimitSpec};

use super::component::{Component, integer, string_array};
use super::ConfigDocument;
use crate::config::CompilerConfig;
use crate::error::CompilerError;
use crate::migrate::inputs::receiver_secret_name;
use crate::model::{ForwarderModel, input_id};
use crate::tls;
use crate::validate::annotations::use_kube_cache;

/// 파드 로그 기준 경로
pub const POD_LOG_DIR: &str = "/var/log/pods";

/// 인프라 네임스페이스 (`kubernetes_logs` 글롭 단위)
pub const INFRA_NAMESPACES: [&str; 5] = ["default", "openshift", "openshift-*", "kube", "kube-*"];

/// 수집하지 않는 로그 파일 확장자
pub const EXCLUDED_EXTENSIONS: [&str; 3] = ["gz", "tmp", "log.*"];

pub const MAX_READ_BYTES: u64 = 3_145_728;
pub const ROTATE_WAIT_SECS: u64 = 5;
pub const GLOB_COOLDOWN_MS: u64 = 15_000;

const HOSTNAME_VRL: &str = r#".hostname = get_env_var("VECTOR_SELF_NODE_NAME") ?? """#;
const STASH_VRL: &str = "._internal = .";

/// 입력의 소스와 유입 트랜스폼을 추가하고 파이프라인이 읽을 ID를 돌려줍니다.
pub fn add_input(
    doc: &mut ConfigDocument,
    model: &ForwarderModel<'_>,
    input: &InputSpec,
    config: &CompilerConfig,
) -> Result<Vec<String>, CompilerError> {
    let base = input_id(&input.name);
    let ids = match &input.kind {
        InputKind::Application(app) => {
            let includes = app
                .includes
                .iter()
                .map(include_glob)
                .collect::<Vec<_>>();
            let excludes = application_excludes(model, app);
            let source = kubernetes_logs(model, &includes, &excludes, app.selector.as_ref())
                .set_opt(
                    "max_line_bytes",
                    app.tuning
                        .as_ref()
                        .and_then(|t| t.max_message_size.as_ref())
                        .and_then(|q| q.as_bytes())
                        .map(integer),
                );
            let source_id = format!("{base}_container");
            doc.add_source(&source_id, source);
            let mut upstream = source_id;
            if let Some(limit) = app
                .tuning
                .as_ref()
                .and_then(|t| t.rate_limit_per_container.as_ref())
            {
                let throttle_id = format!("{base}_throttle");
                doc.add_transform(&throttle_id, container_throttle(&upstream, limit));
                upstream = throttle_id;
            }
            let meta_id = format!("{base}_meta");
            doc.add_transform(&meta_id, meta(&upstream, None, "container"));
            vec![meta_id]
        }
        InputKind::Infrastructure(infra) => {
            let mut ids = Vec::new();
            let sources = if infra.sources.is_empty() {
                InfrastructureSource::ALL.to_vec()
            } else {
                infra.sources.clone()
            };
            if sources.contains(&InfrastructureSource::Container) {
                let includes: Vec<String> = INFRA_NAMESPACES
                    .iter()
                    .map(|ns| format!("{POD_LOG_DIR}/{ns}_*/*/*.log"))
                    .collect();
                let mut excludes = vec![collector_glob(model)];
                excludes.extend(extension_globs());
                let source = kubernetes_logs(model, &includes, &excludes, None).set_opt(
                    "max_line_bytes",
                    infra
                        .tuning
                        .as_ref()
                        .and_then(|t| t.max_message_size.as_ref())
                        .and_then(|q| q.as_bytes())
                        .map(integer),
                );
                let source_id = format!("{base}_container");
                doc.add_source(&source_id, source);
                let meta_id = format!("{source_id}_meta");
                doc.add_transform(&meta_id, meta(&source_id, Some(INPUT_INFRASTRUCTURE), "container"));
                ids.push(meta_id);
            }
            if sources.contains(&InfrastructureSource::Node) {
                let source_id = format!("{base}_journal");
                doc.add_source(
                    &source_id,
                    Component::source("journald")
                        .set("journal_directory", "/var/log/journal")
                        .set("batch_size", 16),
                );
                let meta_id = format!("{source_id}_meta");
                doc.add_transform(&meta_id, meta(&source_id, Some(INPUT_INFRASTRUCTURE), "node"));
                ids.push(meta_id);
            }
            ids
        }
        InputKind::Audit(audit) => {
            let mut sources = if audit.sources.is_empty() {
                AuditSource::ALL.to_vec()
            } else {
                audit.sources.clone()
            };
            sources.sort();
            sources.dedup();
            let mut ids = Vec::new();
            for source in sources {
                let source_id = format!("{base}_{}", audit_suffix(source));
                doc.add_source(
                    &source_id,
                    Component::source("file")
                        .set("include", string_array(audit_paths(source)))
                        .set("host_key", "hostname")
                        .set("glob_minimum_cooldown_ms", integer(GLOB_COOLDOWN_MS)),
                );
                let meta_id = format!("{source_id}_meta");
                doc.add_transform(&meta_id, meta(&source_id, Some(INPUT_AUDIT), source.as_str()));
                ids.push(meta_id);
            }
            ids
        }
        InputKind::Receiver(receiver) => {
            let source = receiver_source(model, input, receiver, config)?;
            doc.add_source(&base, source);
            let meta_id = format!("{base}_meta");
            let (log_type, log_source) = match receiver.receiver_type {
                ReceiverType::Http => (INPUT_AUDIT, "kubeAPI"),
                ReceiverType::Syslog => (INPUT_INFRASTRUCTURE, "syslog"),
            };
            doc.add_transform(&meta_id, meta(&base, Some(log_type), log_source));
            vec![meta_id]
        }
    };
    Ok(ids)
}

// ─── kubernetes_logs ─────────────────────────────────────────────────

fn kubernetes_logs(
    model: &ForwarderModel<'_>,
    includes: &[String],
    excludes: &[String],
    selector: Option<&LabelSelector>,
) -> Component {
    let mut source = Component::source("kubernetes_logs")
        .set("max_read_bytes", integer(MAX_READ_BYTES))
        .set("glob_minimum_cooldown_ms", integer(GLOB_COOLDOWN_MS))
        .set("auto_partial_merge", true)
        .set("rotate_wait_secs", integer(ROTATE_WAIT_SECS))
        .set("exclude_paths_glob_patterns", string_array(excludes))
        .set("pod_annotation_fields.pod_labels", "kubernetes.labels")
        .set("pod_annotation_fields.pod_namespace", "kubernetes.namespace_name")
        .set("pod_annotation_fields.pod_annotations", "kubernetes.annotations")
        .set("pod_annotation_fields.pod_uid", "kubernetes.pod_id")
        .set("pod_annotation_fields.pod_node_name", "hostname")
        .set("namespace_annotation_fields.namespace_uid", "kubernetes.namespace_id");
    if !includes.is_empty() {
        source = source.set("include_paths_glob_patterns", string_array(includes));
    }
    if let Some(selector) = selector.map(label_selector).filter(|s| !s.is_empty()) {
        source = source.set("extra_label_selector", selector);
    }
    if use_kube_cache(model.forwarder) {
        source = source.set("use_apiserver_cache", true);
    }
    source
}

/// `<ns>_*/<container>/*.log` 글롭. 빈 값은 `*`입니다.
fn include_glob(nc: &NamespaceContainer) -> String {
    let ns = nc.namespace.as_deref().filter(|s| !s.is_empty()).unwrap_or("*");
    let container = nc.container.as_deref().filter(|s| !s.is_empty()).unwrap_or("*");
    format!("{POD_LOG_DIR}/{ns}_*/{container}/*.log")
}

/// 수집기 자신의 로그
fn collector_glob(model: &ForwarderModel<'_>) -> String {
    format!(
        "{POD_LOG_DIR}/{}_{}-*/*/*.log",
        model.forwarder.namespace(),
        model.forwarder.name()
    )
}

fn extension_globs() -> impl Iterator<Item = String> {
    EXCLUDED_EXTENSIONS
        .iter()
        .map(|ext| format!("{POD_LOG_DIR}/*/*/*.{ext}"))
}

/// 애플리케이션 입력의 제외 글롭
///
/// 명시적으로 포함하지 않은 인프라 네임스페이스, 사용자 제외 목록, 수집기 자신,
/// 압축/임시 파일 순서입니다.
fn application_excludes(model: &ForwarderModel<'_>, app: &Application) -> Vec<String> {
    let included: Vec<&str> = app
        .includes
        .iter()
        .filter_map(|i| i.namespace.as_deref())
        .collect();
    let mut excludes = vec![collector_glob(model)];
    excludes.extend(
        pruned_infra_namespaces(&included)
            .into_iter()
            .map(|ns| format!("{POD_LOG_DIR}/{ns}_*/*/*.log")),
    );
    excludes.extend(app.excludes.iter().map(include_glob));
    excludes.extend(extension_globs());
    excludes
}

/// 포함 목록에 나온 인프라 네임스페이스를 기본 제외 목록에서 뺍니다.
///
/// `openshift*`/`kube*`는 접두어 전체를, `openshift-x`는 `openshift-*`만,
/// 정확한 이름은 그 이름만 제외 목록에서 지웁니다.
pub fn pruned_infra_namespaces(includes: &[&str]) -> Vec<&'static str> {
    let mut remaining: Vec<&'static str> = INFRA_NAMESPACES.to_vec();
    let mut remove = |name: &str| remaining.retain(|ns| *ns != name);
    for ns in includes {
        match *ns {
            "default" => remove("default"),
            "openshift" => remove("openshift"),
            "kube" => remove("kube"),
            "openshift*" => {
                remove("openshift");
                remove("openshift-*");
            }
            "kube*" => {
                remove("kube");
                remove("kube-*");
            }
            other if other.strip_prefix("openshift-").is_some_and(|s| !s.is_empty()) => {
                remove("openshift-*")
            }
            other if other.strip_prefix("kube-").is_some_and(|s| !s.is_empty()) => {
                remove("kube-*")
            }
            _ => {}
        }
    }
    remaining
}

/// 레이블 선택자를 `extra_label_selector` 문자열로 바꿉니다.
pub fn label_selector(selector: &LabelSelector) -> String {
    let mut terms: Vec<String> = selector
        .match_labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    for expr in &selector.match_expressions {
        let values = expr.values.join(",");
        terms.push(match expr.operator.as_str() {
            "In" => format!("{} in ({values})", expr.key),
            "NotIn" => format!("{} notin ({values})", expr.key),
            "Exists" => expr.key.clone(),
            "DoesNotExist" => format!("!{}", expr.key),
            _ => continue,
        });
    }
    terms.join(",")
}

fn container_throttle(input: &str, limit: &LimitSpec) -> Component {
    Component::new("throttle", &[input.to_owned()])
        .set("key_field", "{{ file }}")
        .set("threshold", limit.max_records_per_second)
        .set("window_secs", 1)
}

// ─── 감사 ────────────────────────────────────────────────────────────

fn audit_suffix(source: AuditSource) -> &'static str {
    match source {
        AuditSource::KubeApi => "kube_api",
        AuditSource::OpenshiftApi => "openshift_api",
        AuditSource::Auditd => "auditd",
        AuditSource::Ovn => "ovn",
    }
}

fn audit_paths(source: AuditSource) -> &'static [&'static str] {
    match source {
        AuditSource::KubeApi => &["/var/log/kube-apiserver/audit.log"],
        AuditSource::OpenshiftApi => &[
            "/var/log/oauth-apiserver/audit.log",
            "/var/log/openshift-apiserver/audit.log",
            "/var/log/oauth-server/audit.log",
        ],
        AuditSource::Auditd => &["/var/log/audit/audit.log"],
        AuditSource::Ovn => &["/var/log/ovn/acl-audit-log.log"],
    }
}

// ─── 리시버 ──────────────────────────────────────────────────────────

fn receiver_source(
    model: &ForwarderModel<'_>,
    input: &InputSpec,
    receiver: &Receiver,
    config: &CompilerConfig,
) -> Result<Component, CompilerError> {
    let host = if config.capability("ipv6") { "[::]" } else { "0.0.0.0" };
    let address = format!("{host}:{}", receiver.port);
    let default_secret = receiver_secret_name(model.forwarder.name(), &input.name);
    let tls_block = tls::materialize_receiver(receiver.tls.as_ref(), &default_secret, config);
    let tls_table = match toml::Value::try_from(&tls_block)? {
        toml::Value::Table(table) => table,
        _ => toml::Table::new(),
    };

    let source = match receiver.receiver_type {
        ReceiverType::Http => Component::source("http_server")
            .set("address", address)
            .set("decoding.codec", "json"),
        ReceiverType::Syslog => Component::source("syslog")
            .set("address", address)
            .set("mode", "tcp"),
    };
    Ok(source.merge("tls", tls_table))
}

// ─── 메타데이터 ──────────────────────────────────────────────────────

/// `log_type`이 `None`이면 네임스페이스로 application/infrastructure를 가릅니다.
fn meta(input: &str, log_type: Option<&str>, log_source: &str) -> Component {
    let log_type_vrl = match log_type {
        Some(t) => format!(".log_type = {t:?}"),
        None => format!(
            "if match_any(string!(.kubernetes.namespace_name), [r'^default$', r'^openshift(-.+)?$', r'^kube(-.+)?$']) {{\n  .log_type = {INPUT_INFRASTRUCTURE:?}\n}} else {{\n  .log_type = {INPUT_APPLICATION:?}\n}}"
        ),
    };
    let source = [
        format!(".log_source = {log_source:?}"),
        log_type_vrl,
        HOSTNAME_VRL.to_owned(),
        STASH_VRL.to_owned(),
    ]
    .join("\n");
    Component::new("remap", &[input.to_owned()]).set("source", source)
}
