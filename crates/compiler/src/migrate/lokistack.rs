//! LokiStack 출력을 테넌트별 Loki/OTLP 출력으로 분할
//!
//! LokiStack을 참조하는 파이프라인은 입력마다 하나로 나뉘고, 각 (입력, LokiStack)
//! 쌍마다 `<lokistack>-<input>` 출력이 생성됩니다. 생성된 출력은 LokiStack의
//! 인증, 튜닝, TLS, 속도 제한을 그대로 상속합니다.

use std::collections::BTreeSet;

use logforward_core::api::output::{
    HttpAuthentication, Loki, LokiStack, LokiStackDataModel, LokiStackLabelKeys, Otlp,
};
use logforward_core::api::{ClusterLogForwarder, Condition, OutputKind, OutputSpec, OutputType};

use super::{migrate_output_condition, pipeline_names, split_pipeline, tenant_for_input};
use crate::config::CompilerConfig;

/// Loki 싱크 기본 레이블 키
pub const DEFAULT_LABEL_KEYS: [&str; 4] = [
    "log_type",
    "kubernetes.namespace_name",
    "kubernetes.pod_name",
    "kubernetes.container_name",
];

/// LokiStack OTLP 수신 경로
pub const OTLP_ENDPOINT_SUFFIX: &str = "/otlp/v1/logs";

/// 게이트웨이 서비스 이름
pub fn gateway_service(target: &str) -> String {
    format!("{target}-gateway-http")
}

/// 테넌트 수신 URL
pub fn tenant_url(service: &str, namespace: &str, tenant: &str) -> String {
    format!(
        "https://{}.{namespace}.svc:8080/api/logs/v1/{tenant}",
        gateway_service(service)
    )
}

/// 테넌트별 레이블 키
///
/// 테넌트 목록에서 시작해, `ignoreGlobal`이 아니면 전역 목록을 붙이고 전역이 비어
/// 있을 때는 기본값을 붙입니다. 결과가 비어 있으면 수집기 기본값을 쓰라는 뜻입니다.
pub fn label_keys_for_tenant<S: AsRef<str>>(
    label_keys: Option<&LokiStackLabelKeys>,
    tenant: &str,
    defaults: &[S],
) -> Vec<String> {
    let Some(label_keys) = label_keys else {
        return Vec::new();
    };
    let tenant_keys = label_keys.for_tenant(tenant);
    let mut keys: BTreeSet<String> = tenant_keys
        .map(|t| t.label_keys.iter().cloned().collect())
        .unwrap_or_default();
    if !tenant_keys.is_some_and(|t| t.ignore_global) {
        if !label_keys.global.is_empty() {
            keys.extend(label_keys.global.iter().cloned());
        } else if !keys.is_empty() {
            keys.extend(defaults.iter().map(|d| d.as_ref().to_owned()));
        }
    }
    keys.into_iter().collect()
}

/// 한 테넌트용 출력을 만듭니다.
pub fn tenant_output(
    source: &OutputSpec,
    lokistack: &LokiStack,
    input: &str,
    tenant: &str,
    forwarder_namespace: &str,
) -> OutputSpec {
    let namespace = lokistack
        .target
        .namespace
        .as_deref()
        .filter(|ns| !ns.is_empty())
        .unwrap_or(forwarder_namespace);
    let url = tenant_url(&lokistack.target.name, namespace, tenant);
    let authentication = lokistack
        .authentication
        .as_ref()
        .map(|auth| HttpAuthentication {
            token: auth.token.clone(),
            ..Default::default()
        });
    let kind = match lokistack.data_model {
        Some(LokiStackDataModel::Otel) => OutputKind::Otlp(Otlp {
            url: format!("{url}{OTLP_ENDPOINT_SUFFIX}"),
            authentication,
            tuning: lokistack.tuning.clone(),
        }),
        _ => OutputKind::Loki(Loki {
            url,
            label_keys: label_keys_for_tenant(
                lokistack.label_keys.as_ref(),
                tenant,
                &DEFAULT_LABEL_KEYS,
            ),
            tenant_key: None,
            authentication,
            tuning: lokistack.tuning.clone(),
        }),
    };
    OutputSpec {
        name: format!("{}-{input}", source.name),
        kind,
        tls: source.tls.clone(),
        rate_limit: source.rate_limit,
    }
}

/// 모든 LokiStack 출력을 분할합니다.
pub fn migrate_lokistack(
    mut forwarder: ClusterLogForwarder,
    _config: &CompilerConfig,
) -> (ClusterLogForwarder, Vec<Condition>) {
    let spec = &forwarder.spec;
    let lokistacks: Vec<(&OutputSpec, &LokiStack)> = spec
        .outputs
        .iter()
        .filter_map(|o| match &o.kind {
            OutputKind::LokiStack(ls) => Some((o, ls)),
            _ => None,
        })
        .collect();
    if lokistacks.is_empty() {
        return (forwarder, Vec::new());
    }
    let is_lokistack = |name: &str| lokistacks.iter().any(|(o, _)| o.name == name);

    let mut outputs: Vec<OutputSpec> = spec
        .outputs
        .iter()
        .filter(|o| o.output_type() != OutputType::LokiStack)
        .cloned()
        .collect();
    let mut pipelines = Vec::with_capacity(spec.pipelines.len());
    let mut taken = pipeline_names(spec);

    for pipeline in &spec.pipelines {
        if !pipeline.output_refs.iter().any(|o| is_lokistack(o)) {
            pipelines.push(pipeline.clone());
            continue;
        }
        pipelines.extend(split_pipeline(pipeline, &mut taken, |output, input| {
            is_lokistack(output).then(|| format!("{output}-{input}"))
        }));

        for input in &pipeline.input_refs {
            let Some(tenant) = tenant_for_input(spec, input) else {
                tracing::debug!(input = %input, "no tenant for lokistack input");
                continue;
            };
            for (source, lokistack) in &lokistacks {
                if !pipeline.output_refs.contains(&source.name) {
                    continue;
                }
                let generated =
                    tenant_output(source, lokistack, input, tenant, forwarder.namespace());
                if !outputs.iter().any(|o| o.name == generated.name) {
                    outputs.push(generated);
                }
            }
        }
    }
    outputs.sort_by(|a, b| a.name.cmp(&b.name));

    let names: Vec<String> = lokistacks.iter().map(|(o, _)| format!("{:?}", o.name)).collect();
    let condition = migrate_output_condition(format!(
        "lokistack: {} migrated to loki output/s",
        names.join(", ")
    ));

    forwarder.spec.outputs = outputs;
    forwarder.spec.pipelines = pipelines;
    (forwarder, vec![condition])
}

#[cfg(test)]
mod tests {
    use super::*;
    use logforward_core::api::output::{
        LokiStackAuthentication, LokiStackTarget, TenantLabelKeys,
    };
    use logforward_core::api::{BearerToken, LimitSpec, PipelineSpec};

    fn lokistack_output(label_keys: Option<LokiStackLabelKeys>) -> OutputSpec {
        let mut output = OutputSpec::new(
            "ls",
            OutputKind::LokiStack(LokiStack {
                target: LokiStackTarget {
                    name: "my-loki".to_owned(),
                    namespace: Some("openshift-logging".to_owned()),
                },
                label_keys,
                data_model: Some(LokiStackDataModel::Viaq),
                authentication: Some(LokiStackAuthentication {
                    token: Some(BearerToken::service_account()),
                }),
                tuning: None,
            }),
        );
        output.rate_limit = Some(LimitSpec {
            max_records_per_second: 100,
        });
        output
    }

    fn forwarder(output: OutputSpec, inputs: &[&str]) -> ClusterLogForwarder {
        let mut clf = ClusterLogForwarder::new("openshift-logging", "collector");
        clf.spec.outputs.push(output);
        clf.spec.pipelines.push(PipelineSpec {
            name: "p".to_owned(),
            input_refs: inputs.iter().map(|s| s.to_string()).collect(),
            output_refs: vec!["ls".to_owned()],
            filter_refs: Vec::new(),
        });
        clf
    }

    fn loki(output: &OutputSpec) -> &Loki {
        match &output.kind {
            OutputKind::Loki(loki) => loki,
            other => panic!("expected loki output, got {other:?}"),
        }
    }

    #[test]
    fn per_tenant_label_keys() {
        let label_keys = LokiStackLabelKeys {
            audit: Some(TenantLabelKeys {
                ignore_global: true,
                label_keys: vec!["objectRef.apiGroup".to_owned(), "log_type".to_owned()],
            }),
            ..Default::default()
        };
        let (clf, conditions) = migrate_lokistack(
            forwarder(lokistack_output(Some(label_keys)), &["application", "audit"]),
            &CompilerConfig::default(),
        );

        let names: Vec<_> = clf.spec.outputs.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["ls-application", "ls-audit"]);

        let app = loki(&clf.spec.outputs[0]);
        assert_eq!(
            app.url,
            "https://my-loki-gateway-http.openshift-logging.svc:8080/api/logs/v1/application"
        );
        assert!(app.label_keys.is_empty());

        let audit = loki(&clf.spec.outputs[1]);
        assert!(audit.url.ends_with("/api/logs/v1/audit"));
        assert_eq!(audit.label_keys, vec!["log_type", "objectRef.apiGroup"]);
        assert_eq!(
            audit.authentication.as_ref().unwrap().token,
            Some(BearerToken::service_account())
        );
        assert_eq!(clf.spec.outputs[1].rate_limit.unwrap().max_records_per_second, 100);

        assert_eq!(clf.spec.pipelines.len(), 2);
        assert_eq!(clf.spec.pipelines[1].name, "p-1");
        assert_eq!(clf.spec.pipelines[1].output_refs, vec!["ls-audit"]);
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].message, "lokistack: \"ls\" migrated to loki output/s");
    }

    #[test]
    fn fans_out_three_tenants() {
        let (clf, _) = migrate_lokistack(
            forwarder(lokistack_output(None), &["application", "audit", "infrastructure"]),
            &CompilerConfig::default(),
        );
        assert_eq!(clf.spec.outputs.len(), 3);
        assert_eq!(clf.spec.pipelines.len(), 3);
        for pipeline in &clf.spec.pipelines {
            assert_eq!(pipeline.input_refs.len(), 1);
            let output = clf.spec.output(&pipeline.output_refs[0]).unwrap();
            assert!(loki(output).url.ends_with(&pipeline.input_refs[0]));
        }
    }

    #[test]
    fn otel_data_model_produces_otlp_outputs() {
        let mut output = lokistack_output(None);
        if let OutputKind::LokiStack(ls) = &mut output.kind {
            ls.data_model = Some(LokiStackDataModel::Otel);
            ls.target.namespace = None;
        }
        let (clf, _) =
            migrate_lokistack(forwarder(output, &["application"]), &CompilerConfig::default());
        match &clf.spec.outputs[0].kind {
            OutputKind::Otlp(otlp) => assert_eq!(
                otlp.url,
                "https://my-loki-gateway-http.openshift-logging.svc:8080/api/logs/v1/application/otlp/v1/logs"
            ),
            other => panic!("expected otlp output, got {other:?}"),
        }
    }

    #[test]
    fn unreferenced_lokistack_is_removed() {
        let mut clf = forwarder(lokistack_output(None), &["application"]);
        clf.spec.pipelines.clear();
        let (clf, conditions) = migrate_lokistack(clf, &CompilerConfig::default());
        assert!(clf.spec.outputs.is_empty());
        assert_eq!(conditions.len(), 1);
    }

    #[test]
    fn label_key_resolution_rules() {
        let defaults = ["a", "b"];
        let tenant = |ignore_global: bool, keys: &[&str]| TenantLabelKeys {
            ignore_global,
            label_keys: keys.iter().map(|s| s.to_string()).collect(),
        };

        // 전역도 테넌트 목록도 없으면 기본값 사용 신호
        let keys = LokiStackLabelKeys {
            application: Some(tenant(false, &[])),
            ..Default::default()
        };
        assert!(label_keys_for_tenant(Some(&keys), "application", &defaults).is_empty());

        // 테넌트 목록만 있으면 기본값과 합침
        let keys = LokiStackLabelKeys {
            application: Some(tenant(false, &["c"])),
            ..Default::default()
        };
        assert_eq!(
            label_keys_for_tenant(Some(&keys), "application", &defaults),
            vec!["a", "b", "c"]
        );

        // 전역이 있으면 기본값 대신 전역
        let keys = LokiStackLabelKeys {
            global: vec!["g".to_owned(), "c".to_owned()],
            application: Some(tenant(false, &["c"])),
            ..Default::default()
        };
        assert_eq!(
            label_keys_for_tenant(Some(&keys), "application", &defaults),
            vec!["c", "g"]
        );
        assert_eq!(
            label_keys_for_tenant(Some(&keys), "audit", &defaults),
            vec!["c", "g"]
        );

        // ignoreGlobal이면 테넌트 목록만
        let keys = LokiStackLabelKeys {
            global: vec!["g".to_owned()],
            application: Some(tenant(true, &["x"])),
            ..Default::default()
        };
        assert_eq!(
            label_keys_for_tenant(Some(&keys), "application", &defaults),
            vec!["x"]
        );
    }
}
