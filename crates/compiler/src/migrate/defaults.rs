//! 기본값 채우기 단계

use std::collections::BTreeMap;

use logforward_core::api::forwarder::{ANNOTATION_ENABLE_OTLP, ResourceRequirements};
use logforward_core::api::output::LokiStackDataModel;
use logforward_core::api::{ClusterLogForwarder, CollectorSpec, Condition, OutputKind, Quantity};

use crate::config::CompilerConfig;

/// 서비스 어카운트 토큰 audience 기본값
pub const DEFAULT_AUDIENCE: &str = "openshift";

/// audience가 비어 있으면 `openshift`로 설정합니다.
pub fn init_service_account(
    mut forwarder: ClusterLogForwarder,
    _config: &CompilerConfig,
) -> (ClusterLogForwarder, Vec<Condition>) {
    let audience = &mut forwarder.spec.service_account.audience;
    if audience.as_deref().is_none_or(str::is_empty) {
        *audience = Some(DEFAULT_AUDIENCE.to_owned());
    }
    (forwarder, Vec::new())
}

/// LokiStack 데이터 모델 기본값
///
/// OTLP tech-preview 어노테이션이 켜져 있으면 `Otel`, 아니면 `Viaq`.
pub fn migrate_outputs(
    mut forwarder: ClusterLogForwarder,
    _config: &CompilerConfig,
) -> (ClusterLogForwarder, Vec<Condition>) {
    let model = if forwarder.annotation_enabled(ANNOTATION_ENABLE_OTLP) {
        LokiStackDataModel::Otel
    } else {
        LokiStackDataModel::Viaq
    };
    for output in &mut forwarder.spec.outputs {
        if let OutputKind::LokiStack(lokistack) = &mut output.kind {
            lokistack.data_model.get_or_insert(model);
        }
    }
    (forwarder, Vec::new())
}

/// LokiStack `tuning.maxWrite` 기본값
pub fn init_loki_outputs(
    mut forwarder: ClusterLogForwarder,
    config: &CompilerConfig,
) -> (ClusterLogForwarder, Vec<Condition>) {
    for output in &mut forwarder.spec.outputs {
        if let OutputKind::LokiStack(lokistack) = &mut output.kind {
            lokistack
                .tuning
                .get_or_insert_with(Default::default)
                .max_write
                .get_or_insert_with(|| Quantity::new(config.lokistack_max_write.clone()));
        }
    }
    (forwarder, Vec::new())
}

/// 수집기 리소스 요청/제한 기본값
pub fn init_resources(
    mut forwarder: ClusterLogForwarder,
    config: &CompilerConfig,
) -> (ClusterLogForwarder, Vec<Condition>) {
    let collector = forwarder
        .spec
        .collector
        .get_or_insert_with(CollectorSpec::default);
    if collector.resources.as_ref().is_none_or(ResourceRequirements::is_empty) {
        collector.resources = Some(ResourceRequirements {
            requests: BTreeMap::from([
                ("cpu".to_owned(), config.cpu_request.clone()),
                ("memory".to_owned(), config.memory_request.clone()),
            ]),
            limits: BTreeMap::from([("memory".to_owned(), config.memory_limit.clone())]),
        });
    }
    (forwarder, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use logforward_core::api::OutputSpec;
    use logforward_core::api::output::{LokiStack, LokiStackTarget};

    fn with_lokistack() -> ClusterLogForwarder {
        let mut clf = ClusterLogForwarder::new("openshift-logging", "collector");
        clf.spec.outputs.push(OutputSpec::new(
            "ls",
            OutputKind::LokiStack(LokiStack {
                target: LokiStackTarget {
                    name: "lokistack-dev".to_owned(),
                    namespace: None,
                },
                ..Default::default()
            }),
        ));
        clf
    }

    fn lokistack(clf: &ClusterLogForwarder) -> &LokiStack {
        match &clf.spec.outputs[0].kind {
            OutputKind::LokiStack(ls) => ls,
            other => panic!("unexpected output kind {other:?}"),
        }
    }

    #[test]
    fn audience_defaults_to_openshift() {
        let (clf, _) = init_service_account(
            ClusterLogForwarder::new("ns", "clf"),
            &CompilerConfig::default(),
        );
        assert_eq!(clf.spec.service_account.audience.as_deref(), Some("openshift"));
    }

    #[test]
    fn audience_is_kept_when_set() {
        let mut clf = ClusterLogForwarder::new("ns", "clf");
        clf.spec.service_account.audience = Some("custom".to_owned());
        let (clf, _) = init_service_account(clf, &CompilerConfig::default());
        assert_eq!(clf.spec.service_account.audience.as_deref(), Some("custom"));
    }

    #[test]
    fn data_model_follows_otlp_annotation() {
        let config = CompilerConfig::default();
        let (clf, _) = migrate_outputs(with_lokistack(), &config);
        assert_eq!(lokistack(&clf).data_model, Some(LokiStackDataModel::Viaq));

        let mut annotated = with_lokistack();
        annotated
            .metadata
            .annotations
            .insert(ANNOTATION_ENABLE_OTLP.to_owned(), "Enabled".to_owned());
        let (clf, _) = migrate_outputs(annotated, &config);
        assert_eq!(lokistack(&clf).data_model, Some(LokiStackDataModel::Otel));
    }

    #[test]
    fn explicit_data_model_is_kept() {
        let mut clf = with_lokistack();
        if let OutputKind::LokiStack(ls) = &mut clf.spec.outputs[0].kind {
            ls.data_model = Some(LokiStackDataModel::Otel);
        }
        let (clf, _) = migrate_outputs(clf, &CompilerConfig::default());
        assert_eq!(lokistack(&clf).data_model, Some(LokiStackDataModel::Otel));
    }

    #[test]
    fn lokistack_max_write_default() {
        let (clf, _) = init_loki_outputs(with_lokistack(), &CompilerConfig::default());
        let tuning = lokistack(&clf).tuning.as_ref().unwrap();
        assert_eq!(tuning.max_write.as_ref().map(Quantity::as_str), Some("10M"));
    }

    #[test]
    fn resources_filled_only_when_absent() {
        let config = CompilerConfig::default();
        let (clf, _) = init_resources(ClusterLogForwarder::new("ns", "clf"), &config);
        let resources = clf.spec.collector.unwrap().resources.unwrap();
        assert_eq!(resources.requests.get("cpu"), Some(&config.cpu_request));
        assert_eq!(resources.limits.get("memory"), Some(&config.memory_limit));

        let mut custom = ClusterLogForwarder::new("ns", "clf");
        custom.spec.collector = Some(CollectorSpec {
            resources: Some(ResourceRequirements {
                requests: BTreeMap::from([("cpu".to_owned(), "1".to_owned())]),
                limits: BTreeMap::new(),
            }),
            ..Default::default()
        });
        let (clf, _) = init_resources(custom, &config);
        let resources = clf.spec.collector.unwrap().resources.unwrap();
        assert_eq!(resources.requests.len(), 1);
        assert!(resources.limits.is_empty());
    }
}
