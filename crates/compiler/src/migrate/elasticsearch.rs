//! `default` Elasticsearch 출력을 테넌트별 인덱스 출력으로 분할

use logforward_core::api::input::{INPUT_APPLICATION, INPUT_AUDIT, INPUT_INFRASTRUCTURE};
use logforward_core::api::{ClusterLogForwarder, Condition, OutputKind, OutputSpec};

use super::{migrate_output_condition, pipeline_names, split_pipeline, tenant_for_input};
use crate::config::CompilerConfig;

/// 분할 대상 출력 이름
pub const DEFAULT_ES_NAME: &str = "default";

pub const APP_INDEX: &str = "app-write";
pub const INFRA_INDEX: &str = "infra-write";
pub const AUDIT_INDEX: &str = "audit-write";

/// 테넌트의 쓰기 인덱스
pub fn index_for_tenant(tenant: &str) -> Option<&'static str> {
    match tenant {
        INPUT_APPLICATION => Some(APP_INDEX),
        INPUT_INFRASTRUCTURE => Some(INFRA_INDEX),
        INPUT_AUDIT => Some(AUDIT_INDEX),
        _ => None,
    }
}

/// `default` ES 출력을 참조하는 파이프라인을 입력별로 나누고 `default-<input>` 출력을 만듭니다.
pub fn default_elasticsearch(
    mut forwarder: ClusterLogForwarder,
    _config: &CompilerConfig,
) -> (ClusterLogForwarder, Vec<Condition>) {
    let spec = &forwarder.spec;
    let Some(default) = spec
        .outputs
        .iter()
        .find(|o| o.name == DEFAULT_ES_NAME && matches!(o.kind, OutputKind::Elasticsearch(_)))
    else {
        return (forwarder, Vec::new());
    };
    let OutputKind::Elasticsearch(es) = &default.kind else {
        return (forwarder, Vec::new());
    };

    let mut outputs: Vec<OutputSpec> = spec
        .outputs
        .iter()
        .filter(|o| o.name != DEFAULT_ES_NAME)
        .cloned()
        .collect();
    let mut pipelines = Vec::with_capacity(spec.pipelines.len());
    let mut taken = pipeline_names(spec);
    let mut generated = Vec::new();

    for pipeline in &spec.pipelines {
        if !pipeline.output_refs.iter().any(|o| o == DEFAULT_ES_NAME) {
            pipelines.push(pipeline.clone());
            continue;
        }
        pipelines.extend(split_pipeline(pipeline, &mut taken, |output, input| {
            (output == DEFAULT_ES_NAME).then(|| format!("{output}-{input}"))
        }));
        for input in &pipeline.input_refs {
            let Some(index) = tenant_for_input(spec, input).and_then(index_for_tenant) else {
                tracing::debug!(input = %input, "no tenant index for default elasticsearch input");
                continue;
            };
            let name = format!("{DEFAULT_ES_NAME}-{input}");
            if outputs.iter().any(|o| o.name == name) {
                continue;
            }
            let mut tenant_es = es.clone();
            tenant_es.index = index.to_owned();
            outputs.push(OutputSpec {
                name: name.clone(),
                kind: OutputKind::Elasticsearch(tenant_es),
                tls: default.tls.clone(),
                rate_limit: default.rate_limit,
            });
            generated.push(name);
        }
    }

    if generated.is_empty() {
        return (forwarder, Vec::new());
    }
    let condition = migrate_output_condition(format!(
        "elasticsearch: {DEFAULT_ES_NAME:?} migrated to output/s {}",
        generated.join(", ")
    ));
    forwarder.spec.outputs = outputs;
    forwarder.spec.pipelines = pipelines;
    (forwarder, vec![condition])
}

#[cfg(test)]
mod tests {
    use super::*;
    use logforward_core::api::output::Elasticsearch;
    use logforward_core::api::{OutputTlsSpec, PipelineSpec, TlsSpec, ValueReference};

    fn forwarder(inputs: &[&str]) -> ClusterLogForwarder {
        let mut clf = ClusterLogForwarder::new("openshift-logging", "collector");
        let mut output = OutputSpec::new(
            DEFAULT_ES_NAME,
            OutputKind::Elasticsearch(Elasticsearch {
                url: "https://elasticsearch:9200".to_owned(),
                version: Some(6),
                index: "{.log_type||\"none\"}".to_owned(),
                ..Default::default()
            }),
        );
        output.tls = Some(OutputTlsSpec {
            tls: TlsSpec {
                ca: Some(ValueReference::from_secret("collector", "ca-bundle.crt")),
                ..Default::default()
            },
            ..Default::default()
        });
        clf.spec.outputs.push(output);
        clf.spec.outputs.push(OutputSpec::new(
            "es-out",
            OutputKind::Elasticsearch(Elasticsearch {
                url: "https://other:9200".to_owned(),
                ..Default::default()
            }),
        ));
        clf.spec.pipelines.push(PipelineSpec {
            name: "p".to_owned(),
            input_refs: inputs.iter().map(|s| s.to_string()).collect(),
            output_refs: vec![DEFAULT_ES_NAME.to_owned(), "es-out".to_owned()],
            filter_refs: Vec::new(),
        });
        clf
    }

    fn index(output: &OutputSpec) -> &str {
        match &output.kind {
            OutputKind::Elasticsearch(es) => &es.index,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn splits_into_tenant_indices() {
        let (clf, conditions) = default_elasticsearch(
            forwarder(&["application", "audit", "infrastructure"]),
            &CompilerConfig::default(),
        );
        let names: Vec<_> = clf.spec.outputs.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "es-out",
                "default-application",
                "default-audit",
                "default-infrastructure"
            ]
        );
        assert_eq!(index(&clf.spec.outputs[1]), APP_INDEX);
        assert_eq!(index(&clf.spec.outputs[2]), AUDIT_INDEX);
        assert_eq!(index(&clf.spec.outputs[3]), INFRA_INDEX);
        assert!(clf.spec.outputs[1].tls.is_some());

        let pipeline_names: Vec<_> = clf.spec.pipelines.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(pipeline_names, vec!["p", "p-1", "p-2"]);
        assert_eq!(
            clf.spec.pipelines[2].output_refs,
            vec!["default-infrastructure", "es-out"]
        );
        assert_eq!(conditions.len(), 1);
    }

    #[test]
    fn unreferenced_default_is_left_alone() {
        let mut clf = forwarder(&["application"]);
        clf.spec.pipelines[0].output_refs = vec!["es-out".to_owned()];
        let before = clf.clone();
        let (after, conditions) = default_elasticsearch(clf, &CompilerConfig::default());
        assert_eq!(before, after);
        assert!(conditions.is_empty());
    }

    #[test]
    fn non_default_names_are_untouched() {
        let mut clf = forwarder(&["application"]);
        clf.spec.outputs[0].name = "es-main".to_owned();
        clf.spec.pipelines[0].output_refs = vec!["es-main".to_owned()];
        let before = clf.clone();
        let (after, conditions) = default_elasticsearch(clf, &CompilerConfig::default());
        assert_eq!(before, after);
        assert!(conditions.is_empty());
    }
}
