//! 포워더 텔레메트리 gauge
//!
//! 입력/출력 유형별로 `"1"`/`"0"` 레이블을 붙인 presence gauge를 기록합니다.

use logforward_core::api::ClusterLogForwarder;
use logforward_core::metrics::{
    FORWARDER_INPUT_INFO, FORWARDER_OUTPUT_INFO, FORWARDER_PIPELINE_INFO, INPUT_TYPE_LABELS,
    IS_NOT_PRESENT, IS_PRESENT, OUTPUT_TYPE_LABELS,
};
use metrics::Label;

use crate::migrate::elasticsearch::DEFAULT_ES_NAME;

fn presence(present: bool) -> &'static str {
    if present { IS_PRESENT } else { IS_NOT_PRESENT }
}

/// 입력 유형 레이블
pub fn input_labels(forwarder: &ClusterLogForwarder) -> Vec<(&'static str, &'static str)> {
    let spec = &forwarder.spec;
    let used = |label: &str| {
        spec.pipelines
            .iter()
            .flat_map(|p| &p.input_refs)
            .any(|name| {
                name == label
                    || spec
                        .input(name)
                        .is_some_and(|input| input.input_type().as_str() == label)
            })
    };
    INPUT_TYPE_LABELS
        .iter()
        .map(|label| (*label, presence(used(label))))
        .collect()
}

/// 출력 유형 레이블. `default`는 기본 이름의 출력, `fluentdForward`는 항상 `"0"`입니다.
pub fn output_labels(forwarder: &ClusterLogForwarder) -> Vec<(&'static str, &'static str)> {
    let outputs = &forwarder.spec.outputs;
    OUTPUT_TYPE_LABELS
        .iter()
        .map(|label| {
            let present = match *label {
                "default" => outputs.iter().any(|o| o.name == DEFAULT_ES_NAME),
                other => outputs.iter().any(|o| o.output_type().as_str() == other),
            };
            (*label, presence(present))
        })
        .collect()
}

fn to_labels(pairs: Vec<(&'static str, &'static str)>) -> Vec<Label> {
    pairs.into_iter().map(|(k, v)| Label::new(k, v)).collect()
}

/// 사용자가 작성한 (마이그레이션 전) 포워더의 gauge를 갱신합니다.
pub fn update(forwarder: &ClusterLogForwarder, healthy: bool) {
    metrics::gauge!(FORWARDER_INPUT_INFO, to_labels(input_labels(forwarder))).set(1.0);
    metrics::gauge!(FORWARDER_OUTPUT_INFO, to_labels(output_labels(forwarder))).set(1.0);
    let pipelines = forwarder.spec.pipelines.len().to_string();
    metrics::gauge!(
        FORWARDER_PIPELINE_INFO,
        "healthStatus" => presence(healthy),
        "pipelineInfo" => pipelines
    )
    .set(1.0);
}
