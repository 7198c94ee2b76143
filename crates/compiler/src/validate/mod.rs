//! 검증기 -- 마이그레이션된 포워더의 요소별 컨디션 생성
//!
//! 사용자 스펙의 문제는 에러가 아니라 `False` 컨디션으로 보고됩니다.
//! 요소마다 정확히 하나의 컨디션(`ValidInput-<name>` 등)이 만들어지며,
//! 한 요소에서 여러 문제가 발견되면 첫 번째 실패만 보고합니다.
//!
//! # 순서
//! 1. 어노테이션 ([`annotations`])
//! 2. 입력/출력/필터 ([`inputs`], [`outputs`], [`filters`])
//! 3. 파이프라인 ([`pipelines`])
//! 4. 권한 ([`permissions`], 비동기)
//!
//! LokiStack OTLP 게이팅([`lokistack`])은 LokiStack 출력이 사라지기 전의
//! 원본 포워더를 대상으로 합니다.

pub mod annotations;
pub mod filters;
pub mod inputs;
pub mod lokistack;
pub mod names;
pub mod outputs;
pub mod permissions;
pub mod pipelines;

use std::collections::BTreeSet;

use logforward_core::api::condition::{
    CONDITION_PREFIX_VALID_FILTER, CONDITION_PREFIX_VALID_INPUT, CONDITION_PREFIX_VALID_OUTPUT,
    CONDITION_PREFIX_VALID_PIPELINE, REASON_VALIDATION_FAILURE, REASON_VALIDATION_SUCCESS,
    element_condition_type, set_condition,
};
use logforward_core::api::{
    ClusterLogForwarder, Condition, ConditionStatus, ForwarderSpec, ForwarderStatus,
};
use tracing::debug;

use crate::secrets::{LookupError, SecretSnapshot};

/// 검증 실패 하나 (사유 + 메시지)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub reason: &'static str,
    pub message: String,
}

impl Failure {
    pub fn new(reason: &'static str, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }

    /// `ValidationFailure` 사유의 실패
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(REASON_VALIDATION_FAILURE, message)
    }
}

impl From<LookupError> for Failure {
    fn from(err: LookupError) -> Self {
        Self::new(err.reason(), err.to_string())
    }
}

/// 요소 검증 결과
pub type Outcome = Result<(), Failure>;

/// 요소 컨디션 (`True` / `ValidationSuccess`)
pub fn element_valid(prefix: &str, kind: &str, name: &str) -> Condition {
    Condition::new(
        element_condition_type(prefix, name),
        ConditionStatus::True,
        REASON_VALIDATION_SUCCESS,
        format!("{kind} {name:?} is valid"),
    )
}

/// 요소 컨디션 (`False`)
pub fn element_invalid(prefix: &str, name: &str, failure: Failure) -> Condition {
    Condition::invalid(
        element_condition_type(prefix, name),
        failure.reason,
        failure.message,
    )
}

fn element_condition(prefix: &str, kind: &str, name: &str, outcome: Outcome) -> Condition {
    match outcome {
        Ok(()) => element_valid(prefix, kind, name),
        Err(failure) => {
            debug!(element = kind, name = %name, reason = failure.reason, message = %failure.message, "validation failed");
            element_invalid(prefix, name, failure)
        }
    }
}

/// 파이프라인이 참조하는 요소 이름
#[derive(Debug, Default)]
pub struct References<'a> {
    pub inputs: BTreeSet<&'a str>,
    pub outputs: BTreeSet<&'a str>,
    pub filters: BTreeSet<&'a str>,
}

pub fn referenced_names(spec: &ForwarderSpec) -> References<'_> {
    let mut refs = References::default();
    for pipeline in &spec.pipelines {
        refs.inputs.extend(pipeline.input_refs.iter().map(String::as_str));
        refs.outputs.extend(pipeline.output_refs.iter().map(String::as_str));
        refs.filters.extend(pipeline.filter_refs.iter().map(String::as_str));
    }
    refs
}

fn unreferenced(kind: &str, name: &str) -> Failure {
    Failure::invalid(format!("{kind} {name:?} not referenced by any pipeline"))
}

/// 동기 검증을 모두 수행합니다.
///
/// `original`은 마이그레이션 전 포워더로, LokiStack 게이팅에만 쓰입니다.
/// 결과의 `conditions`에는 어노테이션/LokiStack 컨디션만 들어갑니다.
/// `Authorized`, `Ready`, `Valid`는 권한 검사와 상태 합성 단계에서 채워집니다.
pub fn validate(
    original: &ClusterLogForwarder,
    migrated: &ClusterLogForwarder,
    secrets: &SecretSnapshot,
) -> ForwarderStatus {
    let mut status = ForwarderStatus::default();
    for condition in annotations::validate_annotations(migrated) {
        set_condition(&mut status.conditions, condition);
    }
    for condition in lokistack::validate_lokistack(original) {
        // 토큰이 없는 LokiStack은 원래 이름의 출력 컨디션으로 보고됩니다.
        if condition
            .condition_type
            .starts_with(CONDITION_PREFIX_VALID_OUTPUT)
        {
            set_condition(&mut status.outputs, condition);
        } else {
            set_condition(&mut status.conditions, condition);
        }
    }

    let spec = &migrated.spec;
    let refs = referenced_names(spec);
    let service_account = spec.service_account.name.as_str();

    let mut seen = BTreeSet::new();
    for input in &spec.inputs {
        let outcome = names::check_element_name(&input.name, &mut seen)
            .and_then(|()| {
                if refs.inputs.contains(input.name.as_str()) {
                    Ok(())
                } else {
                    Err(unreferenced("input", &input.name))
                }
            })
            .and_then(|()| inputs::validate_input(input, secrets));
        set_condition(
            &mut status.inputs,
            element_condition(CONDITION_PREFIX_VALID_INPUT, "input", &input.name, outcome),
        );
    }

    let mut seen = BTreeSet::new();
    for output in &spec.outputs {
        let outcome = names::check_element_name(&output.name, &mut seen)
            .and_then(|()| {
                if refs.outputs.contains(output.name.as_str()) {
                    Ok(())
                } else {
                    Err(unreferenced("output", &output.name))
                }
            })
            .and_then(|()| outputs::validate_output(migrated, output, secrets, service_account));
        set_condition(
            &mut status.outputs,
            element_condition(CONDITION_PREFIX_VALID_OUTPUT, "output", &output.name, outcome),
        );
    }

    let mut seen = BTreeSet::new();
    for filter in &spec.filters {
        let outcome = names::check_element_name(&filter.name, &mut seen)
            .and_then(|()| {
                if refs.filters.contains(filter.name.as_str()) {
                    Ok(())
                } else {
                    Err(unreferenced("filter", &filter.name))
                }
            })
            .and_then(|()| filters::validate_filter(filter));
        set_condition(
            &mut status.filters,
            element_condition(CONDITION_PREFIX_VALID_FILTER, "filter", &filter.name, outcome),
        );
    }

    let mut seen = BTreeSet::new();
    for pipeline in &spec.pipelines {
        let outcome = names::check_element_name(&pipeline.name, &mut seen)
            .and_then(|()| pipelines::validate_pipeline(spec, pipeline));
        set_condition(
            &mut status.pipelines,
            element_condition(
                CONDITION_PREFIX_VALID_PIPELINE,
                "pipeline",
                &pipeline.name,
                outcome,
            ),
        );
    }

    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use logforward_core::api::output::Http;
    use logforward_core::api::{InputSpec, OutputKind, OutputSpec, PipelineSpec};

    fn forwarder() -> ClusterLogForwarder {
        let mut clf = ClusterLogForwarder::new("openshift-logging", "collector");
        clf.spec.service_account.name = "collector".to_owned();
        clf.spec.inputs.push(InputSpec::reserved("application").unwrap());
        clf.spec.outputs.push(OutputSpec::new(
            "http-out",
            OutputKind::Http(Http {
                url: "https://collector.example.com:8443".to_owned(),
                ..Default::default()
            }),
        ));
        clf.spec.pipelines.push(PipelineSpec {
            name: "app-to-http".to_owned(),
            input_refs: vec!["application".to_owned()],
            output_refs: vec!["http-out".to_owned()],
            filter_refs: Vec::new(),
        });
        clf
    }

    #[test]
    fn valid_forwarder_has_true_element_conditions() {
        let clf = forwarder();
        let status = validate(&clf, &clf, &SecretSnapshot::new());
        assert_eq!(status.inputs.len(), 1);
        assert_eq!(status.outputs.len(), 1);
        assert_eq!(status.pipelines.len(), 1);
        assert!(status.all_conditions().all(Condition::is_true));
        assert_eq!(status.outputs[0].message, "output \"http-out\" is valid");
    }

    #[test]
    fn unreferenced_output_is_invalid() {
        let mut clf = forwarder();
        clf.spec.outputs.push(OutputSpec::new(
            "unused",
            OutputKind::Http(Http {
                url: "https://other.example.com".to_owned(),
                ..Default::default()
            }),
        ));
        let status = validate(&clf, &clf, &SecretSnapshot::new());
        let unused = status
            .outputs
            .iter()
            .find(|c| c.condition_type == "ValidOutput-unused")
            .unwrap();
        assert!(unused.is_false());
        assert_eq!(unused.reason, REASON_VALIDATION_FAILURE);
        assert!(unused.message.contains("not referenced by any pipeline"));
    }

    #[test]
    fn duplicate_names_collapse_into_one_failed_condition() {
        let mut clf = forwarder();
        clf.spec.inputs.push(InputSpec::reserved("application").unwrap());
        let status = validate(&clf, &clf, &SecretSnapshot::new());
        assert_eq!(status.inputs.len(), 1);
        assert!(status.inputs[0].is_false());
        assert!(status.inputs[0].message.contains("duplicate name"));
    }
}
