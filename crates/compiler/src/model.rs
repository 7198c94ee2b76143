//! 정규화 모델 -- 마이그레이션된 포워더의 이름 색인
//!
//! 생성기는 스펙을 직접 순회하지 않고 [`ForwarderModel`]을 통해 요소를 찾습니다.
//! 모델은 다음을 함께 계산합니다.
//!
//! - 요소 이름 색인 (입력, 출력, 필터, 파이프라인)
//! - 출력별 싱크 튜닝 ([`SinkTuning`])
//! - 수집기 파드가 마운트해야 할 시크릿/컨피그맵 이름
//! - 자격증명 파일이 필요한 AWS 역할 인증 출력
//!
//! 수집기 컴포넌트 ID는 `input_<name>`, `output_<name>`, `filter_<name>_<index>`
//! 형식이며 이름의 `[a-z0-9_]` 밖 문자는 `_`로 바뀝니다.

use std::collections::{BTreeMap, BTreeSet};

use logforward_core::api::{
    ClusterLogForwarder, DeliveryMode, FilterSpec, InputKind, InputSpec, OutputSpec,
    PipelineSpec, ValueSource,
};

use crate::aws;
use crate::migrate::inputs::receiver_secret_name;
use crate::secrets::{output_secret_refs, output_value_refs};
use crate::tls::{config_maps_for_tls, secrets_for_tls};

// ─── 컴포넌트 ID ─────────────────────────────────────────────────────

/// 요소 이름을 컴포넌트 ID 조각으로 바꿉니다 (소문자, `[a-z0-9_]`).
pub fn component_id(name: &str) -> String {
    name.chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' }
        })
        .collect()
}

pub fn input_id(name: &str) -> String {
    format!("input_{}", component_id(name))
}

pub fn output_id(name: &str) -> String {
    format!("output_{}", component_id(name))
}

/// 파이프라인 `index` 안의 필터 트랜스폼 ID
pub fn filter_id(name: &str, index: usize) -> String {
    format!("filter_{}_{index}", component_id(name))
}

// ─── 튜닝 ────────────────────────────────────────────────────────────

/// 출력 튜닝에서 계산한 싱크 파라미터
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkTuning {
    pub delivery: Option<DeliveryMode>,
    /// `batch.max_bytes`
    pub max_bytes: Option<u64>,
    pub retry_initial_backoff_secs: Option<u64>,
    pub retry_max_duration_secs: Option<u64>,
    /// `none`은 생략됩니다.
    pub compression: Option<String>,
}

impl SinkTuning {
    pub fn from_output(output: &OutputSpec) -> Self {
        let Some(tuning) = output.tuning() else {
            return Self::default();
        };
        Self {
            delivery: tuning.delivery,
            max_bytes: tuning.max_write.as_ref().and_then(|q| q.as_bytes()),
            retry_initial_backoff_secs: tuning.min_retry_duration.filter(|s| *s > 0),
            retry_max_duration_secs: tuning.max_retry_duration.filter(|s| *s > 0),
            compression: tuning
                .compression
                .clone()
                .filter(|c| !c.is_empty() && c != "none"),
        }
    }
}

// ─── 모델 ────────────────────────────────────────────────────────────

/// 마이그레이션된 포워더의 색인
#[derive(Debug)]
pub struct ForwarderModel<'a> {
    pub forwarder: &'a ClusterLogForwarder,
    pub inputs: BTreeMap<&'a str, &'a InputSpec>,
    pub outputs: BTreeMap<&'a str, &'a OutputSpec>,
    pub filters: BTreeMap<&'a str, &'a FilterSpec>,
    pub pipelines: BTreeMap<&'a str, &'a PipelineSpec>,
    pub tuning: BTreeMap<&'a str, SinkTuning>,
}

impl<'a> ForwarderModel<'a> {
    pub fn new(forwarder: &'a ClusterLogForwarder) -> Self {
        let spec = &forwarder.spec;
        Self {
            forwarder,
            inputs: spec.inputs.iter().map(|i| (i.name.as_str(), i)).collect(),
            outputs: spec.outputs.iter().map(|o| (o.name.as_str(), o)).collect(),
            filters: spec.filters.iter().map(|f| (f.name.as_str(), f)).collect(),
            pipelines: spec.pipelines.iter().map(|p| (p.name.as_str(), p)).collect(),
            tuning: spec
                .outputs
                .iter()
                .map(|o| (o.name.as_str(), SinkTuning::from_output(o)))
                .collect(),
        }
    }

    pub fn service_account(&self) -> &str {
        &self.forwarder.spec.service_account.name
    }

    /// 파이프라인이 참조하는 입력 (이름순, 중복 없음)
    pub fn referenced_inputs(&self) -> Vec<&'a InputSpec> {
        let names: BTreeSet<&str> = self
            .forwarder
            .spec
            .pipelines
            .iter()
            .flat_map(|p| p.input_refs.iter().map(String::as_str))
            .collect();
        names
            .into_iter()
            .filter_map(|n| self.inputs.get(n).copied())
            .collect()
    }

    /// 출력을 참조하는 파이프라인과 스펙상 위치
    pub fn pipelines_for_output(&self, output: &str) -> Vec<(usize, &'a PipelineSpec)> {
        self.forwarder
            .spec
            .pipelines
            .iter()
            .enumerate()
            .filter(|(_, p)| p.output_refs.iter().any(|r| r == output))
            .collect()
    }

    /// 수집기 파드가 마운트할 시크릿 이름
    pub fn secret_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for output in self.outputs.values() {
            names.extend(
                output_secret_refs(output, self.service_account())
                    .into_iter()
                    .map(|r| r.secret_name),
            );
            names.extend(output_value_refs(output).iter().filter_map(|r| match r.source() {
                Some(ValueSource::Secret(name)) => Some(name.to_owned()),
                _ => None,
            }));
        }
        for input in self.referenced_inputs() {
            if let InputKind::Receiver(receiver) = &input.kind {
                match receiver.tls.as_ref().filter(|t| !t.is_empty()) {
                    Some(tls) => names.extend(secrets_for_tls(tls)),
                    None => {
                        names.insert(receiver_secret_name(self.forwarder.name(), &input.name));
                    }
                }
            }
        }
        names
    }

    /// 수집기 파드가 마운트할 컨피그맵 이름
    pub fn config_map_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for output in self.outputs.values() {
            names.extend(output_value_refs(output).iter().filter_map(|r| match r.source() {
                Some(ValueSource::ConfigMap(name)) => Some(name.to_owned()),
                _ => None,
            }));
        }
        for input in self.referenced_inputs() {
            if let InputKind::Receiver(receiver) = &input.kind
                && let Some(tls) = &receiver.tls
            {
                names.extend(config_maps_for_tls(tls));
            }
        }
        if !self.role_outputs().is_empty() {
            names.insert(aws::credentials_config_map_name(self.forwarder.name()));
        }
        names
    }

    /// 자격증명 파일이 필요한 출력
    pub fn role_outputs(&self) -> Vec<&'a OutputSpec> {
        aws::role_outputs(self.forwarder)
    }
}
