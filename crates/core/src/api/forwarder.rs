//! ClusterLogForwarder 루트 리소스
//!
//! 사용자가 작성한 포워더 문서를 YAML/JSON에서 읽고 다시 쓰는 타입입니다.
//! 마이그레이션은 [`ClusterLogForwarder`]를 값으로 받아 새 값을 돌려주므로
//! 모든 타입이 `Clone`을 구현합니다.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::filter::FilterSpec;
use super::input::InputSpec;
use super::output::OutputSpec;

// ─── 어노테이션 ──────────────────────────────────────────────────────

/// OTLP 출력 / Otel LokiStack 기술 프리뷰 활성화
pub const ANNOTATION_ENABLE_OTLP: &str = "observability.openshift.io/tech-preview-otlp-output";

/// S3 출력 기술 프리뷰 활성화
pub const ANNOTATION_ENABLE_S3: &str = "observability.openshift.io/tech-preview-s3-output";

/// 수집기 로그 레벨
pub const ANNOTATION_LOG_LEVEL: &str = "observability.openshift.io/log-level";

/// 데몬셋 롤아웃 최대 불가용 비율
pub const ANNOTATION_MAX_UNAVAILABLE: &str =
    "observability.openshift.io/max-unavailable-rollout";

/// kube API 캐시 사용
pub const ANNOTATION_USE_KUBE_CACHE: &str = "observability.openshift.io/use-kube-cache";

/// 수집기를 디플로이먼트로 배포
pub const ANNOTATION_ENABLE_COLLECTOR_AS_DEPLOYMENT: &str =
    "observability.openshift.io/enable-collector-as-deployment";

/// 활성 값(`true`/`enabled`, 대소문자 무시)인지 확인합니다.
pub fn is_enabled_value(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("enabled")
}

// ─── 메타데이터 ──────────────────────────────────────────────────────

/// 오브젝트 메타데이터 (필요한 부분만)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub generation: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

// ─── 스펙 ────────────────────────────────────────────────────────────

/// 관리 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManagementState {
    #[default]
    Managed,
    Unmanaged,
}

/// 수집기가 사용할 서비스 어카운트
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccountSpec {
    pub name: String,
    /// 투영 토큰의 audience. 비어 있으면 마이그레이션이 채웁니다.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
}

/// 리소스 요청/제한 (`cpu`, `memory` → 수량 문자열)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirements {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub requests: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub limits: BTreeMap<String, String>,
}

impl ResourceRequirements {
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty() && self.limits.is_empty()
    }
}

/// 노드 테인트 허용
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toleration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
}

/// 수집기 리소스와 스케줄링 힌트
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectorSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tolerations: Vec<Toleration>,
}

/// 입력 → 필터 → 출력 연결
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSpec {
    pub name: String,
    #[serde(default)]
    pub input_refs: Vec<String>,
    #[serde(default)]
    pub output_refs: Vec<String>,
    /// 나열된 순서대로 적용
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter_refs: Vec<String>,
}

/// 포워더 스펙
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwarderSpec {
    #[serde(default)]
    pub management_state: ManagementState,
    #[serde(default)]
    pub service_account: ServiceAccountSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collector: Option<CollectorSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<InputSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<OutputSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterSpec>,
    #[serde(default)]
    pub pipelines: Vec<PipelineSpec>,
}

impl ForwarderSpec {
    pub fn input(&self, name: &str) -> Option<&InputSpec> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&OutputSpec> {
        self.outputs.iter().find(|o| o.name == name)
    }

    pub fn filter(&self, name: &str) -> Option<&FilterSpec> {
        self.filters.iter().find(|f| f.name == name)
    }
}

// ─── 상태 ────────────────────────────────────────────────────────────

/// 포워더 상태: 최상위 컨디션과 요소별 컨디션 목록
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwarderStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pipelines: Vec<Condition>,
}

impl ForwarderStatus {
    /// 모든 컨디션을 한 줄로 순회합니다 (최상위 먼저).
    pub fn all_conditions(&self) -> impl Iterator<Item = &Condition> {
        self.conditions
            .iter()
            .chain(&self.inputs)
            .chain(&self.outputs)
            .chain(&self.filters)
            .chain(&self.pipelines)
    }
}

// ─── 루트 ────────────────────────────────────────────────────────────

/// ClusterLogForwarder 리소스
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterLogForwarder {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ForwarderSpec,
    #[serde(default)]
    pub status: ForwarderStatus,
}

fn default_api_version() -> String {
    "observability.openshift.io/v1".to_owned()
}

fn default_kind() -> String {
    "ClusterLogForwarder".to_owned()
}

impl ClusterLogForwarder {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: ObjectMeta {
                name: name.into(),
                namespace: namespace.into(),
                ..Default::default()
            },
            spec: ForwarderSpec::default(),
            status: ForwarderStatus::default(),
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata.annotations.get(key).map(String::as_str)
    }

    /// 어노테이션이 활성 값으로 설정되어 있는지 확인합니다.
    pub fn annotation_enabled(&self, key: &str) -> bool {
        self.annotation(key).is_some_and(is_enabled_value)
    }

    pub fn is_managed(&self) -> bool {
        self.spec.management_state == ManagementState::Managed
    }
}
