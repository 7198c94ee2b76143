//! 필터 스펙 -- 레코드 변환

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 필터 유형 판별자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterType {
    #[serde(rename = "drop")]
    Drop,
    #[serde(rename = "prune")]
    Prune,
    #[serde(rename = "openshiftLabels")]
    OpenshiftLabels,
    #[serde(rename = "detectMultilineException")]
    DetectMultilineException,
    #[serde(rename = "parse")]
    Parse,
    #[serde(rename = "kubeAPIAudit")]
    KubeApiAudit,
}

impl FilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drop => "drop",
            Self::Prune => "prune",
            Self::OpenshiftLabels => "openshiftLabels",
            Self::DetectMultilineException => "detectMultilineException",
            Self::Parse => "parse",
            Self::KubeApiAudit => "kubeAPIAudit",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 이름이 붙은 필터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawFilterSpec", into = "RawFilterSpec")]
pub struct FilterSpec {
    pub name: String,
    pub kind: FilterKind,
}

/// 필터 유형별 파라미터
#[derive(Debug, Clone, PartialEq)]
pub enum FilterKind {
    /// 테스트 목록. 어느 테스트든 통과하면 레코드를 버립니다.
    Drop(Vec<DropTest>),
    Prune(PruneFilter),
    /// `.openshift.labels`에 병합할 정적 레이블
    OpenshiftLabels(BTreeMap<String, String>),
    DetectMultilineException,
    Parse,
    KubeApiAudit(KubeApiAudit),
}

impl FilterSpec {
    pub fn filter_type(&self) -> FilterType {
        match &self.kind {
            FilterKind::Drop(_) => FilterType::Drop,
            FilterKind::Prune(_) => FilterType::Prune,
            FilterKind::OpenshiftLabels(_) => FilterType::OpenshiftLabels,
            FilterKind::DetectMultilineException => FilterType::DetectMultilineException,
            FilterKind::Parse => FilterType::Parse,
            FilterKind::KubeApiAudit(_) => FilterType::KubeApiAudit,
        }
    }
}

/// 조건들의 논리곱
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropTest {
    #[serde(default)]
    pub test: Vec<DropCondition>,
}

/// `(field, matches|notMatches regex)`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropCondition {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_matches: Option<String>,
}

/// 필드 제거/유지 목록
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneFilter {
    /// 제거할 필드 경로
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub in_fields: Option<Vec<String>>,
    /// 유지할 필드 경로 (나머지는 제거)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_in: Option<Vec<String>>,
}

/// kube API 감사 정책 필터
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubeApiAudit {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omit_stages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omit_response_codes: Option<Vec<i32>>,
    /// 감사 정책 규칙 (원형 그대로 수집기에 전달)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<serde_json::Value>,
}

/// CRD 표면 그대로의 필터 스펙
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFilterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop: Option<Vec<DropTest>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prune: Option<PruneFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openshift_labels: Option<BTreeMap<String, String>>,
    #[serde(rename = "kubeAPIAudit", default, skip_serializing_if = "Option::is_none")]
    pub kube_api_audit: Option<KubeApiAudit>,
}

impl From<RawFilterSpec> for FilterSpec {
    fn from(raw: RawFilterSpec) -> Self {
        // 누락된 하위 레코드는 빈 값으로 두고 검증 단계에서 컨디션으로 보고합니다.
        let kind = match raw.filter_type {
            FilterType::Drop => FilterKind::Drop(raw.drop.unwrap_or_default()),
            FilterType::Prune => FilterKind::Prune(raw.prune.unwrap_or_default()),
            FilterType::OpenshiftLabels => {
                FilterKind::OpenshiftLabels(raw.openshift_labels.unwrap_or_default())
            }
            FilterType::DetectMultilineException => FilterKind::DetectMultilineException,
            FilterType::Parse => FilterKind::Parse,
            FilterType::KubeApiAudit => {
                FilterKind::KubeApiAudit(raw.kube_api_audit.unwrap_or_default())
            }
        };
        Self {
            name: raw.name,
            kind,
        }
    }
}

impl From<FilterSpec> for RawFilterSpec {
    fn from(spec: FilterSpec) -> Self {
        let mut raw = RawFilterSpec {
            filter_type: spec.filter_type(),
            name: spec.name,
            drop: None,
            prune: None,
            openshift_labels: None,
            kube_api_audit: None,
        };
        match spec.kind {
            FilterKind::Drop(tests) => raw.drop = Some(tests),
            FilterKind::Prune(prune) => raw.prune = Some(prune),
            FilterKind::OpenshiftLabels(labels) => raw.openshift_labels = Some(labels),
            FilterKind::KubeApiAudit(audit) => raw.kube_api_audit = Some(audit),
            FilterKind::DetectMultilineException | FilterKind::Parse => {}
        }
        raw
    }
}
