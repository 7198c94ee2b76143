//! 입력 스펙 -- 수집할 로그 스트림 선택자
//!
//! CRD 표면은 `type` 판별자와 유형 이름으로 된 하위 레코드(`application:` 등)를 씁니다.
//! 내부에서는 [`InputKind`] 합 타입으로 다루며, serde 변환은 [`RawInputSpec`]을 거칩니다.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::common::{LimitSpec, Quantity, TlsSpec};

/// 예약된 입력 이름: 애플리케이션 로그
pub const INPUT_APPLICATION: &str = "application";
/// 예약된 입력 이름: 인프라 로그
pub const INPUT_INFRASTRUCTURE: &str = "infrastructure";
/// 예약된 입력 이름: 감사 로그
pub const INPUT_AUDIT: &str = "audit";

/// 예약된 입력 이름 전체
pub const RESERVED_INPUT_NAMES: [&str; 3] = [INPUT_APPLICATION, INPUT_INFRASTRUCTURE, INPUT_AUDIT];

/// 입력 유형 판별자
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum InputType {
    Application,
    Infrastructure,
    Audit,
    Receiver,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Infrastructure => "infrastructure",
            Self::Audit => "audit",
            Self::Receiver => "receiver",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 이름이 붙은 입력 선택자
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawInputSpec", into = "RawInputSpec")]
pub struct InputSpec {
    pub name: String,
    pub kind: InputKind,
}

/// 입력 유형별 파라미터
#[derive(Debug, Clone, PartialEq)]
pub enum InputKind {
    Application(Application),
    Infrastructure(Infrastructure),
    Audit(Audit),
    Receiver(Receiver),
}

impl InputSpec {
    pub fn input_type(&self) -> InputType {
        match &self.kind {
            InputKind::Application(_) => InputType::Application,
            InputKind::Infrastructure(_) => InputType::Infrastructure,
            InputKind::Audit(_) => InputType::Audit,
            InputKind::Receiver(_) => InputType::Receiver,
        }
    }

    /// 예약 이름에 해당하는 정규 입력 스펙을 만듭니다.
    ///
    /// - `application` → 빈 선택자의 Application
    /// - `infrastructure` → 모든 인프라 소스
    /// - `audit` → 모든 감사 소스
    pub fn reserved(name: &str) -> Option<Self> {
        let kind = match name {
            INPUT_APPLICATION => InputKind::Application(Application::default()),
            INPUT_INFRASTRUCTURE => InputKind::Infrastructure(Infrastructure {
                sources: InfrastructureSource::ALL.to_vec(),
                ..Default::default()
            }),
            INPUT_AUDIT => InputKind::Audit(Audit {
                sources: AuditSource::ALL.to_vec(),
            }),
            _ => return None,
        };
        Some(Self {
            name: name.to_owned(),
            kind,
        })
    }

    pub fn is_receiver(&self) -> bool {
        matches!(self.kind, InputKind::Receiver(_))
    }
}

/// 애플리케이션 컨테이너 로그 선택자
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// 파드 레이블 선택자
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<LabelSelector>,
    /// 포함할 네임스페이스/컨테이너 glob
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<NamespaceContainer>,
    /// 제외할 네임스페이스/컨테이너 glob
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<NamespaceContainer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<ContainerInputTuning>,
}

/// `{namespace-glob, container-glob}` 쌍
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceContainer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

/// 쿠버네티스 레이블 선택자
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_expressions: Vec<LabelSelectorRequirement>,
}

impl LabelSelector {
    pub fn is_empty(&self) -> bool {
        self.match_labels.is_empty() && self.match_expressions.is_empty()
    }
}

/// 레이블 선택자 표현식 (`In`, `NotIn`, `Exists`, `DoesNotExist`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelectorRequirement {
    pub key: String,
    pub operator: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

/// 컨테이너 입력 튜닝
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerInputTuning {
    /// 컨테이너별 초당 레코드 제한
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_per_container: Option<LimitSpec>,
    /// 한 번에 읽을 최대 바이트
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_message_size: Option<Quantity>,
}

/// 인프라 로그 소스
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum InfrastructureSource {
    Container,
    Node,
}

impl InfrastructureSource {
    pub const ALL: [Self; 2] = [Self::Node, Self::Container];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Node => "node",
        }
    }
}

/// 인프라 로그 선택자
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Infrastructure {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<InfrastructureSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<ContainerInputTuning>,
}

/// 감사 로그 소스
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum AuditSource {
    #[serde(rename = "kubeAPI")]
    KubeApi,
    #[serde(rename = "openshiftAPI")]
    OpenshiftApi,
    #[serde(rename = "auditd")]
    Auditd,
    #[serde(rename = "ovn")]
    Ovn,
}

impl AuditSource {
    pub const ALL: [Self; 4] = [Self::KubeApi, Self::OpenshiftApi, Self::Auditd, Self::Ovn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KubeApi => "kubeAPI",
            Self::OpenshiftApi => "openshiftAPI",
            Self::Auditd => "auditd",
            Self::Ovn => "ovn",
        }
    }
}

/// 감사 로그 선택자
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<AuditSource>,
}

/// 네트워크 리시버 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReceiverType {
    Http,
    Syslog,
}

impl ReceiverType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Syslog => "syslog",
        }
    }
}

/// HTTP 리시버가 받을 수 있는 유일한 형식
pub const HTTP_RECEIVER_FORMAT_KUBE_API_AUDIT: &str = "kubeAPIAudit";

/// 네트워크 리시버
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receiver {
    #[serde(rename = "type")]
    pub receiver_type: ReceiverType,
    /// 수신 포트 (1024–65535)
    pub port: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpReceiver>,
}

/// HTTP 리시버 파라미터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpReceiver {
    pub format: String,
}

/// CRD 표면 그대로의 입력 스펙
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInputSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub input_type: InputType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<Application>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infrastructure: Option<Infrastructure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<Audit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Receiver>,
}

impl TryFrom<RawInputSpec> for InputSpec {
    type Error = String;

    fn try_from(raw: RawInputSpec) -> Result<Self, Self::Error> {
        let kind = match raw.input_type {
            InputType::Application => InputKind::Application(raw.application.unwrap_or_default()),
            InputType::Infrastructure => {
                InputKind::Infrastructure(raw.infrastructure.unwrap_or_default())
            }
            InputType::Audit => InputKind::Audit(raw.audit.unwrap_or_default()),
            InputType::Receiver => InputKind::Receiver(raw.receiver.ok_or_else(|| {
                format!(
                    "input {:?} of type receiver requires a 'receiver' section",
                    raw.name
                )
            })?),
        };
        Ok(Self {
            name: raw.name,
            kind,
        })
    }
}

impl From<InputSpec> for RawInputSpec {
    fn from(spec: InputSpec) -> Self {
        let mut raw = RawInputSpec {
            input_type: spec.input_type(),
            name: spec.name,
            application: None,
            infrastructure: None,
            audit: None,
            receiver: None,
        };
        match spec.kind {
            InputKind::Application(a) => raw.application = Some(a),
            InputKind::Infrastructure(i) => raw.infrastructure = Some(i),
            InputKind::Audit(a) => raw.audit = Some(a),
            InputKind::Receiver(r) => raw.receiver = Some(r),
        }
        raw
    }
}
