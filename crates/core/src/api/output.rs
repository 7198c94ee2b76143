//! 출력 스펙 -- 로그 목적지
//!
//! 12가지 출력 유형의 합 타입 [`OutputKind`]과 공통 튜닝/인증 타입을 정의합니다.
//! CRD 표면(`type` + 유형 이름 하위 레코드)과의 변환은 [`RawOutputSpec`]이 담당합니다.
//! 유형에 맞는 하위 레코드가 없으면 역직렬화 단계에서 거부됩니다.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::common::{BearerToken, LimitSpec, OutputTlsSpec, Quantity, SecretReference};

/// 출력 유형 판별자
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum OutputType {
    AzureMonitor,
    Cloudwatch,
    Elasticsearch,
    GoogleCloudLogging,
    Http,
    Kafka,
    Loki,
    LokiStack,
    Otlp,
    S3,
    Splunk,
    Syslog,
}

impl OutputType {
    pub const ALL: [Self; 12] = [
        Self::AzureMonitor,
        Self::Cloudwatch,
        Self::Elasticsearch,
        Self::GoogleCloudLogging,
        Self::Http,
        Self::Kafka,
        Self::Loki,
        Self::LokiStack,
        Self::Otlp,
        Self::S3,
        Self::Splunk,
        Self::Syslog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AzureMonitor => "azureMonitor",
            Self::Cloudwatch => "cloudwatch",
            Self::Elasticsearch => "elasticsearch",
            Self::GoogleCloudLogging => "googleCloudLogging",
            Self::Http => "http",
            Self::Kafka => "kafka",
            Self::Loki => "loki",
            Self::LokiStack => "lokiStack",
            Self::Otlp => "otlp",
            Self::S3 => "s3",
            Self::Splunk => "splunk",
            Self::Syslog => "syslog",
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 이름이 붙은 출력
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawOutputSpec", into = "RawOutputSpec")]
pub struct OutputSpec {
    pub name: String,
    pub kind: OutputKind,
    pub tls: Option<OutputTlsSpec>,
    pub rate_limit: Option<LimitSpec>,
}

/// 출력 유형별 파라미터
#[derive(Debug, Clone, PartialEq)]
pub enum OutputKind {
    AzureMonitor(AzureMonitor),
    Cloudwatch(Cloudwatch),
    Elasticsearch(Elasticsearch),
    GoogleCloudLogging(GoogleCloudLogging),
    Http(Http),
    Kafka(Kafka),
    Loki(Loki),
    LokiStack(LokiStack),
    Otlp(Otlp),
    S3(S3),
    Splunk(Splunk),
    Syslog(Syslog),
}

impl OutputSpec {
    pub fn new(name: impl Into<String>, kind: OutputKind) -> Self {
        Self {
            name: name.into(),
            kind,
            tls: None,
            rate_limit: None,
        }
    }

    pub fn output_type(&self) -> OutputType {
        self.kind.output_type()
    }

    /// 목적지 URL (설정된 경우)
    pub fn url(&self) -> Option<&str> {
        let url = match &self.kind {
            OutputKind::Elasticsearch(o) => Some(&o.url),
            OutputKind::Http(o) => Some(&o.url),
            OutputKind::Loki(o) => Some(&o.url),
            OutputKind::Otlp(o) => Some(&o.url),
            OutputKind::Splunk(o) => Some(&o.url),
            OutputKind::Syslog(o) => Some(&o.url),
            OutputKind::Cloudwatch(o) => o.url.as_ref(),
            OutputKind::S3(o) => o.url.as_ref(),
            OutputKind::Kafka(o) => o.url.as_ref(),
            OutputKind::AzureMonitor(_)
            | OutputKind::GoogleCloudLogging(_)
            | OutputKind::LokiStack(_) => None,
        };
        url.map(String::as_str).filter(|u| !u.is_empty())
    }

    /// 공통 튜닝 (설정된 경우)
    pub fn tuning(&self) -> Option<&OutputTuning> {
        match &self.kind {
            OutputKind::AzureMonitor(o) => o.tuning.as_ref(),
            OutputKind::Cloudwatch(o) => o.tuning.as_ref(),
            OutputKind::Elasticsearch(o) => o.tuning.as_ref(),
            OutputKind::GoogleCloudLogging(o) => o.tuning.as_ref(),
            OutputKind::Http(o) => o.tuning.as_ref(),
            OutputKind::Kafka(o) => o.tuning.as_ref(),
            OutputKind::Loki(o) => o.tuning.as_ref(),
            OutputKind::LokiStack(o) => o.tuning.as_ref(),
            OutputKind::Otlp(o) => o.tuning.as_ref(),
            OutputKind::S3(o) => o.tuning.as_ref(),
            OutputKind::Splunk(o) => o.tuning.as_ref(),
            OutputKind::Syslog(o) => o.tuning.as_ref(),
        }
    }
}

impl OutputKind {
    pub fn output_type(&self) -> OutputType {
        match self {
            Self::AzureMonitor(_) => OutputType::AzureMonitor,
            Self::Cloudwatch(_) => OutputType::Cloudwatch,
            Self::Elasticsearch(_) => OutputType::Elasticsearch,
            Self::GoogleCloudLogging(_) => OutputType::GoogleCloudLogging,
            Self::Http(_) => OutputType::Http,
            Self::Kafka(_) => OutputType::Kafka,
            Self::Loki(_) => OutputType::Loki,
            Self::LokiStack(_) => OutputType::LokiStack,
            Self::Otlp(_) => OutputType::Otlp,
            Self::S3(_) => OutputType::S3,
            Self::Splunk(_) => OutputType::Splunk,
            Self::Syslog(_) => OutputType::Syslog,
        }
    }
}

// ─── 튜닝 ────────────────────────────────────────────────────────────

/// 전달 보장 수준
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeliveryMode {
    /// 디스크 버퍼, 가득 차면 블록
    AtLeastOnce,
    /// 가득 차면 최신 이벤트 드롭
    AtMostOnce,
}

/// 출력 공통 튜닝
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputTuning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryMode>,
    /// 한 번의 전송 최대 바이트
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_write: Option<Quantity>,
    /// 재시도 최소 간격 (초)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_retry_duration: Option<u64>,
    /// 재시도 최대 지속 시간 (초)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retry_duration: Option<u64>,
    /// 압축 (gzip, zlib, zstd, snappy, none)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
}

// ─── 인증 ────────────────────────────────────────────────────────────

/// HTTP 계열 인증 (베어러 토큰 또는 basic)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpAuthentication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<BearerToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<SecretReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<SecretReference>,
}

/// AWS 인증 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AwsAuthType {
    AwsAccessKey,
    IamRole,
}

/// AWS 인증 (CloudWatch, S3)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsAuthentication {
    #[serde(rename = "type")]
    pub auth_type: AwsAuthType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_access_key: Option<AwsAccessKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam_role: Option<AwsRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assume_role: Option<AwsAssumeRole>,
}

/// 정적 액세스 키
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsAccessKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<SecretReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_secret: Option<SecretReference>,
}

/// 웹 아이덴티티 역할
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsRole {
    #[serde(rename = "roleARN", default, skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<SecretReference>,
    pub token: BearerToken,
}

/// 교차 계정 역할 위임
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsAssumeRole {
    #[serde(rename = "roleARN")]
    pub role_arn: SecretReference,
    #[serde(rename = "externalID", default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<SecretReference>,
}

// ─── 유형별 출력 ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureMonitor {
    pub customer_id: String,
    pub log_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AzureMonitorAuthentication>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<OutputTuning>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureMonitorAuthentication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_key: Option<SecretReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cloudwatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub region: String,
    /// 로그 그룹 이름 템플릿
    pub group_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AwsAuthentication>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<OutputTuning>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Elasticsearch {
    pub url: String,
    /// 인덱스 템플릿
    #[serde(default)]
    pub index: String,
    /// 엘라스틱서치 메이저 버전
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<HttpAuthentication>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<OutputTuning>,
}

/// GCP 리소스 식별자 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GoogleCloudLoggingIdType {
    BillingAccount,
    Folder,
    Project,
    Organization,
}

impl GoogleCloudLoggingIdType {
    /// 싱크 설정 키 접두어
    pub fn sink_key(&self) -> &'static str {
        match self {
            Self::BillingAccount => "billing_account_id",
            Self::Folder => "folder_id",
            Self::Project => "project_id",
            Self::Organization => "organization_id",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCloudLoggingId {
    #[serde(rename = "type")]
    pub id_type: GoogleCloudLoggingIdType,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCloudLogging {
    pub id: GoogleCloudLoggingId,
    /// 로그 ID 템플릿
    pub log_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<GoogleCloudLoggingAuthentication>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<OutputTuning>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCloudLoggingAuthentication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<SecretReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Http {
    pub url: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// 요청 타임아웃 (초)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<HttpAuthentication>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<OutputTuning>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kafka {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// 토픽 템플릿
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub brokers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<KafkaAuthentication>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<OutputTuning>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KafkaAuthentication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sasl: Option<SaslAuthentication>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaslAuthentication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<SecretReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<SecretReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanism: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loki {
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label_keys: Vec<String>,
    /// 테넌트 ID 템플릿
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<HttpAuthentication>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<OutputTuning>,
}

/// LokiStack 데이터 모델
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LokiStackDataModel {
    Viaq,
    Otel,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LokiStackTarget {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// 전역 + 테넌트별 레이블 키
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LokiStackLabelKeys {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<TenantLabelKeys>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infrastructure: Option<TenantLabelKeys>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<TenantLabelKeys>,
}

impl LokiStackLabelKeys {
    pub fn for_tenant(&self, tenant: &str) -> Option<&TenantLabelKeys> {
        match tenant {
            "application" => self.application.as_ref(),
            "infrastructure" => self.infrastructure.as_ref(),
            "audit" => self.audit.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantLabelKeys {
    #[serde(default)]
    pub ignore_global: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label_keys: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LokiStackAuthentication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<BearerToken>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LokiStack {
    pub target: LokiStackTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_keys: Option<LokiStackLabelKeys>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_model: Option<LokiStackDataModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<LokiStackAuthentication>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<OutputTuning>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Otlp {
    /// `/v1/logs`로 끝나야 함
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<HttpAuthentication>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<OutputTuning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub region: String,
    pub bucket: String,
    /// 오브젝트 키 접두어 템플릿
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AwsAuthentication>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<OutputTuning>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Splunk {
    pub url: String,
    /// 인덱스 템플릿
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    /// source 템플릿
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<SplunkAuthentication>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<OutputTuning>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplunkAuthentication {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<SecretReference>,
}

/// syslog RFC
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyslogRfc {
    #[serde(rename = "RFC3164")]
    Rfc3164,
    #[default]
    #[serde(rename = "RFC5424")]
    Rfc5424,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Syslog {
    pub url: String,
    #[serde(default)]
    pub rfc: SyslogRfc,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(rename = "procID", default, skip_serializing_if = "Option::is_none")]
    pub proc_id: Option<String>,
    #[serde(rename = "msgID", default, skip_serializing_if = "Option::is_none")]
    pub msg_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning: Option<OutputTuning>,
}

// ─── CRD 표면 ────────────────────────────────────────────────────────

/// CRD 표면 그대로의 출력 스펙
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOutputSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub output_type: OutputType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<OutputTlsSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<LimitSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_monitor: Option<AzureMonitor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloudwatch: Option<Cloudwatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elasticsearch: Option<Elasticsearch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_cloud_logging: Option<GoogleCloudLogging>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<Http>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kafka: Option<Kafka>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loki: Option<Loki>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loki_stack: Option<LokiStack>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otlp: Option<Otlp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub splunk: Option<Splunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syslog: Option<Syslog>,
}

fn missing_section(name: &str, output_type: OutputType) -> String {
    format!("output {name:?} of type {output_type} requires a '{output_type}' section")
}

impl TryFrom<RawOutputSpec> for OutputSpec {
    type Error = String;

    fn try_from(raw: RawOutputSpec) -> Result<Self, Self::Error> {
        let missing = || missing_section(&raw.name, raw.output_type);
        let kind = match raw.output_type {
            OutputType::AzureMonitor => {
                OutputKind::AzureMonitor(raw.azure_monitor.ok_or_else(missing)?)
            }
            OutputType::Cloudwatch => OutputKind::Cloudwatch(raw.cloudwatch.ok_or_else(missing)?),
            OutputType::Elasticsearch => {
                OutputKind::Elasticsearch(raw.elasticsearch.ok_or_else(missing)?)
            }
            OutputType::GoogleCloudLogging => {
                OutputKind::GoogleCloudLogging(raw.google_cloud_logging.ok_or_else(missing)?)
            }
            OutputType::Http => OutputKind::Http(raw.http.ok_or_else(missing)?),
            OutputType::Kafka => OutputKind::Kafka(raw.kafka.ok_or_else(missing)?),
            OutputType::Loki => OutputKind::Loki(raw.loki.ok_or_else(missing)?),
            OutputType::LokiStack => OutputKind::LokiStack(raw.loki_stack.ok_or_else(missing)?),
            OutputType::Otlp => OutputKind::Otlp(raw.otlp.ok_or_else(missing)?),
            OutputType::S3 => OutputKind::S3(raw.s3.ok_or_else(missing)?),
            OutputType::Splunk => OutputKind::Splunk(raw.splunk.ok_or_else(missing)?),
            OutputType::Syslog => OutputKind::Syslog(raw.syslog.ok_or_else(missing)?),
        };
        Ok(Self {
            name: raw.name,
            kind,
            tls: raw.tls,
            rate_limit: raw.rate_limit,
        })
    }
}

impl From<OutputSpec> for RawOutputSpec {
    fn from(spec: OutputSpec) -> Self {
        let mut raw = RawOutputSpec {
            output_type: spec.output_type(),
            name: spec.name,
            tls: spec.tls,
            rate_limit: spec.rate_limit,
            azure_monitor: None,
            cloudwatch: None,
            elasticsearch: None,
            google_cloud_logging: None,
            http: None,
            kafka: None,
            loki: None,
            loki_stack: None,
            otlp: None,
            s3: None,
            splunk: None,
            syslog: None,
        };
        match spec.kind {
            OutputKind::AzureMonitor(o) => raw.azure_monitor = Some(o),
            OutputKind::Cloudwatch(o) => raw.cloudwatch = Some(o),
            OutputKind::Elasticsearch(o) => raw.elasticsearch = Some(o),
            OutputKind::GoogleCloudLogging(o) => raw.google_cloud_logging = Some(o),
            OutputKind::Http(o) => raw.http = Some(o),
            OutputKind::Kafka(o) => raw.kafka = Some(o),
            OutputKind::Loki(o) => raw.loki = Some(o),
            OutputKind::LokiStack(o) => raw.loki_stack = Some(o),
            OutputKind::Otlp(o) => raw.otlp = Some(o),
            OutputKind::S3(o) => raw.s3 = Some(o),
            OutputKind::Splunk(o) => raw.splunk = Some(o),
            OutputKind::Syslog(o) => raw.syslog = Some(o),
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lokistack_output_parses() {
        let yaml = r#"
name: ls
type: lokiStack
lokiStack:
  target:
    name: my-loki
    namespace: openshift-logging
  authentication:
    token:
      from: serviceAccount
  labelKeys:
    audit:
      ignoreGlobal: true
      labelKeys: [log_type, objectRef.apiGroup]
"#;
        let output: OutputSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(output.output_type(), OutputType::LokiStack);
        let OutputKind::LokiStack(ls) = &output.kind else {
            panic!("expected lokiStack");
        };
        let audit = ls
            .label_keys
            .as_ref()
            .and_then(|k| k.for_tenant("audit"))
            .unwrap();
        assert!(audit.ignore_global);
        assert_eq!(audit.label_keys, vec!["log_type", "objectRef.apiGroup"]);
        assert!(output.url().is_none());
    }

    #[test]
    fn missing_type_section_is_rejected() {
        let err = serde_yaml::from_str::<OutputSpec>("name: cw\ntype: cloudwatch\n").unwrap_err();
        assert!(err.to_string().contains("requires a 'cloudwatch' section"));
    }

    #[test]
    fn unknown_output_type_is_rejected() {
        assert!(serde_yaml::from_str::<OutputSpec>("name: f\ntype: fluentdForward\n").is_err());
    }

    #[test]
    fn cloudwatch_role_auth_parses() {
        let yaml = r#"
name: cw
type: cloudwatch
cloudwatch:
  region: us-east-1
  groupName: '{.log_type||"none"}'
  authentication:
    type: iamRole
    iamRole:
      roleARN:
        secretName: cw-secret
        key: role_arn
      token:
        from: serviceAccount
"#;
        let output: OutputSpec = serde_yaml::from_str(yaml).unwrap();
        let OutputKind::Cloudwatch(cw) = &output.kind else {
            panic!("expected cloudwatch");
        };
        let auth = cw.authentication.as_ref().unwrap();
        assert_eq!(auth.auth_type, AwsAuthType::IamRole);
        assert_eq!(
            auth.iam_role.as_ref().and_then(|r| r.role_arn.clone()),
            Some(SecretReference::new("cw-secret", "role_arn"))
        );
    }

    #[test]
    fn serialize_keeps_only_own_section() {
        let output = OutputSpec::new(
            "es",
            OutputKind::Elasticsearch(Elasticsearch {
                url: "https://es:9200".to_owned(),
                index: "app-write".to_owned(),
                ..Default::default()
            }),
        );
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["type"], "elasticsearch");
        assert_eq!(value["elasticsearch"]["index"], "app-write");
        assert!(value.get("loki").is_none());
        assert!(value.get("tls").is_none());
    }

    #[test]
    fn url_is_empty_aware() {
        let output = OutputSpec::new("k", OutputKind::Kafka(Kafka::default()));
        assert!(output.url().is_none());
        let output = OutputSpec::new(
            "k",
            OutputKind::Kafka(Kafka {
                url: Some("tcp://kafka:9092/topic".to_owned()),
                ..Default::default()
            }),
        );
        assert_eq!(output.url(), Some("tcp://kafka:9092/topic"));
    }
}
