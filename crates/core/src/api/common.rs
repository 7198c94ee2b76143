//! 공통 API 타입 -- 시크릿/컨피그맵 참조, TLS, 속도 제한, 바이트 수량

use serde::{Deserialize, Serialize};

/// 시크릿의 특정 키 참조
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    /// 시크릿 내 키
    pub key: String,
    /// 시크릿 이름
    pub secret_name: String,
}

impl SecretReference {
    pub fn new(secret_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret_name: secret_name.into(),
        }
    }
}

/// 시크릿 또는 컨피그맵의 특정 키 참조
///
/// 둘 중 하나만 설정되어야 하며, 둘 다 비어 있으면 해석할 수 없는 참조입니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueReference {
    /// 대상 키
    pub key: String,
    /// 시크릿 이름
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,
    /// 컨피그맵 이름
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map_name: Option<String>,
}

/// [`ValueReference`]가 가리키는 저장소
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource<'a> {
    Secret(&'a str),
    ConfigMap(&'a str),
}

impl ValueReference {
    pub fn from_secret(secret_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret_name: Some(secret_name.into()),
            config_map_name: None,
        }
    }

    pub fn from_config_map(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret_name: None,
            config_map_name: Some(name.into()),
        }
    }

    /// 참조 대상 저장소. 시크릿이 우선합니다.
    pub fn source(&self) -> Option<ValueSource<'_>> {
        match (&self.secret_name, &self.config_map_name) {
            (Some(name), _) if !name.is_empty() => Some(ValueSource::Secret(name)),
            (_, Some(name)) if !name.is_empty() => Some(ValueSource::ConfigMap(name)),
            _ => None,
        }
    }
}

/// 베어러 토큰 출처
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BearerTokenFrom {
    /// 시크릿 키에서 읽음
    Secret,
    /// 수집기 서비스 어카운트의 투영 토큰
    ServiceAccount,
}

/// 베어러 토큰 인증
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BearerToken {
    pub from: BearerTokenFrom,
    /// `from: secret`일 때의 시크릿 참조
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<SecretReference>,
}

impl BearerToken {
    pub fn service_account() -> Self {
        Self {
            from: BearerTokenFrom::ServiceAccount,
            secret: None,
        }
    }

    pub fn from_secret(reference: SecretReference) -> Self {
        Self {
            from: BearerTokenFrom::Secret,
            secret: Some(reference),
        }
    }
}

/// TLS 자료 참조
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsSpec {
    /// CA 번들
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca: Option<ValueReference>,
    /// 클라이언트 인증서
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<ValueReference>,
    /// 클라이언트 개인키
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<SecretReference>,
    /// 개인키 암호
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_passphrase: Option<SecretReference>,
}

impl TlsSpec {
    pub fn is_empty(&self) -> bool {
        self.ca.is_none()
            && self.certificate.is_none()
            && self.key.is_none()
            && self.key_passphrase.is_none()
    }
}

/// 출력용 TLS 설정
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputTlsSpec {
    #[serde(flatten)]
    pub tls: TlsSpec,
    /// 인증서/호스트명 검증 생략
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub insecure_skip_verify: bool,
    /// 출력별 TLS 보안 프로파일
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_profile: Option<TlsSecurityProfile>,
}

/// TLS 보안 프로파일 (사용자 지정)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsSecurityProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_tls_version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ciphers: Vec<String>,
}

/// 초당 레코드 수 제한
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitSpec {
    pub max_records_per_second: i64,
}

/// 쿠버네티스 스타일 바이트 수량 (`10M`, `1Gi`, `512Ki`, `1000`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(String);

impl Quantity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 바이트 수로 변환합니다. 형식이 잘못되면 `None`.
    pub fn as_bytes(&self) -> Option<u64> {
        let s = self.0.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(s.len());
        let (number, suffix) = s.split_at(split);
        if number.is_empty() {
            return None;
        }
        let multiplier: u64 = match suffix {
            "" => 1,
            "k" | "K" => 1_000,
            "M" => 1_000_000,
            "G" => 1_000_000_000,
            "T" => 1_000_000_000_000,
            "Ki" => 1 << 10,
            "Mi" => 1 << 20,
            "Gi" => 1 << 30,
            "Ti" => 1 << 40,
            _ => return None,
        };
        if let Ok(whole) = number.parse::<u64>() {
            return whole.checked_mul(multiplier);
        }
        let fractional: f64 = number.parse().ok()?;
        if !fractional.is_finite() || fractional < 0.0 {
            return None;
        }
        Some((fractional * multiplier as f64).round() as u64)
    }
}

impl From<&str> for Quantity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
