//! 시크릿/컨피그맵 스냅샷과 심볼릭 시크릿 참조
//!
//! 한 번의 조정에서 시크릿과 컨피그맵은 [`SecretSnapshot`]으로 한 번만 읽고,
//! 검증기와 생성기는 이 스냅샷만 봅니다.
//!
//! 렌더링된 설정에는 시크릿 값을 넣지 않습니다. 대신 수집기의 디렉토리 기반 시크릿
//! 백엔드가 해석할 `SECRET[kubernetes_secret.<name>_<key>]` 참조를 넣습니다.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use logforward_core::api::condition::{
    REASON_CONFIG_MAP_KEY_NOT_FOUND, REASON_CONFIG_MAP_NOT_FOUND, REASON_MISSING_SPEC,
    REASON_SECRET_KEY_NOT_FOUND, REASON_SECRET_NOT_FOUND, REASON_VALUE_EMPTY,
};
use logforward_core::api::output::{AwsAuthentication, HttpAuthentication};
use logforward_core::api::{
    BearerToken, BearerTokenFrom, OutputKind, OutputSpec, SecretReference, ValueReference,
    ValueSource,
};
use logforward_core::store::{ConfigMap, Secret};

/// 렌더링되는 시크릿 백엔드 이름
pub const SECRET_BACKEND: &str = "kubernetes_secret";

/// 서비스 어카운트 토큰 시크릿 접미어 (`<serviceAccount>-token`)
pub const SERVICE_ACCOUNT_TOKEN_SECRET_SUFFIX: &str = "-token";

/// 서비스 어카운트 토큰 시크릿의 키
pub const SERVICE_ACCOUNT_TOKEN_KEY: &str = "token";

/// `[A-Za-z0-9_]` 밖의 문자를 `_`로 바꿉니다.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// 수집기 시크릿 백엔드 참조
pub fn secret_ref(secret_name: &str, key: &str) -> String {
    format!("SECRET[{SECRET_BACKEND}.{}_{key}]", sanitize(secret_name))
}

/// 서비스 어카운트 토큰이 담기는 (배포 시 생성되는) 시크릿 이름
pub fn service_account_token_secret(service_account: &str) -> String {
    format!("{service_account}{SERVICE_ACCOUNT_TOKEN_SECRET_SUFFIX}")
}

/// 베어러 토큰을 시크릿 참조로 해석합니다.
///
/// `from: serviceAccount`는 배포 시 생성되는 서비스 어카운트 토큰 시크릿을 가리킵니다.
pub fn bearer_token_ref(token: &BearerToken, service_account: &str) -> Option<SecretReference> {
    match token.from {
        BearerTokenFrom::Secret => token.secret.clone(),
        BearerTokenFrom::ServiceAccount => Some(SecretReference::new(
            service_account_token_secret(service_account),
            SERVICE_ACCOUNT_TOKEN_KEY,
        )),
    }
}

/// 출력이 참조하는 시크릿 키
///
/// 인증 자료와 TLS 개인키/암호를 모읍니다. 서비스 어카운트 토큰은 생성 시크릿으로 해석됩니다.
pub fn output_secret_refs(output: &OutputSpec, service_account: &str) -> Vec<SecretReference> {
    let mut refs: Vec<SecretReference> = Vec::new();
    let http = |auth: &HttpAuthentication, refs: &mut Vec<SecretReference>| {
        refs.extend(auth.token.as_ref().and_then(|t| bearer_token_ref(t, service_account)));
        refs.extend(auth.username.clone());
        refs.extend(auth.password.clone());
    };
    let aws = |auth: &AwsAuthentication, refs: &mut Vec<SecretReference>| {
        if let Some(key) = &auth.aws_access_key {
            refs.extend(key.key_id.clone());
            refs.extend(key.key_secret.clone());
        }
        if let Some(role) = &auth.iam_role {
            refs.extend(role.role_arn.clone());
            refs.extend(bearer_token_ref(&role.token, service_account));
        }
        if let Some(assume) = &auth.assume_role {
            refs.push(assume.role_arn.clone());
            refs.extend(assume.external_id.clone());
        }
    };

    match &output.kind {
        OutputKind::AzureMonitor(o) => {
            refs.extend(o.authentication.as_ref().and_then(|a| a.shared_key.clone()));
        }
        OutputKind::Cloudwatch(o) => {
            if let Some(auth) = &o.authentication {
                aws(auth, &mut refs);
            }
        }
        OutputKind::S3(o) => {
            if let Some(auth) = &o.authentication {
                aws(auth, &mut refs);
            }
        }
        OutputKind::Elasticsearch(o) => {
            if let Some(auth) = &o.authentication {
                http(auth, &mut refs);
            }
        }
        OutputKind::Http(o) => {
            if let Some(auth) = &o.authentication {
                http(auth, &mut refs);
            }
        }
        OutputKind::Loki(o) => {
            if let Some(auth) = &o.authentication {
                http(auth, &mut refs);
            }
        }
        OutputKind::Otlp(o) => {
            if let Some(auth) = &o.authentication {
                http(auth, &mut refs);
            }
        }
        OutputKind::GoogleCloudLogging(o) => {
            refs.extend(o.authentication.as_ref().and_then(|a| a.credentials.clone()));
        }
        OutputKind::Kafka(o) => {
            if let Some(sasl) = o.authentication.as_ref().and_then(|a| a.sasl.as_ref()) {
                refs.extend(sasl.username.clone());
                refs.extend(sasl.password.clone());
            }
        }
        OutputKind::LokiStack(o) => {
            refs.extend(
                o.authentication
                    .as_ref()
                    .and_then(|a| a.token.as_ref())
                    .and_then(|t| bearer_token_ref(t, service_account)),
            );
        }
        OutputKind::Splunk(o) => {
            refs.extend(o.authentication.as_ref().and_then(|a| a.token.clone()));
        }
        OutputKind::Syslog(_) => {}
    }

    if let Some(tls) = &output.tls {
        refs.extend(tls.tls.key.clone());
        refs.extend(tls.tls.key_passphrase.clone());
    }
    refs
}

/// 출력 TLS의 시크릿/컨피그맵 값 참조 (CA, 인증서)
pub fn output_value_refs(output: &OutputSpec) -> Vec<ValueReference> {
    output
        .tls
        .iter()
        .flat_map(|tls| [&tls.tls.ca, &tls.tls.certificate])
        .flatten()
        .cloned()
        .collect()
}

/// 참조 해석 실패
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// 참조에 시크릿/컨피그맵 이름이 없음
    Unspecified { key: String },
    SecretNotFound { name: String },
    SecretKeyNotFound { name: String, key: String },
    ConfigMapNotFound { name: String },
    ConfigMapKeyNotFound { name: String, key: String },
    /// 키는 있지만 값이 비어 있음
    ValueEmpty { name: String, key: String },
}

impl LookupError {
    /// 컨디션 사유
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Unspecified { .. } => REASON_MISSING_SPEC,
            Self::SecretNotFound { .. } => REASON_SECRET_NOT_FOUND,
            Self::SecretKeyNotFound { .. } => REASON_SECRET_KEY_NOT_FOUND,
            Self::ConfigMapNotFound { .. } => REASON_CONFIG_MAP_NOT_FOUND,
            Self::ConfigMapKeyNotFound { .. } => REASON_CONFIG_MAP_KEY_NOT_FOUND,
            Self::ValueEmpty { .. } => REASON_VALUE_EMPTY,
        }
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified { key } => {
                write!(f, "reference to key {key:?} names neither a secret nor a configmap")
            }
            Self::SecretNotFound { name } => write!(f, "secret {name:?} not found"),
            Self::SecretKeyNotFound { name, key } => {
                write!(f, "secret {name:?} does not contain key {key:?}")
            }
            Self::ConfigMapNotFound { name } => write!(f, "configmap {name:?} not found"),
            Self::ConfigMapKeyNotFound { name, key } => {
                write!(f, "configmap {name:?} does not contain key {key:?}")
            }
            Self::ValueEmpty { name, key } => {
                write!(f, "key {key:?} in {name:?} has an empty value")
            }
        }
    }
}

/// 한 번의 조정 동안 고정되는 시크릿/컨피그맵 스냅샷
#[derive(Debug, Clone, Default)]
pub struct SecretSnapshot {
    secrets: BTreeMap<String, Secret>,
    config_maps: BTreeMap<String, ConfigMap>,
    /// 배포 시 생성되어 검증을 건너뛰는 시크릿
    generated: BTreeSet<String>,
}

impl SecretSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_secret(&mut self, secret: Secret) {
        self.secrets.insert(secret.name.clone(), secret);
    }

    pub fn insert_config_map(&mut self, config_map: ConfigMap) {
        self.config_maps.insert(config_map.name.clone(), config_map);
    }

    /// 배포 시 생성될 시크릿으로 표시합니다.
    pub fn mark_generated(&mut self, name: impl Into<String>) {
        self.generated.insert(name.into());
    }

    pub fn secret(&self, name: &str) -> Option<&Secret> {
        self.secrets.get(name)
    }

    pub fn config_map(&self, name: &str) -> Option<&ConfigMap> {
        self.config_maps.get(name)
    }

    pub fn secret_names(&self) -> impl Iterator<Item = &str> {
        self.secrets.keys().map(String::as_str)
    }

    /// 시크릿 키 값을 조회합니다.
    pub fn secret_value(&self, reference: &SecretReference) -> Result<&str, LookupError> {
        let secret = self
            .secrets
            .get(&reference.secret_name)
            .ok_or_else(|| LookupError::SecretNotFound {
                name: reference.secret_name.clone(),
            })?;
        let value = secret
            .data
            .get(&reference.key)
            .ok_or_else(|| LookupError::SecretKeyNotFound {
                name: reference.secret_name.clone(),
                key: reference.key.clone(),
            })?;
        if value.is_empty() {
            return Err(LookupError::ValueEmpty {
                name: reference.secret_name.clone(),
                key: reference.key.clone(),
            });
        }
        Ok(value)
    }

    /// 시크릿 참조가 비어 있지 않은 값으로 해석되는지 확인합니다.
    pub fn check_secret(&self, reference: &SecretReference) -> Result<(), LookupError> {
        if self.generated.contains(&reference.secret_name) {
            return Ok(());
        }
        self.secret_value(reference).map(|_| ())
    }

    /// 시크릿 또는 컨피그맵 참조를 확인합니다.
    pub fn check_value(&self, reference: &ValueReference) -> Result<(), LookupError> {
        match reference.source() {
            Some(ValueSource::Secret(name)) => {
                self.check_secret(&SecretReference::new(name, reference.key.clone()))
            }
            Some(ValueSource::ConfigMap(name)) => {
                let config_map =
                    self.config_maps
                        .get(name)
                        .ok_or_else(|| LookupError::ConfigMapNotFound {
                            name: name.to_owned(),
                        })?;
                match config_map.data.get(&reference.key) {
                    None => Err(LookupError::ConfigMapKeyNotFound {
                        name: name.to_owned(),
                        key: reference.key.clone(),
                    }),
                    Some(value) if value.is_empty() => Err(LookupError::ValueEmpty {
                        name: name.to_owned(),
                        key: reference.key.clone(),
                    }),
                    Some(_) => Ok(()),
                }
            }
            None => Err(LookupError::Unspecified {
                key: reference.key.clone(),
            }),
        }
    }
}
