//! 설정 관리 -- logforward.toml 파싱 및 런타임 설정
//!
//! [`OperatorConfig`]는 컴파일러와 CLI가 공유하는 최상위 설정 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGFORWARD_COLLECTOR_DATA_DIR=/data` 형식)
//! 3. 설정 파일 (`logforward.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logforward_core::error::LogForwardError> {
//! use logforward_core::config::OperatorConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = OperatorConfig::load("logforward.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = OperatorConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::Quantity;
use crate::error::{ConfigError, LogForwardError};

/// logforward 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 수집기 렌더링 설정
    #[serde(default)]
    pub collector: CollectorConfig,
    /// 모든 싱크 TLS 블록에 덧씌울 TLS 프로파일
    #[serde(default)]
    pub tls: TlsProfileConfig,
}

impl OperatorConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogForwardError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogForwardError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogForwardError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogForwardError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogForwardError> {
        toml::from_str(toml_str).map_err(|e| {
            LogForwardError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGFORWARD_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGFORWARD_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGFORWARD_GENERAL_LOG_FORMAT");

        // Collector
        override_string(&mut self.collector.data_dir, "LOGFORWARD_COLLECTOR_DATA_DIR");
        override_string(
            &mut self.collector.secrets_dir,
            "LOGFORWARD_COLLECTOR_SECRETS_DIR",
        );
        override_string(&mut self.collector.config_dir, "LOGFORWARD_COLLECTOR_CONFIG_DIR");
        override_string(
            &mut self.collector.capabilities_path,
            "LOGFORWARD_COLLECTOR_CAPABILITIES_PATH",
        );
        override_string(
            &mut self.collector.cpu_request,
            "LOGFORWARD_COLLECTOR_CPU_REQUEST",
        );
        override_string(
            &mut self.collector.memory_request,
            "LOGFORWARD_COLLECTOR_MEMORY_REQUEST",
        );
        override_string(
            &mut self.collector.memory_limit,
            "LOGFORWARD_COLLECTOR_MEMORY_LIMIT",
        );
        override_string(
            &mut self.collector.lokistack_max_write,
            "LOGFORWARD_COLLECTOR_LOKISTACK_MAX_WRITE",
        );
        override_u64(
            &mut self.collector.expire_metrics_secs,
            "LOGFORWARD_COLLECTOR_EXPIRE_METRICS_SECS",
        );

        // TLS
        override_string(&mut self.tls.min_tls_version, "LOGFORWARD_TLS_MIN_TLS_VERSION");
        override_csv(&mut self.tls.ciphers, "LOGFORWARD_TLS_CIPHERS");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogForwardError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        for (field, value) in [
            ("collector.data_dir", &self.collector.data_dir),
            ("collector.secrets_dir", &self.collector.secrets_dir),
            ("collector.config_dir", &self.collector.config_dir),
        ] {
            if !value.starts_with('/') {
                return Err(ConfigError::InvalidValue {
                    field: field.to_owned(),
                    reason: format!("must be an absolute path, got '{value}'"),
                }
                .into());
            }
        }

        if Quantity::new(&self.collector.lokistack_max_write)
            .as_bytes()
            .is_none()
        {
            return Err(ConfigError::InvalidValue {
                field: "collector.lokistack_max_write".to_owned(),
                reason: format!(
                    "'{}' is not a valid byte quantity",
                    self.collector.lokistack_max_write
                ),
            }
            .into());
        }

        let valid_tls = [
            "",
            "VersionTLS10",
            "VersionTLS11",
            "VersionTLS12",
            "VersionTLS13",
        ];
        if !valid_tls.contains(&self.tls.min_tls_version.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "tls.min_tls_version".to_owned(),
                reason: format!("must be one of: {}", valid_tls[1..].join(", ")),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 수집기 렌더링 설정
///
/// 렌더링되는 설정 문서의 경로 기준과 마이그레이션 기본값을 담습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// 수집기 데이터 디렉토리 기준 (`<data_dir>/<ns>/<name>`)
    pub data_dir: String,
    /// 시크릿 마운트 기준 경로
    pub secrets_dir: String,
    /// 컨피그맵 마운트 기준 경로
    pub config_dir: String,
    /// 클러스터 capability JSON 파일 경로
    pub capabilities_path: String,
    /// 기본 CPU 요청량
    pub cpu_request: String,
    /// 기본 메모리 요청량
    pub memory_request: String,
    /// 기본 메모리 제한량
    pub memory_limit: String,
    /// LokiStack 출력의 기본 `maxWrite`
    pub lokistack_max_write: String,
    /// 내부 메트릭 만료 시간 (초)
    pub expire_metrics_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            data_dir: "/var/lib/vector".to_owned(),
            secrets_dir: "/var/run/ocp-collector/secrets".to_owned(),
            config_dir: "/var/run/ocp-collector/config".to_owned(),
            capabilities_path: "/etc/logforward/capabilities.json".to_owned(),
            cpu_request: "500m".to_owned(),
            memory_request: "64Mi".to_owned(),
            memory_limit: "2Gi".to_owned(),
            lokistack_max_write: "10M".to_owned(),
            expire_metrics_secs: 60,
        }
    }
}

/// 호출자가 제공하는 TLS 프로파일
///
/// 빈 값은 "수집기 기본값 사용"을 의미합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsProfileConfig {
    /// 최소 TLS 버전 (`VersionTLS12` 형식)
    pub min_tls_version: String,
    /// 허용 cipher suite 목록 (OpenSSL 이름)
    pub ciphers: Vec<String>,
}

impl Default for TlsProfileConfig {
    fn default() -> Self {
        Self {
            min_tls_version: "VersionTLS12".to_owned(),
            ciphers: Vec::new(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
