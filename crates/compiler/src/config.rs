//! 컴파일러 설정
//!
//! [`CompilerConfig`]는 core의 [`OperatorConfig`]에서 렌더링과 마이그레이션에
//! 필요한 값만 뽑아 평탄화한 구조체입니다.
//!
//! # 사용 예시
//! ```ignore
//! use logforward_core::config::OperatorConfig;
//! use logforward_compiler::config::CompilerConfig;
//!
//! let config = CompilerConfig::from_core(&OperatorConfig::default());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use logforward_core::config::OperatorConfig;

/// 수집기 서비스 어카운트 토큰 마운트 경로
pub const SERVICE_ACCOUNT_TOKEN_PATH: &str = "/var/run/ocp-collector/serviceaccount/token";

/// 컴파일러 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// 수집기 데이터 디렉토리 기준
    pub data_dir: String,
    /// 시크릿 마운트 기준 경로
    pub secrets_dir: String,
    /// 컨피그맵 마운트 기준 경로
    pub config_dir: String,
    /// 내부 메트릭 만료 시간 (초)
    pub expire_metrics_secs: u64,
    /// 싱크 TLS 블록에 덧씌울 최소 버전 (빈 값이면 생략)
    pub min_tls_version: String,
    /// 싱크 TLS 블록에 덧씌울 cipher suite
    pub ciphers: Vec<String>,
    /// 기본 CPU 요청량
    pub cpu_request: String,
    /// 기본 메모리 요청량
    pub memory_request: String,
    /// 기본 메모리 제한량
    pub memory_limit: String,
    /// LokiStack 기본 `maxWrite`
    pub lokistack_max_write: String,

    // --- core에 없는 런타임 값 ---
    /// 클러스터 capability 플래그 (`ipv6` 등)
    pub capabilities: BTreeMap<String, bool>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self::from_core(&OperatorConfig::default())
    }
}

impl CompilerConfig {
    /// core 설정에서 컴파일러 설정을 생성합니다.
    pub fn from_core(core: &OperatorConfig) -> Self {
        Self {
            data_dir: core.collector.data_dir.clone(),
            secrets_dir: core.collector.secrets_dir.clone(),
            config_dir: core.collector.config_dir.clone(),
            expire_metrics_secs: core.collector.expire_metrics_secs,
            min_tls_version: core.tls.min_tls_version.clone(),
            ciphers: core.tls.ciphers.clone(),
            cpu_request: core.collector.cpu_request.clone(),
            memory_request: core.collector.memory_request.clone(),
            memory_limit: core.collector.memory_limit.clone(),
            lokistack_max_write: core.collector.lokistack_max_write.clone(),
            capabilities: BTreeMap::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: BTreeMap<String, bool>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// capability 플래그 조회 (없으면 false)
    pub fn capability(&self, name: &str) -> bool {
        self.capabilities.get(name).copied().unwrap_or(false)
    }

    /// 시크릿 키의 마운트 경로
    pub fn secret_path(&self, secret_name: &str, key: &str) -> String {
        format!("{}/{secret_name}/{key}", self.secrets_dir)
    }

    /// 컨피그맵 키의 마운트 경로
    pub fn config_map_path(&self, config_map_name: &str, key: &str) -> String {
        format!("{}/{config_map_name}/{key}", self.config_dir)
    }

    /// 포워더별 데이터 디렉토리
    pub fn forwarder_data_dir(&self, namespace: &str, name: &str) -> String {
        format!("{}/{namespace}/{name}", self.data_dir)
    }
}
