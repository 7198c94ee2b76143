//! 에러 타입 -- 도메인별 에러 정의
//!
//! 사용자 스펙의 검증 실패는 에러가 아니라 상태 컨디션으로 표현됩니다.
//! 여기의 에러는 설정 로딩, 외부 협력자 호출, 렌더링 실패처럼
//! 호출자가 재시도하거나 중단해야 하는 상황만 다룹니다.

/// logforward 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogForwardError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 오브젝트 스토어 / SAR 호출 에러
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// 수집기 설정 생성 에러
    #[error("generate error: {0}")]
    Generate(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 외부 협력자 (오브젝트 스토어, SAR 오라클) 에러
///
/// 모두 일시적 인프라 실패로 취급되어 호출자에게 전파됩니다.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 오브젝트가 존재하지 않음
    #[error("{kind} '{name}' not found")]
    NotFound { kind: String, name: String },

    /// 요청 실패 (네트워크, 권한, 서버 에러 등)
    #[error("request failed: {0}")]
    Request(String),

    /// 호출이 취소됨
    #[error("request cancelled")]
    Cancelled,
}

impl StoreError {
    /// `NotFound` 에러 생성 헬퍼
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// 대상이 없어서 발생한 에러인지 확인합니다.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "general.log_level".to_owned(),
            reason: "must be one of: trace, debug".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value for 'general.log_level': must be one of: trace, debug"
        );
    }

    #[test]
    fn store_error_wraps_into_top_level() {
        let err: LogForwardError = StoreError::not_found("secret", "es-certs").into();
        assert_eq!(err.to_string(), "store error: secret 'es-certs' not found");
    }

    #[test]
    fn not_found_is_detected() {
        assert!(StoreError::not_found("serviceaccount", "collector").is_not_found());
        assert!(!StoreError::Request("timeout".to_owned()).is_not_found());
        assert!(!StoreError::Cancelled.is_not_found());
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: LogForwardError = io.into();
        assert!(matches!(err, LogForwardError::Io(_)));
    }
}
