//! 컴파일러 에러 타입
//!
//! 사용자 입력의 문제는 에러가 아니라 컨디션으로 보고합니다.
//! [`CompilerError`]는 검증을 통과한 뒤에도 진행할 수 없는 경우와
//! 협력자(스토어, 리뷰어) 장애만 표현합니다.

use logforward_core::error::{LogForwardError, StoreError};

/// 컴파일러 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum CompilerError {
    /// 템플릿 문법 오류
    #[error("template error: '{template}': {reason}")]
    Template {
        /// 원본 템플릿
        template: String,
        /// 실패 사유
        reason: String,
    },

    /// 필드 경로 문법 오류
    #[error("field path error: '{path}': {reason}")]
    FieldPath {
        /// 원본 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 마이그레이션 실패
    #[error("migration error: {0}")]
    Migration(String),

    /// 출력 싱크 생성 실패
    #[error("generate error: output '{output}': {reason}")]
    Generate {
        /// 출력 이름
        output: String,
        /// 실패 사유
        reason: String,
    },

    /// 스토어/리뷰어 장애
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// 취소됨
    #[error("reconcile cancelled")]
    Cancelled,

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 직렬화 실패
    #[error("serialize error: {0}")]
    Serialize(String),
}

impl From<toml::ser::Error> for CompilerError {
    fn from(err: toml::ser::Error) -> Self {
        CompilerError::Serialize(err.to_string())
    }
}

impl From<CompilerError> for LogForwardError {
    fn from(err: CompilerError) -> Self {
        match err {
            CompilerError::Store(e) => LogForwardError::Store(e),
            CompilerError::Cancelled => LogForwardError::Store(StoreError::Cancelled),
            CompilerError::Io(e) => LogForwardError::Io(e),
            other => LogForwardError::Generate(other.to_string()),
        }
    }
}
