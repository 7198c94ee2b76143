#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`api`]: `ClusterLogForwarder` 스펙/상태 모델과 컨디션 어휘
//! - [`config`]: 오퍼레이터 설정 (`logforward.toml`)
//! - [`error`]: 에러 계층
//! - [`metrics`]: 메트릭 이름 및 레이블 상수
//! - [`store`]: 오브젝트 스토어 / 접근 검토 협력자 trait

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod store;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{ConfigError, LogForwardError, StoreError};

// 설정
pub use config::OperatorConfig;

// API 모델
pub use api::{
    ClusterLogForwarder, Condition, ConditionStatus, FilterSpec, ForwarderSpec, ForwarderStatus,
    InputSpec, OutputSpec, OutputType, PipelineSpec,
};

// 협력자
pub use store::{
    AccessReviewer, ConfigMap, ObjectStore, RenderedConfig, Secret, ServiceAccount,
    SubjectAccessReview,
};
