#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`fieldpath`], [`template`]: 필드 경로와 라우팅 템플릿 문법
//! - [`secrets`], [`tls`]: 시크릿 스냅샷과 TLS 블록
//! - [`migrate`]: 스펙 재작성 단계
//! - [`validate`]: 요소별 검증과 권한 검사
//! - [`model`], [`generator`]: 정규화 모델과 수집기 설정 렌더링
//! - [`status`]: 컨디션 병합과 `Ready` 판정
//! - [`reconcile`]: 한 번의 조정 루프
//! - [`memory`]: 메모리 기반 스토어/리뷰어

pub mod aws;
pub mod cancel;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod fieldpath;
pub mod generator;
pub mod memory;
pub mod migrate;
pub mod model;
pub mod reconcile;
pub mod secrets;
pub mod status;
pub mod telemetry;
pub mod template;
pub mod tls;
pub mod validate;

pub use config::CompilerConfig;
pub use error::CompilerError;
pub use memory::{MemoryStore, StaticReviewer};
pub use model::ForwarderModel;
pub use reconcile::{ReconcileOutcome, reconcile};
pub use secrets::SecretSnapshot;
