//! 협력자 trait -- 오브젝트 스토어와 접근 검토
//!
//! 컴파일러는 클러스터 API 서버에 직접 접근하지 않습니다.
//! 포워더, 시크릿, 컨피그맵, 서비스 어카운트 조회와 결과 기록은 [`ObjectStore`]를,
//! SubjectAccessReview 질의는 [`AccessReviewer`]를 통해 수행합니다.
//!
//! 두 trait 모두 RPITIT를 사용하며 호출자는 제네릭으로 받습니다.
//!
//! # 구현 예시
//! ```ignore
//! struct AllowAll;
//!
//! impl AccessReviewer for AllowAll {
//!     async fn review(&self, _review: SubjectAccessReview) -> Result<bool, StoreError> {
//!         Ok(true)
//!     }
//! }
//! ```

use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::api::{ClusterLogForwarder, ForwarderStatus};
use crate::error::StoreError;

// ─── 오브젝트 ────────────────────────────────────────────────────────

/// 시크릿 스냅샷 (키 → 값)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    pub name: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl Secret {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// 컨피그맵 스냅샷 (키 → 값)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMap {
    pub name: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl ConfigMap {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// 서비스 어카운트 (존재 확인용)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccount {
    pub name: String,
    pub namespace: String,
}

/// SubjectAccessReview 질의
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectAccessReview {
    /// `system:serviceaccount:<ns>:<name>`
    pub user: String,
    pub namespace: String,
    pub verb: String,
    pub resource: String,
    pub group: String,
    /// 리소스 이름 (입력 유형)
    pub name: String,
}

/// 렌더링 결과: 수집기 설정과 마운트해야 할 참조 목록
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedConfig {
    pub namespace: String,
    pub name: String,
    /// 수집기 설정 문서 (TOML)
    pub collector_toml: String,
    /// AWS 자격증명 파일 (역할 인증 출력이 있을 때만)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_credentials: Option<String>,
    /// 수집기 파드가 마운트할 시크릿 이름
    #[serde(default)]
    pub secret_names: Vec<String>,
    /// 수집기 파드가 마운트할 컨피그맵 이름
    #[serde(default)]
    pub config_map_names: Vec<String>,
}

// ─── trait ───────────────────────────────────────────────────────────

/// 인증된 읽기/쓰기 오브젝트 스토어
///
/// 조회 대상이 없으면 `Ok(None)`, 일시적 장애는 `Err`로 돌려줍니다.
pub trait ObjectStore: Send + Sync {
    /// 포워더를 조회합니다.
    fn get_forwarder(
        &self,
        namespace: &str,
        name: &str,
    ) -> impl Future<Output = Result<Option<ClusterLogForwarder>, StoreError>> + Send;

    fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> impl Future<Output = Result<Option<Secret>, StoreError>> + Send;

    fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> impl Future<Output = Result<Option<ConfigMap>, StoreError>> + Send;

    fn get_service_account(
        &self,
        namespace: &str,
        name: &str,
    ) -> impl Future<Output = Result<Option<ServiceAccount>, StoreError>> + Send;

    /// 렌더링된 수집기 설정을 기록합니다 (기존 값 교체).
    fn put_config(
        &self,
        config: RenderedConfig,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// 포워더 상태를 기록합니다.
    fn update_status(
        &self,
        namespace: &str,
        name: &str,
        status: ForwarderStatus,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// SubjectAccessReview 오라클
pub trait AccessReviewer: Send + Sync {
    /// 허용이면 `true`
    fn review(
        &self,
        review: SubjectAccessReview,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}
