//! ClusterLogForwarder API 모델
//!
//! CRD 표면의 camelCase 필드 이름과 `type` 판별자를 그대로 따릅니다.
//! 유형별 하위 레코드를 가진 요소(입력, 출력, 필터)는 합 타입으로 표현하고
//! `Raw*Spec` 중간 타입을 통해 변환합니다.

pub mod common;
pub mod condition;
pub mod filter;
pub mod forwarder;
pub mod input;
pub mod output;

pub use common::{
    BearerToken, BearerTokenFrom, LimitSpec, OutputTlsSpec, Quantity, SecretReference,
    TlsSecurityProfile, TlsSpec, ValueReference, ValueSource,
};
pub use condition::{Condition, ConditionStatus};
pub use filter::{FilterKind, FilterSpec, FilterType};
pub use forwarder::{
    ClusterLogForwarder, CollectorSpec, ForwarderSpec, ForwarderStatus, ManagementState,
    ObjectMeta, PipelineSpec, ServiceAccountSpec,
};
pub use input::{InputKind, InputSpec, InputType};
pub use output::{DeliveryMode, OutputKind, OutputSpec, OutputTuning, OutputType};
