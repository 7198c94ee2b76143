//! 상태 컨디션 -- 요소별/최상위 검증 결과
//!
//! 컨디션 유형과 사유는 닫힌 어휘입니다. 요소별 유형은 접두어에 요소 이름을 붙여
//! 만듭니다 (`ValidInput-my-app`).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── 유형 ────────────────────────────────────────────────────────────

pub const CONDITION_READY: &str = "Ready";
pub const CONDITION_VALID: &str = "Valid";
pub const CONDITION_AUTHORIZED: &str = "Authorized";
pub const CONDITION_MIGRATE: &str = "Migrate";
pub const CONDITION_LOG_LEVEL: &str = "LogLevel";
pub const CONDITION_MAX_UNAVAILABLE: &str = "MaxUnavailable";
pub const CONDITION_USE_KUBE_CACHE: &str = "UseKubeCache";
pub const CONDITION_VALID_LOKISTACK_OTLP_OUTPUTS: &str = "ValidLokistackOTLPOutputs";

pub const CONDITION_PREFIX_VALID_INPUT: &str = "ValidInput-";
pub const CONDITION_PREFIX_VALID_OUTPUT: &str = "ValidOutput-";
pub const CONDITION_PREFIX_VALID_FILTER: &str = "ValidFilter-";
pub const CONDITION_PREFIX_VALID_PIPELINE: &str = "ValidPipeline-";

// ─── 사유 ────────────────────────────────────────────────────────────

pub const REASON_VALIDATION_SUCCESS: &str = "ValidationSuccess";
pub const REASON_VALIDATION_FAILURE: &str = "ValidationFailure";
pub const REASON_MISSING_SPEC: &str = "MissingSpec";
pub const REASON_MISSING_SOURCES: &str = "MissingSources";
pub const REASON_INVALID_GLOB: &str = "InvalidGlob";
pub const REASON_SECRET_NOT_FOUND: &str = "SecretNotFound";
pub const REASON_SECRET_KEY_NOT_FOUND: &str = "SecretKeyNotFound";
pub const REASON_CONFIG_MAP_NOT_FOUND: &str = "ConfigMapNotFound";
pub const REASON_CONFIG_MAP_KEY_NOT_FOUND: &str = "ConfigMapKeyNotFound";
pub const REASON_VALUE_EMPTY: &str = "ValueEmpty";
pub const REASON_FILTER_PRUNE_HOSTNAME: &str = "FilterPruneHostname";
pub const REASON_PIPELINE_INPUT_REF_NOT_FOUND: &str = "PipelineInputRefNotFound";
pub const REASON_PIPELINE_OUTPUT_REF_NOT_FOUND: &str = "PipelineOutputRefNotFound";
pub const REASON_PIPELINE_FILTER_REF_NOT_FOUND: &str = "PipelineFilterRefNotFound";
pub const REASON_CLUSTER_ROLE_MISSING: &str = "ClusterRoleMissing";
pub const REASON_CLUSTER_ROLES_EXIST: &str = "ClusterRolesExist";
pub const REASON_SERVICE_ACCOUNT_DOES_NOT_EXIST: &str = "ServiceAccountDoesNotExist";
pub const REASON_MIGRATE_OUTPUT: &str = "MigrateOutput";
pub const REASON_MIGRATE_INPUT: &str = "MigrateInput";

pub const REASON_RECONCILIATION_COMPLETE: &str = "ReconciliationComplete";
pub const REASON_MANAGEMENT_STATE_UNMANAGED: &str = "ManagementStateUnmanaged";
pub const REASON_INITIALIZATION_FAILED: &str = "InitializationFailed";
pub const REASON_DEPLOYMENT_ERROR: &str = "DeploymentError";

/// 컨디션 상태값
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::True => "True",
            Self::False => "False",
            Self::Unknown => "Unknown",
        }
    }
}

impl From<bool> for ConditionStatus {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 상태 컨디션 레코드
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: ConditionStatus,
    pub reason: String,
    #[serde(default)]
    pub message: String,
    pub last_transition_time: DateTime<Utc>,
    #[serde(default)]
    pub observed_generation: i64,
}

impl Condition {
    pub fn new(
        condition_type: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            condition_type: condition_type.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: Utc::now(),
            observed_generation: 0,
        }
    }

    /// `ValidationSuccess` 사유의 True 컨디션
    pub fn valid(condition_type: impl Into<String>) -> Self {
        Self::new(
            condition_type,
            ConditionStatus::True,
            REASON_VALIDATION_SUCCESS,
            "",
        )
    }

    /// 주어진 사유의 False 컨디션
    pub fn invalid(
        condition_type: impl Into<String>,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(condition_type, ConditionStatus::False, reason, message)
    }

    pub fn with_generation(mut self, generation: i64) -> Self {
        self.observed_generation = generation;
        self
    }

    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }

    pub fn is_false(&self) -> bool {
        self.status == ConditionStatus::False
    }

    /// 시각을 제외한 상태가 같은지 비교합니다.
    pub fn same_state(&self, other: &Self) -> bool {
        self.condition_type == other.condition_type
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// 요소별 컨디션 유형 이름
pub fn element_condition_type(prefix: &str, name: &str) -> String {
    format!("{prefix}{name}")
}

/// 같은 유형의 컨디션을 교체하거나 추가합니다.
///
/// 상태값이 바뀌지 않았다면 기존 `last_transition_time`을 유지합니다.
/// 바뀐 것이 있으면 `true`를 반환합니다.
pub fn set_condition(conditions: &mut Vec<Condition>, mut condition: Condition) -> bool {
    match conditions
        .iter_mut()
        .find(|c| c.condition_type == condition.condition_type)
    {
        Some(existing) => {
            if existing.status == condition.status {
                condition.last_transition_time = existing.last_transition_time;
            }
            let changed = !existing.same_state(&condition)
                || existing.observed_generation != condition.observed_generation;
            *existing = condition;
            changed
        }
        None => {
            conditions.push(condition);
            true
        }
    }
}

/// 유형으로 컨디션을 찾습니다.
pub fn find_condition<'a>(conditions: &'a [Condition], condition_type: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.condition_type == condition_type)
}
