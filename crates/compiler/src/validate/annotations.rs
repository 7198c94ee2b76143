//! 어노테이션 검증
//!
//! 어노테이션이 있을 때만 컨디션을 만듭니다. 이 컨디션들은 `Ready`에 영향을 주지 않습니다.

use logforward_core::api::condition::{
    CONDITION_LOG_LEVEL, CONDITION_MAX_UNAVAILABLE, CONDITION_USE_KUBE_CACHE,
    REASON_VALIDATION_FAILURE, REASON_VALIDATION_SUCCESS,
};
use logforward_core::api::forwarder::{
    ANNOTATION_LOG_LEVEL, ANNOTATION_MAX_UNAVAILABLE, ANNOTATION_USE_KUBE_CACHE, is_enabled_value,
};
use logforward_core::api::{ClusterLogForwarder, Condition, ConditionStatus};

/// 수집기 로그 레벨
pub const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// `use-kube-cache`가 받는 값
const BOOL_VALUES: [&str; 4] = ["true", "false", "enabled", "disabled"];

pub fn validate_annotations(forwarder: &ClusterLogForwarder) -> Vec<Condition> {
    let checks: [(&str, &str, fn(&str) -> Result<(), String>); 3] = [
        (ANNOTATION_LOG_LEVEL, CONDITION_LOG_LEVEL, check_log_level),
        (ANNOTATION_MAX_UNAVAILABLE, CONDITION_MAX_UNAVAILABLE, check_max_unavailable),
        (ANNOTATION_USE_KUBE_CACHE, CONDITION_USE_KUBE_CACHE, check_use_kube_cache),
    ];
    checks
        .into_iter()
        .filter_map(|(annotation, condition_type, check)| {
            let value = forwarder.annotation(annotation)?;
            Some(match check(value) {
                Ok(()) => Condition::new(
                    condition_type,
                    ConditionStatus::True,
                    REASON_VALIDATION_SUCCESS,
                    format!("{annotation}: {value:?}"),
                ),
                Err(message) => {
                    Condition::new(condition_type, ConditionStatus::False, REASON_VALIDATION_FAILURE, message)
                }
            })
        })
        .collect()
}

pub fn check_log_level(value: &str) -> Result<(), String> {
    if LOG_LEVELS.contains(&value) {
        Ok(())
    } else {
        Err(format!(
            "{value:?} is not a valid log level, must be one of: {}",
            LOG_LEVELS.join(", ")
        ))
    }
}

/// 1–100 정수 또는 `1%`–`100%`
pub fn check_max_unavailable(value: &str) -> Result<(), String> {
    let number = value.strip_suffix('%').unwrap_or(value);
    match number.parse::<u32>() {
        Ok(n) if (1..=100).contains(&n) && !number.starts_with('+') => Ok(()),
        _ => Err(format!(
            "{value:?} must be an integer between 1 and 100 or a percentage between 1% and 100%"
        )),
    }
}

pub fn check_use_kube_cache(value: &str) -> Result<(), String> {
    if BOOL_VALUES.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        Ok(())
    } else {
        Err(format!(
            "{value:?} is not a valid value, must be one of: {}",
            BOOL_VALUES.join(", ")
        ))
    }
}

/// `use-kube-cache`가 켜져 있는지
pub fn use_kube_cache(forwarder: &ClusterLogForwarder) -> bool {
    forwarder
        .annotation(ANNOTATION_USE_KUBE_CACHE)
        .is_some_and(is_enabled_value)
}
