//! 상태 합성 -- 검증/권한/마이그레이션 컨디션을 포워더 상태로 합칩니다.
//!
//! 매 패스마다 모든 컨디션을 다시 계산하고, 이전 상태와 병합할 때는
//! 상태값이 같으면 `lastTransitionTime`을 유지합니다. 이번 패스에 나오지 않은
//! 컨디션(삭제된 요소 등)은 제거됩니다.

use logforward_core::api::condition::{
    CONDITION_AUTHORIZED, CONDITION_MIGRATE, CONDITION_READY, CONDITION_VALID,
    REASON_CLUSTER_ROLE_MISSING, REASON_MANAGEMENT_STATE_UNMANAGED,
    REASON_RECONCILIATION_COMPLETE, REASON_SERVICE_ACCOUNT_DOES_NOT_EXIST,
    REASON_VALIDATION_FAILURE, find_condition, set_condition,
};
use logforward_core::api::{Condition, ConditionStatus, ForwarderStatus};
use logforward_core::metrics::{LABEL_ELEMENT, VALIDATION_FAILURES_TOTAL};
use tracing::debug;

/// `Valid=False` 메시지
pub const VALIDATION_FAILURE_MESSAGE: &str =
    "one or more conditions [inputs, outputs, pipelines, filters] have failed validation";

/// 이전 목록에 새 목록을 병합하고 새 목록에 없는 유형은 지웁니다.
fn merge(previous: &[Condition], current: Vec<Condition>) -> Vec<Condition> {
    let mut merged: Vec<Condition> = previous
        .iter()
        .filter(|p| current.iter().any(|c| c.condition_type == p.condition_type))
        .cloned()
        .collect();
    for condition in current {
        set_condition(&mut merged, condition);
    }
    merged
}

/// Migrate 컨디션은 최상위에 하나만 둘 수 있으므로 메시지를 합칩니다.
fn combine_migrations(migrations: Vec<Condition>) -> Option<Condition> {
    let mut iter = migrations.into_iter();
    let mut combined = iter.next()?;
    for next in iter {
        if !next.message.is_empty() {
            if !combined.message.is_empty() {
                combined.message.push_str("; ");
            }
            combined.message.push_str(&next.message);
        }
    }
    combined.condition_type = CONDITION_MIGRATE.to_owned();
    Some(combined)
}

fn count_failures(element: &'static str, conditions: &[Condition]) {
    let failed = conditions.iter().filter(|c| c.is_false()).count();
    if failed > 0 {
        metrics::counter!(VALIDATION_FAILURES_TOTAL, LABEL_ELEMENT => element)
            .increment(failed as u64);
    }
}

/// 한 패스의 결과로 새 상태를 만듭니다.
///
/// - `validation`: 요소별 컨디션과 어노테이션/LokiStack 최상위 컨디션
/// - `authorized`: 권한 검사 결과 (검사를 건너뛰었으면 `None`)
/// - `migrations`: 마이그레이션이 만든 Migrate 컨디션
pub fn synthesize(
    previous: &ForwarderStatus,
    validation: ForwarderStatus,
    authorized: Option<Condition>,
    migrations: Vec<Condition>,
    generation: i64,
) -> ForwarderStatus {
    let stamp = |list: Vec<Condition>| -> Vec<Condition> {
        list.into_iter().map(|c| c.with_generation(generation)).collect()
    };

    count_failures("input", &validation.inputs);
    count_failures("output", &validation.outputs);
    count_failures("filter", &validation.filters);
    count_failures("pipeline", &validation.pipelines);
    count_failures("forwarder", &validation.conditions);

    let elements_valid = validation
        .inputs
        .iter()
        .chain(&validation.outputs)
        .chain(&validation.filters)
        .chain(&validation.pipelines)
        .all(Condition::is_true);
    // 어노테이션 컨디션(LogLevel 등)은 Ready에 영향을 주지 않습니다.
    let blocking = validation
        .conditions
        .iter()
        .find(|c| c.is_false() && c.condition_type.starts_with(CONDITION_VALID))
        .cloned();

    let mut top = validation.conditions;
    top.push(if elements_valid {
        Condition::valid(CONDITION_VALID)
    } else {
        Condition::invalid(CONDITION_VALID, REASON_VALIDATION_FAILURE, VALIDATION_FAILURE_MESSAGE)
    });
    top.extend(combine_migrations(migrations));

    let ready = match (&authorized, blocking) {
        _ if !elements_valid => Condition::invalid(
            CONDITION_READY,
            REASON_VALIDATION_FAILURE,
            VALIDATION_FAILURE_MESSAGE,
        ),
        (_, Some(failed)) => Condition::invalid(CONDITION_READY, failed.reason, failed.message),
        (Some(auth), None) if !auth.is_true() => {
            Condition::invalid(CONDITION_READY, auth.reason.clone(), auth.message.clone())
        }
        (Some(_), None) => Condition::new(
            CONDITION_READY,
            ConditionStatus::True,
            REASON_RECONCILIATION_COMPLETE,
            "",
        ),
        (None, None) => Condition::invalid(
            CONDITION_READY,
            REASON_VALIDATION_FAILURE,
            "authorization was not evaluated",
        ),
    };
    top.extend(authorized);
    top.push(ready);

    let status = ForwarderStatus {
        conditions: merge(&previous.conditions, stamp(top)),
        inputs: merge(&previous.inputs, stamp(validation.inputs)),
        outputs: merge(&previous.outputs, stamp(validation.outputs)),
        filters: merge(&previous.filters, stamp(validation.filters)),
        pipelines: merge(&previous.pipelines, stamp(validation.pipelines)),
    };
    debug!(ready = is_ready(&status), generation, "synthesized forwarder status");
    status
}

/// 관리하지 않는 포워더의 상태: `Ready=Unknown`만 기록합니다.
pub fn unmanaged(previous: &ForwarderStatus, generation: i64) -> ForwarderStatus {
    let mut status = previous.clone();
    set_condition(
        &mut status.conditions,
        Condition::new(
            CONDITION_READY,
            ConditionStatus::Unknown,
            REASON_MANAGEMENT_STATE_UNMANAGED,
            "forwarder is not managed; no collector configuration is rendered",
        )
        .with_generation(generation),
    );
    status
}

/// `Ready=True`인지
pub fn is_ready(status: &ForwarderStatus) -> bool {
    find_condition(&status.conditions, CONDITION_READY).is_some_and(Condition::is_true)
}

/// 권한이 없어 수집기를 내려야 하는지
pub fn must_undeploy_collector(conditions: &[Condition]) -> bool {
    find_condition(conditions, CONDITION_AUTHORIZED).is_some_and(|c| {
        c.is_false()
            && (c.reason == REASON_CLUSTER_ROLE_MISSING
                || c.reason == REASON_SERVICE_ACCOUNT_DOES_NOT_EXIST)
    })
}
