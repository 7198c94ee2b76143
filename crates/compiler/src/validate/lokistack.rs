//! LokiStack 검증 -- 마이그레이션 전 포워더 대상
//!
//! LokiStack 출력은 분할 후 사라지므로 토큰 유무와 OTLP 데이터 모델 게이팅은
//! 사용자가 작성한 원본에서 확인합니다.

use logforward_core::api::condition::{
    CONDITION_PREFIX_VALID_OUTPUT, CONDITION_VALID_LOKISTACK_OTLP_OUTPUTS, REASON_MISSING_SPEC,
    REASON_VALIDATION_FAILURE, REASON_VALIDATION_SUCCESS, element_condition_type,
};
use logforward_core::api::forwarder::ANNOTATION_ENABLE_OTLP;
use logforward_core::api::output::LokiStackDataModel;
use logforward_core::api::{ClusterLogForwarder, Condition, ConditionStatus, OutputKind};

use super::outputs::MISSING_OTLP_ANNOTATION;

pub fn validate_lokistack(original: &ClusterLogForwarder) -> Vec<Condition> {
    let mut conditions = Vec::new();
    let mut otel = false;
    for output in &original.spec.outputs {
        let OutputKind::LokiStack(lokistack) = &output.kind else {
            continue;
        };
        otel |= lokistack.data_model == Some(LokiStackDataModel::Otel);
        if lokistack
            .authentication
            .as_ref()
            .and_then(|a| a.token.as_ref())
            .is_none()
        {
            conditions.push(Condition::invalid(
                element_condition_type(CONDITION_PREFIX_VALID_OUTPUT, &output.name),
                REASON_MISSING_SPEC,
                format!("lokiStack output {:?} requires authentication.token", output.name),
            ));
        }
    }

    if otel {
        conditions.push(if original.annotation_enabled(ANNOTATION_ENABLE_OTLP) {
            Condition::new(
                CONDITION_VALID_LOKISTACK_OTLP_OUTPUTS,
                ConditionStatus::True,
                REASON_VALIDATION_SUCCESS,
                "",
            )
        } else {
            Condition::new(
                CONDITION_VALID_LOKISTACK_OTLP_OUTPUTS,
                ConditionStatus::False,
                REASON_VALIDATION_FAILURE,
                MISSING_OTLP_ANNOTATION,
            )
        });
    }
    conditions
}
