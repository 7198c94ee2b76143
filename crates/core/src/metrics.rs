//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 레이블 키를 중앙에서 정의합니다.
//! 컴파일러는 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다. 익스포터 설치는 호출자의 몫입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logforward_`
//! - 접미어: `_total` (counter), `_seconds` (histogram), `_info` (presence gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(logforward_core::metrics::RECONCILE_TOTAL, "result" => "success").increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (success, invalid, error, cancelled, unmanaged)
pub const LABEL_RESULT: &str = "result";

/// 검증 대상 요소 레이블 키 (input, output, filter, pipeline, forwarder)
pub const LABEL_ELEMENT: &str = "element";

/// 마이그레이션 단계 레이블 키
pub const LABEL_MIGRATION: &str = "migration";

/// 포워더 네임스페이스 레이블 키
pub const LABEL_NAMESPACE: &str = "namespace";

/// 포워더 이름 레이블 키
pub const LABEL_NAME: &str = "name";

// ─── 텔레메트리 presence 값 ────────────────────────────────────────

/// 레이블 값: 존재함
pub const IS_PRESENT: &str = "1";

/// 레이블 값: 존재하지 않음
pub const IS_NOT_PRESENT: &str = "0";

/// 출력 유형 텔레메트리 레이블 집합
///
/// `fluentdForward`는 현재 API에서 받을 수 없는 유형이며 항상 `"0"`으로 보고됩니다.
pub const OUTPUT_TYPE_LABELS: [&str; 14] = [
    "default",
    "azureMonitor",
    "cloudwatch",
    "elasticsearch",
    "fluentdForward",
    "googleCloudLogging",
    "http",
    "kafka",
    "loki",
    "lokiStack",
    "otlp",
    "s3",
    "splunk",
    "syslog",
];

/// 입력 유형 텔레메트리 레이블 집합
pub const INPUT_TYPE_LABELS: [&str; 3] = ["application", "audit", "infrastructure"];

// ─── Reconcile 메트릭 ──────────────────────────────────────────────

/// Reconcile: 전체 reconcile 호출 수 (counter, label: result)
pub const RECONCILE_TOTAL: &str = "logforward_reconcile_total";

/// Reconcile: reconcile 처리 시간 (histogram, 초)
pub const RECONCILE_DURATION_SECONDS: &str = "logforward_reconcile_duration_seconds";

/// Validation: False 컨디션 수 (counter, label: element)
pub const VALIDATION_FAILURES_TOTAL: &str = "logforward_validation_failures_total";

/// Migration: 스펙을 재작성한 마이그레이션 수 (counter, label: migration)
pub const MIGRATIONS_TOTAL: &str = "logforward_migrations_total";

/// Generator: 렌더링된 설정 문서 크기 (histogram, 바이트)
pub const RENDERED_CONFIG_BYTES: &str = "logforward_rendered_config_bytes";

// ─── 텔레메트리 gauge ──────────────────────────────────────────────

/// 포워더 상태 및 파이프라인 수 (gauge, label: healthStatus, pipelineInfo)
pub const FORWARDER_PIPELINE_INFO: &str = "logforward_forwarder_pipeline_info";

/// 포워더 입력 유형 presence (gauge, label: 입력 유형별 "0"/"1")
pub const FORWARDER_INPUT_INFO: &str = "logforward_forwarder_input_info";

/// 포워더 출력 유형 presence (gauge, label: 출력 유형별 "0"/"1")
pub const FORWARDER_OUTPUT_INFO: &str = "logforward_forwarder_output_info";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더 설치 직후 한 번 호출하면
/// `metrics::describe_counter!()`, `describe_gauge!()`, `describe_histogram!()`을
/// 통해 각 메트릭의 HELP 텍스트가 등록됩니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        RECONCILE_TOTAL,
        "Total number of forwarder reconciliations by result"
    );
    describe_histogram!(
        RECONCILE_DURATION_SECONDS,
        "Forwarder reconciliation latency in seconds"
    );
    describe_counter!(
        VALIDATION_FAILURES_TOTAL,
        "Validation conditions reported as False, by element kind"
    );
    describe_counter!(
        MIGRATIONS_TOTAL,
        "Migration steps that rewrote the forwarder spec"
    );
    describe_histogram!(
        RENDERED_CONFIG_BYTES,
        "Size of the rendered collector configuration in bytes"
    );
    describe_gauge!(
        FORWARDER_PIPELINE_INFO,
        "Forwarder health and number of pipelines"
    );
    describe_gauge!(FORWARDER_INPUT_INFO, "Forwarder input type presence");
    describe_gauge!(FORWARDER_OUTPUT_INFO, "Forwarder output type presence");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_share_prefix() {
        for name in [
            RECONCILE_TOTAL,
            RECONCILE_DURATION_SECONDS,
            VALIDATION_FAILURES_TOTAL,
            MIGRATIONS_TOTAL,
            RENDERED_CONFIG_BYTES,
            FORWARDER_PIPELINE_INFO,
            FORWARDER_INPUT_INFO,
            FORWARDER_OUTPUT_INFO,
        ] {
            assert!(name.starts_with("logforward_"), "{name}");
        }
    }

    #[test]
    fn output_labels_include_inert_fluentd_forward() {
        assert!(OUTPUT_TYPE_LABELS.contains(&"fluentdForward"));
        assert!(OUTPUT_TYPE_LABELS.contains(&"default"));
    }

    #[test]
    fn describe_all_without_recorder_is_noop() {
        describe_all();
    }
}
