//! 마이그레이션 -- 사용자 스펙을 명시적인 정규형으로 재작성
//!
//! 각 단계는 순수 함수 `fn(ClusterLogForwarder, &CompilerConfig) -> (ClusterLogForwarder, Vec<Condition>)`
//! 이며 [`MIGRATIONS`] 순서대로 왼쪽에서 오른쪽으로 합성됩니다. 모든 단계는 멱등입니다.
//!
//! # 단계
//! 1. [`defaults::init_service_account`]: 서비스 어카운트 audience 기본값
//! 2. [`inputs::migrate_inputs`]: 예약 입력 이름 구체화, 리시버 서빙 인증서
//! 3. [`defaults::migrate_outputs`]: LokiStack 데이터 모델 기본값
//! 4. [`defaults::init_loki_outputs`]: LokiStack `maxWrite` 기본값
//! 5. [`lokistack::migrate_lokistack`]: LokiStack을 테넌트별 Loki/OTLP 출력으로 분할
//! 6. [`elasticsearch::default_elasticsearch`]: `default` ES 출력을 테넌트별 인덱스로 분할
//! 7. [`defaults::init_resources`]: 수집기 리소스 기본값
//!
//! LokiStack 기본값(3, 4)은 분할(5) 전에 적용되어 생성된 출력이 상속합니다.

pub mod defaults;
pub mod elasticsearch;
pub mod inputs;
pub mod lokistack;

use std::collections::BTreeSet;

use logforward_core::api::condition::{CONDITION_MIGRATE, REASON_MIGRATE_OUTPUT};
use logforward_core::api::input::{
    INPUT_APPLICATION, INPUT_AUDIT, INPUT_INFRASTRUCTURE, RESERVED_INPUT_NAMES, ReceiverType,
};
use logforward_core::api::{
    ClusterLogForwarder, Condition, ConditionStatus, ForwarderSpec, InputKind, PipelineSpec,
};
use logforward_core::metrics::{LABEL_MIGRATION, MIGRATIONS_TOTAL};

use crate::config::CompilerConfig;

/// 마이그레이션 단계 함수
pub type MigrationFn =
    fn(ClusterLogForwarder, &CompilerConfig) -> (ClusterLogForwarder, Vec<Condition>);

/// 이름이 붙은 마이그레이션 단계
#[derive(Clone, Copy)]
pub struct Migration {
    /// 메트릭/로그용 단계 이름
    pub name: &'static str,
    pub apply: MigrationFn,
}

impl std::fmt::Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration").field("name", &self.name).finish()
    }
}

/// 고정 적용 순서
pub const MIGRATIONS: [Migration; 7] = [
    Migration {
        name: "init_service_account",
        apply: defaults::init_service_account,
    },
    Migration {
        name: "migrate_inputs",
        apply: inputs::migrate_inputs,
    },
    Migration {
        name: "migrate_outputs",
        apply: defaults::migrate_outputs,
    },
    Migration {
        name: "init_loki_outputs",
        apply: defaults::init_loki_outputs,
    },
    Migration {
        name: "migrate_lokistack",
        apply: lokistack::migrate_lokistack,
    },
    Migration {
        name: "default_elasticsearch",
        apply: elasticsearch::default_elasticsearch,
    },
    Migration {
        name: "init_resources",
        apply: defaults::init_resources,
    },
];

/// 모든 마이그레이션을 순서대로 적용합니다.
///
/// 스펙을 바꾼 단계는 `logforward_migrations_total`에 집계됩니다.
pub fn migrate(
    forwarder: ClusterLogForwarder,
    config: &CompilerConfig,
) -> (ClusterLogForwarder, Vec<Condition>) {
    let mut current = forwarder;
    let mut conditions = Vec::new();
    for step in MIGRATIONS {
        let before = current.spec.clone();
        let (next, mut step_conditions) = (step.apply)(current, config);
        if next.spec != before {
            tracing::debug!(
                migration = step.name,
                forwarder = %next.name(),
                "migration rewrote forwarder spec"
            );
            metrics::counter!(MIGRATIONS_TOTAL, LABEL_MIGRATION => step.name).increment(1);
        }
        conditions.append(&mut step_conditions);
        current = next;
    }
    (current, conditions)
}

// ─── 공통 도우미 ─────────────────────────────────────────────────────

/// 입력 이름에 해당하는 테넌트
///
/// 예약 이름은 그 자체가 테넌트입니다. 사용자 입력은 유형으로 결정하고,
/// syslog 리시버는 infrastructure, HTTP 리시버는 audit 테넌트로 보냅니다.
pub fn tenant_for_input(spec: &ForwarderSpec, input_name: &str) -> Option<&'static str> {
    if let Some(reserved) = RESERVED_INPUT_NAMES.iter().find(|r| **r == input_name) {
        return Some(reserved);
    }
    let input = spec.input(input_name)?;
    Some(match &input.kind {
        InputKind::Application(_) => INPUT_APPLICATION,
        InputKind::Infrastructure(_) => INPUT_INFRASTRUCTURE,
        InputKind::Audit(_) => INPUT_AUDIT,
        InputKind::Receiver(receiver) => match receiver.receiver_type {
            ReceiverType::Syslog => INPUT_INFRASTRUCTURE,
            ReceiverType::Http => INPUT_AUDIT,
        },
    })
}

/// 포워더가 이미 쓰고 있는 파이프라인 이름
pub(crate) fn pipeline_names(spec: &ForwarderSpec) -> BTreeSet<String> {
    spec.pipelines.iter().map(|p| p.name.clone()).collect()
}

/// 파이프라인을 입력마다 하나씩으로 나눕니다.
///
/// 첫 파이프라인은 원래 이름을, 이후는 `taken`에 없는 첫 `<name>-<n>`을 사용합니다.
/// 같은 입력을 여러 번 참조해도 파이프라인은 하나만 만듭니다.
/// `rewrite`가 `Some`을 돌려준 출력 참조만 바뀌고 나머지는 그대로 남습니다.
pub(crate) fn split_pipeline<F>(
    pipeline: &PipelineSpec,
    taken: &mut BTreeSet<String>,
    rewrite: F,
) -> Vec<PipelineSpec>
where
    F: Fn(&str, &str) -> Option<String>,
{
    let mut inputs: Vec<&String> = Vec::with_capacity(pipeline.input_refs.len());
    for input in &pipeline.input_refs {
        if !inputs.contains(&input) {
            inputs.push(input);
        }
    }

    let mut suffix = 0usize;
    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            let name = if index > 0 && !pipeline.name.is_empty() {
                loop {
                    suffix += 1;
                    let candidate = format!("{}-{suffix}", pipeline.name);
                    if taken.insert(candidate.clone()) {
                        break candidate;
                    }
                }
            } else {
                pipeline.name.clone()
            };
            let output_refs = pipeline
                .output_refs
                .iter()
                .map(|output| rewrite(output, input).unwrap_or_else(|| output.clone()))
                .collect();
            PipelineSpec {
                name,
                input_refs: vec![input.clone()],
                output_refs,
                filter_refs: pipeline.filter_refs.clone(),
            }
        })
        .collect()
}

/// 출력 재작성 Migrate 컨디션
pub(crate) fn migrate_output_condition(message: impl Into<String>) -> Condition {
    Condition::new(
        CONDITION_MIGRATE,
        ConditionStatus::True,
        REASON_MIGRATE_OUTPUT,
        message,
    )
}
