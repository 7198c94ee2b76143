//! 조정 파이프라인
//!
//! 한 번의 조정은 다음 순서로 진행됩니다.
//!
//! ```text
//! fetch ──> migrate ──> snapshot ──> validate ──> authorize ──> synthesize
//!                                                                   │
//!                                           Ready=True ──> render ──┤
//!                                                                   └──> update_status
//! ```
//!
//! 외부 호출은 모두 취소 토큰과 경합합니다. 취소되면 상태를 기록하지 않고
//! [`CompilerError::Cancelled`]를 돌려줍니다.

use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use logforward_core::api::{ClusterLogForwarder, ForwarderStatus};
use logforward_core::error::StoreError;
use logforward_core::metrics::{
    LABEL_RESULT, RECONCILE_DURATION_SECONDS, RECONCILE_TOTAL, RENDERED_CONFIG_BYTES,
};
use logforward_core::store::{AccessReviewer, ObjectStore, RenderedConfig};

use crate::aws;
use crate::cancel::guarded;
use crate::config::CompilerConfig;
use crate::error::CompilerError;
use crate::generator;
use crate::migrate::{self, inputs::generated_secrets};
use crate::model::ForwarderModel;
use crate::secrets::{SecretSnapshot, service_account_token_secret};
use crate::status;
use crate::telemetry;
use crate::validate::{permissions::validate_permissions, validate};

/// 조정 결과
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// 기록된 상태
    pub status: ForwarderStatus,
    /// `Ready=True`일 때 기록된 렌더링 결과
    pub rendered: Option<RenderedConfig>,
    /// 수집기를 내려야 하는지
    pub undeploy: bool,
}

impl ReconcileOutcome {
    pub fn is_ready(&self) -> bool {
        status::is_ready(&self.status)
    }

    fn result_label(&self, managed: bool) -> &'static str {
        match (managed, self.is_ready()) {
            (false, _) => "unmanaged",
            (true, true) => "ready",
            (true, false) => "not_ready",
        }
    }
}

/// 포워더 하나를 조정합니다.
///
/// 검증 실패는 상태 컨디션으로 보고되고 `Ok`를 돌려줍니다.
/// 스토어/리뷰어 장애와 취소만 `Err`입니다.
pub async fn reconcile<S, R>(
    store: &S,
    reviewer: &R,
    config: &CompilerConfig,
    namespace: &str,
    name: &str,
    cancel: &CancellationToken,
) -> Result<ReconcileOutcome, CompilerError>
where
    S: ObjectStore,
    R: AccessReviewer,
{
    let started = Instant::now();
    let result = run(store, reviewer, config, namespace, name, cancel).await;
    let label = match &result {
        Ok((outcome, managed)) => outcome.result_label(*managed),
        Err(CompilerError::Cancelled) => "cancelled",
        Err(_) => "error",
    };
    metrics::counter!(RECONCILE_TOTAL, LABEL_RESULT => label).increment(1);
    metrics::histogram!(RECONCILE_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

    match result {
        Ok((outcome, _)) => {
            info!(
                namespace = %namespace,
                name = %name,
                ready = outcome.is_ready(),
                rendered = outcome.rendered.is_some(),
                "reconcile complete"
            );
            Ok(outcome)
        }
        Err(CompilerError::Cancelled) => {
            debug!(namespace = %namespace, name = %name, "reconcile cancelled");
            Err(CompilerError::Cancelled)
        }
        Err(e) => {
            warn!(namespace = %namespace, name = %name, error = %e, "reconcile failed");
            Err(e)
        }
    }
}

async fn run<S, R>(
    store: &S,
    reviewer: &R,
    config: &CompilerConfig,
    namespace: &str,
    name: &str,
    cancel: &CancellationToken,
) -> Result<(ReconcileOutcome, bool), CompilerError>
where
    S: ObjectStore,
    R: AccessReviewer,
{
    let original = guarded(cancel, store.get_forwarder(namespace, name))
        .await?
        .ok_or_else(|| StoreError::not_found("ClusterLogForwarder", format!("{namespace}/{name}")))?;
    let generation = original.metadata.generation;

    if !original.is_managed() {
        let status = status::unmanaged(&original.status, generation);
        guarded(cancel, store.update_status(namespace, name, status.clone())).await?;
        let outcome = ReconcileOutcome {
            status,
            rendered: None,
            undeploy: false,
        };
        return Ok((outcome, false));
    }

    let (migrated, migrations) = migrate::migrate(original.clone(), config);
    let model = ForwarderModel::new(&migrated);
    let secrets = snapshot(store, &model, cancel).await?;

    let validation = validate(&original, &migrated, &secrets);
    let authorized = validate_permissions(store, reviewer, &migrated, cancel).await?;
    let status = status::synthesize(
        &original.status,
        validation,
        Some(authorized),
        migrations,
        generation,
    );
    let ready = status::is_ready(&status);
    telemetry::update(&original, ready);

    let rendered = if ready {
        let rendered = render(&model, &secrets, config)?;
        metrics::histogram!(RENDERED_CONFIG_BYTES).record(rendered.collector_toml.len() as f64);
        guarded(cancel, store.put_config(rendered.clone())).await?;
        Some(rendered)
    } else {
        debug!(namespace = %namespace, name = %name, "forwarder not ready; collector config not regenerated");
        None
    };

    guarded(cancel, store.update_status(namespace, name, status.clone())).await?;
    let undeploy = status::must_undeploy_collector(&status.conditions);
    Ok((
        ReconcileOutcome {
            status,
            rendered,
            undeploy,
        },
        true,
    ))
}

/// 참조된 시크릿과 컨피그맵을 한 번씩 읽어 스냅샷을 만듭니다.
///
/// 없는 오브젝트는 건너뛰고 검증 단계에서 컨디션으로 보고됩니다.
pub async fn snapshot<S: ObjectStore>(
    store: &S,
    model: &ForwarderModel<'_>,
    cancel: &CancellationToken,
) -> Result<SecretSnapshot, CompilerError> {
    let forwarder: &ClusterLogForwarder = model.forwarder;
    let namespace = forwarder.namespace();
    let mut secrets = SecretSnapshot::new();
    for name in generated_secrets(forwarder) {
        secrets.mark_generated(name);
    }
    secrets.mark_generated(service_account_token_secret(model.service_account()));

    for name in model.secret_names() {
        match guarded(cancel, store.get_secret(namespace, &name)).await? {
            Some(secret) => secrets.insert_secret(secret),
            None => debug!(namespace = %namespace, secret = %name, "referenced secret not found"),
        }
    }
    for name in model.config_map_names() {
        match guarded(cancel, store.get_config_map(namespace, &name)).await? {
            Some(config_map) => secrets.insert_config_map(config_map),
            None => debug!(namespace = %namespace, config_map = %name, "referenced configmap not found"),
        }
    }
    Ok(secrets)
}

fn render(
    model: &ForwarderModel<'_>,
    secrets: &SecretSnapshot,
    config: &CompilerConfig,
) -> Result<RenderedConfig, CompilerError> {
    let forwarder = model.forwarder;
    Ok(RenderedConfig {
        namespace: forwarder.namespace().to_owned(),
        name: forwarder.name().to_owned(),
        collector_toml: generator::generate(model, config)?,
        aws_credentials: aws::render_credentials(forwarder, secrets, config)?,
        secret_names: model.secret_names().into_iter().collect(),
        config_map_names: model.config_map_names().into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use logforward_core::api::condition::{
        CONDITION_AUTHORIZED, CONDITION_READY, REASON_CLUSTER_ROLE_MISSING,
        REASON_MANAGEMENT_STATE_UNMANAGED, find_condition,
    };
    use logforward_core::api::output::{Elasticsearch, Http};
    use logforward_core::api::{
        ConditionStatus, ManagementState, OutputKind, OutputSpec, PipelineSpec, SecretReference,
    };

    use crate::memory::{MemoryStore, StaticReviewer};

    const NS: &str = "openshift-logging";

    fn forwarder() -> ClusterLogForwarder {
        let mut clf = ClusterLogForwarder::new(NS, "collector");
        clf.metadata.generation = 2;
        clf.spec.service_account.name = "logcollector".to_owned();
        clf.spec.outputs.push(OutputSpec::new(
            "web",
            OutputKind::Http(Http {
                url: "https://web.example.com/logs".to_owned(),
                ..Default::default()
            }),
        ));
        clf.spec.pipelines.push(PipelineSpec {
            name: "app".to_owned(),
            input_refs: vec!["application".to_owned()],
            output_refs: vec!["web".to_owned()],
            filter_refs: Vec::new(),
        });
        clf
    }

    fn store(clf: ClusterLogForwarder) -> MemoryStore {
        MemoryStore::new()
            .with_forwarder(clf)
            .with_service_account(NS, "logcollector")
    }

    #[tokio::test]
    async fn ready_forwarder_renders_config() {
        let store = store(forwarder());
        let outcome = reconcile(
            &store,
            &StaticReviewer::allow_all(),
            &CompilerConfig::default(),
            NS,
            "collector",
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(outcome.is_ready());
        assert!(!outcome.undeploy);
        let rendered = store.rendered(NS, "collector").await.unwrap();
        assert!(rendered.collector_toml.contains("[sinks.output_web]"));
        assert_eq!(rendered.aws_credentials, None);
        let status = store.status(NS, "collector").await.unwrap();
        assert!(status.all_conditions().all(|c| c.observed_generation == 2));
    }

    #[tokio::test]
    async fn missing_secret_blocks_rendering() {
        let mut clf = forwarder();
        clf.spec.outputs.push(OutputSpec::new(
            "es",
            OutputKind::Elasticsearch(Elasticsearch {
                url: "https://es.example.com:9200".to_owned(),
                index: "{.log_type||\"app\"}".to_owned(),
                authentication: Some(logforward_core::api::output::HttpAuthentication {
                    username: Some(SecretReference::new("es-secret", "username")),
                    password: Some(SecretReference::new("es-secret", "password")),
                    ..Default::default()
                }),
                ..Default::default()
            }),
        ));
        clf.spec.pipelines[0].output_refs.push("es".to_owned());
        let store = store(clf);

        let outcome = reconcile(
            &store,
            &StaticReviewer::allow_all(),
            &CompilerConfig::default(),
            NS,
            "collector",
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(!outcome.is_ready());
        assert!(outcome.rendered.is_none());
        assert!(store.rendered(NS, "collector").await.is_none());
        let es = outcome
            .status
            .outputs
            .iter()
            .find(|c| c.condition_type == "ValidOutput-es")
            .unwrap();
        assert!(es.is_false());
    }

    #[tokio::test]
    async fn unauthorized_requests_undeploy() {
        let store = store(forwarder());
        let outcome = reconcile(
            &store,
            &StaticReviewer::allowing(["audit"]),
            &CompilerConfig::default(),
            NS,
            "collector",
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        let authorized = find_condition(&outcome.status.conditions, CONDITION_AUTHORIZED).unwrap();
        assert_eq!(authorized.reason, REASON_CLUSTER_ROLE_MISSING);
        assert!(outcome.undeploy);
        assert!(store.rendered(NS, "collector").await.is_none());
    }

    #[tokio::test]
    async fn unmanaged_forwarder_is_not_rendered() {
        let mut clf = forwarder();
        clf.spec.management_state = ManagementState::Unmanaged;
        let store = store(clf);
        let outcome = reconcile(
            &store,
            &StaticReviewer::allow_all(),
            &CompilerConfig::default(),
            NS,
            "collector",
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        let ready = find_condition(&outcome.status.conditions, CONDITION_READY).unwrap();
        assert_eq!(ready.status, ConditionStatus::Unknown);
        assert_eq!(ready.reason, REASON_MANAGEMENT_STATE_UNMANAGED);
        assert!(outcome.rendered.is_none());
    }

    #[tokio::test]
    async fn cancelled_reconcile_writes_nothing() {
        let store = store(forwarder());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = reconcile(
            &store,
            &StaticReviewer::allow_all(),
            &CompilerConfig::default(),
            NS,
            "collector",
            &cancel,
        )
        .await;

        assert!(matches!(result, Err(CompilerError::Cancelled)));
        assert!(store.status(NS, "collector").await.is_none());
    }

    #[tokio::test]
    async fn store_failures_surface_as_errors() {
        let store = store(forwarder());
        store.set_unavailable(true);
        let result = reconcile(
            &store,
            &StaticReviewer::allow_all(),
            &CompilerConfig::default(),
            NS,
            "collector",
            &CancellationToken::new(),
        )
        .await;
        assert!(matches!(result, Err(CompilerError::Store(StoreError::Request(_)))));
    }

    #[tokio::test]
    async fn missing_forwarder_is_not_found() {
        let store = MemoryStore::new();
        let result = reconcile(
            &store,
            &StaticReviewer::allow_all(),
            &CompilerConfig::default(),
            NS,
            "absent",
            &CancellationToken::new(),
        )
        .await;
        assert!(matches!(result, Err(CompilerError::Store(ref e)) if e.is_not_found()));
    }
}
