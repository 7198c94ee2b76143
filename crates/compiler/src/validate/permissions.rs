//! 권한 검증 -- 서비스 어카운트의 로그 수집 권한
//!
//! 파이프라인이 참조하는 논리 입력 유형마다 SubjectAccessReview를 한 번씩 질의해
//! `Authorized` 컨디션을 만듭니다.
//!
//! - 애플리케이션 입력이 `default`/`openshift*`/`kube*` 네임스페이스를 포함하면
//!   `infrastructure` 권한도 필요합니다.
//! - syslog 리시버는 `infrastructure` 권한이 필요합니다.
//! - 리시버만 있는 포워더는 질의 없이 허용됩니다.

use std::collections::BTreeSet;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use logforward_core::api::condition::{
    CONDITION_AUTHORIZED, REASON_CLUSTER_ROLE_MISSING, REASON_CLUSTER_ROLES_EXIST,
    REASON_SERVICE_ACCOUNT_DOES_NOT_EXIST,
};
use logforward_core::api::input::{INPUT_INFRASTRUCTURE, ReceiverType, RESERVED_INPUT_NAMES};
use logforward_core::api::{ClusterLogForwarder, Condition, ConditionStatus, InputKind};
use logforward_core::store::{AccessReviewer, ObjectStore, SubjectAccessReview};

use crate::cancel::guarded;
use crate::error::CompilerError;

/// 인프라 네임스페이스로 취급하는 패턴
pub const INFRA_NAMESPACE_PATTERN: &str = "^default$|^openshift.*$|^kube.*$";

pub const REVIEW_VERB: &str = "collect";
pub const REVIEW_RESOURCE: &str = "logs";
pub const REVIEW_GROUP: &str = "observability.openshift.io";

/// 파이프라인이 참조하는 입력에서 필요한 권한 유형과 리시버 존재 여부를 모읍니다.
pub fn gather_input_types(forwarder: &ClusterLogForwarder) -> (BTreeSet<&'static str>, bool) {
    let infra = regex::Regex::new(INFRA_NAMESPACE_PATTERN).ok();
    let spec = &forwarder.spec;
    let refs: BTreeSet<&str> = spec
        .pipelines
        .iter()
        .flat_map(|p| p.input_refs.iter().map(String::as_str))
        .collect();

    let mut types: BTreeSet<&'static str> = RESERVED_INPUT_NAMES
        .into_iter()
        .filter(|name| refs.contains(*name))
        .collect();
    let mut receivers = 0usize;

    for input in spec.inputs.iter().filter(|i| refs.contains(i.name.as_str())) {
        match &input.kind {
            InputKind::Application(app) => {
                types.insert(input.input_type().as_str());
                let includes_infra = app.includes.iter().any(|include| {
                    match (&infra, include.namespace.as_deref()) {
                        (Some(re), Some(ns)) => re.is_match(ns),
                        _ => false,
                    }
                });
                if includes_infra {
                    types.insert(INPUT_INFRASTRUCTURE);
                }
            }
            InputKind::Infrastructure(_) | InputKind::Audit(_) => {
                types.insert(input.input_type().as_str());
            }
            InputKind::Receiver(receiver) => {
                receivers += 1;
                if receiver.receiver_type == ReceiverType::Syslog {
                    types.insert(INPUT_INFRASTRUCTURE);
                }
            }
        }
    }
    (types, receivers > 0)
}

/// `Authorized` 컨디션을 계산합니다.
///
/// 서비스 어카운트가 없거나 권한이 부족한 것은 컨디션으로 보고하고,
/// 스토어/리뷰어 장애와 취소만 `Err`로 돌려줍니다.
pub async fn validate_permissions<S, R>(
    store: &S,
    reviewer: &R,
    forwarder: &ClusterLogForwarder,
    cancel: &CancellationToken,
) -> Result<Condition, CompilerError>
where
    S: ObjectStore,
    R: AccessReviewer,
{
    let namespace = forwarder.namespace();
    let sa_name = forwarder.spec.service_account.name.as_str();

    let account = guarded(cancel, store.get_service_account(namespace, sa_name)).await?;
    if account.is_none() {
        debug!(namespace = %namespace, service_account = %sa_name, "service account not found");
        return Ok(Condition::new(
            CONDITION_AUTHORIZED,
            ConditionStatus::False,
            REASON_SERVICE_ACCOUNT_DOES_NOT_EXIST,
            format!("serviceaccounts {sa_name:?} not found"),
        ));
    }

    let (types, has_receivers) = gather_input_types(forwarder);
    let permitted = types.iter().copied().collect::<Vec<_>>().join(" ");
    if types.is_empty() {
        if has_receivers {
            return Ok(authorized(&permitted));
        }
        warn!(namespace = %namespace, name = %forwarder.name(), "no inputs were found to evaluate permissions");
        return Ok(Condition::new(
            CONDITION_AUTHORIZED,
            ConditionStatus::False,
            REASON_CLUSTER_ROLE_MISSING,
            "There is an error in the input permission validation; no inputs were found to evaluate",
        ));
    }

    let user = format!("system:serviceaccount:{namespace}:{sa_name}");
    let mut denied = Vec::new();
    for input_type in &types {
        let review = SubjectAccessReview {
            user: user.clone(),
            // 클러스터 범위 바인딩
            namespace: String::new(),
            verb: REVIEW_VERB.to_owned(),
            resource: REVIEW_RESOURCE.to_owned(),
            group: REVIEW_GROUP.to_owned(),
            name: (*input_type).to_owned(),
        };
        let allowed = guarded(cancel, reviewer.review(review)).await?;
        debug!(user = %user, input = input_type, allowed, "subject access review");
        if !allowed {
            denied.push(*input_type);
        }
    }

    if denied.is_empty() {
        Ok(authorized(&permitted))
    } else {
        Ok(Condition::new(
            CONDITION_AUTHORIZED,
            ConditionStatus::False,
            REASON_CLUSTER_ROLE_MISSING,
            format!(
                "insufficient permissions on service account, not authorized to collect {denied:?} logs"
            ),
        ))
    }
}

fn authorized(permitted: &str) -> Condition {
    Condition::new(
        CONDITION_AUTHORIZED,
        ConditionStatus::True,
        REASON_CLUSTER_ROLES_EXIST,
        format!("permitted to collect log types: [{permitted}]"),
    )
}
