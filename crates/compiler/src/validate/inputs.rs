//! 입력 검증

use logforward_core::api::condition::{
    REASON_INVALID_GLOB, REASON_MISSING_SOURCES, REASON_MISSING_SPEC,
};
use logforward_core::api::input::{
    Application, HTTP_RECEIVER_FORMAT_KUBE_API_AUDIT, LabelSelector, NamespaceContainer,
    Receiver, ReceiverType,
};
use logforward_core::api::{InputKind, InputSpec};

use super::{Failure, Outcome};
use crate::secrets::SecretSnapshot;

/// 리시버 포트 범위
pub const RECEIVER_PORT_RANGE: std::ops::RangeInclusive<i32> = 1024..=65535;

/// 레이블 셀렉터 연산자
const SELECTOR_OPERATORS: [&str; 4] = ["In", "NotIn", "Exists", "DoesNotExist"];

pub fn validate_input(input: &InputSpec, secrets: &SecretSnapshot) -> Outcome {
    match &input.kind {
        InputKind::Application(app) => validate_application(&input.name, app),
        InputKind::Infrastructure(infra) if infra.sources.is_empty() => Err(Failure::new(
            REASON_MISSING_SOURCES,
            format!("infrastructure input {:?} must define at least one source", input.name),
        )),
        InputKind::Audit(audit) if audit.sources.is_empty() => Err(Failure::new(
            REASON_MISSING_SOURCES,
            format!("audit input {:?} must define at least one source", input.name),
        )),
        InputKind::Infrastructure(_) | InputKind::Audit(_) => Ok(()),
        InputKind::Receiver(receiver) => validate_receiver(&input.name, receiver, secrets),
    }
}

/// 네임스페이스/컨테이너 글롭: `^[a-zA-Z0-9*\-]*$`
pub fn is_valid_glob(glob: &str) -> bool {
    glob.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '*' || c == '-')
}

fn validate_application(name: &str, app: &Application) -> Outcome {
    let globs = app
        .includes
        .iter()
        .chain(&app.excludes)
        .flat_map(|NamespaceContainer { namespace, container }| [namespace, container])
        .flatten();
    for glob in globs {
        if !is_valid_glob(glob) {
            return Err(Failure::new(
                REASON_INVALID_GLOB,
                format!(
                    "application input {name:?} has an invalid glob {glob:?}: must match ^[a-zA-Z0-9*\\-]*$"
                ),
            ));
        }
    }

    if let Some(limit) = app
        .tuning
        .as_ref()
        .and_then(|t| t.rate_limit_per_container)
        && limit.max_records_per_second <= 0
    {
        return Err(Failure::invalid(format!(
            "application input {name:?} rateLimitPerContainer.maxRecordsPerSecond must be greater than 0"
        )));
    }

    if let Some(selector) = &app.selector {
        validate_selector(name, selector)?;
    }
    Ok(())
}

fn validate_selector(name: &str, selector: &LabelSelector) -> Outcome {
    for requirement in &selector.match_expressions {
        if !SELECTOR_OPERATORS.contains(&requirement.operator.as_str()) {
            return Err(Failure::invalid(format!(
                "application input {name:?} selector has unknown operator {:?}",
                requirement.operator
            )));
        }
        let needs_values = matches!(requirement.operator.as_str(), "In" | "NotIn");
        if needs_values == requirement.values.is_empty() {
            return Err(Failure::invalid(format!(
                "application input {name:?} selector operator {:?} on key {:?} has invalid values",
                requirement.operator, requirement.key
            )));
        }
    }
    Ok(())
}

fn validate_receiver(name: &str, receiver: &Receiver, secrets: &SecretSnapshot) -> Outcome {
    if !RECEIVER_PORT_RANGE.contains(&receiver.port) {
        return Err(Failure::invalid(format!(
            "receiver input {name:?} port {} must be between {} and {}",
            receiver.port,
            RECEIVER_PORT_RANGE.start(),
            RECEIVER_PORT_RANGE.end()
        )));
    }

    match (receiver.receiver_type, &receiver.http) {
        (ReceiverType::Http, None) => {
            return Err(Failure::new(
                REASON_MISSING_SPEC,
                format!("http receiver input {name:?} must define an http section"),
            ));
        }
        (ReceiverType::Http, Some(http)) if http.format != HTTP_RECEIVER_FORMAT_KUBE_API_AUDIT => {
            return Err(Failure::invalid(format!(
                "http receiver input {name:?} has unsupported format {:?}, expected {HTTP_RECEIVER_FORMAT_KUBE_API_AUDIT:?}",
                http.format
            )));
        }
        (ReceiverType::Syslog, Some(_)) => {
            return Err(Failure::invalid(format!(
                "syslog receiver input {name:?} must not define an http section"
            )));
        }
        _ => {}
    }

    if let Some(tls) = &receiver.tls {
        for reference in [&tls.ca, &tls.certificate].into_iter().flatten() {
            secrets.check_value(reference)?;
        }
        for reference in [&tls.key, &tls.key_passphrase].into_iter().flatten() {
            secrets.check_secret(reference)?;
        }
    }
    Ok(())
}
