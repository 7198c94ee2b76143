//! 예약 입력 이름 구체화와 리시버 서빙 인증서 기본값

use logforward_core::api::condition::{CONDITION_MIGRATE, REASON_MIGRATE_INPUT};
use logforward_core::api::input::RESERVED_INPUT_NAMES;
use logforward_core::api::{
    ClusterLogForwarder, Condition, ConditionStatus, InputKind, InputSpec, SecretReference,
    TlsSpec, ValueReference,
};

use crate::config::CompilerConfig;

/// 서빙 인증서 시크릿의 인증서 키
pub const SERVING_CERT_KEY: &str = "tls.crt";

/// 서빙 인증서 시크릿의 개인키 키
pub const SERVING_KEY_KEY: &str = "tls.key";

/// 리시버 입력의 서빙 인증서 시크릿 이름 (`<forwarder>-<input>`)
pub fn receiver_secret_name(forwarder_name: &str, input_name: &str) -> String {
    format!("{forwarder_name}-{input_name}")
}

/// 파이프라인이 참조하는 예약 입력을 정규형으로 구체화합니다.
///
/// 같은 이름의 사용자 입력은 정규형으로 교체됩니다. TLS가 없는 리시버에는
/// 배포 시 생성되는 서빙 인증서 시크릿을 연결합니다.
pub fn migrate_inputs(
    mut forwarder: ClusterLogForwarder,
    _config: &CompilerConfig,
) -> (ClusterLogForwarder, Vec<Condition>) {
    let mut referenced: Vec<&str> = Vec::new();
    for pipeline in &forwarder.spec.pipelines {
        for input in &pipeline.input_refs {
            if let Some(reserved) = RESERVED_INPUT_NAMES.iter().find(|r| **r == input.as_str())
                && !referenced.contains(reserved)
            {
                referenced.push(reserved);
            }
        }
    }

    let mut materialized = Vec::new();
    for name in referenced {
        let Some(canonical) = InputSpec::reserved(name) else {
            continue;
        };
        let inputs = &mut forwarder.spec.inputs;
        match inputs.iter_mut().find(|i| i.name == name) {
            Some(existing) if *existing == canonical => {}
            Some(existing) => {
                *existing = canonical;
                materialized.push(name);
            }
            None => {
                inputs.push(canonical);
                materialized.push(name);
            }
        }
    }

    let forwarder_name = forwarder.metadata.name.clone();
    for input in &mut forwarder.spec.inputs {
        if let InputKind::Receiver(receiver) = &mut input.kind
            && receiver.tls.is_none()
        {
            let secret = receiver_secret_name(&forwarder_name, &input.name);
            receiver.tls = Some(TlsSpec {
                certificate: Some(ValueReference::from_secret(secret.clone(), SERVING_CERT_KEY)),
                key: Some(SecretReference::new(secret, SERVING_KEY_KEY)),
                ..Default::default()
            });
        }
    }

    let conditions = if materialized.is_empty() {
        Vec::new()
    } else {
        vec![Condition::new(
            CONDITION_MIGRATE,
            ConditionStatus::True,
            REASON_MIGRATE_INPUT,
            format!("reserved inputs materialized: {}", materialized.join(", ")),
        )]
    };
    (forwarder, conditions)
}

/// 배포 시 생성되는 리시버 서빙 인증서 시크릿 이름
pub fn generated_secrets(forwarder: &ClusterLogForwarder) -> Vec<String> {
    forwarder
        .spec
        .inputs
        .iter()
        .filter(|input| input.is_receiver())
        .map(|input| receiver_secret_name(forwarder.name(), &input.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use logforward_core::api::PipelineSpec;
    use logforward_core::api::input::{
        Application, AuditSource, InfrastructureSource, NamespaceContainer, Receiver,
        ReceiverType,
    };

    fn referencing(inputs: &[&str]) -> ClusterLogForwarder {
        let mut clf = ClusterLogForwarder::new("openshift-logging", "myforwarder");
        clf.spec.pipelines.push(PipelineSpec {
            name: "p".to_owned(),
            input_refs: inputs.iter().map(|s| s.to_string()).collect(),
            output_refs: vec!["out".to_owned()],
            filter_refs: Vec::new(),
        });
        clf
    }

    #[test]
    fn reserved_inputs_are_stubbed_when_referenced() {
        let (clf, conditions) = migrate_inputs(
            referencing(&["application", "infrastructure", "audit"]),
            &CompilerConfig::default(),
        );
        assert_eq!(clf.spec.inputs.len(), 3);
        assert_eq!(
            clf.spec.inputs[0].kind,
            InputKind::Application(Application::default())
        );
        match &clf.spec.inputs[1].kind {
            InputKind::Infrastructure(infra) => {
                assert_eq!(infra.sources, InfrastructureSource::ALL.to_vec())
            }
            other => panic!("unexpected {other:?}"),
        }
        match &clf.spec.inputs[2].kind {
            InputKind::Audit(audit) => assert_eq!(audit.sources, AuditSource::ALL.to_vec()),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].reason, REASON_MIGRATE_INPUT);
    }

    #[test]
    fn user_input_with_reserved_name_is_replaced() {
        let mut clf = referencing(&["application"]);
        let custom = Application {
            includes: vec![NamespaceContainer {
                namespace: None,
                container: Some("foo".to_owned()),
            }],
            ..Default::default()
        };
        clf.spec.inputs.push(InputSpec {
            name: "application".to_owned(),
            kind: InputKind::Application(custom.clone()),
        });
        clf.spec.inputs.push(InputSpec {
            name: "my-bar".to_owned(),
            kind: InputKind::Application(custom.clone()),
        });
        let (clf, _) = migrate_inputs(clf, &CompilerConfig::default());
        assert_eq!(clf.spec.inputs.len(), 2);
        assert_eq!(
            clf.spec.input("application").unwrap().kind,
            InputKind::Application(Application::default())
        );
        assert_eq!(
            clf.spec.input("my-bar").unwrap().kind,
            InputKind::Application(custom)
        );
    }

    #[test]
    fn receiver_without_tls_gets_serving_certificate() {
        let mut clf = referencing(&[]);
        clf.spec.inputs.push(InputSpec {
            name: "anapp".to_owned(),
            kind: InputKind::Receiver(Receiver {
                receiver_type: ReceiverType::Http,
                port: 8443,
                tls: None,
                http: None,
            }),
        });
        let (clf, conditions) = migrate_inputs(clf, &CompilerConfig::default());
        assert!(conditions.is_empty());
        let InputKind::Receiver(receiver) = &clf.spec.inputs[0].kind else {
            panic!("receiver expected");
        };
        let tls = receiver.tls.as_ref().unwrap();
        assert_eq!(
            tls.key,
            Some(SecretReference::new("myforwarder-anapp", "tls.key"))
        );
        assert_eq!(
            tls.certificate,
            Some(ValueReference::from_secret("myforwarder-anapp", "tls.crt"))
        );
        assert_eq!(generated_secrets(&clf), vec!["myforwarder-anapp"]);
    }

    #[test]
    fn second_pass_reports_nothing() {
        let config = CompilerConfig::default();
        let (once, _) = migrate_inputs(referencing(&["audit"]), &config);
        let (twice, conditions) = migrate_inputs(once.clone(), &config);
        assert_eq!(once, twice);
        assert!(conditions.is_empty());
    }
}
