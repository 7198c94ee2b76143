//! 통합 테스트 -- 문서 로드부터 상태 기록까지의 전체 흐름

use tokio_util::sync::CancellationToken;

use logforward_compiler::migrate::migrate;
use logforward_compiler::validate::validate;
use logforward_compiler::{
    CompilerConfig, MemoryStore, SecretSnapshot, StaticReviewer, reconcile,
};
use logforward_core::api::condition::{
    CONDITION_AUTHORIZED, CONDITION_LOG_LEVEL, CONDITION_MIGRATE, CONDITION_READY,
    CONDITION_VALID_LOKISTACK_OTLP_OUTPUTS, REASON_CLUSTER_ROLE_MISSING,
    REASON_VALIDATION_FAILURE, find_condition,
};
use logforward_core::api::output::{Elasticsearch, Loki};
use logforward_core::api::{ClusterLogForwarder, OutputKind, OutputSpec};
use logforward_core::store::Secret;

const NS: &str = "openshift-logging";

fn load(yaml: &str) -> ClusterLogForwarder {
    ClusterLogForwarder::from_yaml(yaml).expect("fixture must parse")
}

async fn run(store: &MemoryStore, reviewer: &StaticReviewer) -> logforward_compiler::ReconcileOutcome {
    reconcile(
        store,
        reviewer,
        &CompilerConfig::default(),
        NS,
        "collector",
        &CancellationToken::new(),
    )
    .await
    .expect("reconcile must succeed")
}

fn es(output: &OutputSpec) -> &Elasticsearch {
    match &output.kind {
        OutputKind::Elasticsearch(es) => es,
        other => panic!("expected elasticsearch output, got {other:?}"),
    }
}

fn loki(output: &OutputSpec) -> &Loki {
    match &output.kind {
        OutputKind::Loki(loki) => loki,
        other => panic!("expected loki output, got {other:?}"),
    }
}

// ─── 기본 엘라스틱서치 분할 ──────────────────────────────────────────

const DEFAULT_ES: &str = r#"
metadata:
  name: collector
  namespace: openshift-logging
spec:
  serviceAccount:
    name: logcollector
  outputs:
    - name: default
      type: elasticsearch
      elasticsearch:
        url: https://elasticsearch:9200
        version: 6
        index: '{.log_type||"none"}'
      tls:
        ca:
          key: ca-bundle.crt
          secretName: collector
  pipelines:
    - name: p
      inputRefs: [application, audit, infrastructure]
      outputRefs: [default]
"#;

#[test]
fn default_elasticsearch_fans_out_per_tenant() {
    let (migrated, conditions) = migrate(load(DEFAULT_ES), &CompilerConfig::default());

    let outputs: Vec<(&str, &str)> = migrated
        .spec
        .outputs
        .iter()
        .map(|o| (o.name.as_str(), es(o).index.as_str()))
        .collect();
    assert_eq!(
        outputs,
        vec![
            ("default-application", "app-write"),
            ("default-audit", "audit-write"),
            ("default-infrastructure", "infra-write"),
        ]
    );
    for output in &migrated.spec.outputs {
        assert_eq!(es(output).version, Some(6));
        assert!(output.tls.is_some());
    }

    let pipelines: Vec<&str> = migrated.spec.pipelines.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(pipelines, vec!["p", "p-1", "p-2"]);
    assert!(conditions.iter().any(|c| c.message.contains("default-application")));
}

#[tokio::test]
async fn default_elasticsearch_renders_three_sinks() {
    let store = MemoryStore::new()
        .with_forwarder(load(DEFAULT_ES))
        .with_service_account(NS, "logcollector")
        .with_secret(NS, Secret::new("collector").with_entry("ca-bundle.crt", "-----BEGIN CERTIFICATE-----"));

    let outcome = run(&store, &StaticReviewer::allow_all()).await;
    assert!(outcome.is_ready(), "status: {:#?}", outcome.status);

    let rendered = outcome.rendered.expect("ready forwarder renders config");
    let document: toml::Table = toml::from_str(&rendered.collector_toml).unwrap();
    let sinks = document["sinks"].as_table().unwrap();
    for id in [
        "output_default_application",
        "output_default_audit",
        "output_default_infrastructure",
    ] {
        assert_eq!(sinks[id]["type"].as_str(), Some("elasticsearch"), "{id}");
    }
    assert!(rendered.secret_names.contains(&"collector".to_owned()));
    assert!(!rendered.collector_toml.contains("-----BEGIN CERTIFICATE-----"));
}

// ─── LokiStack ───────────────────────────────────────────────────────

const LOKISTACK: &str = r#"
metadata:
  name: collector
  namespace: openshift-logging
spec:
  serviceAccount:
    name: logcollector
  outputs:
    - name: ls
      type: lokiStack
      lokiStack:
        target:
          name: my-loki
          namespace: openshift-logging
        authentication:
          token:
            from: serviceAccount
        labelKeys:
          audit:
            ignoreGlobal: true
            labelKeys: [log_type, objectRef.apiGroup]
  pipelines:
    - name: p
      inputRefs: [application, audit]
      outputRefs: [ls]
"#;

#[test]
fn lokistack_applies_per_tenant_label_keys() {
    let (migrated, _) = migrate(load(LOKISTACK), &CompilerConfig::default());

    let app = migrated.spec.output("ls-application").expect("application tenant output");
    assert_eq!(
        loki(app).url,
        "https://my-loki-gateway-http.openshift-logging.svc:8080/api/logs/v1/application"
    );
    assert!(loki(app).label_keys.is_empty());

    let audit = migrated.spec.output("ls-audit").expect("audit tenant output");
    assert_eq!(
        loki(audit).url,
        "https://my-loki-gateway-http.openshift-logging.svc:8080/api/logs/v1/audit"
    );
    assert_eq!(loki(audit).label_keys, vec!["log_type", "objectRef.apiGroup"]);
    assert!(migrated.spec.output("ls").is_none());
}

#[tokio::test]
async fn lokistack_otel_requires_tech_preview_annotation() {
    let otel = LOKISTACK.replace(
        "        labelKeys:\n",
        "        dataModel: Otel\n        labelKeys:\n",
    );
    let store = MemoryStore::new()
        .with_forwarder(load(&otel))
        .with_service_account(NS, "logcollector");
    let outcome = run(&store, &StaticReviewer::allow_all()).await;
    let gate = find_condition(&outcome.status.conditions, CONDITION_VALID_LOKISTACK_OTLP_OUTPUTS)
        .expect("otel gate condition");
    assert!(gate.is_false());
    assert_eq!(gate.message, "missing tech-preview annotation for OTLP output");
    assert!(!outcome.is_ready());

    let annotated = otel.replace(
        "  namespace: openshift-logging\nspec:",
        "  namespace: openshift-logging\n  annotations:\n    observability.openshift.io/tech-preview-otlp-output: enabled\nspec:",
    );
    let store = MemoryStore::new()
        .with_forwarder(load(&annotated))
        .with_service_account(NS, "logcollector");
    let outcome = run(&store, &StaticReviewer::allow_all()).await;
    let gate = find_condition(&outcome.status.conditions, CONDITION_VALID_LOKISTACK_OTLP_OUTPUTS)
        .expect("otel gate condition");
    assert!(gate.is_true());
}

#[test]
fn unreferenced_lokistack_is_removed_and_named() {
    let yaml = LOKISTACK.replace(
        "  pipelines:\n",
        "    - name: unused\n      type: lokiStack\n      lokiStack:\n        target:\n          name: other-loki\n        authentication:\n          token:\n            from: serviceAccount\n  pipelines:\n",
    );
    let (migrated, conditions) = migrate(load(&yaml), &CompilerConfig::default());

    let names: Vec<&str> = migrated.spec.outputs.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["ls-application", "ls-audit"]);
    let migrate_messages: Vec<&str> = conditions
        .iter()
        .filter(|c| c.condition_type == CONDITION_MIGRATE)
        .map(|c| c.message.as_str())
        .collect();
    assert!(
        migrate_messages.contains(&r#"lokistack: "ls", "unused" migrated to loki output/s"#),
        "{migrate_messages:?}"
    );
}

// ─── 권한 ────────────────────────────────────────────────────────────

const HTTP_APP: &str = r#"
metadata:
  name: collector
  namespace: openshift-logging
spec:
  serviceAccount:
    name: logcollector
  outputs:
    - name: web
      type: http
      http:
        url: https://logs.example.com/ingest
  pipelines:
    - name: app
      inputRefs: [application]
      outputRefs: [web]
"#;

#[tokio::test]
async fn authorization_follows_permitted_input_types() {
    let reviewer = StaticReviewer::allowing(["application"]);

    let store = MemoryStore::new()
        .with_forwarder(load(HTTP_APP))
        .with_service_account(NS, "logcollector");
    let outcome = run(&store, &reviewer).await;
    let authorized = find_condition(&outcome.status.conditions, CONDITION_AUTHORIZED).unwrap();
    assert!(authorized.is_true());
    assert!(outcome.is_ready());

    let with_audit = HTTP_APP.replace("inputRefs: [application]", "inputRefs: [application, audit]");
    let store = MemoryStore::new()
        .with_forwarder(load(&with_audit))
        .with_service_account(NS, "logcollector");
    let outcome = run(&store, &reviewer).await;
    let authorized = find_condition(&outcome.status.conditions, CONDITION_AUTHORIZED).unwrap();
    assert!(authorized.is_false());
    assert_eq!(authorized.reason, REASON_CLUSTER_ROLE_MISSING);
    assert!(authorized.message.contains("audit"));
    let ready = find_condition(&outcome.status.conditions, CONDITION_READY).unwrap();
    assert_eq!(ready.reason, REASON_CLUSTER_ROLE_MISSING);
    assert!(outcome.undeploy);
    assert!(outcome.rendered.is_none());
}

#[tokio::test]
async fn missing_service_account_is_reported() {
    let store = MemoryStore::new().with_forwarder(load(HTTP_APP));
    let outcome = run(&store, &StaticReviewer::allow_all()).await;
    let authorized = find_condition(&outcome.status.conditions, CONDITION_AUTHORIZED).unwrap();
    assert_eq!(authorized.reason, "ServiceAccountDoesNotExist");
    assert!(outcome.undeploy);
}

// ─── 참조 검사 ───────────────────────────────────────────────────────

#[test]
fn unreferenced_output_fails_validation() {
    let yaml = HTTP_APP.replace(
        "  pipelines:\n",
        "    - name: spare\n      type: http\n      http:\n        url: https://spare.example.com\n  pipelines:\n",
    );
    let original = load(&yaml);
    let (migrated, _) = migrate(original.clone(), &CompilerConfig::default());
    let status = validate(&original, &migrated, &SecretSnapshot::new());

    let spare = status
        .outputs
        .iter()
        .find(|c| c.condition_type == "ValidOutput-spare")
        .expect("condition for unreferenced output");
    assert!(spare.is_false());
    assert_eq!(spare.reason, REASON_VALIDATION_FAILURE);
    let web = status
        .outputs
        .iter()
        .find(|c| c.condition_type == "ValidOutput-web")
        .unwrap();
    assert!(web.is_true());
}

#[test]
fn prune_filters_must_keep_required_fields() {
    let with_filter = |prune: &str| {
        let yaml = HTTP_APP
            .replace(
                "  pipelines:\n",
                &format!("  filters:\n    - name: trim\n      type: prune\n      prune:\n{prune}  pipelines:\n"),
            )
            .replace("outputRefs: [web]", "outputRefs: [web]\n      filterRefs: [trim]");
        let original = load(&yaml);
        let (migrated, _) = migrate(original.clone(), &CompilerConfig::default());
        let status = validate(&original, &migrated, &SecretSnapshot::new());
        status
            .filters
            .iter()
            .find(|c| c.condition_type == "ValidFilter-trim")
            .map(|c| c.is_true())
            .expect("filter condition")
    };

    assert!(!with_filter("        in: [.message]\n"));
    assert!(!with_filter("        notIn: [.log_type, .message]\n"));
    assert!(with_filter("        notIn: [.log_type, .log_source, .message, .level]\n"));
    assert!(with_filter("        in: [.kubernetes.annotations]\n"));
}

// ─── 어노테이션 ──────────────────────────────────────────────────────

#[tokio::test]
async fn invalid_annotation_does_not_block_ready() {
    let yaml = HTTP_APP.replace(
        "  namespace: openshift-logging\nspec:",
        "  namespace: openshift-logging\n  annotations:\n    observability.openshift.io/log-level: bogus\nspec:",
    );
    let store = MemoryStore::new()
        .with_forwarder(load(&yaml))
        .with_service_account(NS, "logcollector");
    let outcome = run(&store, &StaticReviewer::allow_all()).await;

    let log_level = find_condition(&outcome.status.conditions, CONDITION_LOG_LEVEL)
        .expect("log level condition");
    assert!(log_level.is_false());
    assert!(outcome.is_ready(), "status: {:#?}", outcome.status);
    assert!(outcome.rendered.is_some());
}

// ─── 출력 URL ────────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_output_urls_fail_validation() {
    for url in [
        "https://web.example.com:notaport/logs",
        "https://web.example.com:99999/logs",
        "https://",
        "web.example.com/logs",
    ] {
        let yaml = HTTP_APP.replace("https://logs.example.com/ingest", url);
        let store = MemoryStore::new()
            .with_forwarder(load(&yaml))
            .with_service_account(NS, "logcollector");
        let outcome = run(&store, &StaticReviewer::allow_all()).await;

        let web = find_condition(&outcome.status.outputs, "ValidOutput-web").expect("output condition");
        assert!(web.is_false(), "{url}: {web:?}");
        assert_eq!(web.reason, REASON_VALIDATION_FAILURE, "{url}");
        assert!(web.message.contains("invalid URL"), "{url}: {}", web.message);
        assert!(!outcome.is_ready(), "{url}");
        assert!(outcome.rendered.is_none(), "{url}");
    }
}

// ─── 드롭 필터 ───────────────────────────────────────────────────────

#[tokio::test]
async fn drop_regex_with_quote_renders_valid_literal() {
    let yaml = HTTP_APP
        .replace(
            "  pipelines:\n",
            "  filters:\n    - name: quiet\n      type: drop\n      drop:\n        - test:\n            - field: .message\n              matches: \"it's\"\n  pipelines:\n",
        )
        .replace("outputRefs: [web]", "outputRefs: [web]\n      filterRefs: [quiet]");
    let store = MemoryStore::new()
        .with_forwarder(load(&yaml))
        .with_service_account(NS, "logcollector");
    let outcome = run(&store, &StaticReviewer::allow_all()).await;
    assert!(outcome.is_ready(), "status: {:#?}", outcome.status);

    let rendered = outcome.rendered.expect("ready forwarder renders config");
    let document: toml::Table = toml::from_str(&rendered.collector_toml).unwrap();
    let conditions: Vec<&str> = document["transforms"]
        .as_table()
        .unwrap()
        .values()
        .filter_map(|t| t.get("condition").and_then(|c| c.as_str()))
        .collect();
    assert_eq!(conditions.len(), 1, "{conditions:?}");
    assert!(conditions[0].contains(r"r'it\x27s'"), "{}", conditions[0]);
    assert!(!conditions[0].contains("it's"));
}
