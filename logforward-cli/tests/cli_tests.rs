//! End-to-end tests that run the `logforward` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const HTTP_FORWARDER: &str = r#"
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

const ES_WITH_AUTH: &str = r#"
metadata:
  name: collector
  namespace: openshift-logging
spec:
  serviceAccount:
    name: logcollector
  outputs:
    - name: es
      type: elasticsearch
      elasticsearch:
        url: https://es.example.com:9200
        index: app-write
        authentication:
          username:
            key: username
            secretName: es-secret
          password:
            key: password
            secretName: es-secret
  pipelines:
    - name: app
      inputRefs: [application]
      outputRefs: [es]
"#;

fn logforward(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_logforward"))
        .arg("--config")
        .arg("/nonexistent/logforward.toml")
        .args(args)
        .env("RUST_LOG", "error")
        .output()
        .expect("binary should run")
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("should write fixture");
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_render_to_stdout() {
    let dir = TempDir::new().expect("temp dir");
    let clf = write(dir.path(), "clf.yaml", HTTP_FORWARDER);

    let output = logforward(&["render", clf.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let rendered: toml::Table = toml::from_str(&stdout(&output)).expect("stdout is TOML");
    assert!(rendered["sinks"].as_table().expect("sinks").contains_key("output_web"));
}

#[test]
fn test_render_to_file_reports_json() {
    let dir = TempDir::new().expect("temp dir");
    let clf = write(dir.path(), "clf.yaml", HTTP_FORWARDER);
    let out = dir.path().join("vector.toml");

    let output = logforward(&[
        "--output",
        "json",
        "render",
        clf.to_str().expect("utf-8 path"),
        "--out",
        out.to_str().expect("utf-8 path"),
    ]);
    assert_eq!(output.status.code(), Some(0));
    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("json report");
    assert_eq!(report["forwarder"].as_str(), Some("openshift-logging/collector"));
    assert!(out.exists());
}

#[test]
fn test_validate_missing_secret_exits_not_ready() {
    let dir = TempDir::new().expect("temp dir");
    let clf = write(dir.path(), "clf.yaml", ES_WITH_AUTH);

    let output = logforward(&["--output", "json", "validate", clf.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(3));
    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("json report");
    assert_eq!(report["ready"].as_bool(), Some(false));
}

#[test]
fn test_validate_with_secrets_dir_is_ready() {
    let dir = TempDir::new().expect("temp dir");
    let clf = write(dir.path(), "clf.yaml", ES_WITH_AUTH);
    let secret = dir.path().join("cluster").join("secrets").join("es-secret");
    std::fs::create_dir_all(&secret).expect("mkdir");
    std::fs::write(secret.join("username"), "elastic").expect("write");
    std::fs::write(secret.join("password"), "changeme").expect("write");

    let output = logforward(&[
        "validate",
        clf.to_str().expect("utf-8 path"),
        "--secrets",
        dir.path().join("cluster").to_str().expect("utf-8 path"),
    ]);
    assert_eq!(output.status.code(), Some(0), "stdout: {}", stdout(&output));
}

#[test]
fn test_validate_unauthorized_input_type() {
    let dir = TempDir::new().expect("temp dir");
    let clf = write(dir.path(), "clf.yaml", HTTP_FORWARDER);

    let output = logforward(&["validate", clf.to_str().expect("utf-8 path"), "--allow", "audit"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stdout(&output).contains("Authorized"));
}

#[test]
fn test_migrate_prints_yaml() {
    let dir = TempDir::new().expect("temp dir");
    let clf = write(dir.path(), "clf.yaml", HTTP_FORWARDER);

    let output = logforward(&["migrate", clf.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("logcollector"));
}

#[test]
fn test_unparsable_document_exits_one() {
    let dir = TempDir::new().expect("temp dir");
    let clf = write(dir.path(), "clf.yaml", "spec: [");

    let output = logforward(&["validate", clf.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid forwarder document"));
}

#[test]
fn test_config_validate_missing_file_exits_two() {
    let output = logforward(&["config", "validate"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_config_show_unknown_section() {
    let output = logforward(&["config", "show", "--section", "pipelines"]);
    assert_eq!(output.status.code(), Some(1));
}
