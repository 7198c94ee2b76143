//! logforward.toml 통합 설정 테스트
//!
//! - logforward.toml.example 파싱 테스트
//! - 부분 설정 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use logforward_core::config::OperatorConfig;
use logforward_core::error::{ConfigError, LogForwardError};
use serial_test::serial;

// =============================================================================
// logforward.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_and_validates() {
    let content = include_str!("../../../logforward.toml.example");
    let config = OperatorConfig::parse(content).expect("example config should parse");
    config
        .validate()
        .expect("example config should pass validation");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.collector.data_dir, "/var/lib/vector");
    assert_eq!(config.collector.lokistack_max_write, "10M");
    assert_eq!(config.collector.expire_metrics_secs, 60);
    assert_eq!(config.tls.min_tls_version, "VersionTLS12");
}

#[test]
fn example_config_matches_defaults() {
    let content = include_str!("../../../logforward.toml.example");
    let parsed = OperatorConfig::parse(content).expect("should parse");
    let defaults = OperatorConfig::default();

    assert_eq!(parsed.collector.secrets_dir, defaults.collector.secrets_dir);
    assert_eq!(parsed.collector.config_dir, defaults.collector.config_dir);
    assert_eq!(parsed.collector.memory_limit, defaults.collector.memory_limit);
}

// =============================================================================
// 부분 설정
// =============================================================================

#[test]
fn partial_config_fills_missing_sections() {
    let config = OperatorConfig::parse("[tls]\nmin_tls_version = \"VersionTLS13\"\n")
        .expect("should parse");
    assert_eq!(config.tls.min_tls_version, "VersionTLS13");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.collector.cpu_request, "500m");
}

#[test]
fn empty_file_is_all_defaults() {
    let config = OperatorConfig::parse("").expect("empty should parse");
    config.validate().expect("defaults are valid");
}

// =============================================================================
// 에러
// =============================================================================

#[test]
fn malformed_toml_is_parse_error() {
    let err = OperatorConfig::parse("[general\nlog_level = ").unwrap_err();
    assert!(matches!(
        err,
        LogForwardError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn invalid_max_write_is_rejected() {
    let config =
        OperatorConfig::parse("[collector]\nlokistack_max_write = \"lots\"\n").expect("parse");
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("collector.lokistack_max_write"));
}

#[tokio::test]
async fn missing_file_is_file_not_found() {
    let err = OperatorConfig::from_file("/nonexistent/logforward.toml")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LogForwardError::Config(ConfigError::FileNotFound { .. })
    ));
}

// =============================================================================
// 환경변수 우선순위
// =============================================================================

#[tokio::test]
#[serial]
async fn env_overrides_file_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("logforward.toml");
    std::fs::write(&path, "[general]\nlog_level = \"warn\"\n").expect("write");

    // SAFETY: serial_test로 환경변수 접근을 직렬화합니다.
    unsafe { std::env::set_var("LOGFORWARD_GENERAL_LOG_LEVEL", "debug") };
    let config = OperatorConfig::load(&path).await;
    unsafe { std::env::remove_var("LOGFORWARD_GENERAL_LOG_LEVEL") };

    assert_eq!(config.expect("load").general.log_level, "debug");
}
