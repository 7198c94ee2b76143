//! 출력 검증
//!
//! 순서: tech-preview 게이팅 → URL → 스킴/TLS 일관성 → 유형별 필수 항목과 템플릿
//! → 압축 → 시크릿/컨피그맵 참조 → 역할 ARN 값.

use logforward_core::api::condition::REASON_MISSING_SPEC;
use logforward_core::api::forwarder::{ANNOTATION_ENABLE_OTLP, ANNOTATION_ENABLE_S3};
use logforward_core::api::output::{
    AwsAuthType, AwsAuthentication, AzureMonitor, Elasticsearch, Http, HttpAuthentication, Kafka,
    Syslog,
};
use logforward_core::api::{ClusterLogForwarder, OutputKind, OutputSpec};
use url::Url;

use super::{Failure, Outcome};
use crate::aws::parse_role_arn;
use crate::secrets::{SecretSnapshot, output_secret_refs, output_value_refs};
use crate::{template, tls};

/// 허용되는 압축 알고리즘
pub const COMPRESSION_ALGORITHMS: [&str; 5] = ["gzip", "zlib", "zstd", "snappy", "none"];

/// HTTP 출력이 허용하는 Content-Type
pub const HTTP_CONTENT_TYPES: [&str; 2] = ["application/json", "application/x-ndjson"];

/// HTTP 출력 메서드
pub const HTTP_METHODS: [&str; 8] = [
    "GET", "HEAD", "POST", "PUT", "DELETE", "OPTIONS", "TRACE", "PATCH",
];

/// Elasticsearch 출력에서 사용자가 지정할 수 없는 헤더
const ES_RESERVED_HEADERS: [&str; 2] = ["authorization", "content-type"];

/// syslog 출력 URL 스킴
const SYSLOG_SCHEMES: [&str; 4] = ["tcp", "tls", "udp", "udps"];

/// OTLP 엔드포인트 경로 접미어
pub const OTLP_PATH_SUFFIX: &str = "/v1/logs";

pub const MISSING_OTLP_ANNOTATION: &str = "missing tech-preview annotation for OTLP output";
pub const MISSING_S3_ANNOTATION: &str = "missing tech-preview annotation for S3 output";

pub fn validate_output(
    forwarder: &ClusterLogForwarder,
    output: &OutputSpec,
    secrets: &SecretSnapshot,
    service_account: &str,
) -> Outcome {
    match &output.kind {
        OutputKind::Otlp(_) if !forwarder.annotation_enabled(ANNOTATION_ENABLE_OTLP) => {
            return Err(Failure::invalid(MISSING_OTLP_ANNOTATION));
        }
        OutputKind::S3(_) if !forwarder.annotation_enabled(ANNOTATION_ENABLE_S3) => {
            return Err(Failure::invalid(MISSING_S3_ANNOTATION));
        }
        _ => {}
    }

    if let Some(url) = output.url() {
        check_url(url)?;
    }
    tls::check_scheme(output.url(), output.tls.as_ref()).map_err(Failure::invalid)?;

    match &output.kind {
        OutputKind::AzureMonitor(o) => validate_azure(o)?,
        OutputKind::Cloudwatch(o) => {
            check_template("groupName", &o.group_name)?;
            validate_aws(o.authentication.as_ref())?;
        }
        OutputKind::S3(o) => {
            if o.bucket.is_empty() {
                return Err(Failure::new(REASON_MISSING_SPEC, "s3 output requires a bucket"));
            }
            if let Some(prefix) = &o.key_prefix {
                check_template("keyPrefix", prefix)?;
            }
            validate_aws(o.authentication.as_ref())?;
        }
        OutputKind::Elasticsearch(o) => validate_elasticsearch(o)?,
        OutputKind::GoogleCloudLogging(o) => {
            check_template("logId", &o.log_id)?;
            if o.authentication.as_ref().and_then(|a| a.credentials.as_ref()).is_none() {
                return Err(Failure::new(
                    REASON_MISSING_SPEC,
                    "googleCloudLogging output requires authentication.credentials",
                ));
            }
        }
        OutputKind::Http(o) => {
            validate_http(o)?;
            validate_basic_auth(o.authentication.as_ref())?;
        }
        OutputKind::Kafka(o) => validate_kafka(o)?,
        OutputKind::Loki(o) => {
            if let Some(tenant) = &o.tenant_key {
                check_template("tenantKey", tenant)?;
            }
            validate_basic_auth(o.authentication.as_ref())?;
        }
        OutputKind::LokiStack(o) => {
            if o.authentication.as_ref().and_then(|a| a.token.as_ref()).is_none() {
                return Err(Failure::new(
                    REASON_MISSING_SPEC,
                    "lokiStack output requires authentication.token",
                ));
            }
        }
        OutputKind::Otlp(o) => {
            if !o.url.trim_end_matches('/').ends_with(OTLP_PATH_SUFFIX) {
                return Err(Failure::invalid(format!(
                    "otlp output url {:?} must end with {OTLP_PATH_SUFFIX:?}",
                    o.url
                )));
            }
            validate_basic_auth(o.authentication.as_ref())?;
        }
        OutputKind::Splunk(o) => {
            for (field, value) in [("index", &o.index), ("source", &o.source)] {
                if let Some(value) = value {
                    check_template(field, value)?;
                }
            }
            if o.authentication.as_ref().and_then(|a| a.token.as_ref()).is_none() {
                return Err(Failure::new(
                    REASON_MISSING_SPEC,
                    "splunk output requires authentication.token",
                ));
            }
        }
        OutputKind::Syslog(o) => validate_syslog(o)?,
    }

    if let Some(compression) = output.tuning().and_then(|t| t.compression.as_deref())
        && !COMPRESSION_ALGORITHMS.contains(&compression)
    {
        return Err(Failure::invalid(format!(
            "compression {compression:?} is not one of {}",
            COMPRESSION_ALGORITHMS.join(", ")
        )));
    }

    for reference in output_secret_refs(output, service_account) {
        secrets.check_secret(&reference)?;
    }
    for reference in output_value_refs(output) {
        secrets.check_value(&reference)?;
    }

    if let Some(auth) = crate::aws::aws_authentication(output) {
        check_role_arns(auth, secrets)?;
    }
    Ok(())
}

// ─── 공통 ────────────────────────────────────────────────────────────

/// `scheme://host[:port][...]` 형태인지 확인합니다.
pub fn check_url(url: &str) -> Outcome {
    let parsed =
        Url::parse(url).map_err(|e| Failure::invalid(format!("invalid URL {url:?}: {e}")))?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(Failure::invalid(format!("invalid URL {url:?}: missing host")));
    }
    Ok(())
}

fn check_template(field: &str, value: &str) -> Outcome {
    template::validate(value)
        .map_err(|reason| Failure::invalid(format!("{field} template {value:?} is invalid: {reason}")))
}

fn validate_basic_auth(auth: Option<&HttpAuthentication>) -> Outcome {
    let Some(auth) = auth else {
        return Ok(());
    };
    if auth.username.is_some() != auth.password.is_some() {
        return Err(Failure::new(
            REASON_MISSING_SPEC,
            "authentication requires both username and password",
        ));
    }
    Ok(())
}

// ─── 유형별 ──────────────────────────────────────────────────────────

fn validate_azure(output: &AzureMonitor) -> Outcome {
    if output.customer_id.is_empty() {
        return Err(Failure::new(
            REASON_MISSING_SPEC,
            "azureMonitor output requires customerId",
        ));
    }
    let log_type_ok = !output.log_type.is_empty()
        && output.log_type.len() <= 100
        && output
            .log_type
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !log_type_ok {
        return Err(Failure::invalid(format!(
            "azureMonitor logType {:?} must match ^[a-zA-Z0-9_]{{1,100}}$",
            output.log_type
        )));
    }
    if output
        .authentication
        .as_ref()
        .and_then(|a| a.shared_key.as_ref())
        .is_none()
    {
        return Err(Failure::new(
            REASON_MISSING_SPEC,
            "azureMonitor output requires authentication.sharedKey",
        ));
    }
    Ok(())
}

fn validate_aws(auth: Option<&AwsAuthentication>) -> Outcome {
    let Some(auth) = auth else {
        return Err(Failure::new(REASON_MISSING_SPEC, "AWS authentication is required"));
    };
    match auth.auth_type {
        AwsAuthType::AwsAccessKey => {
            let complete = auth
                .aws_access_key
                .as_ref()
                .is_some_and(|k| k.key_id.is_some() && k.key_secret.is_some());
            if !complete {
                return Err(Failure::new(
                    REASON_MISSING_SPEC,
                    "awsAccessKey authentication requires keyId and keySecret",
                ));
            }
        }
        AwsAuthType::IamRole => {
            if auth.iam_role.as_ref().and_then(|r| r.role_arn.as_ref()).is_none() {
                return Err(Failure::new(
                    REASON_MISSING_SPEC,
                    "iamRole authentication requires roleARN",
                ));
            }
        }
    }
    Ok(())
}

fn check_role_arns(auth: &AwsAuthentication, secrets: &SecretSnapshot) -> Outcome {
    if auth.auth_type == AwsAuthType::IamRole
        && let Some(reference) = auth.iam_role.as_ref().and_then(|r| r.role_arn.as_ref())
    {
        let value = secrets.secret_value(reference)?;
        if parse_role_arn(value).is_none() {
            return Err(Failure::invalid(format!(
                "secret {:?} key {:?} does not contain a valid role ARN",
                reference.secret_name, reference.key
            )));
        }
    }
    if let Some(assume) = &auth.assume_role {
        let value = secrets.secret_value(&assume.role_arn)?;
        if parse_role_arn(value).is_none() {
            return Err(Failure::invalid(format!(
                "secret {:?} key {:?} does not contain a valid assume role ARN",
                assume.role_arn.secret_name, assume.role_arn.key
            )));
        }
    }
    Ok(())
}

fn validate_elasticsearch(output: &Elasticsearch) -> Outcome {
    if !output.index.is_empty() {
        check_template("index", &output.index)?;
    }
    if let Some(version) = output.version
        && version < 6
    {
        return Err(Failure::invalid(format!(
            "elasticsearch version {version} is not supported, minimum is 6"
        )));
    }
    if let Some(header) = output
        .headers
        .keys()
        .find(|h| ES_RESERVED_HEADERS.contains(&h.to_ascii_lowercase().as_str()))
    {
        return Err(Failure::invalid(format!(
            "elasticsearch output may not set the {header:?} header"
        )));
    }
    validate_basic_auth(output.authentication.as_ref())
}

fn validate_http(output: &Http) -> Outcome {
    for (header, value) in &output.headers {
        if header.eq_ignore_ascii_case("content-type")
            && !HTTP_CONTENT_TYPES.contains(&value.trim().to_ascii_lowercase().as_str())
        {
            return Err(Failure::invalid(format!(
                "http output Content-Type must be one of {}, got {value:?}",
                HTTP_CONTENT_TYPES.join(", ")
            )));
        }
    }
    if let Some(method) = &output.method
        && !HTTP_METHODS.contains(&method.to_ascii_uppercase().as_str())
    {
        return Err(Failure::invalid(format!("http output method {method:?} is not supported")));
    }
    if output.timeout == Some(0) {
        return Err(Failure::invalid("http output timeout must be greater than 0"));
    }
    Ok(())
}

fn validate_kafka(output: &Kafka) -> Outcome {
    if output.url.as_deref().is_none_or(str::is_empty) && output.brokers.is_empty() {
        return Err(Failure::new(
            REASON_MISSING_SPEC,
            "kafka output requires a url or at least one broker",
        ));
    }
    for broker in &output.brokers {
        check_url(broker)?;
    }
    if let Some(topic) = &output.topic {
        check_template("topic", topic)?;
    }
    if let Some(sasl) = output.authentication.as_ref().and_then(|a| a.sasl.as_ref())
        && sasl.username.is_some() != sasl.password.is_some()
    {
        return Err(Failure::new(
            REASON_MISSING_SPEC,
            "kafka sasl authentication requires both username and password",
        ));
    }
    Ok(())
}

fn validate_syslog(output: &Syslog) -> Outcome {
    let scheme = tls::url_scheme(&output.url).unwrap_or_default();
    if !SYSLOG_SCHEMES.contains(&scheme.as_str()) {
        return Err(Failure::invalid(format!(
            "syslog output url scheme must be one of {}, got {scheme:?}",
            SYSLOG_SCHEMES.join(", ")
        )));
    }
    let templated = [
        ("appName", &output.app_name),
        ("procID", &output.proc_id),
        ("msgID", &output.msg_id),
        ("facility", &output.facility),
        ("severity", &output.severity),
    ];
    for (field, value) in templated {
        if let Some(value) = value {
            check_template(field, value)?;
        }
    }
    if let Some(key) = &output.payload_key {
        crate::fieldpath::validate(key)
            .map_err(|e| Failure::invalid(format!("payloadKey {key:?}: {e}")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use logforward_core::api::condition::{REASON_SECRET_KEY_NOT_FOUND, REASON_VALIDATION_FAILURE};
    use logforward_core::api::output::{
        AwsAccessKey, AwsRole, Cloudwatch, Otlp, S3, Splunk, SplunkAuthentication,
    };
    use logforward_core::api::{BearerToken, OutputTlsSpec, SecretReference};
    use logforward_core::store::Secret;

    fn clf() -> ClusterLogForwarder {
        ClusterLogForwarder::new("openshift-logging", "collector")
    }

    fn check(output: &OutputSpec, secrets: &SecretSnapshot) -> Outcome {
        validate_output(&clf(), output, secrets, "collector")
    }

    fn es(headers: &[(&str, &str)]) -> OutputSpec {
        OutputSpec::new(
            "es",
            OutputKind::Elasticsearch(Elasticsearch {
                url: "https://es:9200".to_owned(),
                index: "{.log_type||\"none\"}".to_owned(),
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                ..Default::default()
            }),
        )
    }

    fn cloudwatch(auth: AwsAuthentication) -> OutputSpec {
        OutputSpec::new(
            "cw",
            OutputKind::Cloudwatch(Cloudwatch {
                url: None,
                region: "us-east-1".to_owned(),
                group_name: "{.log_type||\"none\"}".to_owned(),
                authentication: Some(auth),
                tuning: None,
            }),
        )
    }

    #[test]
    fn url_shapes() {
        assert!(check_url("https://es.example.com:9200/path").is_ok());
        assert!(check_url("tcp://user@kafka:9092").is_ok());
        assert!(check_url("es.example.com").is_err());
        assert!(check_url("https://").is_err());
        assert!(check_url("1http://host").is_err());
        assert!(check_url("tcp://").is_err());
        assert!(check_url("file:///var/log/app").is_err());
    }

    #[test]
    fn bad_port_rejected() {
        let err = check_url("https://web.example.com:notaport/logs").unwrap_err();
        assert_eq!(err.reason, REASON_VALIDATION_FAILURE);
        assert!(err.message.contains("invalid port"));
        assert!(check_url("https://web.example.com:70000").is_err());
        assert!(check_url("tls://rsyslog.example.com:6514").is_ok());
    }

    #[test]
    fn elasticsearch_reserved_headers() {
        let secrets = SecretSnapshot::new();
        assert!(check(&es(&[("X-Custom", "1")]), &secrets).is_ok());
        assert!(check(&es(&[("authorization", "Bearer x")]), &secrets).is_err());
        assert!(check(&es(&[("Content-Type", "text/plain")]), &secrets).is_err());
    }

    #[test]
    fn http_content_type_restricted() {
        let http = |value: &str| {
            OutputSpec::new(
                "h",
                OutputKind::Http(Http {
                    url: "https://h.example.com".to_owned(),
                    headers: [("Content-Type".to_owned(), value.to_owned())].into(),
                    ..Default::default()
                }),
            )
        };
        let secrets = SecretSnapshot::new();
        assert!(check(&http("application/x-ndjson"), &secrets).is_ok());
        assert!(check(&http("text/plain"), &secrets).is_err());
    }

    #[test]
    fn plaintext_url_with_insecure_tls_fails() {
        let mut output = es(&[]);
        if let OutputKind::Elasticsearch(o) = &mut output.kind {
            o.url = "http://es:9200".to_owned();
        }
        output.tls = Some(OutputTlsSpec {
            insecure_skip_verify: true,
            ..Default::default()
        });
        let err = check(&output, &SecretSnapshot::new()).unwrap_err();
        assert_eq!(err.reason, REASON_VALIDATION_FAILURE);
    }

    #[test]
    fn otlp_needs_annotation_and_path() {
        let output = OutputSpec::new(
            "otel",
            OutputKind::Otlp(Otlp {
                url: "https://collector:4318/v1/logs".to_owned(),
                ..Default::default()
            }),
        );
        let err = check(&output, &SecretSnapshot::new()).unwrap_err();
        assert_eq!(err.message, MISSING_OTLP_ANNOTATION);

        let mut annotated = clf();
        annotated
            .metadata
            .annotations
            .insert(ANNOTATION_ENABLE_OTLP.to_owned(), "true".to_owned());
        assert!(validate_output(&annotated, &output, &SecretSnapshot::new(), "sa").is_ok());

        let mut bad_path = output.clone();
        if let OutputKind::Otlp(o) = &mut bad_path.kind {
            o.url = "https://collector:4318/logs".to_owned();
        }
        assert!(validate_output(&annotated, &bad_path, &SecretSnapshot::new(), "sa").is_err());
    }

    #[test]
    fn s3_is_tech_preview() {
        let output = OutputSpec::new(
            "s3",
            OutputKind::S3(S3 {
                url: None,
                region: "us-east-1".to_owned(),
                bucket: "logs".to_owned(),
                key_prefix: None,
                authentication: None,
                tuning: None,
            }),
        );
        let err = check(&output, &SecretSnapshot::new()).unwrap_err();
        assert_eq!(err.message, MISSING_S3_ANNOTATION);
    }

    #[test]
    fn access_key_requires_both_parts() {
        let output = cloudwatch(AwsAuthentication {
            auth_type: AwsAuthType::AwsAccessKey,
            aws_access_key: Some(AwsAccessKey {
                key_id: Some(SecretReference::new("cw", "key_id")),
                key_secret: None,
            }),
            iam_role: None,
            assume_role: None,
        });
        let err = check(&output, &SecretSnapshot::new()).unwrap_err();
        assert_eq!(err.reason, REASON_MISSING_SPEC);
    }

    #[test]
    fn iam_role_arn_value_is_checked() {
        let output = cloudwatch(AwsAuthentication {
            auth_type: AwsAuthType::IamRole,
            aws_access_key: None,
            iam_role: Some(AwsRole {
                role_arn: Some(SecretReference::new("cw", "role_arn")),
                token: BearerToken::service_account(),
            }),
            assume_role: None,
        });
        let mut secrets = SecretSnapshot::new();
        secrets.mark_generated("collector-token");
        secrets.insert_secret(Secret::new("cw").with_entry("role_arn", "not-an-arn"));
        let err = check(&output, &secrets).unwrap_err();
        assert!(err.message.contains("valid role ARN"));

        let mut secrets = SecretSnapshot::new();
        secrets.mark_generated("collector-token");
        secrets.insert_secret(
            Secret::new("cw").with_entry("role_arn", "arn:aws:iam::123456789012:role/logs"),
        );
        assert!(check(&output, &secrets).is_ok());
    }

    #[test]
    fn splunk_token_must_resolve() {
        let output = OutputSpec::new(
            "splunk",
            OutputKind::Splunk(Splunk {
                url: "https://splunk:8088".to_owned(),
                authentication: Some(SplunkAuthentication {
                    token: Some(SecretReference::new("splunk", "hecToken")),
                }),
                ..Default::default()
            }),
        );
        let mut secrets = SecretSnapshot::new();
        secrets.insert_secret(Secret::new("splunk").with_entry("other", "x"));
        let err = check(&output, &secrets).unwrap_err();
        assert_eq!(err.reason, REASON_SECRET_KEY_NOT_FOUND);
    }

    #[test]
    fn bad_compression_rejected() {
        let mut output = es(&[]);
        if let OutputKind::Elasticsearch(o) = &mut output.kind {
            o.tuning = Some(logforward_core::api::OutputTuning {
                compression: Some("brotli".to_owned()),
                ..Default::default()
            });
        }
        assert!(check(&output, &SecretSnapshot::new()).is_err());
    }

    #[test]
    fn bad_index_template_rejected() {
        let mut output = es(&[]);
        if let OutputKind::Elasticsearch(o) = &mut output.kind {
            o.index = "{.log_type}".to_owned();
        }
        let err = check(&output, &SecretSnapshot::new()).unwrap_err();
        assert!(err.message.starts_with("index template"));
    }

    #[test]
    fn syslog_scheme() {
        let syslog = |url: &str| {
            OutputSpec::new(
                "rsyslog",
                OutputKind::Syslog(Syslog {
                    url: url.to_owned(),
                    ..Default::default()
                }),
            )
        };
        assert!(check(&syslog("tcp://rsyslog:514"), &SecretSnapshot::new()).is_ok());
        assert!(check(&syslog("https://rsyslog:514"), &SecretSnapshot::new()).is_err());
    }
}
