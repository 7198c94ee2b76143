//! CloudWatch, S3 싱크

use logforward_core::api::OutputSpec;
use logforward_core::api::output::{AwsAuthType, Cloudwatch, S3};

use super::{SinkContext, SinkParts, secret_value, template_field};
use crate::aws::{aws_authentication, credentials_path, sink_profile};
use crate::error::CompilerError;
use crate::generator::component::Component;

/// S3 키 접두어 기본 템플릿
pub const DEFAULT_S3_KEY_PREFIX: &str = r#"{.log_type||"unknown"}/"#;

/// 애플리케이션은 `<ns>_<pod>_<container>`, 그 외는 `<host>.<log_source>`
const STREAM_NAME_VRL: &str = r#"._internal.cw_stream_name = if ._internal.log_type == "application" {
  join!([to_string(._internal.kubernetes.namespace_name) ?? "", to_string(._internal.kubernetes.pod_name) ?? "", to_string(._internal.kubernetes.container_name) ?? ""], "_")
} else {
  (to_string(._internal.hostname) ?? "") + "." + (to_string(._internal.log_source) ?? "")
}"#;

pub fn cloudwatch(
    ctx: &SinkContext<'_>,
    cw: &Cloudwatch,
    inputs: &[String],
) -> Result<SinkParts, CompilerError> {
    let mut remap = Vec::new();
    let group = template_field(&mut remap, "cw_group_name", &cw.group_name)?;
    remap.push(STREAM_NAME_VRL.to_owned());
    let sink = Component::new("aws_cloudwatch_logs", inputs)
        .set("region", cw.region.as_str())
        .set("group_name", group)
        .set("stream_name", "{{ _internal.cw_stream_name }}")
        .set("encoding.codec", "json")
        .set("request.concurrency", 2)
        .set("healthcheck.enabled", false)
        .set_opt("endpoint", cw.url.as_deref().filter(|u| !u.is_empty()));
    Ok(SinkParts {
        remap,
        ..SinkParts::new(auth(ctx, ctx.output, sink))
    })
}

pub fn s3(ctx: &SinkContext<'_>, s3: &S3, inputs: &[String]) -> Result<SinkParts, CompilerError> {
    let mut remap = Vec::new();
    let prefix = s3
        .key_prefix
        .as_deref()
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_S3_KEY_PREFIX);
    let key_prefix = template_field(&mut remap, "s3_key_prefix", prefix)?;
    let sink = Component::new("aws_s3", inputs)
        .set("region", s3.region.as_str())
        .set("bucket", s3.bucket.as_str())
        .set("key_prefix", key_prefix)
        .set("encoding.codec", "json")
        .set("healthcheck.enabled", false)
        .set_opt("endpoint", s3.url.as_deref().filter(|u| !u.is_empty()));
    Ok(SinkParts {
        remap,
        ..SinkParts::new(auth(ctx, ctx.output, sink))
    })
}

/// 액세스 키는 시크릿 참조로, 역할 인증은 자격증명 파일과 프로파일로 설정합니다.
fn auth(ctx: &SinkContext<'_>, output: &OutputSpec, mut sink: Component) -> Component {
    let Some(auth) = aws_authentication(output) else {
        return sink;
    };
    match auth.auth_type {
        AwsAuthType::AwsAccessKey => {
            if let Some(key) = &auth.aws_access_key {
                sink = sink
                    .set_opt("auth.access_key_id", key.key_id.as_ref().map(secret_value))
                    .set_opt(
                        "auth.secret_access_key",
                        key.key_secret.as_ref().map(secret_value),
                    );
            }
            if let Some(assume) = &auth.assume_role {
                sink = sink
                    .set("auth.assume_role", secret_value(&assume.role_arn))
                    .set_opt(
                        "auth.external_id",
                        assume.external_id.as_ref().map(secret_value),
                    );
            }
            sink
        }
        AwsAuthType::IamRole => sink
            .set("auth.credentials_file", credentials_path(ctx.config, ctx.forwarder_name))
            .set("auth.profile", sink_profile(output)),
    }
}
