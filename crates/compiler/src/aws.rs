//! AWS 역할 인증 -- ARN 파싱과 자격증명 파일 생성
//!
//! `iamRole` 인증을 쓰는 CloudWatch/S3 출력마다 `[profile output_<name>]` 블록을 만듭니다.
//! 파일은 `<forwarder>-aws-credentials` 컨피그맵의 `credentials` 키로 마운트되고
//! 싱크는 `auth.credentials_file` + `auth.profile`로 참조합니다.

use std::sync::LazyLock;

use regex::Regex;

use logforward_core::api::output::{AwsAuthType, AwsAuthentication};
use logforward_core::api::{BearerTokenFrom, ClusterLogForwarder, OutputKind, OutputSpec};

use crate::config::{CompilerConfig, SERVICE_ACCOUNT_TOKEN_PATH};
use crate::error::CompilerError;
use crate::secrets::SecretSnapshot;

/// 역할 ARN 패턴
pub const ROLE_ARN_PATTERN: &str = r"arn:aws[^:]*:(iam|sts)::\d{12}:role/\S+";

/// 자격증명 파일 키
pub const CREDENTIALS_KEY: &str = "credentials";

static ROLE_ARN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(ROLE_ARN_PATTERN).ok());

/// 문자열에서 첫 번째 역할 ARN을 찾습니다.
pub fn parse_role_arn(value: &str) -> Option<&str> {
    ROLE_ARN.as_ref()?.find(value).map(|m| m.as_str())
}

/// 자격증명 컨피그맵 이름
pub fn credentials_config_map_name(forwarder_name: &str) -> String {
    format!("{forwarder_name}-aws-credentials")
}

/// 수집기 파드 안의 자격증명 파일 경로
pub fn credentials_path(config: &CompilerConfig, forwarder_name: &str) -> String {
    config.config_map_path(&credentials_config_map_name(forwarder_name), CREDENTIALS_KEY)
}

/// 출력의 기본 프로파일 이름
pub fn profile_name(output_name: &str) -> String {
    format!("output_{output_name}")
}

/// 출력의 AWS 인증 블록
pub fn aws_authentication(output: &OutputSpec) -> Option<&AwsAuthentication> {
    match &output.kind {
        OutputKind::Cloudwatch(o) => o.authentication.as_ref(),
        OutputKind::S3(o) => o.authentication.as_ref(),
        _ => None,
    }
}

/// 역할 인증을 쓰는 출력인지
pub fn uses_role(output: &OutputSpec) -> bool {
    aws_authentication(output).is_some_and(|a| a.auth_type == AwsAuthType::IamRole)
}

/// 싱크가 참조할 프로파일 (역할 위임이 있으면 위임 프로파일)
pub fn sink_profile(output: &OutputSpec) -> String {
    let base = profile_name(&output.name);
    match aws_authentication(output).and_then(|a| a.assume_role.as_ref()) {
        Some(_) => format!("{base}-assume-role"),
        None => base,
    }
}

/// 역할 인증 출력 (이름순)
pub fn role_outputs(forwarder: &ClusterLogForwarder) -> Vec<&OutputSpec> {
    let mut outputs: Vec<_> = forwarder.spec.outputs.iter().filter(|o| uses_role(o)).collect();
    outputs.sort_by(|a, b| a.name.cmp(&b.name));
    outputs
}

/// 자격증명 파일을 만듭니다. 역할 인증 출력이 없으면 `None`.
pub fn render_credentials(
    forwarder: &ClusterLogForwarder,
    secrets: &SecretSnapshot,
    config: &CompilerConfig,
) -> Result<Option<String>, CompilerError> {
    let outputs = role_outputs(forwarder);
    if outputs.is_empty() {
        return Ok(None);
    }

    let mut file = String::new();
    for output in outputs {
        let fail = |reason: String| CompilerError::Generate {
            output: output.name.clone(),
            reason,
        };
        let Some(auth) = aws_authentication(output) else {
            continue;
        };
        let role = auth
            .iam_role
            .as_ref()
            .ok_or_else(|| fail("iamRole section missing".to_owned()))?;
        let arn_ref = role
            .role_arn
            .as_ref()
            .ok_or_else(|| fail("roleARN missing".to_owned()))?;
        let arn_value = secrets
            .secret_value(arn_ref)
            .map_err(|e| fail(e.to_string()))?;
        let arn = parse_role_arn(arn_value)
            .ok_or_else(|| fail("roleARN does not contain a role ARN".to_owned()))?;
        let token_file = match (&role.token.from, &role.token.secret) {
            (BearerTokenFrom::Secret, Some(secret)) => {
                config.secret_path(&secret.secret_name, &secret.key)
            }
            _ => SERVICE_ACCOUNT_TOKEN_PATH.to_owned(),
        };

        let profile = profile_name(&output.name);
        file.push_str(&format!(
            "[profile {profile}]\nrole_arn = {arn}\nweb_identity_token_file = {token_file}\nrole_session_name = output-{}\n\n",
            output.name
        ));

        if let Some(assume) = &auth.assume_role {
            let assume_value = secrets
                .secret_value(&assume.role_arn)
                .map_err(|e| fail(e.to_string()))?;
            let assume_arn = parse_role_arn(assume_value)
                .ok_or_else(|| fail("assumeRole roleARN does not contain a role ARN".to_owned()))?;
            file.push_str(&format!(
                "[profile {profile}-assume-role]\nrole_arn = {assume_arn}\nsource_profile = {profile}\n"
            ));
            if let Some(external) = &assume.external_id {
                let external_id = secrets
                    .secret_value(external)
                    .map_err(|e| fail(e.to_string()))?;
                file.push_str(&format!("external_id = {external_id}\n"));
            }
            file.push('\n');
        }
    }
    Ok(Some(file))
}
