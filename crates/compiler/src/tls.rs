//! TLS 블록 생성과 URL 스킴 검사

use std::collections::BTreeSet;

use serde::Serialize;
use url::Url;

use logforward_core::api::{OutputTlsSpec, TlsSpec, ValueReference, ValueSource};

use crate::config::CompilerConfig;
use crate::secrets::secret_ref;

/// TLS를 사용하는 URL 스킴
pub const SECURE_SCHEMES: [&str; 3] = ["https", "tls", "udps"];

/// 수집기 TLS 블록
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TlsBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_tls_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ciphersuites: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crt_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_pass: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify_certificate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify_hostname: Option<bool>,
}

impl TlsBlock {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// URL 스킴 (소문자)
pub fn url_scheme(url: &str) -> Option<String> {
    Url::parse(url).ok().map(|u| u.scheme().to_owned())
}

/// TLS 스킴인지 확인합니다. URL이 없으면 클라우드 기본 엔드포인트(HTTPS)로 봅니다.
pub fn is_secure(url: Option<&str>) -> bool {
    match url {
        None => true,
        Some(url) => url_scheme(url).is_some_and(|s| SECURE_SCHEMES.contains(&s.as_str())),
    }
}

/// 평문 URL에 TLS 전용 옵션이 설정되어 있으면 실패 메시지를 돌려줍니다.
pub fn check_scheme(url: Option<&str>, tls: Option<&OutputTlsSpec>) -> Result<(), String> {
    let (Some(url), Some(tls)) = (url, tls) else {
        return Ok(());
    };
    if is_secure(Some(url)) {
        return Ok(());
    }
    if tls.insecure_skip_verify || tls.security_profile.is_some() {
        return Err(format!(
            "insecureSkipVerify and securityProfile require a secure URL scheme ({}), got {url:?}",
            SECURE_SCHEMES.join(", ")
        ));
    }
    Ok(())
}

/// TLS 스펙이 참조하는 시크릿 이름
pub fn secrets_for_tls(tls: &TlsSpec) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for reference in [&tls.ca, &tls.certificate].into_iter().flatten() {
        if let Some(ValueSource::Secret(name)) = reference.source() {
            names.insert(name.to_owned());
        }
    }
    for reference in [&tls.key, &tls.key_passphrase].into_iter().flatten() {
        names.insert(reference.secret_name.clone());
    }
    names
}

/// TLS 스펙이 참조하는 컨피그맵 이름
pub fn config_maps_for_tls(tls: &TlsSpec) -> BTreeSet<String> {
    [&tls.ca, &tls.certificate]
        .into_iter()
        .flatten()
        .filter_map(|r| match r.source() {
            Some(ValueSource::ConfigMap(name)) => Some(name.to_owned()),
            _ => None,
        })
        .collect()
}

fn value_path(reference: &ValueReference, config: &CompilerConfig) -> Option<String> {
    match reference.source()? {
        ValueSource::Secret(name) => Some(config.secret_path(name, &reference.key)),
        ValueSource::ConfigMap(name) => Some(config.config_map_path(name, &reference.key)),
    }
}

fn apply_references(block: &mut TlsBlock, tls: &TlsSpec, config: &CompilerConfig) {
    block.ca_file = tls.ca.as_ref().and_then(|r| value_path(r, config));
    block.crt_file = tls.certificate.as_ref().and_then(|r| value_path(r, config));
    block.key_file = tls
        .key
        .as_ref()
        .map(|r| config.secret_path(&r.secret_name, &r.key));
    block.key_pass = tls
        .key_passphrase
        .as_ref()
        .map(|r| secret_ref(&r.secret_name, &r.key));
}

/// 출력 싱크의 TLS 블록을 만듭니다.
///
/// 평문 URL이면 `None`. 출력의 보안 프로파일이 없으면 호출자 프로파일을 덧씌웁니다.
pub fn materialize(
    tls: Option<&OutputTlsSpec>,
    url: Option<&str>,
    config: &CompilerConfig,
) -> Option<TlsBlock> {
    if !is_secure(url) {
        return None;
    }
    let mut block = TlsBlock::default();
    if let Some(tls) = tls {
        apply_references(&mut block, &tls.tls, config);
        if tls.insecure_skip_verify {
            block.verify_certificate = Some(false);
            block.verify_hostname = Some(false);
        }
    }

    let profile = tls.and_then(|t| t.security_profile.as_ref());
    let min_version = profile
        .and_then(|p| p.min_tls_version.clone())
        .unwrap_or_else(|| config.min_tls_version.clone());
    let ciphers = match profile {
        Some(p) if !p.ciphers.is_empty() => p.ciphers.join(","),
        _ => config.ciphers.join(","),
    };
    block.min_tls_version = Some(min_version).filter(|v| !v.is_empty());
    block.ciphersuites = Some(ciphers).filter(|c| !c.is_empty());

    (!block.is_empty()).then_some(block)
}

/// 리시버 소스의 서버 TLS 블록
///
/// TLS 스펙이 없으면 `<forwarder>-<input>` 서빙 인증서 시크릿을 사용합니다.
pub fn materialize_receiver(
    tls: Option<&TlsSpec>,
    default_secret: &str,
    config: &CompilerConfig,
) -> TlsBlock {
    let mut block = TlsBlock {
        enabled: Some(true),
        ..TlsBlock::default()
    };
    match tls.filter(|t| !t.is_empty()) {
        Some(tls) => apply_references(&mut block, tls, config),
        None => {
            block.crt_file = Some(config.secret_path(default_secret, "tls.crt"));
            block.key_file = Some(config.secret_path(default_secret, "tls.key"));
        }
    }
    block.min_tls_version = Some(config.min_tls_version.clone()).filter(|v| !v.is_empty());
    block.ciphersuites = Some(config.ciphers.join(",")).filter(|c| !c.is_empty());
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use logforward_core::api::{SecretReference, TlsSecurityProfile};

    fn tls_spec() -> OutputTlsSpec {
        OutputTlsSpec {
            tls: TlsSpec {
                ca: Some(ValueReference::from_config_map("trusted", "ca-bundle.crt")),
                certificate: Some(ValueReference::from_secret("client", "tls.crt")),
                key: Some(SecretReference::new("client", "tls.key")),
                key_passphrase: Some(SecretReference::new("client-pass", "passphrase")),
            },
            insecure_skip_verify: false,
            security_profile: None,
        }
    }

    #[test]
    fn materialize_paths_and_profile() {
        let config = CompilerConfig::default();
        let block = materialize(Some(&tls_spec()), Some("https://es:9200"), &config).unwrap();
        assert_eq!(
            block.ca_file.as_deref(),
            Some("/var/run/ocp-collector/config/trusted/ca-bundle.crt")
        );
        assert_eq!(
            block.crt_file.as_deref(),
            Some("/var/run/ocp-collector/secrets/client/tls.crt")
        );
        assert_eq!(
            block.key_pass.as_deref(),
            Some("SECRET[kubernetes_secret.client_pass_passphrase]")
        );
        assert_eq!(block.min_tls_version.as_deref(), Some("VersionTLS12"));
        assert_eq!(block.verify_certificate, None);
    }

    #[test]
    fn plaintext_url_has_no_tls_block() {
        let config = CompilerConfig::default();
        assert!(materialize(Some(&tls_spec()), Some("http://es:9200"), &config).is_none());
    }

    #[test]
    fn insecure_skip_verify_disables_verification() {
        let mut spec = tls_spec();
        spec.insecure_skip_verify = true;
        spec.security_profile = Some(TlsSecurityProfile {
            min_tls_version: Some("VersionTLS13".to_owned()),
            ciphers: vec!["TLS_AES_128_GCM_SHA256".to_owned()],
        });
        let block = materialize(Some(&spec), Some("tls://syslog:6514"), &CompilerConfig::default())
            .unwrap();
        assert_eq!(block.verify_certificate, Some(false));
        assert_eq!(block.verify_hostname, Some(false));
        assert_eq!(block.min_tls_version.as_deref(), Some("VersionTLS13"));
        assert_eq!(block.ciphersuites.as_deref(), Some("TLS_AES_128_GCM_SHA256"));
    }

    #[test]
    fn scheme_check_flags_plaintext_with_tls_options() {
        let mut spec = tls_spec();
        assert!(check_scheme(Some("http://x"), Some(&spec)).is_ok());
        spec.insecure_skip_verify = true;
        assert!(check_scheme(Some("http://x"), Some(&spec)).is_err());
        assert!(check_scheme(Some("udps://x:514"), Some(&spec)).is_ok());
        assert!(check_scheme(None, Some(&spec)).is_ok());
    }

    #[test]
    fn reference_name_sets() {
        let spec = tls_spec();
        assert_eq!(
            secrets_for_tls(&spec.tls).into_iter().collect::<Vec<_>>(),
            vec!["client", "client-pass"]
        );
        assert_eq!(
            config_maps_for_tls(&spec.tls).into_iter().collect::<Vec<_>>(),
            vec!["trusted"]
        );
    }

    #[test]
    fn receiver_defaults_to_serving_certificate() {
        let block = materialize_receiver(None, "collector-http-audit", &CompilerConfig::default());
        assert_eq!(block.enabled, Some(true));
        assert_eq!(
            block.key_file.as_deref(),
            Some("/var/run/ocp-collector/secrets/collector-http-audit/tls.key")
        );
    }
}
