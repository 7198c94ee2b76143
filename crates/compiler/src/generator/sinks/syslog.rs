//! syslog 싱크 (`socket` + syslog 인코딩)

use logforward_core::api::output::{Syslog, SyslogRfc};

use super::{SinkContext, SinkParts, split_url, template_field};
use crate::error::CompilerError;
use crate::generator::component::Component;

pub const DEFAULT_FACILITY: &str = "user";
pub const DEFAULT_SEVERITY: &str = "informational";
/// app_name, proc_id, msg_id 기본값 (RFC5424 NILVALUE)
pub const NIL_VALUE: &str = "-";

/// URL 스킴의 전송 모드. `tls`는 TCP 위의 TLS입니다.
pub fn mode(url: &str) -> &'static str {
    match split_url(url).map(|parts| parts.scheme).as_deref() {
        Some("udp" | "udps") => "udp",
        _ => "tcp",
    }
}

pub fn sink(_ctx: &SinkContext<'_>, syslog: &Syslog, inputs: &[String]) -> Result<SinkParts, CompilerError> {
    let mut remap = Vec::new();
    let mut field = |key: &str, value: Option<&str>, default: &str| {
        let value = value.filter(|v| !v.is_empty()).unwrap_or(default);
        template_field(&mut remap, &format!("syslog_{key}"), value)
    };
    let rfc = match syslog.rfc {
        SyslogRfc::Rfc3164 => "rfc3164",
        SyslogRfc::Rfc5424 => "rfc5424",
    };
    let facility = field("facility", syslog.facility.as_deref(), DEFAULT_FACILITY)?;
    let severity = field("severity", syslog.severity.as_deref(), DEFAULT_SEVERITY)?;
    let app_name = field("app_name", syslog.app_name.as_deref(), NIL_VALUE)?;
    let proc_id = field("proc_id", syslog.proc_id.as_deref(), NIL_VALUE)?;
    let msg_id = field("msg_id", syslog.msg_id.as_deref(), NIL_VALUE)?;

    let sink = Component::new("socket", inputs)
        .set(
            "address",
            split_url(&syslog.url).map(|parts| parts.authority).unwrap_or_default(),
        )
        .set("mode", mode(&syslog.url))
        .set("encoding.codec", "syslog")
        .set("encoding.rfc", rfc)
        .set("encoding.facility", facility)
        .set("encoding.severity", severity)
        .set("encoding.app_name", app_name)
        .set("encoding.proc_id", proc_id)
        .set("encoding.msg_id", msg_id)
        .set_opt(
            "encoding.payload_key",
            syslog.payload_key.as_deref().filter(|k| !k.is_empty()),
        );
    Ok(SinkParts {
        remap,
        explicit_tls: true,
        ..SinkParts::new(sink)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_selects_mode() {
        assert_eq!(mode("udp://rsyslog:514"), "udp");
        assert_eq!(mode("tls://rsyslog:6514"), "tcp");
        assert_eq!(mode("tcp://rsyslog:514"), "tcp");
    }
}
