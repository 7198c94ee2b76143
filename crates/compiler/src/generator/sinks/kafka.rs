//! Kafka 싱크

use logforward_core::api::output::Kafka;

use super::{SinkContext, SinkParts, secret_value, split_url, template_field};
use crate::error::CompilerError;
use crate::generator::component::Component;

pub const DEFAULT_TOPIC: &str = "topic";
pub const DEFAULT_SASL_MECHANISM: &str = "PLAIN";

/// 브로커 목록 (`host:port`, URL 호스트가 먼저)
pub fn bootstrap_servers(kafka: &Kafka) -> Vec<String> {
    let mut servers: Vec<String> = Vec::new();
    for url in kafka.url.iter().chain(kafka.brokers.iter()) {
        if let Some(parts) = split_url(url)
            && !servers.contains(&parts.authority)
        {
            servers.push(parts.authority);
        }
    }
    servers
}

/// `topic`, 없으면 URL 경로, 둘 다 없으면 기본값
fn topic_template(kafka: &Kafka) -> String {
    if let Some(topic) = kafka.topic.as_deref().filter(|t| !t.is_empty()) {
        return topic.to_owned();
    }
    kafka
        .url
        .as_deref()
        .and_then(split_url)
        .map(|parts| parts.path)
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_TOPIC.to_owned())
}

pub fn sink(_ctx: &SinkContext<'_>, kafka: &Kafka, inputs: &[String]) -> Result<SinkParts, CompilerError> {
    let mut remap = Vec::new();
    let topic = template_field(&mut remap, "kafka_topic", &topic_template(kafka))?;
    let mut sink = Component::new("kafka", inputs)
        .set("bootstrap_servers", bootstrap_servers(kafka).join(","))
        .set("topic", topic)
        .set("encoding.codec", "json")
        .set("encoding.timestamp_format", "rfc3339")
        .set("healthcheck.enabled", false);
    if let Some(sasl) = kafka.authentication.as_ref().and_then(|a| a.sasl.as_ref()) {
        let mechanism = sasl
            .mechanism
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_SASL_MECHANISM);
        sink = sink
            .set("sasl.enabled", true)
            .set("sasl.mechanism", mechanism)
            .set_opt("sasl.username", sasl.username.as_ref().map(secret_value))
            .set_opt("sasl.password", sasl.password.as_ref().map(secret_value));
    }
    Ok(SinkParts {
        remap,
        explicit_tls: true,
        ..SinkParts::new(sink)
    })
}
