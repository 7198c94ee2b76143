//! 수집기 설정 생성기
//!
//! 정규화 모델을 소스/트랜스폼/싱크 DAG로 렌더링합니다. 문서는 [`toml::Table`]로
//! 조립되므로 각 섹션의 컴포넌트는 ID 사전순으로 출력됩니다.
//!
//! ```text
//! input_<i>_* ──> input_<i>_meta ──> filter_<f>_<p> ... ──> output_<o>_remap ──> output_<o>
//! ```
//!
//! 시크릿 값은 문서에 들어가지 않습니다. 싱크는 `SECRET[kubernetes_secret.<name>_<key>]`
//! 참조만 담고, 수집기가 디렉토리 백엔드에서 값을 읽습니다.

pub mod component;
pub mod filters;
pub mod sinks;
pub mod sources;

use std::collections::BTreeMap;

use toml::{Table, Value};
use tracing::{debug, info};

use crate::config::CompilerConfig;
use crate::error::CompilerError;
use crate::model::{ForwarderModel, filter_id};
use crate::secrets::SECRET_BACKEND;

use component::{Component, integer};

/// 소스/트랜스폼/싱크 섹션
#[derive(Debug, Default)]
pub struct ConfigDocument {
    sources: Table,
    transforms: Table,
    sinks: Table,
}

impl ConfigDocument {
    pub fn add_source(&mut self, id: &str, component: Component) {
        self.sources.insert(id.to_owned(), Value::Table(component.into_table()));
    }

    pub fn add_transform(&mut self, id: &str, component: Component) {
        self.transforms.insert(id.to_owned(), Value::Table(component.into_table()));
    }

    pub fn add_sink(&mut self, id: &str, component: Component) {
        self.sinks.insert(id.to_owned(), Value::Table(component.into_table()));
    }

    pub fn sources(&self) -> &Table {
        &self.sources
    }

    pub fn transforms(&self) -> &Table {
        &self.transforms
    }

    pub fn sinks(&self) -> &Table {
        &self.sinks
    }

    /// 전역 설정과 섹션을 합친 최상위 테이블
    pub fn into_table(self, model: &ForwarderModel<'_>, config: &CompilerConfig) -> Table {
        let forwarder = model.forwarder;
        let globals = Component::default()
            .set(
                "data_dir",
                config.forwarder_data_dir(forwarder.namespace(), forwarder.name()),
            )
            .set("expire_metrics_secs", integer(config.expire_metrics_secs))
            .set("api.enabled", true)
            .set_at(&["secret", SECRET_BACKEND, "type"], "directory")
            .set_at(&["secret", SECRET_BACKEND, "base_path"], config.secrets_dir.as_str());
        let mut table = globals.into_table();
        for (section, components) in [
            ("sources", self.sources),
            ("transforms", self.transforms),
            ("sinks", self.sinks),
        ] {
            if !components.is_empty() {
                table.insert(section.to_owned(), Value::Table(components));
            }
        }
        table
    }
}

/// 모델의 컴포넌트 DAG를 만듭니다.
pub fn build(model: &ForwarderModel<'_>, config: &CompilerConfig) -> Result<ConfigDocument, CompilerError> {
    let mut doc = ConfigDocument::default();

    let mut input_ids: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for input in model.referenced_inputs() {
        let ids = sources::add_input(&mut doc, model, input, config)?;
        input_ids.insert(input.name.as_str(), ids);
    }

    // 파이프라인별 마지막 트랜스폼 ID
    let mut terminals: Vec<Vec<String>> = Vec::new();
    for (index, pipeline) in model.forwarder.spec.pipelines.iter().enumerate() {
        let mut upstream: Vec<String> = Vec::new();
        for id in pipeline
            .input_refs
            .iter()
            .filter_map(|name| input_ids.get(name.as_str()))
            .flatten()
        {
            if !upstream.contains(id) {
                upstream.push(id.clone());
            }
        }
        for name in &pipeline.filter_refs {
            let Some(filter) = model.filters.get(name.as_str()) else {
                continue;
            };
            let id = filter_id(name, index);
            doc.add_transform(&id, filters::filter_component(filter, &upstream)?);
            upstream = vec![id];
        }
        terminals.push(upstream);
    }

    for output in model.outputs.values() {
        let mut inputs: Vec<String> = Vec::new();
        for (index, _) in model.pipelines_for_output(&output.name) {
            for id in terminals.get(index).into_iter().flatten() {
                if !inputs.contains(id) {
                    inputs.push(id.clone());
                }
            }
        }
        if inputs.is_empty() {
            debug!(output = %output.name, "output not referenced by any pipeline; skipping sink");
            continue;
        }
        sinks::add_output(&mut doc, model, output, inputs, config)?;
    }
    Ok(doc)
}

/// 수집기 설정 문서를 렌더링합니다.
pub fn generate(model: &ForwarderModel<'_>, config: &CompilerConfig) -> Result<String, CompilerError> {
    let doc = build(model, config)?;
    let (sources, transforms, sinks) = (doc.sources.len(), doc.transforms.len(), doc.sinks.len());
    let rendered = toml::to_string(&doc.into_table(model, config))?;
    info!(
        forwarder = %model.forwarder.name(),
        sources,
        transforms,
        sinks,
        "rendered collector configuration"
    );
    Ok(rendered)
}
