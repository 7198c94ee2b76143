//! 파이프라인 검증 -- 참조 해석과 GCL hostname 보존

use logforward_core::api::condition::{
    REASON_FILTER_PRUNE_HOSTNAME, REASON_PIPELINE_FILTER_REF_NOT_FOUND,
    REASON_PIPELINE_INPUT_REF_NOT_FOUND, REASON_PIPELINE_OUTPUT_REF_NOT_FOUND,
};
use logforward_core::api::filter::PruneFilter;
use logforward_core::api::{FilterKind, ForwarderSpec, OutputKind, PipelineSpec};

use super::{Failure, Outcome};

const HOSTNAME_FIELD: &str = ".hostname";

pub fn validate_pipeline(spec: &ForwarderSpec, pipeline: &PipelineSpec) -> Outcome {
    let name = &pipeline.name;
    if pipeline.input_refs.is_empty() {
        return Err(Failure::invalid(format!(
            "pipeline {name:?} must reference at least one input"
        )));
    }
    if pipeline.output_refs.is_empty() {
        return Err(Failure::invalid(format!(
            "pipeline {name:?} must reference at least one output"
        )));
    }

    let missing = |refs: &[String], exists: &dyn Fn(&str) -> bool| -> Vec<String> {
        refs.iter().filter(|r| !exists(r)).cloned().collect()
    };
    let inputs = missing(&pipeline.input_refs, &|r| spec.input(r).is_some());
    if !inputs.is_empty() {
        return Err(Failure::new(
            REASON_PIPELINE_INPUT_REF_NOT_FOUND,
            format!("pipeline {name:?} references unknown inputs {inputs:?}"),
        ));
    }
    let outputs = missing(&pipeline.output_refs, &|r| spec.output(r).is_some());
    if !outputs.is_empty() {
        return Err(Failure::new(
            REASON_PIPELINE_OUTPUT_REF_NOT_FOUND,
            format!("pipeline {name:?} references unknown outputs {outputs:?}"),
        ));
    }
    let filters = missing(&pipeline.filter_refs, &|r| spec.filter(r).is_some());
    if !filters.is_empty() {
        return Err(Failure::new(
            REASON_PIPELINE_FILTER_REF_NOT_FOUND,
            format!("pipeline {name:?} references unknown filters {filters:?}"),
        ));
    }

    let has_gcl = pipeline
        .output_refs
        .iter()
        .filter_map(|r| spec.output(r))
        .any(|o| matches!(o.kind, OutputKind::GoogleCloudLogging(_)));
    if has_gcl
        && let Some(filter) = pipeline.filter_refs.iter().filter_map(|r| spec.filter(r)).find(
            |f| matches!(&f.kind, FilterKind::Prune(prune) if prunes_hostname(prune)),
        )
    {
        return Err(Failure::new(
            REASON_FILTER_PRUNE_HOSTNAME,
            format!(
                "prune filter {:?} removes {HOSTNAME_FIELD}, which googleCloudLogging outputs require",
                filter.name
            ),
        ));
    }
    Ok(())
}

/// `.hostname`이 제거되는지 (`in`에 있거나, `notIn`이 있는데 빠져 있음)
pub fn prunes_hostname(prune: &PruneFilter) -> bool {
    let listed = |fields: &Option<Vec<String>>| {
        fields
            .as_ref()
            .map(|f| f.iter().any(|p| p == HOSTNAME_FIELD))
    };
    listed(&prune.in_fields) == Some(true) || listed(&prune.not_in) == Some(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use logforward_core::api::output::{
        GoogleCloudLogging, GoogleCloudLoggingId, GoogleCloudLoggingIdType,
    };
    use logforward_core::api::{FilterSpec, InputSpec, OutputSpec};

    fn spec(prune: PruneFilter) -> ForwarderSpec {
        ForwarderSpec {
            inputs: vec![InputSpec::reserved("application").unwrap()],
            outputs: vec![OutputSpec::new(
                "gcl",
                OutputKind::GoogleCloudLogging(GoogleCloudLogging {
                    id: GoogleCloudLoggingId {
                        id_type: GoogleCloudLoggingIdType::Project,
                        value: "my-project".to_owned(),
                    },
                    log_id: "app".to_owned(),
                    authentication: None,
                    tuning: None,
                }),
            )],
            filters: vec![FilterSpec {
                name: "prune".to_owned(),
                kind: FilterKind::Prune(prune),
            }],
            ..Default::default()
        }
    }

    fn pipeline(inputs: &[&str], outputs: &[&str], filters: &[&str]) -> PipelineSpec {
        let owned = |v: &[&str]| v.iter().map(|s| s.to_string()).collect();
        PipelineSpec {
            name: "p".to_owned(),
            input_refs: owned(inputs),
            output_refs: owned(outputs),
            filter_refs: owned(filters),
        }
    }

    #[test]
    fn unknown_refs_have_specific_reasons() {
        let spec = spec(PruneFilter::default());
        let err = validate_pipeline(&spec, &pipeline(&["audit"], &["gcl"], &[])).unwrap_err();
        assert_eq!(err.reason, REASON_PIPELINE_INPUT_REF_NOT_FOUND);
        let err = validate_pipeline(&spec, &pipeline(&["application"], &["nope"], &[])).unwrap_err();
        assert_eq!(err.reason, REASON_PIPELINE_OUTPUT_REF_NOT_FOUND);
        let err =
            validate_pipeline(&spec, &pipeline(&["application"], &["gcl"], &["nope"])).unwrap_err();
        assert_eq!(err.reason, REASON_PIPELINE_FILTER_REF_NOT_FOUND);
    }

    #[test]
    fn empty_pipeline_is_invalid() {
        let spec = spec(PruneFilter::default());
        assert!(validate_pipeline(&spec, &pipeline(&[], &["gcl"], &[])).is_err());
        assert!(validate_pipeline(&spec, &pipeline(&["application"], &[], &[])).is_err());
    }

    #[test]
    fn gcl_forbids_pruning_hostname() {
        let in_hostname = spec(PruneFilter {
            in_fields: Some(vec![".hostname".to_owned()]),
            not_in: None,
        });
        let err = validate_pipeline(&in_hostname, &pipeline(&["application"], &["gcl"], &["prune"]))
            .unwrap_err();
        assert_eq!(err.reason, REASON_FILTER_PRUNE_HOSTNAME);

        let not_in_without = spec(PruneFilter {
            in_fields: None,
            not_in: Some(vec![".log_type".to_owned(), ".message".to_owned()]),
        });
        assert!(
            validate_pipeline(&not_in_without, &pipeline(&["application"], &["gcl"], &["prune"]))
                .is_err()
        );

        let keeps = spec(PruneFilter {
            in_fields: Some(vec![".kubernetes.labels".to_owned()]),
            not_in: Some(vec![".hostname".to_owned(), ".message".to_owned()]),
        });
        assert!(validate_pipeline(&keeps, &pipeline(&["application"], &["gcl"], &["prune"])).is_ok());
    }
}
