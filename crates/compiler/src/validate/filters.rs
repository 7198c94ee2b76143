//! 필터 검증 -- drop 테스트와 prune 필드 목록

use logforward_core::api::filter::{DropTest, PruneFilter};
use logforward_core::api::{FilterKind, FilterSpec};

use super::{Failure, Outcome};
use crate::fieldpath;

/// prune 필터가 제거할 수 없는 필드
pub const REQUIRED_FIELDS: [&str; 3] = [".log_type", ".log_source", ".message"];

pub fn validate_filter(filter: &FilterSpec) -> Outcome {
    let problems = match &filter.kind {
        FilterKind::Drop(tests) => drop_problems(&filter.name, tests),
        FilterKind::Prune(prune) => prune_problems(&filter.name, prune),
        FilterKind::OpenshiftLabels(_)
        | FilterKind::DetectMultilineException
        | FilterKind::Parse
        | FilterKind::KubeApiAudit(_) => Vec::new(),
    };
    if problems.is_empty() {
        Ok(())
    } else {
        Err(Failure::invalid(problems.join(", ")))
    }
}

fn field_problem(path: &str) -> Option<String> {
    fieldpath::validate(path)
        .err()
        .map(|e| format!("{path:?}: {e}"))
}

fn drop_problems(name: &str, tests: &[DropTest]) -> Vec<String> {
    if tests.is_empty() {
        return vec![format!("{name} drop filter must have at least one test")];
    }
    let mut problems = Vec::new();
    for (index, test) in tests.iter().enumerate() {
        let mut test_problems = Vec::new();
        if test.test.is_empty() {
            test_problems.push("test must have at least one condition".to_owned());
        }
        for condition in &test.test {
            test_problems.extend(field_problem(&condition.field));
            match (&condition.matches, &condition.not_matches) {
                (Some(_), Some(_)) => test_problems
                    .push("only one of matches or notMatches can be defined at once".to_owned()),
                (None, None) => {
                    test_problems.push("one of matches or notMatches must be defined".to_owned())
                }
                _ => {}
            }
            for pattern in [&condition.matches, &condition.not_matches].into_iter().flatten() {
                if regex::Regex::new(pattern).is_err() {
                    test_problems.push(format!(
                        "matches/notMatches {pattern:?} must be a valid regular expression"
                    ));
                }
            }
        }
        if !test_problems.is_empty() {
            problems.push(format!("{name}: test[{index}] [{}]", test_problems.join(", ")));
        }
    }
    problems
}

fn prune_problems(name: &str, prune: &PruneFilter) -> Vec<String> {
    if prune.in_fields.is_none() && prune.not_in.is_none() {
        return vec![format!("{name} prune filter must have one or both of `in`, `notIn`")];
    }
    let mut problems = Vec::new();

    if let Some(in_fields) = &prune.in_fields {
        problems.extend(in_fields.iter().filter_map(|f| field_problem(f)));
        let listed: Vec<&str> = in_fields
            .iter()
            .map(String::as_str)
            .filter(|f| REQUIRED_FIELDS.contains(f))
            .collect();
        if !listed.is_empty() {
            problems.push(format!(
                "{listed:?} is/are required fields and must be removed from the `in` list."
            ));
        }
    }

    if let Some(not_in) = &prune.not_in {
        problems.extend(not_in.iter().filter_map(|f| field_problem(f)));
        let mut missing: Vec<&str> = REQUIRED_FIELDS
            .into_iter()
            .filter(|required| !not_in.iter().any(|f| f == required))
            .collect();
        missing.sort_unstable();
        if !missing.is_empty() {
            problems.push(format!(
                "{missing:?} is/are required fields and must be included in the `notIn` list."
            ));
        }
    }

    if problems.is_empty() {
        problems
    } else {
        vec![format!("{name}: [{}]", problems.join(", "))]
    }
}
