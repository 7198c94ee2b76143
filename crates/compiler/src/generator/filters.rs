//! 필터 트랜스폼 -- 파이프라인 필터를 VRL/트랜스폼으로 바꿉니다.
//!
//! 모든 필터는 유입 단계에서 보관한 `._internal` 레코드를 대상으로 합니다.

use std::collections::BTreeMap;

use logforward_core::api::filter::{DropCondition, DropTest, KubeApiAudit, PruneFilter};
use logforward_core::api::{FilterKind, FilterSpec};

use super::component::{Component, string_array};
use crate::error::CompilerError;
use crate::fieldpath::FieldPath;

/// 레코드 보관 필드
pub const INTERNAL: &str = "_internal";

/// `omitResponseCodes`가 없을 때 생략하는 응답 코드
pub const DEFAULT_OMIT_RESPONSE_CODES: [i32; 4] = [404, 409, 422, 429];

/// 필터 하나를 트랜스폼 컴포넌트로 만듭니다.
pub fn filter_component(filter: &FilterSpec, inputs: &[String]) -> Result<Component, CompilerError> {
    let component = match &filter.kind {
        FilterKind::Drop(tests) => {
            Component::new("filter", inputs).set("condition", drop_condition(tests))
        }
        FilterKind::Prune(prune) => remap(inputs, prune_vrl(prune)?),
        FilterKind::OpenshiftLabels(labels) => remap(inputs, openshift_labels_vrl(labels)),
        FilterKind::DetectMultilineException => Component::new("detect_exceptions", inputs)
            .set("languages", string_array(&["All"]))
            .set(
                "group_by",
                string_array(&[
                    "._internal.kubernetes.namespace_name",
                    "._internal.kubernetes.pod_name",
                    "._internal.kubernetes.container_name",
                    "._internal.kubernetes.pod_id",
                ]),
            )
            .set("expire_after_secs", 2)
            .set("multiline_flush_interval_secs", 1),
        FilterKind::Parse => remap(inputs, PARSE_VRL.to_owned()),
        FilterKind::KubeApiAudit(audit) => remap(inputs, kube_api_audit_vrl(audit))
            .set("drop_on_abort", true),
    };
    Ok(component)
}

fn remap(inputs: &[String], source: String) -> Component {
    Component::new("remap", inputs).set("source", source)
}

// ─── drop ────────────────────────────────────────────────────────────

/// 통과 조건: 어느 테스트도 참이 아니어야 합니다.
///
/// ```text
/// !((c1 && c2) || (c3))
/// ```
pub fn drop_condition(tests: &[DropTest]) -> String {
    let clauses: Vec<String> = tests
        .iter()
        .map(|t| {
            let terms: Vec<String> = t.test.iter().filter_map(drop_term).collect();
            format!("({})", terms.join(" && "))
        })
        .collect();
    format!("!({})", clauses.join(" || "))
}

fn drop_term(condition: &DropCondition) -> Option<String> {
    let field = format!("to_string(.{INTERNAL}{}) ?? \"\"", condition.field);
    match (&condition.matches, &condition.not_matches) {
        (Some(re), _) => Some(format!("match({field}, {})", regex_literal(re))),
        (None, Some(re)) => Some(format!("!match({field}, {})", regex_literal(re))),
        (None, None) => None,
    }
}

/// VRL 정규식 리터럴 `r'...'`
///
/// 작은따옴표(`'`와 이스케이프된 `\'`)는 같은 문자를 뜻하는 `\x27`로 바꿔
/// 리터럴이 중간에 끝나지 않게 합니다.
fn regex_literal(re: &str) -> String {
    let mut out = String::with_capacity(re.len() + 2);
    out.push_str("r'");
    let mut escaped = false;
    for c in re.chars() {
        match c {
            '\'' if escaped => {
                out.pop();
                out.push_str(r"\x27");
            }
            '\'' => out.push_str(r"\x27"),
            _ => out.push(c),
        }
        escaped = c == '\\' && !escaped;
    }
    out.push('\'');
    out
}

// ─── prune ───────────────────────────────────────────────────────────

/// `_internal` 아래 경로 목록. 레이블 경로는 dedot 별칭이 뒤따릅니다.
pub fn prune_paths(fields: &[String]) -> Result<Vec<Vec<String>>, CompilerError> {
    let mut paths = Vec::new();
    for field in fields {
        let parsed = FieldPath::parse(field).map_err(|e| CompilerError::FieldPath {
            path: field.clone(),
            reason: e.to_string(),
        })?;
        for names in parsed.with_dedot_alias() {
            let mut path = Vec::with_capacity(names.len() + 1);
            path.push(INTERNAL.to_owned());
            path.extend(names);
            paths.push(path);
        }
    }
    Ok(paths)
}

fn path_literal(path: &[String]) -> Result<String, CompilerError> {
    serde_json::to_string(path).map_err(|e| CompilerError::Serialize(e.to_string()))
}

pub fn prune_vrl(prune: &PruneFilter) -> Result<String, CompilerError> {
    let mut lines = Vec::new();
    if let Some(fields) = prune.in_fields.as_deref().filter(|f| !f.is_empty()) {
        for path in prune_paths(fields)? {
            lines.push(format!(". = remove!(., {})", path_literal(&path)?));
        }
    }
    if let Some(fields) = prune.not_in.as_deref().filter(|f| !f.is_empty()) {
        let kept = prune_paths(fields)?
            .iter()
            .map(|p| path_literal(p))
            .collect::<Result<Vec<_>, _>>()?;
        lines.push("new_object = {}".to_owned());
        lines.push(format!("paths_to_keep = [{}]", kept.join(",")));
        lines.push(
            "for_each(paths_to_keep) -> |_index, path| {\n  ref = get!(., path)\n  if ref != null {\n    new_object = set!(new_object, path, ref)\n  }\n}"
                .to_owned(),
        );
        lines.push(". = new_object".to_owned());
    }
    Ok(lines.join("\n"))
}

// ─── 기타 ────────────────────────────────────────────────────────────

fn openshift_labels_vrl(labels: &BTreeMap<String, String>) -> String {
    let literal = serde_json::to_string(labels).unwrap_or_else(|_| "{}".to_owned());
    format!(
        "._internal.openshift.labels = merge(object(._internal.openshift.labels) ?? {{}}, {literal})"
    )
}

const PARSE_VRL: &str = r#"parsed, err = parse_json(string(._internal.message) ?? "")
if err == null && is_object(parsed) {
  ._internal.structured = parsed
}"#;

const AUDIT_RULES_VRL: &str = r#"matched = false
level = "Metadata"
for_each(rules) -> |_index, rule| {
  if !matched {
    users = array(rule.users) ?? []
    verbs = array(rule.verbs) ?? []
    namespaces = array(rule.namespaces) ?? []
    if (length(users) == 0 || includes(users, ._internal.user.username)) && (length(verbs) == 0 || includes(verbs, ._internal.verb)) && (length(namespaces) == 0 || includes(namespaces, ._internal.objectRef.namespace)) {
      matched = true
      level = string(rule.level) ?? "Metadata"
    }
  }
}
if level == "None" { abort }
if level == "Metadata" {
  del(._internal.requestObject)
  del(._internal.responseObject)
}
if level == "Request" { del(._internal.responseObject) }
._internal.level = level"#;

/// kube API 감사 정책
///
/// 생략 단계와 응답 코드를 먼저 거르고, 첫 번째로 일치하는 규칙의 level을 적용합니다.
pub fn kube_api_audit_vrl(audit: &KubeApiAudit) -> String {
    let codes = audit
        .omit_response_codes
        .clone()
        .unwrap_or_else(|| DEFAULT_OMIT_RESPONSE_CODES.to_vec());
    let stages = serde_json::to_string(&audit.omit_stages).unwrap_or_else(|_| "[]".to_owned());
    let codes = serde_json::to_string(&codes).unwrap_or_else(|_| "[]".to_owned());
    let rules = serde_json::to_string(&audit.rules).unwrap_or_else(|_| "[]".to_owned());
    format!(
        "if includes({stages}, ._internal.stage) {{ abort }}\nif includes({codes}, ._internal.responseStatus.code) {{ abort }}\nrules = {rules}\n{AUDIT_RULES_VRL}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(field: &str, matches: Option<&str>, not_matches: Option<&str>) -> DropCondition {
        DropCondition {
            field: field.to_owned(),
            matches: matches.map(str::to_owned),
            not_matches: not_matches.map(str::to_owned),
        }
    }

    #[test]
    fn drop_condition_negates_disjunction_of_tests() {
        let tests = vec![
            DropTest {
                test: vec![
                    cond(".kubernetes.namespace_name", Some("busybox"), None),
                    cond(".level", None, Some("d.+")),
                ],
            },
            DropTest {
                test: vec![cond(".log_type", Some("application"), None)],
            },
        ];
        assert_eq!(
            drop_condition(&tests),
            r#"!((match(to_string(._internal.kubernetes.namespace_name) ?? "", r'busybox') && !match(to_string(._internal.level) ?? "", r'd.+')) || (match(to_string(._internal.log_type) ?? "", r'application')))"#
        );
    }

    #[test]
    fn quotes_in_regex_do_not_end_the_literal() {
        let tests = vec![DropTest {
            test: vec![cond(".message", Some("it's"), None)],
        }];
        let vrl = drop_condition(&tests);
        assert_eq!(vrl, r#"!((match(to_string(._internal.message) ?? "", r'it\x27s')))"#);
        assert!(regex::Regex::new(r"it\x27s").unwrap().is_match("it's"));
        assert_eq!(regex_literal(r"it\'s"), r"r'it\x27s'");
        assert_eq!(regex_literal(r"a\\'"), r"r'a\\\x27'");
    }

    #[test]
    fn prune_keeps_label_and_dedot_alias() {
        let paths = prune_paths(&[r#".kubernetes.labels."bar/baz0-9.test""#.to_owned()]).unwrap();
        assert_eq!(
            paths,
            vec![
                vec!["_internal", "kubernetes", "labels", "bar/baz0-9.test"],
                vec!["_internal", "kubernetes", "labels", "bar_baz0-9_test"],
            ]
        );
    }

    #[test]
    fn prune_in_removes_each_path() {
        let prune = PruneFilter {
            in_fields: Some(vec![".kubernetes.annotations".to_owned(), ".hostname".to_owned()]),
            not_in: None,
        };
        assert_eq!(
            prune_vrl(&prune).unwrap(),
            ". = remove!(., [\"_internal\",\"kubernetes\",\"annotations\"])\n. = remove!(., [\"_internal\",\"hostname\"])"
        );
    }

    #[test]
    fn prune_not_in_builds_new_object() {
        let prune = PruneFilter {
            in_fields: None,
            not_in: Some(vec![".message".to_owned(), ".log_type".to_owned()]),
        };
        let vrl = prune_vrl(&prune).unwrap();
        assert!(vrl.contains(r#"paths_to_keep = [["_internal","message"],["_internal","log_type"]]"#));
        assert!(vrl.ends_with(". = new_object"));
    }

    #[test]
    fn invalid_prune_path_is_an_error() {
        let prune = PruneFilter {
            in_fields: Some(vec!["message".to_owned()]),
            not_in: None,
        };
        assert!(matches!(prune_vrl(&prune), Err(CompilerError::FieldPath { .. })));
    }

    #[test]
    fn audit_policy_defaults_response_codes() {
        let vrl = kube_api_audit_vrl(&KubeApiAudit::default());
        assert!(vrl.starts_with("if includes([], ._internal.stage) { abort }"));
        assert!(vrl.contains("if includes([404,409,422,429], ._internal.responseStatus.code)"));

        let vrl = kube_api_audit_vrl(&KubeApiAudit {
            omit_response_codes: Some(Vec::new()),
            ..Default::default()
        });
        assert!(vrl.contains("if includes([], ._internal.responseStatus.code)"));
    }

    #[test]
    fn labels_merge_into_openshift_labels() {
        let filter = FilterSpec {
            name: "labels".to_owned(),
            kind: FilterKind::OpenshiftLabels(BTreeMap::from([(
                "cluster".to_owned(),
                "east".to_owned(),
            )])),
        };
        let component = filter_component(&filter, &["in".to_owned()]).unwrap();
        let source = component.get("source").and_then(|v| v.as_str()).unwrap();
        assert!(source.ends_with(r#"{"cluster":"east"})"#));
    }
}
