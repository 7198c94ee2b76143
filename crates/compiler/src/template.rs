//! 라우팅 템플릿 -- `app-{.kubernetes.namespace_name||"none"}`
//!
//! 정적 부분은 `[A-Za-z0-9._/-]`, 동적 부분은 `{` 필드 경로 `||` ... `||` `"fallback"` `}`
//! 입니다. 대체 문자열은 반드시 있어야 합니다.
//!
//! 컴파일된 [`Template`]은 수집기 VRL 식으로 렌더링됩니다. 각 동적 부분은
//! 첫 번째로 비어 있지 않은 필드 값, 없으면 대체 문자열로 평가됩니다.
//!
//! ```text
//! foo-{.bar||.baz||"none"}  ->  "foo-" + to_string!(._internal.bar||._internal.baz||"none")
//! ```

use crate::error::CompilerError;
use crate::fieldpath::{self, FieldPath};

/// 템플릿 조각
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Literal(String),
    Dynamic {
        paths: Vec<FieldPath>,
        fallback: String,
    },
}

/// 컴파일된 템플릿
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    parts: Vec<Part>,
}

impl Template {
    /// 템플릿 문자열을 파싱합니다.
    pub fn compile(source: &str) -> Result<Self, CompilerError> {
        let fail = |reason: &str| CompilerError::Template {
            template: source.to_owned(),
            reason: reason.to_owned(),
        };

        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut rest = source;
        while let Some(c) = rest.chars().next() {
            if c != '{' {
                if !is_static_char(c) {
                    return Err(fail(&format!("invalid character {c:?} outside of braces")));
                }
                literal.push(c);
                rest = &rest[c.len_utf8()..];
                continue;
            }
            if !literal.is_empty() {
                parts.push(Part::Literal(std::mem::take(&mut literal)));
            }
            let (part, consumed) = parse_dynamic(&rest[1..]).map_err(|r| fail(r))?;
            parts.push(part);
            rest = &rest[1 + consumed..];
        }
        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }

        Ok(Self {
            source: source.to_owned(),
            parts,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// 동적 부분이 없는 템플릿인지
    pub fn is_static(&self) -> bool {
        self.parts.iter().all(|p| matches!(p, Part::Literal(_)))
    }

    /// VRL 식으로 렌더링합니다.
    pub fn to_vrl(&self) -> String {
        if self.parts.is_empty() {
            return "\"\"".to_owned();
        }
        self.parts
            .iter()
            .map(|part| match part {
                Part::Literal(text) => vrl_string(text),
                Part::Dynamic { paths, fallback } => {
                    let mut alternatives: Vec<String> = paths
                        .iter()
                        .map(|p| format!("._internal{p}"))
                        .collect();
                    alternatives.push(vrl_string(fallback));
                    format!("to_string!({})", alternatives.join("||"))
                }
            })
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

/// 템플릿을 검증하고 VRL 식을 돌려줍니다.
pub fn render(template: &str) -> Result<String, CompilerError> {
    Template::compile(template).map(|t| t.to_vrl())
}

/// 템플릿 문법 검증 (오류 메시지는 컨디션용)
pub fn validate(template: &str) -> Result<(), String> {
    Template::compile(template).map(|_| ()).map_err(|e| match e {
        CompilerError::Template { reason, .. } => reason,
        other => other.to_string(),
    })
}

fn is_static_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '/' | '-')
}

/// `{` 다음부터 `}`까지 읽습니다. 소비한 바이트 수는 `}`를 포함합니다.
fn parse_dynamic(input: &str) -> Result<(Part, usize), &'static str> {
    let mut paths = Vec::new();
    let mut pos = 0;
    loop {
        let rest = &input[pos..];
        if rest.starts_with('"') {
            break;
        }
        let (segments, consumed) =
            fieldpath::scan(rest).map_err(|_| "expected a field path or quoted fallback")?;
        let path = FieldPath::parse(&fieldpath::join(&segments))
            .map_err(|_| "invalid field path")?;
        paths.push(path);
        pos += consumed;
        if !input[pos..].starts_with("||") {
            return Err("field paths must be followed by '||' and a quoted fallback");
        }
        pos += 2;
    }
    if paths.is_empty() {
        return Err("at least one field path is required before the fallback");
    }

    let rest = &input[pos + 1..];
    let close = rest.find('"').ok_or("unterminated fallback string")?;
    let fallback = rest[..close].to_owned();
    pos += 1 + close + 1;
    if !input[pos..].starts_with('}') {
        return Err("expected '}' after fallback");
    }
    Ok((Part::Dynamic { paths, fallback }, pos + 1))
}

fn vrl_string(text: &str) -> String {
    format!("{text:?}")
}
