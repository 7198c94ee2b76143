//! 필드 경로 문법 -- `.kubernetes.labels."app.io/name"`
//!
//! 경로는 `.`으로 시작하는 세그먼트 나열입니다. 세그먼트는 `[A-Za-z0-9_]+`이거나
//! 큰따옴표로 감싼 임의 문자열(`\"` 이스케이프 허용)입니다.
//!
//! 세그먼트는 원문 그대로(따옴표 포함) 보관하고, 이름이 필요할 때만 따옴표를 벗깁니다.
//! 레이블 경로(`.kubernetes.labels.*`, `.kubernetes.namespace_labels.*`)는
//! 수집기의 dedot 정규화를 따라가도록 별칭 경로를 함께 만듭니다.

use std::fmt;

/// 필드 경로 문법 오류
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldPathError {
    #[error("field must start with '.'")]
    MissingLeadingDot,
    #[error("field must be a valid dot delimited path expression")]
    Invalid,
}

/// dedot 별칭을 만드는 레이블 맵 경로
const DEDOT_PREFIXES: [[&str; 2]; 2] = [
    ["kubernetes", "labels"],
    ["kubernetes", "namespace_labels"],
];

/// 검증된 필드 경로
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Result<Self, FieldPathError> {
        let (segments, consumed) = scan(path)?;
        if consumed != path.len() {
            return Err(FieldPathError::Invalid);
        }
        Ok(Self { segments })
    }

    /// 원문 세그먼트 (따옴표 유지)
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// 따옴표를 벗긴 세그먼트 이름
    pub fn names(&self) -> Vec<String> {
        self.segments.iter().map(|s| unquote(s)).collect()
    }

    /// 따옴표가 필요 없는 세그먼트까지 모두 따옴표로 감쌉니다.
    pub fn quoted(&self) -> Vec<String> {
        quote(&self.segments)
    }

    /// 원래 경로와, 해당하는 경우 dedot 별칭 경로의 이름 목록
    ///
    /// 레이블 이름에 `.` 또는 `/`가 있을 때만 두 번째 경로가 추가됩니다.
    pub fn with_dedot_alias(&self) -> Vec<Vec<String>> {
        let names = self.names();
        let mut paths = vec![names.clone()];
        let is_label_map = DEDOT_PREFIXES
            .iter()
            .any(|prefix| names.len() > 2 && names[..2] == prefix[..]);
        if is_label_map && names[2].contains(['.', '/']) {
            let mut alias = names;
            alias[2] = alias[2].replace(['.', '/'], "_");
            paths.push(alias);
        }
        paths
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join(&self.segments))
    }
}

/// 경로가 문법을 만족하는지 검증합니다.
pub fn validate(path: &str) -> Result<(), FieldPathError> {
    FieldPath::parse(path).map(|_| ())
}

/// 경로를 원문 세그먼트로 나눕니다. 따옴표 안의 `.`은 구분자가 아닙니다.
pub fn split(path: &str) -> Result<Vec<String>, FieldPathError> {
    FieldPath::parse(path).map(|p| p.segments)
}

/// 세그먼트를 다시 점 경로로 합칩니다.
pub fn join<S: AsRef<str>>(segments: &[S]) -> String {
    segments.iter().fold(String::new(), |mut out, s| {
        out.push('.');
        out.push_str(s.as_ref());
        out
    })
}

/// 따옴표 없는 세그먼트를 큰따옴표로 감쌉니다.
pub fn quote<S: AsRef<str>>(segments: &[S]) -> Vec<String> {
    segments
        .iter()
        .map(|s| {
            let s = s.as_ref();
            if is_quoted(s) {
                s.to_owned()
            } else {
                format!("\"{s}\"")
            }
        })
        .collect()
}

/// 세그먼트 이름을 경로 원문으로 되돌립니다 (필요할 때만 따옴표).
pub fn segment_from_name(name: &str) -> String {
    if !name.is_empty() && name.chars().all(is_unquoted_char) {
        name.to_owned()
    } else {
        format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

/// 문자열 앞부분에서 필드 경로를 읽습니다.
///
/// 읽은 세그먼트와 소비한 바이트 수를 반환합니다. 템플릿 파서가 `||`나 `}` 앞까지
/// 경로를 읽을 때 사용합니다.
pub(crate) fn scan(input: &str) -> Result<(Vec<String>, usize), FieldPathError> {
    if !input.starts_with('.') {
        return Err(FieldPathError::MissingLeadingDot);
    }
    let mut segments = Vec::new();
    let mut pos = 0;
    while let Some(after_dot) = input[pos..].strip_prefix('.') {
        let len = if after_dot.starts_with('"') {
            let close = closing_quote(after_dot).ok_or(FieldPathError::Invalid)?;
            if close == 1 {
                return Err(FieldPathError::Invalid);
            }
            close + 1
        } else {
            after_dot
                .find(|c: char| !is_unquoted_char(c))
                .unwrap_or(after_dot.len())
        };
        if len == 0 {
            return Err(FieldPathError::Invalid);
        }
        segments.push(after_dot[..len].to_owned());
        pos += 1 + len;
    }
    Ok((segments, pos))
}

fn is_unquoted_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_quoted(segment: &str) -> bool {
    segment.len() >= 2 && segment.starts_with('"') && segment.ends_with('"')
}

/// 여는 따옴표(인덱스 0) 다음의 닫는 따옴표 위치
fn closing_quote(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => return Some(i),
            _ => {}
        }
    }
    None
}

fn unquote(segment: &str) -> String {
    if !is_quoted(segment) {
        return segment.to_owned();
    }
    let inner = &segment[1..segment.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
