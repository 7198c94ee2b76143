//! 요소 이름 규칙: `^[a-z][a-z0-9-]*[a-z0-9]$`, 목록 안에서 유일

use std::collections::BTreeSet;

use super::{Failure, Outcome};

/// 이름 패턴 (메시지용)
pub const NAME_PATTERN: &str = "^[a-z][a-z0-9-]*[a-z0-9]$";

/// 이름 패턴을 만족하는지 확인합니다.
pub fn is_valid_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };
    bytes.len() >= 2
        && first.is_ascii_lowercase()
        && (last.is_ascii_lowercase() || last.is_ascii_digit())
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
}

pub fn check_name(name: &str) -> Outcome {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(Failure::invalid(format!(
            "name {name:?} must match {NAME_PATTERN}"
        )))
    }
}

/// 이름 패턴과 중복을 함께 검사합니다. `seen`에 이름을 기록합니다.
pub fn check_element_name<'a>(name: &'a str, seen: &mut BTreeSet<&'a str>) -> Outcome {
    check_name(name)?;
    if !seen.insert(name) {
        return Err(Failure::invalid(format!("duplicate name: {name:?}")));
    }
    Ok(())
}
