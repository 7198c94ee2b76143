//! 클러스터 capability 파일 (`{"ipv6": true, ...}`)

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, warn};

/// capability 파일을 읽습니다.
///
/// 파일이 없거나 JSON이 올바르지 않으면 빈 맵을 돌려줍니다.
pub fn read_capabilities(path: &Path) -> BTreeMap<String, bool> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "capabilities file not readable");
            return BTreeMap::new();
        }
    };
    match serde_json::from_str(&content) {
        Ok(capabilities) => capabilities,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed capabilities file");
            BTreeMap::new()
        }
    }
}
