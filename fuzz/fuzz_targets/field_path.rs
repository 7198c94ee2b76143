#![no_main]

use libfuzzer_sys::fuzz_target;
use logforward_compiler::fieldpath::{FieldPath, join};

fuzz_target!(|data: &[u8]| {
    let Ok(path) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(parsed) = FieldPath::parse(path) {
        // 분해한 세그먼트를 다시 이으면 같은 경로로 파싱되어야 함
        let rejoined = join(parsed.segments());
        let again = FieldPath::parse(&rejoined).expect("joined path must parse");
        assert_eq!(again.names(), parsed.names());
        let _ = parsed.with_dedot_alias();
    }
});
