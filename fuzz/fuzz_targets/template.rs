#![no_main]

use libfuzzer_sys::fuzz_target;
use logforward_compiler::template::Template;

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        if let Ok(template) = Template::compile(source) {
            let _ = template.to_vrl();
        }
    }
});
