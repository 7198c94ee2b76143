#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use logforward_compiler::generator::generate;
use logforward_compiler::migrate::migrate;
use logforward_compiler::validate::validate;
use logforward_compiler::{CompilerConfig, ForwarderModel, SecretSnapshot};
use logforward_core::api::ClusterLogForwarder;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// YAML 또는 JSON 문서
    document: String,
    json: bool,
}

fuzz_target!(|input: FuzzInput| {
    let parsed = if input.json {
        ClusterLogForwarder::from_json(&input.document).ok()
    } else {
        ClusterLogForwarder::from_yaml(&input.document).ok()
    };
    let Some(original) = parsed else {
        return;
    };

    let config = CompilerConfig::default();
    let (migrated, _) = migrate(original.clone(), &config);
    // 마이그레이션은 멱등이어야 함
    let (twice, _) = migrate(migrated.clone(), &config);
    assert_eq!(twice.spec, migrated.spec);

    let _ = validate(&original, &migrated, &SecretSnapshot::new());
    let model = ForwarderModel::new(&migrated);
    let _ = generate(&model, &config);
});
