//! The shipped example configuration must stay loadable.

use std::path::PathBuf;

#[test]
fn test_example_config_parses() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("prep-ml.example.yaml");
    let content = std::fs::read_to_string(&path).unwrap();
    let value: serde_yaml::Value = serde_yaml::from_str(&content).unwrap();

    for section in ["paths", "labels", "sampler", "stream", "memmap", "generate", "zarr"] {
        assert!(value.get(section).is_some(), "missing section {}", section);
    }
    assert_eq!(value["memmap"]["num_variables"].as_u64(), Some(1131));
}
