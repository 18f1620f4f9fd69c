use callguard::{ContractError, GuardConfig};

#[test]
fn settings_file_overrides_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("callguard.toml");
    std::fs::write(&path, "check_side_effect = true\ncheck_range = false\n").expect("write");
    let config = GuardConfig::load(&path).expect("load");
    assert_eq!(config, GuardConfig::default().with_side_effect(true).with_range(false));
}

#[test]
fn missing_settings_file_means_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = GuardConfig::load(dir.path().join("absent.toml")).expect("load");
    assert_eq!(config, GuardConfig::default());
}

#[test]
fn malformed_settings_are_config_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("callguard.toml");
    std::fs::write(&path, "check_type = \"sometimes\"\n").expect("write");
    assert!(matches!(GuardConfig::load(&path), Err(ContractError::Config(_))));
}
