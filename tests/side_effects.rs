use std::path::Path;

use callguard::{
    Args, ContractError, Description, Guard, GuardConfig, Phase, TypeSpec, ValueDesc, Violation,
    WriteFile,
};
use serde_json::{Value, json};
use tempfile::TempDir;

fn with_side_effects() -> GuardConfig {
    GuardConfig::default().with_side_effect(true)
}

fn path_arg(args: &Args) -> String {
    args.get(0).and_then(Value::as_str).unwrap_or_default().to_string()
}

// write_report(path) writes a file named by its input
fn setup(dir: &TempDir, writes: bool) -> Guard {
    let template = format!("{}/{{inputs[name]}}.txt", dir.path().display());
    let description = Description::new(
        vec![ValueDesc::typed(TypeSpec::string()).with_name("name")],
        Vec::new(),
    )
    .with_side_effect(WriteFile::new(template));
    let root = dir.path().to_path_buf();
    Guard::new(description, move |args: &Args| {
        if writes {
            let _ = std::fs::write(root.join(format!("{}.txt", path_arg(args))), "report");
        }
    })
    .with_config(with_side_effects())
}

fn side_effect_failure(err: ContractError) -> (Phase, String) {
    let ContractError::Check(e) = err else {
        panic!("expected a check error, got {err}");
    };
    assert_eq!(e.len(), 1);
    match &e.violations[0] {
        Violation::SideEffect { description, phase } => (*phase, description.clone()),
        other => panic!("expected a side effect violation, got {other}"),
    }
}

#[test]
fn write_file_passes_when_the_file_appears() {
    let dir = tempfile::tempdir().expect("tempdir");
    let guard = setup(&dir, true);
    guard.call(&Args::new().arg(json!("report"))).expect("first call");
    assert!(dir.path().join("report.txt").exists());
}

#[test]
fn an_existing_file_fails_before_the_call() {
    let dir = tempfile::tempdir().expect("tempdir");
    let guard = setup(&dir, true);
    guard.call(&Args::new().arg(json!("report"))).expect("first call");
    let (phase, description) = side_effect_failure(guard.call(&Args::new().arg(json!("report"))).unwrap_err());
    assert_eq!(phase, Phase::PreCall);
    assert!(description.starts_with("Write file to "));
}

#[test]
fn a_missing_file_fails_after_the_call() {
    let dir = tempfile::tempdir().expect("tempdir");
    let guard = setup(&dir, false);
    let (phase, _) = side_effect_failure(guard.call(&Args::new().arg(json!("report"))).unwrap_err());
    assert_eq!(phase, Phase::PostCall);
}

#[test]
fn side_effects_are_not_checked_by_default() {
    let dir = tempfile::tempdir().expect("tempdir");
    let guard = setup(&dir, false).with_config(GuardConfig::default());
    assert!(guard.call(&Args::new().arg(json!("report"))).is_ok());
}

#[test]
fn output_templates_are_only_checked_after_the_call() {
    let dir = tempfile::tempdir().expect("tempdir");
    let description = Description::new(
        vec![ValueDesc::typed(TypeSpec::string()).with_name("stem")],
        vec![ValueDesc::typed(TypeSpec::string()).with_name("path")],
    )
    .with_side_effect(WriteFile::new("{outputs[path]}"));
    let root = dir.path().to_path_buf();
    let save = Guard::new(description, move |args: &Args| {
        let path = root.join(format!("{}.out", path_arg(args)));
        let _ = std::fs::write(&path, "saved");
        json!(path.to_string_lossy())
    })
    .with_config(with_side_effects());

    let res = save.call(&Args::new().arg(json!("a"))).expect("call");
    let written = res.as_value().and_then(Value::as_str).expect("a path");
    assert!(Path::new(written).exists());
    // the same output path again is fine, the template names no input
    assert!(save.call(&Args::new().arg(json!("a"))).is_ok());
}

#[test]
fn side_effect_descriptions_are_listed() {
    let description = Description::default()
        .with_side_effect(WriteFile::new("{inputs[0]}.log"))
        .with_side_effect(WriteFile::new("{outputs[0]}"));
    assert_eq!(
        description.side_effect_descriptions(),
        vec!["Write file to {inputs[0]}.log", "Write file to {outputs[0]}"]
    );
}

#[test]
fn doubled_braces_stay_literal_in_paths() {
    let dir = tempfile::tempdir().expect("tempdir");
    let template = format!("{}/{{{{{{inputs[name]}}}}}}.txt", dir.path().display());
    let description = Description::new(
        vec![ValueDesc::typed(TypeSpec::string()).with_name("name")],
        Vec::new(),
    )
    .with_side_effect(WriteFile::new(template));
    let root = dir.path().to_path_buf();
    let guard = Guard::new(description, move |args: &Args| {
        let _ = std::fs::write(root.join(format!("{{{}}}.txt", path_arg(args))), "report");
    })
    .with_config(with_side_effects());
    guard.call(&Args::new().arg(json!("report"))).expect("call");
    assert!(dir.path().join("{report}.txt").exists());
}
