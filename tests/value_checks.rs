use std::sync::Arc;

use callguard::kinds::{InputPath, OneOf, OutputPath, SubSet};
use callguard::{
    Args, CheckerRegistry, ContractError, Description, Guard, Phase, TypeSpec, ValueDesc,
    ValueKind, Violation,
};
use serde_json::{Value, json};

#[test]
fn integer_range_is_closed_on_both_ends() {
    let registry = CheckerRegistry::with_builtins();
    let (lo, hi) = (-3i64, 7i64);
    let v = ValueDesc::typed(TypeSpec::integer()).with_range(json!([lo, hi])).with_name("n");
    for n in -10..=10 {
        let passed = v.check_range(&registry, &json!(n)).is_ok();
        assert_eq!(passed, lo <= n && n <= hi, "value {n}");
    }
}

#[test]
fn missing_range_is_unconstrained() {
    let registry = CheckerRegistry::with_builtins();
    let v = ValueDesc::typed(TypeSpec::integer());
    for n in [i64::MIN, -1, 0, 1, i64::MAX] {
        assert!(v.check_range(&registry, &json!(n)).is_ok());
    }
    let f = ValueDesc::typed(TypeSpec::float());
    assert!(f.check_range(&registry, &json!(1e300)).is_ok());
}

#[test]
fn scalar_type_checks() {
    let registry = CheckerRegistry::with_builtins();
    let cases = [
        (TypeSpec::string(), json!("a"), true),
        (TypeSpec::string(), json!(1), false),
        (TypeSpec::integer(), json!(1), true),
        (TypeSpec::integer(), json!(1.5), false),
        (TypeSpec::float(), json!(1.5), true),
        (TypeSpec::float(), json!(1), false),
        (TypeSpec::boolean(), json!(true), true),
        (TypeSpec::boolean(), json!(0), false),
    ];
    for (ty, value, ok) in cases {
        let v = ValueDesc::typed(ty.clone()).with_name("x");
        assert_eq!(v.check_type(&registry, &value).is_ok(), ok, "{ty} against {value}");
    }
}

#[test]
fn type_failures_report_the_slot_and_expected_type() {
    let registry = CheckerRegistry::with_builtins();
    let v = ValueDesc::typed(TypeSpec::integer()).with_name("count");
    let err = v.check_type(&registry, &json!("three")).unwrap_err();
    assert_eq!(
        err,
        Violation::Type { slot: "count".into(), value: json!("three"), expected: TypeSpec::integer() }
    );
    assert!(err.to_string().contains("count"));
}

#[test]
fn untyped_values_always_pass() {
    let registry = CheckerRegistry::with_builtins();
    let v = ValueDesc::untyped().with_range(json!([0, 1]));
    for value in [json!(null), json!("x"), json!(99), json!([1, 2])] {
        assert!(v.check(&registry, &value).is_ok());
    }
}

#[test]
fn check_without_any_checker_is_a_configuration_error() {
    let registry = CheckerRegistry::new();
    let v = ValueDesc::typed(TypeSpec::integer());
    let err = v.check(&registry, &json!(1)).unwrap_err();
    assert!(matches!(err, ContractError::Configuration(_)));
    // the individual checks still pass unconditionally
    assert!(v.check_type(&registry, &json!("x")).is_ok());
    assert!(v.check_range(&registry, &json!("x")).is_ok());
}

#[test]
fn check_reports_a_single_violation() {
    let registry = CheckerRegistry::with_builtins();
    let v = ValueDesc::typed(TypeSpec::integer()).with_range(json!([0, 10]));
    assert!(v.check(&registry, &json!(5)).is_ok());
    let err = v.check(&registry, &json!(11)).unwrap_err();
    assert!(matches!(err, ContractError::Violation(Violation::Range { .. })));
}

#[test]
fn registered_types_without_checker_pass() {
    let registry = CheckerRegistry::new();
    registry.register_range_check("even", |v: &Value, _: Option<&Value>| {
        v.as_i64().is_some_and(|n| n % 2 == 0)
    });
    let v = ValueDesc::typed(TypeSpec::named("even"));
    assert!(v.check(&registry, &json!(4)).is_ok());
    assert!(v.check(&registry, &json!(3)).is_err());
    // no type predicate registered for "even"
    assert!(v.check_type(&registry, &json!("not a number")).is_ok());
}

#[test]
fn default_instance_check_matches_json_kinds() {
    let registry = CheckerRegistry::new();
    registry.register_instance_check("list");
    let v = ValueDesc::typed(TypeSpec::generic("list", vec![TypeSpec::integer()]));
    assert!(v.check_type(&registry, &json!([1, 2])).is_ok());
    assert!(v.check_type(&registry, &json!({"a": 1})).is_err());
}

#[test]
fn guards_use_their_own_registry() {
    let registry = Arc::new(CheckerRegistry::new());
    registry.register_range_check("even", |v: &Value, _: Option<&Value>| {
        v.as_i64().is_some_and(|n| n % 2 == 0)
    });
    let description = Description::new(
        vec![ValueDesc::typed(TypeSpec::named("even")).with_name("n")],
        vec![ValueDesc::untyped().with_name("half")],
    );
    let half = Guard::new(description, |args: &Args| {
        json!(args.get(0).and_then(Value::as_i64).unwrap_or_default() / 2)
    })
    .with_registry(registry);
    assert_eq!(half.call(&Args::new().arg(json!(8))).unwrap().as_value(), Some(&json!(4)));
    assert!(half.call(&Args::new().arg(json!(7))).is_err());
}

// ------------- Extended kinds -------------
fn plus_one(args: &Args) -> Value {
    json!(args.get(0).and_then(Value::as_i64).unwrap_or_default() + 1)
}

#[test]
fn one_of_accepts_members_only() {
    let description = Description::new(
        vec![ValueDesc::typed(OneOf::type_spec()).with_range(json!([1, 2, 3, 4])).with_name("a")],
        vec![ValueDesc::untyped()],
    );
    let add1 = Guard::new(description, plus_one);
    assert_eq!(add1.call(&Args::new().arg(json!(1))).unwrap().as_value(), Some(&json!(2)));
    let err = add1.call(&Args::new().arg(json!(-1))).unwrap_err();
    match err {
        ContractError::Check(e) => {
            assert_eq!(e.phase, Phase::PreCall);
            assert!(matches!(e.violations[0], Violation::Range { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn subset_requires_every_element_in_range() {
    let description = Description::new(
        vec![ValueDesc::typed(SubSet::type_spec()).with_range(json!([1, 2, 3, 4])).with_name("s")],
        vec![ValueDesc::untyped()],
    );
    let all_add1 = Guard::new(description, |args: &Args| {
        let items = args.get(0).and_then(Value::as_array).cloned().unwrap_or_default();
        json!(items.iter().filter_map(Value::as_i64).map(|n| n + 1).collect::<Vec<_>>())
    });
    let res = all_add1.call(&Args::new().arg(json!([1, 2]))).unwrap();
    assert_eq!(res.as_value(), Some(&json!([2, 3])));
    assert!(all_add1.call(&Args::new().arg(json!([5, 5]))).is_err());
}

#[test]
fn input_paths_must_exist_output_paths_need_not() {
    let dir = tempfile::tempdir().expect("tempdir");
    let existing = dir.path().join("a_exist_file.txt");
    std::fs::write(&existing, "aaa").expect("write");
    let existing = existing.to_str().expect("utf-8 path").to_string();
    let missing = dir.path().join("a_not_exist_file.txt").to_str().expect("utf-8 path").to_string();

    let description = Description::new(
        vec![
            ValueDesc::typed(InputPath::type_spec()).with_name("path"),
            ValueDesc::typed(TypeSpec::boolean()).with_name("return_path"),
        ],
        vec![ValueDesc::typed(OutputPath::type_spec())],
    );
    let func1 = Guard::new(description, |args: &Args| {
        if args.get(1) == Some(&json!(true)) { args.get(0).cloned().unwrap_or_default() } else { json!(0) }
    });

    assert!(func1.call(&Args::new().arg(json!(existing)).arg(json!(true))).is_ok());
    // 0 is not a path
    let err = func1.call(&Args::new().arg(json!(existing)).arg(json!(false))).unwrap_err();
    assert!(matches!(err, ContractError::Check(ref e) if e.phase == Phase::PostCall));
    let err = func1.call(&Args::new().arg(json!(missing)).arg(json!(true))).unwrap_err();
    assert!(matches!(err, ContractError::Check(ref e) if e.phase == Phase::PreCall));
}

#[test]
fn global_registry_knows_the_extended_kinds() {
    let registry = CheckerRegistry::global();
    for name in ["string", "integer", "float", "boolean", "OneOf", "SubSet", "InputPath", "OutputPath"] {
        assert!(registry.is_registered(name), "{name}");
    }
}
