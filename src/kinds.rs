// used to check that input paths exist
use std::path::Path;

use serde_json::Value;

use crate::checker::{CheckerRegistry, ValueKind};
use crate::datatype::{BOOLEAN, FLOAT, INTEGER, STRING, TypeSpec};

// ------------- Scalar kinds -------------
pub struct StringKind;
impl ValueKind for StringKind {
    const NAME: &'static str = STRING;
    fn check_type(value: &Value, _ty: &TypeSpec) -> bool {
        value.is_string()
    }
    fn register(registry: &CheckerRegistry) {
        registry.register_type_check(Self::NAME, Self::check_type);
    }
}

pub struct IntegerKind;
impl ValueKind for IntegerKind {
    const NAME: &'static str = INTEGER;
    fn check_type(value: &Value, _ty: &TypeSpec) -> bool {
        value.is_i64() || value.is_u64()
    }
    fn check_range(value: &Value, range: Option<&Value>) -> bool {
        number_in_closed_interval(value, range)
    }
    fn register(registry: &CheckerRegistry) {
        registry.register_type_check(Self::NAME, Self::check_type);
        registry.register_range_check(Self::NAME, Self::check_range);
    }
}

pub struct FloatKind;
impl ValueKind for FloatKind {
    const NAME: &'static str = FLOAT;
    fn check_type(value: &Value, _ty: &TypeSpec) -> bool {
        value.is_f64()
    }
    fn check_range(value: &Value, range: Option<&Value>) -> bool {
        number_in_closed_interval(value, range)
    }
    fn register(registry: &CheckerRegistry) {
        registry.register_type_check(Self::NAME, Self::check_type);
        registry.register_range_check(Self::NAME, Self::check_range);
    }
}

pub struct BooleanKind;
impl ValueKind for BooleanKind {
    const NAME: &'static str = BOOLEAN;
    fn check_type(value: &Value, _ty: &TypeSpec) -> bool {
        value.is_boolean()
    }
    fn register(registry: &CheckerRegistry) {
        registry.register_type_check(Self::NAME, Self::check_type);
    }
}

/// `None` is unconstrained, otherwise `[low, high]` inclusive on both ends.
pub fn number_in_closed_interval(value: &Value, range: Option<&Value>) -> bool {
    let Some(range) = range.filter(|r| !r.is_null()) else {
        return true;
    };
    let (low, high) = match range.as_array() {
        Some(bounds) if bounds.len() == 2 => (&bounds[0], &bounds[1]),
        _ => return false,
    };
    // integers compare exactly, anything else goes through f64
    if let (Some(v), Some(l), Some(h)) = (value.as_i64(), low.as_i64(), high.as_i64()) {
        return l <= v && v <= h;
    }
    match (value.as_f64(), low.as_f64(), high.as_f64()) {
        (Some(v), Some(l), Some(h)) => l <= v && v <= h,
        _ => false,
    }
}

// ------------- Extended kinds -------------
/// Range is a collection and the value must be one of its members.
pub struct OneOf;
impl ValueKind for OneOf {
    const NAME: &'static str = "OneOf";
    fn check_range(value: &Value, range: Option<&Value>) -> bool {
        range.is_some_and(|r| is_member(value, r))
    }
    fn register(registry: &CheckerRegistry) {
        registry.register_range_check(Self::NAME, Self::check_range);
    }
}

/// Every element of the value must be a member of the range.
pub struct SubSet;
impl ValueKind for SubSet {
    const NAME: &'static str = "SubSet";
    fn check_range(value: &Value, range: Option<&Value>) -> bool {
        let Some(range) = range else {
            return false;
        };
        match value {
            Value::Array(items) => items.iter().all(|item| is_member(item, range)),
            Value::Object(map) => map
                .keys()
                .all(|key| is_member(&Value::String(key.clone()), range)),
            _ => false,
        }
    }
    fn register(registry: &CheckerRegistry) {
        registry.register_range_check(Self::NAME, Self::check_range);
    }
}

/// A path that has to exist when the call is made.
pub struct InputPath;
impl ValueKind for InputPath {
    const NAME: &'static str = "InputPath";
    fn check_type(value: &Value, _ty: &TypeSpec) -> bool {
        value.is_string()
    }
    fn check_range(value: &Value, _range: Option<&Value>) -> bool {
        value.as_str().is_some_and(|p| Path::new(p).exists())
    }
    fn register(registry: &CheckerRegistry) {
        registry.register_type_check(Self::NAME, Self::check_type);
        registry.register_range_check(Self::NAME, Self::check_range);
    }
}

/// A path the call produces, so it may not exist yet when checked.
pub struct OutputPath;
impl ValueKind for OutputPath {
    const NAME: &'static str = "OutputPath";
    fn check_type(value: &Value, _ty: &TypeSpec) -> bool {
        value.is_string()
    }
    fn register(registry: &CheckerRegistry) {
        registry.register_type_check(Self::NAME, Self::check_type);
    }
}

pub fn register_extended_kinds(registry: &CheckerRegistry) {
    registry.register_kind::<OneOf>();
    registry.register_kind::<SubSet>();
    registry.register_kind::<InputPath>();
    registry.register_kind::<OutputPath>();
}

// membership as a collection understands it: array elements, object keys, substrings
fn is_member(value: &Value, collection: &Value) -> bool {
    match collection {
        Value::Array(items) => items.contains(value),
        Value::Object(map) => value.as_str().is_some_and(|key| map.contains_key(key)),
        Value::String(text) => value.as_str().is_some_and(|part| text.contains(part)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn membership_over_collection_shapes() {
        assert!(is_member(&json!(2), &json!([1, 2, 3])));
        assert!(!is_member(&json!(5), &json!([1, 2, 3])));
        assert!(is_member(&json!("a"), &json!({"a": 1})));
        assert!(is_member(&json!("ell"), &json!("hello")));
        assert!(!is_member(&json!(1), &json!(1)));
    }

    #[test]
    fn malformed_numeric_ranges_fail() {
        assert!(!number_in_closed_interval(&json!(1), Some(&json!([0]))));
        assert!(!number_in_closed_interval(&json!(1), Some(&json!("0..2"))));
        assert!(!number_in_closed_interval(&json!("1"), Some(&json!([0, 2]))));
        assert!(number_in_closed_interval(&json!(1.5), Some(&json!([1, 2]))));
    }
}
