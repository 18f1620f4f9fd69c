use std::collections::BTreeMap;

use serde_json::Value;

use crate::checker::CheckerRegistry;
use crate::datatype::TypeSpec;
use crate::error::{ContractError, Result, Violation};

/// A default value, or `NotDef` when the slot has none.
///
/// `NotDef` is distinct from every legitimate default, JSON `null` included.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DefaultValue {
    #[default]
    NotDef,
    Value(Value),
}

impl DefaultValue {
    pub fn is_defined(&self) -> bool {
        matches!(self, DefaultValue::Value(_))
    }
    pub fn value(&self) -> Option<&Value> {
        match self {
            DefaultValue::Value(v) => Some(v),
            DefaultValue::NotDef => None,
        }
    }
}

impl From<Value> for DefaultValue {
    fn from(v: Value) -> Self {
        DefaultValue::Value(v)
    }
}

// ------------- Value descriptor -------------
/// Describes one input parameter or one output slot of a callable.
///
/// Equality compares the checkable attributes only (`ty`, `range`, `default`,
/// `name`, `doc`); the extension bag in `attrs` is adapter metadata.
#[derive(Debug, Clone, Default)]
pub struct ValueDesc {
    pub ty: Option<TypeSpec>,
    pub range: Option<Value>,
    pub default: DefaultValue,
    pub name: Option<String>,
    pub doc: Option<String>,
    pub attrs: BTreeMap<String, Value>,
}

impl ValueDesc {
    pub fn new(ty: Option<TypeSpec>) -> Self {
        Self { ty, ..Self::default() }
    }
    pub fn typed(ty: TypeSpec) -> Self {
        Self::new(Some(ty))
    }
    pub fn untyped() -> Self {
        Self::new(None)
    }
    pub fn with_range(mut self, range: Value) -> Self {
        self.range = Some(range);
        self
    }
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = DefaultValue::Value(default);
        self
    }
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
    pub fn with_attr(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }
    pub fn name_or_default(&self) -> &str {
        self.name.as_deref().unwrap_or("?")
    }
    pub fn check_type(&self, registry: &CheckerRegistry, value: &Value) -> std::result::Result<(), Violation> {
        let Some(ty) = &self.ty else {
            return Ok(());
        };
        match registry.type_checker(ty) {
            Some(checker) if !checker(value, ty) => Err(Violation::Type {
                slot: self.name_or_default().to_string(),
                value: value.clone(),
                expected: ty.clone(),
            }),
            _ => Ok(()),
        }
    }
    pub fn check_range(&self, registry: &CheckerRegistry, value: &Value) -> std::result::Result<(), Violation> {
        let Some(ty) = &self.ty else {
            return Ok(());
        };
        match registry.range_checker(ty) {
            Some(checker) if !checker(value, self.range.as_ref()) => Err(Violation::Range {
                slot: self.name_or_default().to_string(),
                value: value.clone(),
                range: self.range.clone(),
            }),
            _ => Ok(()),
        }
    }
    /// Type check then range check. A typed slot whose type has no checker at
    /// all is a setup problem and reported as [`ContractError::Configuration`].
    pub fn check(&self, registry: &CheckerRegistry, value: &Value) -> Result<()> {
        if let Some(ty) = &self.ty {
            if registry.type_checker(ty).is_none() && registry.range_checker(ty).is_none() {
                return Err(ContractError::Configuration(format!(
                    "No checker registered for type: {}",
                    ty
                )));
            }
        }
        self.check_type(registry, value)?;
        self.check_range(registry, value)?;
        Ok(())
    }
}

impl PartialEq for ValueDesc {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty
            && self.range == other.range
            && self.default == other.default
            && self.name == other.name
            && self.doc == other.doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equality_ignores_extension_attributes() {
        let a = ValueDesc::typed(TypeSpec::integer()).with_name("a");
        let b = a.clone().with_attr("widget", json!("slider"));
        assert_eq!(a, b);
        assert_ne!(a, b.with_doc("count"));
    }

    #[test]
    fn null_default_is_still_a_default() {
        let v = ValueDesc::untyped().with_default(Value::Null);
        assert!(v.default.is_defined());
        assert_ne!(v.default, DefaultValue::NotDef);
    }
}
