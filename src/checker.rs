//! The checker registry: semantic type name -> type predicate and range predicate.
//!
//! A process normally uses the [`CheckerRegistry::global`] instance, which is
//! seeded with the built-in scalar kinds and the extended kinds from
//! [`crate::kinds`]. Registration is expected to happen at startup; after that
//! the maps are only read. Independent registries can be created with
//! [`CheckerRegistry::new`] or [`CheckerRegistry::with_builtins`] when a caller
//! needs isolation, e.g. in tests.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

// used for the checker maps, keys are type names and never hostile
use core::hash::BuildHasherDefault;
use seahash::SeaHasher;

use serde_json::Value;
use tracing::debug;

use crate::datatype::{BOOLEAN, FLOAT, INTEGER, STRING, TypeSpec};
use crate::kinds;

pub type NameHasher = BuildHasherDefault<SeaHasher>;

pub type TypePredicate = Arc<dyn Fn(&Value, &TypeSpec) -> bool + Send + Sync>;
pub type RangePredicate = Arc<dyn Fn(&Value, Option<&Value>) -> bool + Send + Sync>;

lazy_static::lazy_static! {
    static ref GLOBAL_REGISTRY: Arc<CheckerRegistry> = Arc::new(CheckerRegistry::with_builtins());
}

/// A semantic type with its own validation strategy.
///
/// Implementors provide the predicates they care about and register exactly
/// those in [`ValueKind::register`]; a kind that only constrains ranges must not
/// install a type predicate, since having one changes what `check` reports.
pub trait ValueKind {
    const NAME: &'static str;
    fn check_type(_value: &Value, _ty: &TypeSpec) -> bool {
        true
    }
    fn check_range(_value: &Value, _range: Option<&Value>) -> bool {
        true
    }
    fn register(registry: &CheckerRegistry);
    fn type_spec() -> TypeSpec {
        TypeSpec::named(Self::NAME)
    }
}

pub struct CheckerRegistry {
    type_checkers: RwLock<HashMap<String, TypePredicate, NameHasher>>,
    range_checkers: RwLock<HashMap<String, RangePredicate, NameHasher>>,
}

impl CheckerRegistry {
    /// An empty registry. Every check against it passes.
    pub fn new() -> Self {
        Self {
            type_checkers: RwLock::new(HashMap::default()),
            range_checkers: RwLock::new(HashMap::default()),
        }
    }
    /// A registry with the scalar kinds and the extended kinds registered.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        kinds::StringKind::register(&registry);
        kinds::IntegerKind::register(&registry);
        kinds::FloatKind::register(&registry);
        kinds::BooleanKind::register(&registry);
        kinds::register_extended_kinds(&registry);
        registry
    }
    pub fn global() -> Arc<CheckerRegistry> {
        Arc::clone(&GLOBAL_REGISTRY)
    }
    pub fn register_type_check<F>(&self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&Value, &TypeSpec) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(ty = %name, "registering type check");
        self.type_checkers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, Arc::new(predicate));
    }
    /// Registers the default type check: the value must be an instance of the
    /// JSON kind the type is named after.
    pub fn register_instance_check(&self, name: impl Into<String>) {
        self.register_type_check(name, is_instance);
    }
    pub fn register_range_check<F>(&self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&Value, Option<&Value>) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(ty = %name, "registering range check");
        self.range_checkers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, Arc::new(predicate));
    }
    pub fn register_kind<K: ValueKind>(&self) {
        K::register(self);
    }
    pub fn type_checker(&self, ty: &TypeSpec) -> Option<TypePredicate> {
        let name = ty.name()?;
        self.type_checkers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
    pub fn range_checker(&self, ty: &TypeSpec) -> Option<RangePredicate> {
        let name = ty.name()?;
        self.range_checkers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
    pub fn is_registered(&self, name: &str) -> bool {
        self.type_checkers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
            || self
                .range_checkers
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains_key(name)
    }
    /// Every name with at least one predicate, sorted.
    pub fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .type_checkers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        for name in self
            .range_checkers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
        {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names.sort();
        names
    }
}

impl Default for CheckerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Name of the JSON kind of a value, in the vocabulary of the built-in types.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => crate::datatype::NONE,
        Value::Bool(_) => BOOLEAN,
        Value::Number(n) if n.is_f64() => FLOAT,
        Value::Number(_) => INTEGER,
        Value::String(_) => STRING,
        Value::Array(_) => crate::datatype::LIST,
        Value::Object(_) => crate::datatype::DICT,
    }
}

pub fn is_instance(value: &Value, ty: &TypeSpec) -> bool {
    ty.name() == Some(kind_of(value))
}
