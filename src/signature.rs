//! Turning a reflected signature plus attached marks into a [`Description`].
//!
//! Rust has no runtime reflection of function signatures, so the adapter works
//! on a [`SignatureSource`]: anything that can list its parameters (name,
//! optional annotation, optional default) and its return annotation. A
//! [`MarkTable`] carries the constraints attached to individual slots before
//! parsing, keyed by position or by name.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::bindings::Key;
use crate::datatype::TypeSpec;
use crate::description::Description;
use crate::error::{ContractError, Result};
use crate::side_effect::SideEffect;
use crate::value::{DefaultValue, ValueDesc};

// ------------- Signature -------------
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Annotation {
    #[default]
    Empty,
    Type(TypeSpec),
    Value(ValueDesc),
}

impl Annotation {
    fn to_value(&self) -> ValueDesc {
        match self {
            Annotation::Empty => ValueDesc::untyped(),
            Annotation::Type(ty) => ValueDesc::typed(ty.clone()),
            Annotation::Value(v) => v.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReturnAnnotation {
    #[default]
    Empty,
    Single(Annotation),
    List(Vec<Annotation>),
    Tuple(Vec<Annotation>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub annotation: Annotation,
    pub default: DefaultValue,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), annotation: Annotation::Empty, default: DefaultValue::NotDef }
    }
    pub fn typed(name: impl Into<String>, ty: TypeSpec) -> Self {
        Self { annotation: Annotation::Type(ty), ..Self::new(name) }
    }
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotation = annotation;
        self
    }
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = DefaultValue::Value(default);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    pub parameters: Vec<Parameter>,
    pub returns: ReturnAnnotation,
}

impl Signature {
    pub fn new(parameters: Vec<Parameter>, returns: ReturnAnnotation) -> Self {
        Self { parameters, returns }
    }
}

pub trait SignatureSource {
    fn parameters(&self) -> Vec<Parameter>;
    fn returns(&self) -> ReturnAnnotation;
    /// A bound method lists its parameters without the receiver, while marks
    /// were attached to the full function and count it.
    fn is_method(&self) -> bool {
        false
    }
}

impl SignatureSource for Signature {
    fn parameters(&self) -> Vec<Parameter> {
        self.parameters.clone()
    }
    fn returns(&self) -> ReturnAnnotation {
        self.returns.clone()
    }
}

/// The signature of a bound method, receiver already left out.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature(pub Signature);

impl SignatureSource for MethodSignature {
    fn parameters(&self) -> Vec<Parameter> {
        self.0.parameters.clone()
    }
    fn returns(&self) -> ReturnAnnotation {
        self.0.returns.clone()
    }
    fn is_method(&self) -> bool {
        true
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Annotation::Empty => write!(f, "_"),
            Annotation::Type(ty) => write!(f, "{}", ty),
            Annotation::Value(v) => {
                match &v.ty {
                    Some(ty) => write!(f, "{}", ty)?,
                    None => write!(f, "_")?,
                }
                if let Some(range) = &v.range {
                    write!(f, "{}", range)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(")?;
        for (i, p) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p.name)?;
            if p.annotation != Annotation::Empty {
                write!(f, ": {}", p.annotation)?;
            }
            if let DefaultValue::Value(d) = &p.default {
                write!(f, " = {}", d)?;
            }
        }
        write!(f, ")")?;
        let joined = |items: &[Annotation]| {
            items.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ")
        };
        match &self.returns {
            ReturnAnnotation::Empty => Ok(()),
            ReturnAnnotation::Single(a) => write!(f, " -> {}", a),
            ReturnAnnotation::List(items) => write!(f, " -> [{}]", joined(items)),
            ReturnAnnotation::Tuple(items) => write!(f, " -> ({})", joined(items)),
        }
    }
}

// ------------- Marks -------------
/// Attribute overrides attached to one slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mark {
    pub ty: Option<TypeSpec>,
    pub range: Option<Value>,
    pub default: Option<DefaultValue>,
    pub name: Option<String>,
    pub doc: Option<String>,
    pub attrs: BTreeMap<String, Value>,
}

impl Mark {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn ty(mut self, ty: TypeSpec) -> Self {
        self.ty = Some(ty);
        self
    }
    pub fn range(mut self, range: Value) -> Self {
        self.range = Some(range);
        self
    }
    pub fn default_value(mut self, default: Value) -> Self {
        self.default = Some(DefaultValue::Value(default));
        self
    }
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
    pub fn attr(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }
    /// Folds `later` into this mark; attributes set in `later` win.
    pub fn merge(&mut self, later: Mark) {
        if later.ty.is_some() {
            self.ty = later.ty;
        }
        if later.range.is_some() {
            self.range = later.range;
        }
        if later.default.is_some() {
            self.default = later.default;
        }
        if later.name.is_some() {
            self.name = later.name;
        }
        if later.doc.is_some() {
            self.doc = later.doc;
        }
        self.attrs.extend(later.attrs);
    }
    pub fn apply(&self, value: &mut ValueDesc) {
        if let Some(ty) = &self.ty {
            value.ty = Some(ty.clone());
        }
        if let Some(range) = &self.range {
            value.range = Some(range.clone());
        }
        if let Some(default) = &self.default {
            value.default = default.clone();
        }
        if let Some(name) = &self.name {
            value.name = Some(name.clone());
        }
        if let Some(doc) = &self.doc {
            value.doc = Some(doc.clone());
        }
        value
            .attrs
            .extend(self.attrs.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

#[derive(Debug, Clone, Default)]
pub struct MarkTable {
    pub inputs: BTreeMap<Key, Mark>,
    pub outputs: BTreeMap<Key, Mark>,
    pub side_effects: Vec<Arc<dyn SideEffect>>,
}

impl MarkTable {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn mark_input(mut self, key: impl Into<Key>, mark: Mark) -> Self {
        self.inputs.entry(key.into()).or_default().merge(mark);
        self
    }
    pub fn mark_output(mut self, key: impl Into<Key>, mark: Mark) -> Self {
        self.outputs.entry(key.into()).or_default().merge(mark);
        self
    }
    pub fn mark_side_effect<S: SideEffect + 'static>(mut self, effect: S) -> Self {
        self.side_effects.push(Arc::new(effect));
        self
    }
}

// the index mark wins over the name mark, as only one of them is applied
fn apply_marks(marks: &BTreeMap<Key, Mark>, index: usize, value: &mut ValueDesc) {
    let mark = marks.get(&Key::Index(index)).or_else(|| {
        value
            .name
            .as_ref()
            .and_then(|name| marks.get(&Key::Name(name.clone())))
    });
    if let Some(mark) = mark.cloned() {
        mark.apply(value);
    }
}

// ------------- Parsing -------------
pub fn parse_signature<S: SignatureSource + ?Sized>(
    source: &S,
    marks: &MarkTable,
) -> Result<Description> {
    let mut description = Description::new(
        parse_inputs(source, &marks.inputs),
        parse_outputs(source.returns(), &marks.outputs)?,
    );
    description.side_effects = marks.side_effects.clone();
    description.check_unique_names()?;
    Ok(description)
}

fn parse_inputs<S: SignatureSource + ?Sized>(
    source: &S,
    marks: &BTreeMap<Key, Mark>,
) -> Vec<ValueDesc> {
    let is_method = source.is_method();
    source
        .parameters()
        .into_iter()
        .enumerate()
        .map(|(idx, param)| {
            let mut value = param.annotation.to_value();
            value.name = Some(param.name);
            if param.default.is_defined() {
                value.default = param.default;
            }
            let mark_idx = if is_method { idx + 1 } else { idx };
            apply_marks(marks, mark_idx, &mut value);
            value
        })
        .collect()
}

fn parse_outputs(returns: ReturnAnnotation, marks: &BTreeMap<Key, Mark>) -> Result<Vec<ValueDesc>> {
    let mut outputs = match returns {
        ReturnAnnotation::Empty => outputs_from_marks(marks)?,
        ReturnAnnotation::Single(a) => vec![a.to_value()],
        ReturnAnnotation::List(items) | ReturnAnnotation::Tuple(items) => {
            items.iter().map(Annotation::to_value).collect()
        }
    };
    for (idx, value) in outputs.iter_mut().enumerate() {
        if value.name.is_none() {
            value.name = Some(format!("output_{}", idx));
        }
        apply_marks(marks, idx, value);
    }
    Ok(outputs)
}

// with no return annotation the marks alone decide the outputs
fn outputs_from_marks(marks: &BTreeMap<Key, Mark>) -> Result<Vec<ValueDesc>> {
    let keys: Vec<&Key> = marks.keys().collect();
    match keys.as_slice() {
        [] => Ok(Vec::new()),
        [Key::Name(name)] => Ok(vec![ValueDesc::untyped().with_name(name.clone())]),
        keys if keys
            .iter()
            .enumerate()
            .all(|(i, k)| **k == Key::Index(i)) =>
        {
            Ok(keys.iter().map(|_| ValueDesc::untyped()).collect())
        }
        _ => Err(ContractError::Configuration(format!(
            "Output marks must use the positions 0..n or exactly one name, got: {}",
            keys.iter().map(|k| k.to_string()).collect::<Vec<_>>().join(", ")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn contiguous_output_marks_make_untyped_outputs() {
        let marks = BTreeMap::from([
            (Key::Index(0), Mark::new()),
            (Key::Index(1), Mark::new().ty(TypeSpec::integer())),
        ]);
        let outputs = parse_outputs(ReturnAnnotation::Empty, &marks).unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].ty, None);
        assert_eq!(outputs[1].ty, Some(TypeSpec::integer()));
        assert_eq!(outputs[1].name.as_deref(), Some("output_1"));
    }

    #[test]
    fn gapped_or_mixed_output_marks_are_rejected() {
        let gapped = BTreeMap::from([(Key::Index(1), Mark::new())]);
        assert!(matches!(
            parse_outputs(ReturnAnnotation::Empty, &gapped),
            Err(ContractError::Configuration(_))
        ));
        let mixed = BTreeMap::from([(Key::Index(0), Mark::new()), (Key::from("out"), Mark::new())]);
        assert!(parse_outputs(ReturnAnnotation::Empty, &mixed).is_err());
    }

    #[test]
    fn marks_merge_with_later_attributes_winning() {
        let mut mark = Mark::new().range(json!([0, 1])).doc("first");
        mark.merge(Mark::new().doc("second").attr("unit", json!("m")));
        assert_eq!(mark.range, Some(json!([0, 1])));
        assert_eq!(mark.doc.as_deref(), Some("second"));
        assert_eq!(mark.attrs.get("unit"), Some(&json!("m")));
    }
}
