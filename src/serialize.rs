//! JSON form of a [`Description`].
//!
//! ```json
//! {"inputs": [{"type": "integer", "range": [0, 10], "default": "not_defined", "name": "a", "doc": null}],
//!  "outputs": [...], "side_effects": [{"description": "..."}], "name": null, "doc": null}
//! ```
//!
//! Types are written as their name, or as their structural form (`list[integer]`)
//! for parameterized types. On the way back in, type expressions are resolved
//! against a [`TypeEnv`]. A name the environment does not know is not an error:
//! the slot keeps the raw text as a [`TypeSpec::Unresolved`] placeholder and a
//! [`SerializationWarning`] is reported, so descriptions referring to types
//! from other processes still round-trip structurally. Names are read up to
//! the next bracket or comma; a type whose name contains one of those is
//! refused when encoding. Duplicate input or output names are refused when
//! decoding.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::checker::CheckerRegistry;
use crate::datatype::{BUILTIN_NAMES, TypeSpec};
use crate::description::Description;
use crate::error::{ContractError, Result};
use crate::side_effect::{Described, SideEffect};
use crate::value::{DefaultValue, ValueDesc};

/// Written in place of a default when the slot has none.
pub const NOT_DEFINED: &str = "not_defined";

// ------------- Type environment -------------
/// Names a decoder may resolve on top of the built-in ones.
#[derive(Debug, Clone, Default)]
pub struct TypeEnv {
    names: HashSet<String>,
}

impl TypeEnv {
    pub fn new() -> Self {
        Self::default()
    }
    /// Every kind with a checker in `registry`.
    pub fn from_registry(registry: &CheckerRegistry) -> Self {
        Self { names: registry.registered_names().into_iter().collect() }
    }
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.names.insert(name.into());
        self
    }
    pub fn resolves(&self, name: &str) -> bool {
        BUILTIN_NAMES.contains(&name) || self.names.contains(name)
    }
}

// ------------- Wire format -------------
#[derive(Debug, Serialize, Deserialize)]
struct EncodedValue {
    #[serde(rename = "type", default)]
    ty: Option<String>,
    #[serde(default)]
    range: Option<Value>,
    #[serde(default = "not_defined")]
    default: Value,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    doc: Option<String>,
}

fn not_defined() -> Value {
    Value::String(NOT_DEFINED.to_string())
}

#[derive(Debug, Serialize, Deserialize)]
struct EncodedSideEffect {
    description: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct EncodedDescription {
    #[serde(default)]
    inputs: Vec<EncodedValue>,
    #[serde(default)]
    outputs: Vec<EncodedValue>,
    #[serde(default)]
    side_effects: Vec<EncodedSideEffect>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    doc: Option<String>,
}

/// A type expression that named something the environment could not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializationWarning {
    pub slot: Option<String>,
    pub expression: String,
    pub unknown: String,
}

impl fmt::Display for SerializationWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Failed to resolve type {} (unknown name `{}`), using the original string as type.",
            self.expression, self.unknown
        )
    }
}

#[derive(Debug)]
pub struct Decoded {
    pub description: Description,
    pub warnings: Vec<SerializationWarning>,
}

// ------------- Encoding -------------
fn encode_value(value: &ValueDesc) -> Result<EncodedValue> {
    if let Some(name) = value.ty.as_ref().and_then(TypeSpec::first_inexpressible) {
        return Err(ContractError::Configuration(format!(
            "Type name `{}` of `{}` cannot be written as a type expression",
            name,
            value.name_or_default()
        )));
    }
    Ok(EncodedValue {
        ty: value.ty.as_ref().map(TypeSpec::to_string),
        range: value.range.clone(),
        default: match &value.default {
            DefaultValue::NotDef => not_defined(),
            DefaultValue::Value(v) => v.clone(),
        },
        name: value.name.clone(),
        doc: value.doc.clone(),
    })
}

fn encode(description: &Description) -> Result<EncodedDescription> {
    Ok(EncodedDescription {
        inputs: description.inputs.iter().map(encode_value).collect::<Result<_>>()?,
        outputs: description.outputs.iter().map(encode_value).collect::<Result<_>>()?,
        side_effects: description
            .side_effects
            .iter()
            .map(|s| EncodedSideEffect { description: s.description() })
            .collect(),
        name: description.name.clone(),
        doc: description.doc.clone(),
    })
}

pub fn to_value(description: &Description) -> Result<Value> {
    Ok(serde_json::to_value(encode(description)?)?)
}

pub fn to_json(description: &Description) -> Result<String> {
    Ok(serde_json::to_string(&encode(description)?)?)
}

pub fn to_json_pretty(description: &Description) -> Result<String> {
    Ok(serde_json::to_string_pretty(&encode(description)?)?)
}

// ------------- Decoding -------------
fn decode_value(
    encoded: EncodedValue,
    env: &TypeEnv,
    warnings: &mut Vec<SerializationWarning>,
) -> Result<ValueDesc> {
    let ty = match encoded.ty {
        None => None,
        Some(expression) => match TypeSpec::parse(&expression, |n| env.resolves(n))? {
            Ok(spec) => Some(spec),
            Err(unknown) => {
                let warning = SerializationWarning {
                    slot: encoded.name.clone(),
                    expression: expression.clone(),
                    unknown,
                };
                warn!(slot = ?warning.slot, "{}", warning);
                warnings.push(warning);
                Some(TypeSpec::Unresolved(expression))
            }
        },
    };
    let default = match encoded.default {
        Value::String(s) if s == NOT_DEFINED => DefaultValue::NotDef,
        other => DefaultValue::Value(other),
    };
    Ok(ValueDesc {
        ty,
        range: encoded.range,
        default,
        name: encoded.name,
        doc: encoded.doc,
        ..ValueDesc::default()
    })
}

/// Decodes `text`, resolving type names against `env` (built-ins only when `None`).
pub fn from_json(text: &str, env: Option<&TypeEnv>) -> Result<Decoded> {
    let encoded: EncodedDescription = serde_json::from_str(text)?;
    decode(encoded, env)
}

pub fn from_value(value: Value, env: Option<&TypeEnv>) -> Result<Decoded> {
    let encoded: EncodedDescription = serde_json::from_value(value)?;
    decode(encoded, env)
}

fn decode(encoded: EncodedDescription, env: Option<&TypeEnv>) -> Result<Decoded> {
    let builtin = TypeEnv::new();
    let env = env.unwrap_or(&builtin);
    let mut warnings = Vec::new();
    let mut description = Description::default();
    for v in encoded.inputs {
        description.inputs.push(decode_value(v, env, &mut warnings)?);
    }
    for v in encoded.outputs {
        description.outputs.push(decode_value(v, env, &mut warnings)?);
    }
    description.side_effects = encoded
        .side_effects
        .into_iter()
        .map(|s| Arc::new(Described::new(s.description)) as Arc<dyn SideEffect>)
        .collect();
    description.name = encoded.name;
    description.doc = encoded.doc;
    description.check_unique_names()?;
    Ok(Decoded { description, warnings })
}

impl Description {
    pub fn to_json(&self) -> Result<String> {
        to_json(self)
    }
    pub fn from_json(text: &str, env: Option<&TypeEnv>) -> Result<Decoded> {
        from_json(text, env)
    }
}
