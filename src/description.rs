use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::bindings::{Args, Bindings};
use crate::error::{BindingError, ContractError, Result};
use crate::side_effect::SideEffect;
use crate::signature::{Annotation, Parameter, ReturnAnnotation, Signature};
use crate::value::ValueDesc;

/// The full contract of a callable: ordered inputs, ordered outputs and the
/// side effects checked around a call.
#[derive(Clone, Default)]
pub struct Description {
    pub inputs: Vec<ValueDesc>,
    pub outputs: Vec<ValueDesc>,
    pub side_effects: Vec<Arc<dyn SideEffect>>,
    pub name: Option<String>,
    pub doc: Option<String>,
}

impl Description {
    pub fn new(inputs: Vec<ValueDesc>, outputs: Vec<ValueDesc>) -> Self {
        Self { inputs, outputs, ..Self::default() }
    }
    pub fn with_side_effect<S: SideEffect + 'static>(mut self, effect: S) -> Self {
        self.side_effects.push(Arc::new(effect));
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
    pub fn input(&self, name: &str) -> Option<&ValueDesc> {
        self.inputs.iter().find(|v| v.name.as_deref() == Some(name))
    }
    pub fn output(&self, name: &str) -> Option<&ValueDesc> {
        self.outputs.iter().find(|v| v.name.as_deref() == Some(name))
    }
    pub fn side_effect_descriptions(&self) -> Vec<String> {
        self.side_effects.iter().map(|s| s.description()).collect()
    }

    /// Input names must be unique, and so must output names.
    pub fn check_unique_names(&self) -> Result<()> {
        for (kind, slots) in [("input", &self.inputs), ("output", &self.outputs)] {
            let mut seen = HashSet::new();
            for name in slots.iter().filter_map(|v| v.name.as_deref()) {
                if !seen.insert(name) {
                    return Err(ContractError::Configuration(format!(
                        "Duplicate {} name: `{}`",
                        kind, name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Binds call arguments to the declared inputs, in declaration order.
    ///
    /// Each input takes the next positional argument, else the keyword argument
    /// of the same name, else its default. Arguments that no input accepts are
    /// rejected the way an ordinary call would reject them.
    pub fn parse_pass_in(&self, args: &Args) -> Result<Bindings> {
        if args.positional.len() > self.inputs.len() {
            return Err(BindingError::TooManyPositional {
                given: args.positional.len(),
                accepted: self.inputs.len(),
            }
            .into());
        }
        let mut bindings = Bindings::new();
        let mut positional = args.positional.iter();
        for input in &self.inputs {
            let name = input.name_or_default();
            let value = match positional.next() {
                Some(value) => {
                    if args.keyword.contains_key(name) {
                        return Err(BindingError::Duplicate(name.to_string()).into());
                    }
                    value.clone()
                }
                None => match args.keyword.get(name).or(input.default.value()) {
                    Some(value) => value.clone(),
                    None => return Err(BindingError::Missing(name.to_string()).into()),
                },
            };
            bindings.push(name, value);
        }
        if let Some(unexpected) = args.keyword.keys().find(|k| self.input(k).is_none()) {
            return Err(BindingError::UnexpectedKeyword(unexpected.clone()).into());
        }
        Ok(bindings)
    }

    /// Regenerates a signature that parses back into the same inputs and outputs.
    pub fn compose_signature(&self) -> Signature {
        let parameters = self
            .inputs
            .iter()
            .map(|v| Parameter {
                name: v.name_or_default().to_string(),
                annotation: Annotation::Value(v.clone()),
                default: v.default.clone(),
            })
            .collect();
        let returns = match self.outputs.as_slice() {
            [] => ReturnAnnotation::Empty,
            [single] => ReturnAnnotation::Single(Annotation::Value(single.clone())),
            many => ReturnAnnotation::Tuple(
                many.iter().map(|v| Annotation::Value(v.clone())).collect(),
            ),
        };
        Signature { parameters, returns }
    }
}

impl PartialEq for Description {
    fn eq(&self, other: &Self) -> bool {
        self.inputs == other.inputs
            && self.outputs == other.outputs
            && self.side_effect_descriptions() == other.side_effect_descriptions()
            && self.name == other.name
            && self.doc == other.doc
    }
}

impl fmt::Debug for Description {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Description")
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("side_effects", &self.side_effect_descriptions())
            .field("name", &self.name)
            .field("doc", &self.doc)
            .finish()
    }
}
