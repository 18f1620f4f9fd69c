//! Named conditions checked around a call that a value check cannot express.

use std::fmt;
use std::path::Path;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::bindings::{Bindings, Key};

lazy_static::lazy_static! {
    // {inputs[name]}, {inputs[0]}, {outputs[path]} ..., `{{` and `}}` are literal braces
    static ref PLACEHOLDER: Regex = Regex::new(r"\{\{|\}\}|\{(inputs|outputs)\[([^\]\}]+)\]\}").unwrap();
}

/// A before/after condition around a guarded call.
///
/// Both checks pass by default. Implementations must be stateless so one
/// instance can be shared across guards.
pub trait SideEffect: fmt::Debug + Send + Sync {
    fn description(&self) -> String;
    fn check_before(&self, _inputs: &Bindings) -> bool {
        true
    }
    fn check_after(&self, _inputs: &Bindings, _outputs: &Bindings) -> bool {
        true
    }
}

/// A side effect known only by its description, e.g. one restored from JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Described {
    description: String,
}
impl Described {
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: description.into() }
    }
}
impl SideEffect for Described {
    fn description(&self) -> String {
        self.description.clone()
    }
}

// ------------- WriteFile -------------
/// The call writes a file at a templated path.
///
/// The template may reference bound values as `{inputs[key]}` or
/// `{outputs[key]}`, where `key` is a position or a name. Literal braces are
/// written doubled, `{{` and `}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFile {
    path_template: String,
}

impl WriteFile {
    pub fn new(path_template: impl Into<String>) -> Self {
        Self { path_template: path_template.into() }
    }
    pub fn path_template(&self) -> &str {
        &self.path_template
    }
    pub fn references_outputs(&self) -> bool {
        PLACEHOLDER
            .captures_iter(&self.path_template)
            .any(|c| c.get(1).is_some_and(|m| m.as_str() == "outputs"))
    }
    /// The concrete path, `None` when a placeholder names a missing binding.
    pub fn render(&self, inputs: &Bindings, outputs: &Bindings) -> Option<String> {
        let mut missing = false;
        let rendered = PLACEHOLDER.replace_all(&self.path_template, |c: &Captures| {
            let Some(kind) = c.get(1) else {
                return c[0][..1].to_string();
            };
            let source = if kind.as_str() == "inputs" { inputs } else { outputs };
            match source.get(&Key::parse(&c[2])) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => {
                    missing = true;
                    String::new()
                }
            }
        });
        (!missing).then(|| rendered.into_owned())
    }
}

impl SideEffect for WriteFile {
    fn description(&self) -> String {
        format!("Write file to {}", self.path_template)
    }
    fn check_before(&self, inputs: &Bindings) -> bool {
        // the path depends on what the call returns, nothing to check yet
        if self.references_outputs() {
            return true;
        }
        match self.render(inputs, &Bindings::new()) {
            Some(path) => !Path::new(&path).exists(),
            None => false,
        }
    }
    fn check_after(&self, inputs: &Bindings, outputs: &Bindings) -> bool {
        self.render(inputs, outputs)
            .is_some_and(|path| Path::new(&path).exists())
    }
}
