use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::datatype::TypeSpec;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("Binding error: {0}")]
    Binding(#[from] BindingError),
    #[error("Check failed: {0}")]
    Violation(#[from] Violation),
    #[error("{0}")]
    Check(#[from] CheckError),
    #[error("Output num({returned}) does not match the description outputs num({declared})")]
    Arity { returned: usize, declared: usize },
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ContractError>;

impl From<config::ConfigError> for ContractError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}

/// Call arguments that could not be bound to the declared inputs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("missing required argument: `{0}`")]
    Missing(String),
    #[error("takes {accepted} positional arguments but {given} were given")]
    TooManyPositional { given: usize, accepted: usize },
    #[error("got an unexpected keyword argument `{0}`")]
    UnexpectedKeyword(String),
    #[error("got multiple values for argument `{0}`")]
    Duplicate(String),
}

/// One failed check. Several of these make up a [`CheckError`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Violation {
    #[error("Value {value} of `{slot}` is not in valid type({expected})")]
    Type { slot: String, value: Value, expected: TypeSpec },
    #[error("Value {value} of `{slot}` is not in a valid range({})", render_range(.range))]
    Range { slot: String, value: Value, range: Option<Value> },
    #[error("Side effect `{description}` failed its {phase} check")]
    SideEffect { description: String, phase: Phase },
}

fn render_range(range: &Option<Value>) -> String {
    match range {
        Some(r) => r.to_string(),
        None => String::from("none"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    PreCall,
    PostCall,
}
impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Phase::PreCall => write!(f, "pre-call"),
            Phase::PostCall => write!(f, "post-call"),
        }
    }
}

/// Every violation collected during one guard phase.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{} {phase} check(s) failed:{}", .violations.len(), render_violations(.violations))]
pub struct CheckError {
    pub phase: Phase,
    pub violations: Vec<Violation>,
}
impl CheckError {
    pub fn new(phase: Phase, violations: Vec<Violation>) -> Self {
        Self { phase, violations }
    }
    pub fn len(&self) -> usize {
        self.violations.len()
    }
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

fn render_violations(violations: &[Violation]) -> String {
    violations.iter().map(|v| format!(" [{}]", v)).collect()
}
