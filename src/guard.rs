//! Runtime enforcement of a [`Description`] around a callable.
//!
//! One guarded call runs strictly in sequence: bind the arguments, run the
//! pre-call checks, invoke the callable once with the caller's original
//! arguments, then run the post-call checks. Within a phase every check runs
//! before anything is reported, so a [`CheckError`] lists all violations of
//! that phase rather than the first one.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::bindings::{Args, Bindings};
use crate::checker::CheckerRegistry;
use crate::description::Description;
use crate::error::{CheckError, ContractError, Phase, Result, Violation};
use crate::settings::GuardConfig;
use crate::signature::{MarkTable, SignatureSource, parse_signature};
use crate::value::ValueDesc;

pub type Callable = dyn Fn(&Args) -> Return + Send + Sync;

/// What a guarded callable hands back.
#[derive(Debug, Clone, PartialEq)]
pub enum Return {
    /// The callable returned nothing.
    Unit,
    /// A single, non-aggregate result. A JSON array here is still one value.
    Value(Value),
    /// One element per declared output.
    Tuple(Vec<Value>),
}

impl Return {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Return::Value(v) => Some(v),
            _ => None,
        }
    }
    pub fn into_tuple(self) -> Option<Vec<Value>> {
        match self {
            Return::Tuple(vs) => Some(vs),
            _ => None,
        }
    }
}
impl From<Value> for Return {
    fn from(v: Value) -> Self {
        Return::Value(v)
    }
}
impl From<()> for Return {
    fn from(_: ()) -> Self {
        Return::Unit
    }
}

fn output_name(idx: usize) -> String {
    format!("output_{}", idx)
}

// ------------- Guard -------------
pub struct Guard {
    func: Arc<Callable>,
    description: Description,
    config: GuardConfig,
    registry: Arc<CheckerRegistry>,
    receiver: Option<Value>,
}

impl Guard {
    /// Unnamed outputs of `description` are named `output_<index>`.
    pub fn new<F, R>(mut description: Description, func: F) -> Self
    where
        F: Fn(&Args) -> R + Send + Sync + 'static,
        R: Into<Return>,
    {
        for (idx, output) in description.outputs.iter_mut().enumerate() {
            if output.name.is_none() {
                output.name = Some(output_name(idx));
            }
        }
        Self {
            func: Arc::new(move |args: &Args| -> Return { func(args).into() }),
            description,
            config: GuardConfig::default(),
            registry: CheckerRegistry::global(),
            receiver: None,
        }
    }
    /// Builds the description from a signature and its marks.
    pub fn from_signature<S, F, R>(source: &S, marks: &MarkTable, func: F) -> Result<Self>
    where
        S: SignatureSource + ?Sized,
        F: Fn(&Args) -> R + Send + Sync + 'static,
        R: Into<Return>,
    {
        Ok(Self::new(parse_signature(source, marks)?, func))
    }
    pub fn with_config(mut self, config: GuardConfig) -> Self {
        self.config = config;
        self
    }
    pub fn with_registry(mut self, registry: Arc<CheckerRegistry>) -> Self {
        self.registry = registry;
        self
    }
    pub fn description(&self) -> &Description {
        &self.description
    }
    pub fn description_mut(&mut self) -> &mut Description {
        &mut self.description
    }
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }
    pub fn receiver(&self) -> Option<&Value> {
        self.receiver.as_ref()
    }
    pub fn is_bound(&self) -> bool {
        self.receiver.is_some()
    }

    /// Binds the guard to a receiver, turning it into a bound method.
    ///
    /// The first time, the leading receiver input is dropped from the
    /// description and every later call gets `receiver` as its first positional
    /// argument. Binding again to the same receiver changes nothing; binding to
    /// a different one is refused since the description was already adjusted.
    pub fn bind(&mut self, receiver: Value) -> Result<()> {
        match &self.receiver {
            Some(bound) if *bound == receiver => return Ok(()),
            Some(bound) => {
                return Err(ContractError::Configuration(format!(
                    "Guard is already bound to {}, cannot rebind to {}",
                    bound, receiver
                )));
            }
            None => {}
        }
        if self.description.inputs.is_empty() {
            return Err(ContractError::Configuration(String::from(
                "Cannot bind a guard whose description declares no receiver input",
            )));
        }
        let dropped = self.description.inputs.remove(0);
        debug!(receiver = %receiver, dropped = dropped.name_or_default(), "guard bound");
        self.receiver = Some(receiver);
        Ok(())
    }

    pub fn call(&self, args: &Args) -> Result<Return> {
        let pass_in = self.description.parse_pass_in(args)?;
        let mut violations = Vec::new();
        if self.config.check_inputs {
            for (value, desc) in pass_in.iter().map(|(_, v)| v).zip(&self.description.inputs) {
                self.check_value(desc, value, &mut violations);
            }
        }
        if self.config.check_side_effect {
            for effect in &self.description.side_effects {
                if !effect.check_before(&pass_in) {
                    violations.push(Violation::SideEffect {
                        description: effect.description(),
                        phase: Phase::PreCall,
                    });
                }
            }
        }
        Self::raise(Phase::PreCall, violations)?;
        debug!(inputs = pass_in.len(), "pre-call checks passed");

        let result = match &self.receiver {
            Some(receiver) => (self.func)(&args.with_receiver(receiver)),
            None => (self.func)(args),
        };

        let mut violations = Vec::new();
        let mut outputs = Bindings::new();
        if self.config.check_outputs {
            outputs = self.bind_outputs(&result)?;
            for (value, desc) in outputs.iter().map(|(_, v)| v).zip(&self.description.outputs) {
                self.check_value(desc, value, &mut violations);
            }
        } else if self.config.check_side_effect {
            // output templates still need the results, arity is not enforced here
            outputs = self.bind_outputs(&result).unwrap_or_default();
        }
        if self.config.check_side_effect {
            for effect in &self.description.side_effects {
                if !effect.check_after(&pass_in, &outputs) {
                    violations.push(Violation::SideEffect {
                        description: effect.description(),
                        phase: Phase::PostCall,
                    });
                }
            }
        }
        Self::raise(Phase::PostCall, violations)?;
        debug!(outputs = outputs.len(), "post-call checks passed");
        Ok(result)
    }

    // maps a result onto the declared outputs, arity mismatches fail at once
    fn bind_outputs(&self, result: &Return) -> Result<Bindings> {
        let declared = &self.description.outputs;
        let values: Vec<Value> = match result {
            Return::Tuple(values) => values.clone(),
            Return::Value(value) => vec![value.clone()],
            Return::Unit => Vec::new(),
        };
        if values.len() != declared.len() {
            return Err(ContractError::Arity { returned: values.len(), declared: declared.len() });
        }
        Ok(declared
            .iter()
            .zip(values)
            .enumerate()
            .map(|(idx, (desc, value))| (desc.name.clone().unwrap_or_else(|| output_name(idx)), value))
            .collect())
    }

    // a value failing its type check is not range checked as well
    fn check_value(&self, desc: &ValueDesc, value: &Value, violations: &mut Vec<Violation>) {
        if self.config.check_type {
            if let Err(violation) = desc.check_type(&self.registry, value) {
                violations.push(violation);
                return;
            }
        }
        if self.config.check_range {
            if let Err(violation) = desc.check_range(&self.registry, value) {
                violations.push(violation);
            }
        }
    }

    fn raise(phase: Phase, violations: Vec<Violation>) -> Result<()> {
        if violations.is_empty() {
            return Ok(());
        }
        warn!(%phase, count = violations.len(), "guard checks failed");
        Err(CheckError::new(phase, violations).into())
    }
}
