// config lets guard settings live in a separate file or in the environment
use ::config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::error::Result;

pub const ENV_PREFIX: &str = "CALLGUARD";

/// Which checks a [`crate::guard::Guard`] runs. Every toggle is independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub check_inputs: bool,
    pub check_outputs: bool,
    pub check_side_effect: bool,
    pub check_type: bool,
    pub check_range: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            check_inputs: true,
            check_outputs: true,
            check_side_effect: false,
            check_type: true,
            check_range: true,
        }
    }
}

impl GuardConfig {
    /// Reads an optional settings file, then `CALLGUARD_*` environment
    /// variables on top of it. Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize::<GuardConfig>()?)
    }
    pub fn with_inputs(mut self, on: bool) -> Self {
        self.check_inputs = on;
        self
    }
    pub fn with_outputs(mut self, on: bool) -> Self {
        self.check_outputs = on;
        self
    }
    pub fn with_side_effect(mut self, on: bool) -> Self {
        self.check_side_effect = on;
        self
    }
    pub fn with_type(mut self, on: bool) -> Self {
        self.check_type = on;
        self
    }
    pub fn with_range(mut self, on: bool) -> Self {
        self.check_range = on;
        self
    }
}
