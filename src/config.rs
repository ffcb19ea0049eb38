//! Processor configuration
//!
//! Settings can be built in code or loaded from a TOML file:
//!
//! ```toml
//! seed = 42
//! max-repeat-count = 64
//! unresolved-references = "error"
//!
//! [parameters]
//! DATABASE_USER = "admin"
//!
//! [labels]
//! environment = "staging"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generator::DEFAULT_MAX_REPEAT;
use crate::template::{Labels, ResolutionContext, UnresolvedReferencePolicy};

/// Errors that can occur when loading or parsing a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Configuration options for template processing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProcessorConfig {
    /// Seed for generated values; every call uses fresh entropy when unset
    pub seed: Option<u64>,

    /// Largest repeat count accepted in generator expressions
    pub max_repeat_count: usize,

    /// Handling of `${NAME}` references to undeclared parameters
    pub unresolved_references: UnresolvedReferencePolicy,

    /// Parameter values that replace the template's own
    pub parameters: BTreeMap<String, String>,

    /// Labels added to every object; a template's own labels win on conflict
    pub labels: Labels,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_repeat_count: DEFAULT_MAX_REPEAT,
            unresolved_references: UnresolvedReferencePolicy::default(),
            parameters: BTreeMap::new(),
            labels: Labels::new(),
        }
    }
}

impl ProcessorConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Use a fixed seed so generated values are reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the largest accepted repeat count
    pub fn with_max_repeat_count(mut self, max: usize) -> Self {
        self.max_repeat_count = max;
        self
    }

    /// Set how unresolved references are handled
    pub fn with_unresolved_references(mut self, policy: UnresolvedReferencePolicy) -> Self {
        self.unresolved_references = policy;
        self
    }

    /// Supply a value for a parameter
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Add a label for every generated object
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Resolution settings derived from this configuration
    pub fn resolution_context(&self) -> ResolutionContext {
        ResolutionContext::with_overrides(self.parameters.clone())
            .with_max_repeat_count(self.max_repeat_count)
    }
}
