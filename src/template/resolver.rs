//! Parameter resolution - turns declared parameters into concrete values

use std::collections::{BTreeMap, HashSet};

use rand::Rng;
use tracing::{debug, warn};

use crate::generator::{self, DEFAULT_MAX_REPEAT};

use super::error::TemplateError;
use super::model::Parameter;

/// Final value of every parameter in one template.
///
/// Built once per processing call and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedValues {
    values: BTreeMap<String, String>,
}

impl ResolvedValues {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(|v| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ResolvedValues {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Supplied by the caller at processing time
    Override,
    /// The parameter's own `value`
    Explicit,
    /// Produced by the parameter's generator expression
    Generated,
    /// Optional parameter with nothing to go on
    Empty,
}

impl ValueSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::Explicit => "explicit",
            Self::Generated => "generated",
            Self::Empty => "empty",
        }
    }
}

/// Context for parameter resolution
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    /// Values supplied by the caller; they take the place of a parameter's own value
    pub overrides: BTreeMap<String, String>,
    /// Largest repeat count accepted in generator expressions
    pub max_repeat_count: usize,
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionContext {
    /// Create a context with no overrides and the default repeat limit
    pub fn new() -> Self {
        Self {
            overrides: BTreeMap::new(),
            max_repeat_count: DEFAULT_MAX_REPEAT,
        }
    }

    /// Create a context with caller-supplied values
    pub fn with_overrides(overrides: BTreeMap<String, String>) -> Self {
        Self {
            overrides,
            ..Self::new()
        }
    }

    pub fn with_max_repeat_count(mut self, max: usize) -> Self {
        self.max_repeat_count = max;
        self
    }
}

/// Resolve parameters with no overrides
pub fn resolve<R: Rng + ?Sized>(
    parameters: &[Parameter],
    rng: &mut R,
) -> Result<ResolvedValues, TemplateError> {
    resolve_parameters(parameters, &ResolutionContext::new(), rng)
}

/// Resolve every parameter in declaration order.
///
/// An explicit value (or override) is used verbatim even if a generator is also
/// present. Otherwise the generator runs once. A required parameter with
/// neither fails the whole resolution; an optional one resolves to "".
pub fn resolve_parameters<R: Rng + ?Sized>(
    parameters: &[Parameter],
    ctx: &ResolutionContext,
    rng: &mut R,
) -> Result<ResolvedValues, TemplateError> {
    let mut seen = HashSet::new();
    for param in parameters {
        if !seen.insert(param.name.as_str()) {
            return Err(TemplateError::DuplicateParameter {
                parameter: param.name.clone(),
            });
        }
    }

    for name in ctx.overrides.keys() {
        if !seen.contains(name.as_str()) {
            warn!(parameter = %name, "ignoring value for undeclared parameter");
        }
    }

    let mut values = BTreeMap::new();
    for param in parameters {
        let (value, source) = resolve_one(param, ctx, rng)?;
        debug!(parameter = %param.name, source = source.as_str(), "resolved parameter");
        values.insert(param.name.clone(), value);
    }

    Ok(ResolvedValues { values })
}

fn resolve_one<R: Rng + ?Sized>(
    param: &Parameter,
    ctx: &ResolutionContext,
    rng: &mut R,
) -> Result<(String, ValueSource), TemplateError> {
    if let Some(value) = ctx.overrides.get(&param.name) {
        return Ok((value.clone(), ValueSource::Override));
    }

    if let Some(value) = param.explicit_value() {
        return Ok((value.to_string(), ValueSource::Explicit));
    }

    if let Some(pattern) = param.generator() {
        let expr = generator::parse_with_limit(pattern, ctx.max_repeat_count).map_err(|source| {
            TemplateError::InvalidGeneratorExpression {
                parameter: param.name.clone(),
                source,
            }
        })?;
        return Ok((expr.generate(rng), ValueSource::Generated));
    }

    if param.required {
        return Err(TemplateError::MissingParameterValue {
            parameter: param.name.clone(),
        });
    }

    Ok((String::new(), ValueSource::Empty))
}
