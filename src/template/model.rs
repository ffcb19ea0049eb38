//! Object model shared by templates and configs

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Label key/value pairs, kept sorted for stable output
pub type Labels = BTreeMap<String, String>;

/// Anything that can be handed to the processor.
///
/// The processor only accepts [`Template`]; every other kind is rejected, which
/// is why objects expose their kind and support downcasting.
pub trait Object: Any + fmt::Debug + Send + Sync {
    /// Resource kind, e.g. `Template` or `Service`
    fn kind(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}

/// Mutable view of a definition's label map.
///
/// Typed kinds keep labels in a [`Labels`] map; JSON-backed definitions keep
/// them in a JSON object whose values may not all be strings.
pub enum LabelMap<'a> {
    Typed(&'a mut Labels),
    Json(&'a mut Map<String, Value>),
}

impl LabelMap<'_> {
    pub fn contains_key(&self, key: &str) -> bool {
        match self {
            LabelMap::Typed(labels) => labels.contains_key(key),
            LabelMap::Json(labels) => labels.contains_key(key),
        }
    }

    /// Get a label value; non-string JSON values read as `None`
    pub fn get(&self, key: &str) -> Option<&str> {
        match self {
            LabelMap::Typed(labels) => labels.get(key).map(|v| v.as_str()),
            LabelMap::Json(labels) => labels.get(key).and_then(Value::as_str),
        }
    }

    /// Insert a label unless the key is already present.
    ///
    /// Returns whether the label was added.
    pub fn insert_if_absent(&mut self, key: &str, value: &str) -> bool {
        if self.contains_key(key) {
            return false;
        }
        match self {
            LabelMap::Typed(labels) => {
                labels.insert(key.to_string(), value.to_string());
            }
            LabelMap::Json(labels) => {
                labels.insert(key.to_string(), Value::String(value.to_string()));
            }
        }
        true
    }
}

/// A resource definition bundled in a template.
///
/// The engine never looks at a definition's schema. It only needs to reach every
/// string leaf (for parameter substitution) and, when the kind has one, the
/// label map (for label injection).
pub trait Definition: Object {
    /// Call `visitor` on every string leaf. Map keys are not visited.
    fn visit_strings(&mut self, visitor: &mut dyn FnMut(&mut String));

    /// The definition's label map, if its kind has one
    fn label_map(&mut self) -> Option<LabelMap<'_>>;

    fn clone_definition(&self) -> Box<dyn Definition>;

    /// Encode as a JSON resource including `kind` and `apiVersion`
    fn to_json(&self) -> serde_json::Result<Value>;
}

impl Clone for Box<dyn Definition> {
    fn clone(&self) -> Self {
        self.clone_definition()
    }
}

/// Standard metadata carried by every object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Labels,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: Labels,
    /// Fields not modeled above, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ObjectMeta {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Visit name, namespace and every label and annotation value
    pub fn visit_strings(&mut self, visitor: &mut dyn FnMut(&mut String)) {
        visitor(&mut self.name);
        if let Some(namespace) = &mut self.namespace {
            visitor(namespace);
        }
        self.labels.values_mut().for_each(|v| visitor(v));
        self.annotations.values_mut().for_each(|v| visitor(v));
        visit_extra(&mut self.extra, visitor);
    }
}

/// Call `visitor` on every string leaf of a JSON value. Map keys are not visited.
pub(crate) fn visit_value(value: &mut Value, visitor: &mut dyn FnMut(&mut String)) {
    match value {
        Value::String(s) => visitor(s),
        Value::Array(items) => items.iter_mut().for_each(|v| visit_value(v, visitor)),
        Value::Object(map) => visit_extra(map, visitor),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

pub(crate) fn visit_extra(map: &mut Map<String, Value>, visitor: &mut dyn FnMut(&mut String)) {
    map.values_mut().for_each(|v| visit_value(v, visitor));
}

/// A named slot resolved to a concrete value before substitution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Explicit value; wins over `generate`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Generator expression used when no value is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate: Option<String>,
    #[serde(default)]
    pub required: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_generator(mut self, expression: impl Into<String>) -> Self {
        self.generate = Some(expression.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// The explicit value, treating an empty string as absent
    pub fn explicit_value(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.is_empty())
    }

    /// The generator expression, treating an empty string as absent
    pub fn generator(&self) -> Option<&str> {
        self.generate.as_deref().filter(|g| !g.is_empty())
    }
}

/// A parameterized bundle of resource definitions
#[derive(Debug, Clone, Default)]
pub struct Template {
    pub metadata: ObjectMeta,
    pub parameters: Vec<Parameter>,
    pub objects: Vec<Box<dyn Definition>>,
    /// Labels stamped onto every generated object
    pub object_labels: Labels,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::named(name),
            ..Self::default()
        }
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_object(mut self, object: impl Definition) -> Self {
        self.objects.push(Box::new(object));
        self
    }

    pub fn with_object_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.object_labels.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

impl Object for Template {
    fn kind(&self) -> &str {
        "Template"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The fully resolved output of processing a template
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub metadata: ObjectMeta,
    /// Resolved definitions, in the template's order
    pub items: Vec<Box<dyn Definition>>,
}

impl Config {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Downcast the item at `index` to a concrete kind
    pub fn item<T: Definition>(&self, index: usize) -> Option<&T> {
        self.items.get(index)?.as_any().downcast_ref::<T>()
    }

    /// Encode as a `Config` resource
    pub fn to_json(&self) -> serde_json::Result<Value> {
        let items = self
            .items
            .iter()
            .map(|item| item.to_json())
            .collect::<serde_json::Result<Vec<_>>>()?;

        let mut map = Map::new();
        map.insert("apiVersion".to_string(), Value::String("v1".to_string()));
        map.insert("kind".to_string(), Value::String("Config".to_string()));
        map.insert("metadata".to_string(), serde_json::to_value(&self.metadata)?);
        map.insert("items".to_string(), Value::Array(items));
        Ok(Value::Object(map))
    }
}

impl Object for Config {
    fn kind(&self) -> &str {
        "Config"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Package resolved definitions into a config, keeping their order
pub fn assemble(definitions: Vec<Box<dyn Definition>>) -> Config {
    Config {
        metadata: ObjectMeta::default(),
        items: definitions,
    }
}
