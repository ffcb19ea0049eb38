//! Decoding resource documents into objects and encoding configs
//!
//! Documents are dispatched on their `kind`: `Template` and `Config` become the
//! processor's own types, `Service` and `Pod` their typed adapters, and any
//! other kind a [`GenericObject`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::template::{
    Config, Definition, GenericObject, Labels, Object, ObjectMeta, Parameter, Pod, Service,
    Template,
};

/// Errors that can occur when reading or writing documents
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("document is not an object with a string `kind`")]
    MissingKind,

    #[error("invalid {kind}: {source}")]
    InvalidObject {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct TemplateDocument {
    #[serde(default)]
    metadata: ObjectMeta,
    #[serde(default)]
    parameters: Vec<Parameter>,
    #[serde(default)]
    objects: Vec<Value>,
    /// Labels applied to every object
    #[serde(default)]
    labels: Labels,
}

#[derive(Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    metadata: ObjectMeta,
    #[serde(default)]
    items: Vec<Value>,
}

fn kind_of(value: &Value) -> Result<String, CodecError> {
    value
        .get("kind")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(CodecError::MissingKind)
}

fn typed<T: DeserializeOwned>(kind: &str, value: Value) -> Result<T, CodecError> {
    serde_json::from_value(value).map_err(|source| CodecError::InvalidObject {
        kind: kind.to_string(),
        source,
    })
}

/// Decode a typed kind. `kind` is dropped first so it does not land in the
/// kind's `extra` map; encoding stamps it back.
fn typed_kind<T: DeserializeOwned>(kind: &str, mut value: Value) -> Result<T, CodecError> {
    if let Value::Object(map) = &mut value {
        map.remove("kind");
    }
    typed(kind, value)
}

/// Decode a resource definition
pub fn decode_definition(value: Value) -> Result<Box<dyn Definition>, CodecError> {
    let kind = kind_of(&value)?;
    Ok(match kind.as_str() {
        "Service" => Box::new(typed_kind::<Service>(&kind, value)?),
        "Pod" => Box::new(typed_kind::<Pod>(&kind, value)?),
        _ => Box::new(GenericObject::new(value).ok_or(CodecError::MissingKind)?),
    })
}

fn decode_definitions(values: Vec<Value>) -> Result<Vec<Box<dyn Definition>>, CodecError> {
    values.into_iter().map(decode_definition).collect()
}

/// Decode a `Template` document, whatever its `kind` field says
pub fn decode_template(value: Value) -> Result<Template, CodecError> {
    let doc: TemplateDocument = typed("Template", value)?;
    Ok(Template {
        metadata: doc.metadata,
        parameters: doc.parameters,
        objects: decode_definitions(doc.objects)?,
        object_labels: doc.labels,
    })
}

/// Decode any object by its `kind`
pub fn decode_object(value: Value) -> Result<Box<dyn Object>, CodecError> {
    let kind = kind_of(&value)?;
    Ok(match kind.as_str() {
        "Template" => Box::new(decode_template(value)?),
        "Config" => {
            let doc: ConfigDocument = typed(&kind, value)?;
            Box::new(Config {
                metadata: doc.metadata,
                items: decode_definitions(doc.items)?,
            })
        }
        "Service" => Box::new(typed_kind::<Service>(&kind, value)?),
        "Pod" => Box::new(typed_kind::<Pod>(&kind, value)?),
        _ => Box::new(GenericObject::new(value).ok_or(CodecError::MissingKind)?),
    })
}

/// Decode an object from a JSON document
pub fn from_json_str(content: &str) -> Result<Box<dyn Object>, CodecError> {
    decode_object(serde_json::from_str(content)?)
}

/// Decode an object from a YAML document (JSON is valid YAML too)
pub fn from_yaml_str(content: &str) -> Result<Box<dyn Object>, CodecError> {
    decode_object(serde_yaml::from_str(content)?)
}

/// Encode a config as pretty-printed JSON
pub fn to_json_string(config: &Config) -> Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(&config.to_json()?)?)
}

/// Encode a config as YAML
pub fn to_yaml_string(config: &Config) -> Result<String, CodecError> {
    Ok(serde_yaml::to_string(&config.to_json()?)?)
}
