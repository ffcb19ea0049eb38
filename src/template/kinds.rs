//! Concrete definition kinds
//!
//! `Service` and `Pod` are typed adapters for the kinds templates most often
//! carry. Everything else travels as a [`GenericObject`] backed by JSON.
//!
//! Typed kinds keep every field they do not model in a flattened `extra` map,
//! so decoding and encoding a resource never loses data.

use std::any::Any;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::model::{visit_extra, visit_value, Definition, LabelMap, Labels, Object, ObjectMeta};

const API_VERSION: &str = "v1";

/// Serialize a typed kind and stamp `kind` on it, plus `apiVersion` if it has none
fn typed_json<T: Serialize>(kind: &str, object: &T) -> serde_json::Result<Value> {
    let mut value = serde_json::to_value(object)?;
    if let Value::Object(map) = &mut value {
        map.insert("kind".to_string(), Value::String(kind.to_string()));
        map.entry("apiVersion")
            .or_insert_with(|| Value::String(API_VERSION.to_string()));
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionAffinity {
    #[default]
    #[serde(rename = "None")]
    Disabled,
    #[serde(rename = "ClientIP")]
    ClientIp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<u16>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ServicePort>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub selector: Labels,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_affinity: Option<SessionAffinity>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ServiceSpec,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::named(name),
            ..Self::default()
        }
    }

    pub fn with_port(mut self, port: u16, protocol: Protocol) -> Self {
        self.spec.ports.push(ServicePort {
            port,
            protocol: Some(protocol),
            ..ServicePort::default()
        });
        self
    }

    pub fn with_selector(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.selector.insert(key.into(), value.into());
        self
    }
}

impl Object for Service {
    fn kind(&self) -> &str {
        "Service"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Definition for Service {
    fn visit_strings(&mut self, visitor: &mut dyn FnMut(&mut String)) {
        if let Some(api_version) = &mut self.api_version {
            visitor(api_version);
        }
        self.metadata.visit_strings(visitor);
        for port in &mut self.spec.ports {
            if let Some(name) = &mut port.name {
                visitor(name);
            }
            visit_extra(&mut port.extra, visitor);
        }
        self.spec.selector.values_mut().for_each(|v| visitor(v));
        visit_extra(&mut self.spec.extra, visitor);
        visit_extra(&mut self.extra, visitor);
    }

    fn label_map(&mut self) -> Option<LabelMap<'_>> {
        Some(LabelMap::Typed(&mut self.metadata.labels))
    }

    fn clone_definition(&self) -> Box<dyn Definition> {
        Box::new(self.clone())
    }

    fn to_json(&self) -> serde_json::Result<Value> {
        typed_json(self.kind(), self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    pub container_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ContainerPort>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Container {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ..Self::default()
        }
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push(EnvVar {
            name: name.into(),
            value: value.into(),
            ..EnvVar::default()
        });
        self
    }

    fn visit_strings(&mut self, visitor: &mut dyn FnMut(&mut String)) {
        visitor(&mut self.name);
        visitor(&mut self.image);
        self.command.iter_mut().for_each(|s| visitor(s));
        self.args.iter_mut().for_each(|s| visitor(s));
        for var in &mut self.env {
            visitor(&mut var.name);
            visitor(&mut var.value);
            visit_extra(&mut var.extra, visitor);
        }
        for port in &mut self.ports {
            visit_extra(&mut port.extra, visitor);
        }
        visit_extra(&mut self.extra, visitor);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<Container>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: PodSpec,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Pod {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::named(name),
            ..Self::default()
        }
    }

    pub fn with_container(mut self, container: Container) -> Self {
        self.spec.containers.push(container);
        self
    }
}

impl Object for Pod {
    fn kind(&self) -> &str {
        "Pod"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Definition for Pod {
    fn visit_strings(&mut self, visitor: &mut dyn FnMut(&mut String)) {
        if let Some(api_version) = &mut self.api_version {
            visitor(api_version);
        }
        self.metadata.visit_strings(visitor);
        for container in &mut self.spec.containers {
            container.visit_strings(visitor);
        }
        visit_extra(&mut self.spec.extra, visitor);
        visit_extra(&mut self.extra, visitor);
    }

    fn label_map(&mut self) -> Option<LabelMap<'_>> {
        Some(LabelMap::Typed(&mut self.metadata.labels))
    }

    fn clone_definition(&self) -> Box<dyn Definition> {
        Box::new(self.clone())
    }

    fn to_json(&self) -> serde_json::Result<Value> {
        typed_json(self.kind(), self)
    }
}

/// Any other resource, kept as its JSON value.
///
/// Labels live under `metadata.labels`. An object without a `metadata` map, or
/// whose `labels` entry is not a map, has no label map.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericObject {
    value: Value,
}

impl GenericObject {
    /// Wrap a JSON object; returns `None` unless it is a map with a string `kind`
    pub fn new(value: Value) -> Option<Self> {
        value.get("kind").and_then(Value::as_str)?;
        Some(Self { value })
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

impl Object for GenericObject {
    fn kind(&self) -> &str {
        self.value.get("kind").and_then(Value::as_str).unwrap_or_default()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Definition for GenericObject {
    fn visit_strings(&mut self, visitor: &mut dyn FnMut(&mut String)) {
        visit_value(&mut self.value, visitor);
    }

    fn label_map(&mut self) -> Option<LabelMap<'_>> {
        let metadata = self.value.get_mut("metadata")?.as_object_mut()?;
        let labels = metadata
            .entry("labels")
            .or_insert_with(|| Value::Object(Map::new()));
        labels.as_object_mut().map(LabelMap::Json)
    }

    fn clone_definition(&self) -> Box<dyn Definition> {
        Box::new(self.clone())
    }

    fn to_json(&self) -> serde_json::Result<Value> {
        Ok(self.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn strings(definition: &mut dyn Definition) -> Vec<String> {
        let mut seen = Vec::new();
        definition.visit_strings(&mut |s| seen.push(s.clone()));
        seen
    }

    #[test]
    fn test_service_json_shape() {
        let service = Service::new("web").with_port(80, Protocol::Tcp);
        let value = service.to_json().unwrap();
        assert_eq!(value["kind"], "Service");
        assert_eq!(value["apiVersion"], "v1");
        assert_eq!(value["metadata"]["name"], "web");
        assert_eq!(value["spec"]["ports"][0]["protocol"], "TCP");
        assert!(value["spec"].get("sessionAffinity").is_none());
    }

    #[test]
    fn test_unmodeled_fields_survive_round_trip() {
        let input = json!({
            "apiVersion": "v1beta3",
            "metadata": {"name": "web", "uid": "1234", "generateName": "web-"},
            "spec": {
                "type": "NodePort",
                "clusterIP": "10.0.0.1",
                "ports": [{"port": 80, "nodePort": 30080}]
            }
        });
        let service: Service = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(service.spec.extra["type"], "NodePort");

        let mut expected = input;
        expected["kind"] = json!("Service");
        assert_eq!(service.to_json().unwrap(), expected);
    }

    #[test]
    fn test_pod_extra_strings_visited() {
        let mut pod: Pod = serde_json::from_value(json!({
            "metadata": {"name": "db"},
            "spec": {
                "restartPolicy": "${POLICY}",
                "containers": [{
                    "name": "c",
                    "image": "i",
                    "imagePullPolicy": "${PULL}",
                    "volumeMounts": [{"name": "data", "mountPath": "/var/${DIR}"}]
                }]
            }
        }))
        .unwrap();
        let seen = strings(&mut pod);
        for expected in ["${POLICY}", "${PULL}", "data", "/var/${DIR}"] {
            assert!(seen.contains(&expected.to_string()), "{} not visited", expected);
        }
    }

    #[test]
    fn test_service_visits_selector_values() {
        let mut service = Service::new("web").with_selector("app", "${APP}");
        assert_eq!(strings(&mut service), vec!["web", "${APP}"]);
    }

    #[test]
    fn test_pod_visits_container_strings() {
        let mut pod = Pod::new("db").with_container(
            Container::new("mysql", "mysql:${VERSION}").with_env("MYSQL_PASSWORD", "${PASSWORD}"),
        );
        assert_eq!(
            strings(&mut pod),
            vec!["db", "mysql", "mysql:${VERSION}", "MYSQL_PASSWORD", "${PASSWORD}"]
        );
    }

    #[test]
    fn test_generic_object_requires_kind() {
        assert!(GenericObject::new(json!({"metadata": {}})).is_none());
        assert!(GenericObject::new(json!("Route")).is_none());
        let route = GenericObject::new(json!({"kind": "Route"})).unwrap();
        assert_eq!(route.kind(), "Route");
    }

    #[test]
    fn test_generic_object_visits_leaves_not_keys() {
        let mut route = GenericObject::new(json!({
            "kind": "Route",
            "spec": {"${HOST}": ["a", 1, true, null, {"b": "c"}]}
        }))
        .unwrap();
        let seen = strings(&mut route);
        assert!(seen.contains(&"a".to_string()));
        assert!(seen.contains(&"c".to_string()));
        assert!(!seen.contains(&"${HOST}".to_string()));
    }

    #[test]
    fn test_generic_label_map_created_under_metadata() {
        let mut route = GenericObject::new(json!({"kind": "Route", "metadata": {"name": "r"}})).unwrap();
        route.label_map().unwrap().insert_if_absent("app", "web");
        assert_eq!(route.value()["metadata"]["labels"]["app"], "web");
    }

    #[test]
    fn test_generic_without_metadata_has_no_labels() {
        let mut route = GenericObject::new(json!({"kind": "Route"})).unwrap();
        assert!(route.label_map().is_none());

        let mut odd = GenericObject::new(json!({"kind": "Route", "metadata": {"labels": "x"}})).unwrap();
        assert!(odd.label_map().is_none());
    }
}
