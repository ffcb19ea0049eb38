//! Label injection - stamps the template's labels onto every definition

use tracing::trace;

use super::model::{Definition, Labels};

/// Merge `labels` into one definition's label map.
///
/// Keys the definition already has are left alone, so an object's own labels
/// always win over template-wide ones. Returns how many labels were added.
pub fn add_labels(definition: &mut dyn Definition, labels: &Labels) -> usize {
    let Some(mut map) = definition.label_map() else {
        trace!("definition has no label map");
        return 0;
    };
    let mut added = 0;
    for (key, value) in labels {
        if map.insert_if_absent(key, value) {
            added += 1;
        }
    }
    added
}

/// Merge `labels` into every definition that has a label map. Never fails.
pub fn apply_labels(
    mut definitions: Vec<Box<dyn Definition>>,
    labels: &Labels,
) -> Vec<Box<dyn Definition>> {
    if labels.is_empty() {
        return definitions;
    }
    for definition in &mut definitions {
        add_labels(definition.as_mut(), labels);
    }
    definitions
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::template::{GenericObject, Pod, Service};

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_labels_added_to_unlabeled_service() {
        let defs: Vec<Box<dyn Definition>> = vec![Box::new(Service::new("svc"))];
        let out = apply_labels(defs, &labels(&[("label1", "value1"), ("label2", "value2")]));
        let service = out[0].as_any().downcast_ref::<Service>().unwrap();
        assert_eq!(
            service.metadata.labels,
            labels(&[("label1", "value1"), ("label2", "value2")])
        );
    }

    #[test]
    fn test_existing_labels_preserved() {
        let mut pod = Pod::new("db");
        pod.metadata.labels = labels(&[("app", "mine")]);
        let added = add_labels(&mut pod, &labels(&[("app", "template"), ("tier", "data")]));
        assert_eq!(added, 1);
        assert_eq!(pod.metadata.labels, labels(&[("app", "mine"), ("tier", "data")]));
    }

    #[test]
    fn test_applying_twice_is_idempotent() {
        let global = labels(&[("a", "1"), ("b", "2")]);
        let defs: Vec<Box<dyn Definition>> = vec![Box::new(Service::new("svc"))];
        let once = apply_labels(defs, &global);
        let once_labels = once[0].as_any().downcast_ref::<Service>().unwrap().metadata.labels.clone();
        let twice = apply_labels(once, &global);
        let twice_labels = &twice[0].as_any().downcast_ref::<Service>().unwrap().metadata.labels;
        assert_eq!(&once_labels, twice_labels);
    }

    #[test]
    fn test_definition_without_label_map_passes_through() {
        let route = GenericObject::new(json!({"kind": "Route", "spec": {}})).unwrap();
        let defs: Vec<Box<dyn Definition>> = vec![Box::new(route.clone())];
        let out = apply_labels(defs, &labels(&[("a", "1")]));
        assert_eq!(out[0].as_any().downcast_ref::<GenericObject>(), Some(&route));
    }

    #[test]
    fn test_generic_object_labels_merged() {
        let route = GenericObject::new(json!({
            "kind": "Route",
            "metadata": {"labels": {"app": "mine"}}
        }))
        .unwrap();
        let defs: Vec<Box<dyn Definition>> = vec![Box::new(route)];
        let out = apply_labels(defs, &labels(&[("app", "x"), ("env", "prod")]));
        let route = out[0].as_any().downcast_ref::<GenericObject>().unwrap();
        assert_eq!(
            route.value()["metadata"]["labels"],
            json!({"app": "mine", "env": "prod"})
        );
    }
}
