//! Parameter substitution - replaces `${NAME}` references in definitions

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::TemplateError;
use super::model::Definition;
use super::resolver::ResolvedValues;

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([a-zA-Z0-9_]+)\}").expect("reference pattern should be a valid regex")
});

/// What to do with a `${NAME}` reference that names no parameter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnresolvedReferencePolicy {
    /// Leave the reference in the output verbatim
    #[default]
    PassThrough,
    /// Fail processing with [`TemplateError::UnresolvedReference`]
    Error,
}

/// Replace every known reference in `input`.
///
/// Replacement happens in a single pass: a substituted value that itself
/// contains `${...}` is not expanded again. Returns the input borrowed when
/// nothing changed.
pub fn substitute_str<'a>(
    input: &'a str,
    values: &ResolvedValues,
    policy: UnresolvedReferencePolicy,
) -> Result<Cow<'a, str>, TemplateError> {
    if !input.contains("${") {
        return Ok(Cow::Borrowed(input));
    }

    let mut out = String::with_capacity(input.len());
    let mut last = 0;

    for caps in REFERENCE.captures_iter(input) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        match values.get(name.as_str()) {
            Some(value) => {
                out.push_str(&input[last..whole.start()]);
                out.push_str(value);
                last = whole.end();
            }
            None => match policy {
                UnresolvedReferencePolicy::PassThrough => {
                    warn!(reference = name.as_str(), "leaving unresolved parameter reference");
                }
                UnresolvedReferencePolicy::Error => {
                    return Err(TemplateError::UnresolvedReference {
                        reference: name.as_str().to_string(),
                    });
                }
            },
        }
    }

    if last == 0 {
        return Ok(Cow::Borrowed(input));
    }
    out.push_str(&input[last..]);
    Ok(Cow::Owned(out))
}

/// Substitute into a single definition in place
pub fn substitute_definition(
    definition: &mut dyn Definition,
    values: &ResolvedValues,
    policy: UnresolvedReferencePolicy,
) -> Result<(), TemplateError> {
    let mut failure = None;
    definition.visit_strings(&mut |s| {
        if failure.is_some() {
            return;
        }
        let replaced = match substitute_str(s, values, policy) {
            Ok(Cow::Owned(new)) => Some(new),
            Ok(Cow::Borrowed(_)) => None,
            Err(err) => {
                failure = Some(err);
                None
            }
        };
        if let Some(new) = replaced {
            *s = new;
        }
    });
    failure.map_or(Ok(()), Err)
}

/// Substitute resolved values into copies of `definitions`.
///
/// The input definitions are left untouched; the returned definitions have the
/// same structure with references replaced in every string leaf.
pub fn substitute(
    definitions: &[Box<dyn Definition>],
    values: &ResolvedValues,
    policy: UnresolvedReferencePolicy,
) -> Result<Vec<Box<dyn Definition>>, TemplateError> {
    definitions
        .iter()
        .map(|definition| {
            let mut copy = definition.clone_definition();
            substitute_definition(copy.as_mut(), values, policy)?;
            Ok(copy)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::template::{GenericObject, Service};

    fn values() -> ResolvedValues {
        [("HOST", "example.com"), ("PORT", "8080"), ("EMPTY", "")]
            .into_iter()
            .collect()
    }

    fn sub(input: &str) -> String {
        substitute_str(input, &values(), UnresolvedReferencePolicy::PassThrough)
            .unwrap()
            .into_owned()
    }

    #[test]
    fn test_whole_string_reference() {
        assert_eq!(sub("${HOST}"), "example.com");
    }

    #[test]
    fn test_embedded_and_multiple_references() {
        assert_eq!(sub("http://${HOST}:${PORT}/${HOST}"), "http://example.com:8080/example.com");
    }

    #[test]
    fn test_empty_value_substitutes() {
        assert_eq!(sub("a${EMPTY}b"), "ab");
    }

    #[test]
    fn test_unknown_reference_passes_through() {
        assert_eq!(sub("${HOST}/${NOPE}"), "example.com/${NOPE}");
    }

    #[test]
    fn test_unknown_reference_can_fail() {
        let err = substitute_str("${NOPE}", &values(), UnresolvedReferencePolicy::Error).unwrap_err();
        assert!(matches!(err, TemplateError::UnresolvedReference { ref reference } if reference == "NOPE"));
    }

    #[test]
    fn test_malformed_tokens_untouched() {
        assert_eq!(sub("$HOST ${} ${HOST ${-x}"), "$HOST ${} ${HOST ${-x}");
    }

    #[test]
    fn test_no_recursive_expansion() {
        let values: ResolvedValues = [("A", "${B}"), ("B", "b")].into_iter().collect();
        let out = substitute_str("${A}", &values, UnresolvedReferencePolicy::Error).unwrap();
        assert_eq!(out, "${B}");
    }

    #[test]
    fn test_unchanged_string_is_borrowed() {
        let out = substitute_str("plain", &values(), UnresolvedReferencePolicy::PassThrough).unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn test_substitute_leaves_input_untouched() {
        let originals: Vec<Box<dyn Definition>> = vec![
            Box::new(Service::new("${HOST}")),
            Box::new(
                GenericObject::new(json!({
                    "kind": "Route",
                    "metadata": {"name": "route"},
                    "spec": {"host": "${HOST}", "port": 8080, "${HOST}": "key"}
                }))
                .unwrap(),
            ),
        ];

        let out = substitute(&originals, &values(), UnresolvedReferencePolicy::PassThrough).unwrap();

        let service = out[0].as_any().downcast_ref::<Service>().unwrap();
        assert_eq!(service.metadata.name, "example.com");
        let route = out[1].as_any().downcast_ref::<GenericObject>().unwrap();
        assert_eq!(
            route.value()["spec"],
            json!({"host": "example.com", "port": 8080, "${HOST}": "key"})
        );

        let original = originals[0].as_any().downcast_ref::<Service>().unwrap();
        assert_eq!(original.metadata.name, "${HOST}");
    }

    #[test]
    fn test_substitute_fails_on_first_unresolved() {
        let originals: Vec<Box<dyn Definition>> = vec![Box::new(Service::new("${MISSING}"))];
        assert!(substitute(&originals, &values(), UnresolvedReferencePolicy::Error).is_err());
    }
}
