//! Errors raised while processing a template

use thiserror::Error;

use crate::error::GeneratorError;

/// Errors that can occur during template processing
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The object handed to the processor is not a template
    #[error("invalid input type: expected Template, got {kind}")]
    InvalidInputType { kind: String },

    /// A parameter's generator expression could not be parsed
    #[error("parameter {parameter}: {source}")]
    InvalidGeneratorExpression {
        parameter: String,
        #[source]
        source: GeneratorError,
    },

    /// A required parameter has neither a value nor a generator
    #[error("missing value for required parameter: {parameter}")]
    MissingParameterValue { parameter: String },

    /// Two parameters share a name
    #[error("duplicate parameter definition: {parameter}")]
    DuplicateParameter { parameter: String },

    /// A `${NAME}` reference names no parameter (only raised when configured to)
    #[error("unresolved parameter reference: ${{{reference}}}")]
    UnresolvedReference { reference: String },
}

impl TemplateError {
    /// The parameter or reference name this error is about, if any
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::InvalidGeneratorExpression { parameter, .. }
            | Self::MissingParameterValue { parameter }
            | Self::DuplicateParameter { parameter } => Some(parameter),
            Self::UnresolvedReference { reference } => Some(reference),
            Self::InvalidInputType { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Diagnostic;

    #[test]
    fn test_missing_parameter_display() {
        let err = TemplateError::MissingParameterValue {
            parameter: "DB_PASSWORD".to_string(),
        };
        assert!(err.to_string().contains("DB_PASSWORD"));
        assert_eq!(err.parameter(), Some("DB_PASSWORD"));
    }

    #[test]
    fn test_unresolved_reference_display() {
        let err = TemplateError::UnresolvedReference {
            reference: "HOST".to_string(),
        };
        assert_eq!(err.to_string(), "unresolved parameter reference: ${HOST}");
    }

    #[test]
    fn test_generator_error_display_names_parameter_and_pattern() {
        let err = TemplateError::InvalidGeneratorExpression {
            parameter: "TOKEN".to_string(),
            source: GeneratorError::new("", vec![Diagnostic::Empty]),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("parameter TOKEN: invalid generator expression"));
    }
}
