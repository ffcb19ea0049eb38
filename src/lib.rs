//! Template Processor - resolves parameterized templates into configs
//!
//! This library provides a generator-expression parser, a parameter resolver and
//! the substitution and labeling passes that turn a [`Template`] into a [`Config`].
//!
//! # Example
//!
//! ```rust
//! use template_processor::{process, Parameter, Service, Template};
//!
//! let template = Template::new("web")
//!     .with_parameter(Parameter::new("NAME").with_value("frontend"))
//!     .with_object(Service::new("${NAME}"))
//!     .with_object_label("app", "web");
//!
//! let config = process(&template).unwrap();
//! let service = config.item::<Service>(0).unwrap();
//! assert_eq!(service.metadata.name, "frontend");
//! assert_eq!(service.metadata.labels["app"], "web");
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod generator;
pub mod template;

pub use codec::CodecError;
pub use config::{ConfigError, ProcessorConfig};
pub use error::{Diagnostic, GeneratorError};
pub use generator::GeneratorExpression;
pub use template::{
    Config, Container, Definition, GenericObject, Labels, Object, ObjectMeta, Parameter, Pod,
    Service, Template, TemplateError, UnresolvedReferencePolicy,
};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::info;

/// Errors that can occur in the document pipeline
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Error reading the input document
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Error processing the template
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Processes templates according to a [`ProcessorConfig`]
///
/// A processor holds no mutable state and can be shared between threads. Each
/// call gets its own random number generator.
#[derive(Debug, Clone, Default)]
pub struct Processor {
    config: ProcessorConfig,
}

impl Processor {
    pub fn new(config: ProcessorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Process an object, rejecting anything that is not a [`Template`]
    pub fn process(&self, object: &dyn Object) -> Result<Config, TemplateError> {
        self.process_with_rng(object, &mut self.rng())
    }

    /// Process an object drawing generated values from `rng`
    pub fn process_with_rng<R: Rng + ?Sized>(
        &self,
        object: &dyn Object,
        rng: &mut R,
    ) -> Result<Config, TemplateError> {
        let template = object.as_any().downcast_ref::<Template>().ok_or_else(|| {
            TemplateError::InvalidInputType {
                kind: object.kind().to_string(),
            }
        })?;
        self.process_template(template, rng)
    }

    /// Resolve, substitute, label and assemble in that order.
    ///
    /// The template is not modified. The first failure aborts processing.
    pub fn process_template<R: Rng + ?Sized>(
        &self,
        template: &Template,
        rng: &mut R,
    ) -> Result<Config, TemplateError> {
        let values =
            template::resolve_parameters(&template.parameters, &self.config.resolution_context(), rng)?;

        let definitions =
            template::substitute(&template.objects, &values, self.config.unresolved_references)?;

        let mut labels = self.config.labels.clone();
        labels.extend(template.object_labels.clone());
        let definitions = template::apply_labels(definitions, &labels);

        let mut config = template::assemble(definitions);
        config.metadata.name = template.metadata.name.clone();

        info!(
            template = template.name(),
            parameters = values.len(),
            items = config.items.len(),
            "processed template"
        );
        Ok(config)
    }

    /// Decode a JSON or YAML document and process it
    pub fn process_document(&self, source: &str) -> Result<Config, ProcessError> {
        let object = codec::from_yaml_str(source)?;
        Ok(self.process(object.as_ref())?)
    }
}

/// Process an object with default configuration
///
/// This is the main entry point for the library.
pub fn process(object: &dyn Object) -> Result<Config, TemplateError> {
    Processor::default().process(object)
}
