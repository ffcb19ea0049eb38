//! Template processing
//!
//! A [`Template`] bundles resource definitions with parameters. Processing
//! resolves every parameter, substitutes `${NAME}` references in all string
//! values, stamps the template's labels onto each definition and returns the
//! result as a [`Config`].
//!
//! # Example
//!
//! ```text
//! parameters:
//!   - name: PASSWORD
//!     generate: "[a-zA-Z0-9]{16}"
//! objects:
//!   - kind: Pod
//!     spec:
//!       containers:
//!         - name: db
//!           image: mysql
//!           env:
//!             - name: MYSQL_PASSWORD
//!               value: ${PASSWORD}
//! ```

mod error;
mod kinds;
mod labels;
mod model;
mod resolver;
mod substitute;

pub use error::TemplateError;
pub use kinds::{
    Container, ContainerPort, EnvVar, GenericObject, Pod, PodSpec, Protocol, Service, ServicePort,
    ServiceSpec, SessionAffinity,
};
pub use labels::{add_labels, apply_labels};
pub use model::{
    assemble, Config, Definition, LabelMap, Labels, Object, ObjectMeta, Parameter, Template,
};
pub use resolver::{
    resolve, resolve_parameters, ResolutionContext, ResolvedValues, ValueSource,
};
pub use substitute::{
    substitute, substitute_definition, substitute_str, UnresolvedReferencePolicy,
};
