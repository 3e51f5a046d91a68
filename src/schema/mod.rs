//! Model schema, registry, and template rendering

pub mod model;
pub mod registry;
pub mod template;

pub use model::{
    Application, Choice, FieldDef, FieldKind, ModelDef, ReverseRelation, PK_NAMES,
};
pub use registry::{ModelRegistry, Schema, SchemaError};
pub use template::{
    Template, TemplateError, TemplateLoader, TemplateRenderer, TeraRenderer,
};
