pub mod embedded;
pub mod path;
pub mod schema;
pub mod type_resolver;

pub use embedded::{BUNDLE_CORE_SCHEMAS, embedded_registry};
pub use path::PropertyPath;
pub use schema::{FhirSchema, FhirSchemaElement, SchemaKind, SchemaRegistry};
pub use type_resolver::{ResolvedType, TypeResolver};
