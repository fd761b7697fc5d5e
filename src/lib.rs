//! # OctoFHIR Bundle Validator
//!
//! Validates FHIR bundles in two passes: a structural check against a
//! FHIR-Schema style type description, then a set of house rules the
//! schema cannot express (no `id`, `meta` or `text` on entry resources,
//! short `scheme:digits` URIs for `fullUrl` and references, coded values
//! without free text).
//!
//! ## Building blocks
//!
//! - [`walk`]: pre-order traversal of a JSON tree with property paths
//! - [`TypeResolver`]: maps `Patient.maritalStatus` style paths to declared types
//! - [`RuleEngine`]: entry and node checks keyed by resolved type
//! - [`BundleValidator`]: runs everything and collects a [`ValidationResult`]
//!
//! ## Quick Start
//!
//! ```rust
//! use octofhir_bundle_validator::{BundleValidator, DiagnosticCode, ValidatorConfig};
//!
//! # fn example() -> octofhir_bundle_validator::Result<()> {
//! let validator = BundleValidator::with_embedded_schemas(ValidatorConfig::default())?;
//! let result = validator.validate(r#"{
//!     "resourceType": "Bundle",
//!     "type": "collection",
//!     "entry": [{"fullUrl": "resource:0", "resource": {"resourceType": "Patient", "id": "p1"}}]
//! }"#);
//!
//! assert!(!result.failed);
//! assert_eq!(result.with_code(DiagnosticCode::ForbiddenId).count(), 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod core;
pub mod error;
pub mod types;
pub mod validation;
pub mod walker;

pub use crate::core::ValidatorConfig;
pub use error::{BundleValidatorError, Result};
pub use types::{
    FhirSchema, FhirSchemaElement, PropertyPath, ResolvedType, SchemaKind, SchemaRegistry,
    TypeResolver, embedded_registry,
};
pub use validation::{
    BundleValidator, Diagnostic, DiagnosticCode, DiagnosticLog, FhirSchemaValidator, RuleEngine,
    SchemaValidator, Severity, ValidationResult,
};
pub use walker::{count_objects, walk};
