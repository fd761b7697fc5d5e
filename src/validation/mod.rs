pub mod bundle;
pub mod diagnostics;
pub mod rules;
pub mod schema_validator;

use serde_json::Value;

pub use bundle::BundleValidator;
pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticLog, Severity, ValidationResult};
pub use rules::{RuleEngine, SHORT_URI_PATTERN};
pub use schema_validator::FhirSchemaValidator;

/// Structural check of a JSON value against a named schema type.
///
/// Implementations append their findings to `log`, using `location` as the
/// prefix of every diagnostic location, and report whether the value
/// conformed. The bundle validator relies on nothing else.
pub trait SchemaValidator: Send + Sync {
    fn validate(
        &self,
        type_name: &str,
        value: &Value,
        log: &mut DiagnosticLog,
        location: &str,
    ) -> bool;
}
