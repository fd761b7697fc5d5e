//! Orchestration of one bundle validation call.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::diagnostics::{DiagnosticCode, DiagnosticLog, ValidationResult};
use super::rules::{RuleEngine, entry_location};
use super::schema_validator::FhirSchemaValidator;
use super::SchemaValidator;
use crate::core::ValidatorConfig;
use crate::error::Result;
use crate::types::{PropertyPath, SchemaRegistry, TypeResolver, embedded_registry};
use crate::walker::walk;

/// Validates bundle documents: schema first, then the house rules for every
/// entry.
///
/// Immutable after construction; share it freely between threads.
pub struct BundleValidator {
    config: ValidatorConfig,
    schema_validator: Arc<dyn SchemaValidator>,
    resolver: TypeResolver,
    rules: RuleEngine,
}

impl BundleValidator {
    /// Validator over `registry`, with [`FhirSchemaValidator`] as the schema step.
    pub fn new(registry: SchemaRegistry, config: ValidatorConfig) -> Result<Self> {
        let resolver = TypeResolver::new(&registry);
        let schema_validator = FhirSchemaValidator::new(Arc::new(registry));
        Self::build(config, Arc::new(schema_validator), resolver)
    }

    /// Validator over the schemas shipped with the crate.
    pub fn with_embedded_schemas(config: ValidatorConfig) -> Result<Self> {
        Self::new(embedded_registry().clone(), config)
    }

    /// Plug in a different schema step. Types for the node rules still come
    /// from `registry`.
    pub fn with_schema_validator(
        registry: &SchemaRegistry,
        schema_validator: Arc<dyn SchemaValidator>,
        config: ValidatorConfig,
    ) -> Result<Self> {
        Self::build(config, schema_validator, TypeResolver::new(registry))
    }

    fn build(
        config: ValidatorConfig,
        schema_validator: Arc<dyn SchemaValidator>,
        resolver: TypeResolver,
    ) -> Result<Self> {
        config.validate()?;
        let rules = match &config.short_uri_pattern {
            Some(pattern) => RuleEngine::with_short_uri_pattern(pattern)?,
            None => RuleEngine::new()?,
        };
        Ok(Self {
            config,
            schema_validator,
            resolver,
            rules,
        })
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn resolver(&self) -> &TypeResolver {
        &self.resolver
    }

    /// Validate one bundle given as JSON text.
    ///
    /// Never fails: every finding, including unparseable input, ends up as a
    /// diagnostic in the returned result.
    pub fn validate(&self, text: &str) -> ValidationResult {
        let mut log = DiagnosticLog::new();

        let trimmed = text.trim();
        if trimmed.len() != text.len() {
            log.warn(
                DiagnosticCode::TrailingCharacters,
                format!(
                    "Input has {} leading or trailing whitespace byte(s); they were ignored",
                    text.len() - trimmed.len()
                ),
                None,
            );
        }

        self.write_debug_output(text);

        let document: Value = match serde_json::from_str(trimmed) {
            Ok(document) => document,
            Err(e) => {
                log.fatal(
                    DiagnosticCode::InvalidJson,
                    format!("Input is not valid JSON: {e}"),
                    None,
                );
                return ValidationResult::from_log(None, log);
            }
        };

        let bundle_type = self.config.bundle_type.as_str();
        if !self
            .schema_validator
            .validate(bundle_type, &document, &mut log, bundle_type)
        {
            tracing::debug!("Schema check of the document failed, skipping entry checks");
            return ValidationResult::from_log(Some(document), log);
        }

        let entry_count = match document.get("entry") {
            Some(Value::Array(entries)) if !entries.is_empty() => {
                for (index, entry) in entries.iter().enumerate() {
                    self.validate_entry(index, entry, &mut log);
                }
                entries.len()
            }
            _ => {
                log.fatal(
                    DiagnosticCode::MissingEntries,
                    format!("{bundle_type}.entry must be a non-empty array"),
                    Some(format!("{bundle_type}.entry")),
                );
                return ValidationResult::from_log(Some(document), log);
            }
        };

        log.info(
            DiagnosticCode::Validated,
            format!("Validated {bundle_type} with {entry_count} entries"),
        );
        if self.config.dump_document {
            let dump = serde_json::to_string_pretty(&document)
                .unwrap_or_else(|_| document.to_string());
            log.debug(DiagnosticCode::DocumentDump, dump);
        }

        ValidationResult::from_log(Some(document), log)
    }

    fn validate_entry(&self, index: usize, entry: &Value, log: &mut DiagnosticLog) {
        tracing::debug!("Checking Bundle.entry[{index}]");

        let resource = entry.get("resource").filter(|resource| resource.is_object());
        let resource_type = resource
            .and_then(|resource| resource.get("resourceType"))
            .and_then(Value::as_str)
            .unwrap_or_default();

        if let Some(resource) = resource
            && !self
                .schema_validator
                .validate(resource_type, resource, log, &entry_location(index))
        {
            tracing::debug!("Bundle.entry[{index}] does not conform to {resource_type}");
        }

        if self.rules.check_entry(entry, index, log).is_none() {
            return;
        }
        let Some(resource) = resource else {
            return;
        };

        let root = PropertyPath::root();
        let start = root.child(resource_type);
        walk(resource, &start, &mut |node, path| {
            self.rules.check_node(&self.resolver, node, path, index, log);
        });
    }

    fn write_debug_output(&self, text: &str) {
        let Some(path) = &self.config.debug_output_path else {
            return;
        };
        match std::fs::write(path, text) {
            Ok(()) => tracing::debug!("Wrote raw input to {}", path.display()),
            Err(e) => tracing::warn!("Failed to write debug output to {}: {e}", path.display()),
        }
    }
}

impl fmt::Debug for BundleValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleValidator")
            .field("config", &self.config)
            .field("resolver", &self.resolver)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::diagnostics::Severity;

    fn validator() -> BundleValidator {
        BundleValidator::with_embedded_schemas(ValidatorConfig::default().without_document_dump())
            .unwrap()
    }

    fn codes(result: &ValidationResult) -> Vec<DiagnosticCode> {
        result.diagnostics.iter().map(|d| d.code).collect()
    }

    #[test]
    fn test_clean_bundle() {
        let text = r#"{
            "resourceType": "Bundle",
            "type": "collection",
            "entry": [
                {"fullUrl": "resource:0", "resource": {"resourceType": "Patient", "gender": "female"}}
            ]
        }"#;
        let result = validator().validate(text);
        assert_eq!(codes(&result), vec![DiagnosticCode::Validated]);
        assert!(result.is_valid());
        assert!(result.document.is_some());
    }

    #[test]
    fn test_document_dump_is_last() {
        let validator = BundleValidator::with_embedded_schemas(ValidatorConfig::default()).unwrap();
        let text = r#"{"resourceType": "Bundle", "type": "collection",
            "entry": [{"fullUrl": "resource:0", "resource": {"resourceType": "Patient"}}]}"#;
        let result = validator.validate(text);
        let last = result.diagnostics.last().unwrap();
        assert_eq!(last.code, DiagnosticCode::DocumentDump);
        assert_eq!(last.severity, Severity::Debug);
        assert!(last.message.contains("\"resourceType\": \"Bundle\""));
    }

    #[test]
    fn test_schema_failure_stops_before_entries() {
        let text = r#"{"resourceType": "Bundle", "entry": [{"resource": {"resourceType": "Patient", "id": "x"}}]}"#;
        let result = validator().validate(text);
        assert_eq!(codes(&result), vec![DiagnosticCode::RequiredElementMissing]);
        assert!(result.failed);
        assert!(result.document.is_some());
    }

    #[test]
    fn test_entry_schema_failure_still_runs_node_rules() {
        let text = r#"{
            "resourceType": "Bundle",
            "type": "collection",
            "entry": [
                {"fullUrl": "resource:0", "resource": {"resourceType": "Patient", "hairColour": "red",
                    "maritalStatus": {"text": "M"}}},
                {"fullUrl": "resource:1", "resource": {"resourceType": "Patient",
                    "maritalStatus": {"text": "M"}}}
            ]
        }"#;
        let result = validator().validate(text);
        assert_eq!(
            codes(&result),
            vec![
                DiagnosticCode::UnknownElement,
                DiagnosticCode::CodeableConceptText,
                DiagnosticCode::CodeableConceptText,
                DiagnosticCode::Validated,
            ]
        );
        assert_eq!(
            result.diagnostics[1].location.as_deref(),
            Some("Bundle.entry[0].resource.maritalStatus.text")
        );
        assert_eq!(
            result.diagnostics[2].location.as_deref(),
            Some("Bundle.entry[1].resource.maritalStatus.text")
        );
        assert!(result.failed);
    }

    #[test]
    fn test_invalid_short_uri_pattern_is_rejected() {
        let config = ValidatorConfig {
            short_uri_pattern: Some("[unclosed".to_string()),
            ..ValidatorConfig::default()
        };
        assert!(BundleValidator::with_embedded_schemas(config).is_err());
    }

    struct AcceptEverything;

    impl SchemaValidator for AcceptEverything {
        fn validate(&self, _: &str, _: &Value, _: &mut DiagnosticLog, _: &str) -> bool {
            true
        }
    }

    #[test]
    fn test_custom_schema_validator() {
        let validator = BundleValidator::with_schema_validator(
            embedded_registry(),
            Arc::new(AcceptEverything),
            ValidatorConfig::default().without_document_dump(),
        )
        .unwrap();
        let text = r#"{"entry": [{"fullUrl": "resource:0", "resource": {"resourceType": "Patient", "anything": 1}}]}"#;
        let result = validator.validate(text);
        assert_eq!(codes(&result), vec![DiagnosticCode::Validated]);
    }
}
