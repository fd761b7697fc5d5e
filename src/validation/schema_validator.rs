//! Structural validation of JSON values against a [`SchemaRegistry`].
//!
//! This is the schema step that runs before any house rule. It checks
//! element names, array versus single values, primitive JSON kinds and
//! required elements. Values typed with an abstract type (`Resource`) are
//! polymorphic: only their `resourceType` is checked here and their content
//! is left to a separate call against the concrete type.

use serde_json::{Map, Value};
use std::sync::Arc;

use super::SchemaValidator;
use super::diagnostics::{DiagnosticCode, DiagnosticLog};
use crate::types::{FhirSchemaElement, SchemaRegistry};

/// Where element definitions for the current object come from.
#[derive(Clone, Copy)]
enum Scope<'a> {
    Type(&'a str),
    Backbone(&'a FhirSchemaElement),
}

impl<'a> Scope<'a> {
    fn element(&self, registry: &'a SchemaRegistry, name: &str) -> Option<&'a FhirSchemaElement> {
        match *self {
            Scope::Type(type_name) => registry.element(type_name, name),
            Scope::Backbone(element) => element.child(name),
        }
    }

    fn required(&self, registry: &'a SchemaRegistry) -> Vec<&'a str> {
        match *self {
            Scope::Type(type_name) => registry.required_elements(type_name),
            Scope::Backbone(element) => element
                .required
                .iter()
                .flatten()
                .map(String::as_str)
                .collect(),
        }
    }
}

/// Per-call state: the shared log plus the number of violations added.
struct SchemaValidationContext<'l> {
    log: &'l mut DiagnosticLog,
    violations: usize,
}

impl SchemaValidationContext<'_> {
    fn add_error(&mut self, code: DiagnosticCode, message: String, location: &str) {
        self.violations += 1;
        self.log.fatal(code, message, Some(location.to_string()));
    }
}

/// [`SchemaValidator`] backed by a static set of FHIR-Schema style definitions.
#[derive(Debug, Clone)]
pub struct FhirSchemaValidator {
    registry: Arc<SchemaRegistry>,
}

impl FhirSchemaValidator {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    fn validate_typed(
        &self,
        context: &mut SchemaValidationContext<'_>,
        type_name: &str,
        value: &Value,
        location: &str,
    ) {
        let Some(schema) = self.registry.get(type_name) else {
            // Types without a definition accept any value.
            return;
        };

        if schema.is_primitive() {
            self.validate_primitive_value(context, type_name, value, location);
            return;
        }

        let Value::Object(object) = value else {
            context.add_error(
                DiagnosticCode::WrongType,
                format!(
                    "Expected {type_name} object, got: {}",
                    json_type_name(value)
                ),
                location,
            );
            return;
        };

        if schema.abstract_type {
            self.validate_polymorphic(context, type_name, object, location);
            return;
        }

        if schema.is_resource() {
            match object.get("resourceType").and_then(Value::as_str) {
                Some(actual) if actual == type_name => {}
                Some(actual) => {
                    context.add_error(
                        DiagnosticCode::ResourceTypeMismatch,
                        format!("Expected resourceType {type_name}, got: {actual}"),
                        location,
                    );
                    return;
                }
                None => {
                    context.add_error(
                        DiagnosticCode::RequiredElementMissing,
                        "Required element resourceType is missing".to_string(),
                        location,
                    );
                    return;
                }
            }
        }

        self.validate_object(context, Scope::Type(type_name), object, location);
    }

    /// Only the type tag of a polymorphic value is checked.
    fn validate_polymorphic(
        &self,
        context: &mut SchemaValidationContext<'_>,
        type_name: &str,
        object: &Map<String, Value>,
        location: &str,
    ) {
        match object.get("resourceType") {
            Some(Value::String(resource_type)) if !resource_type.is_empty() => {
                let known = self
                    .registry
                    .get(resource_type)
                    .is_some_and(|schema| schema.is_resource() && !schema.abstract_type);
                if !known {
                    context.add_error(
                        DiagnosticCode::UnknownSchema,
                        format!("Unknown resource type {resource_type} for {type_name}"),
                        location,
                    );
                }
            }
            Some(other) => {
                context.add_error(
                    DiagnosticCode::WrongType,
                    format!(
                        "Expected non-empty string resourceType, got: {}",
                        json_type_name(other)
                    ),
                    location,
                );
            }
            None => {
                context.add_error(
                    DiagnosticCode::RequiredElementMissing,
                    "Required element resourceType is missing".to_string(),
                    location,
                );
            }
        }
    }

    fn validate_object(
        &self,
        context: &mut SchemaValidationContext<'_>,
        scope: Scope<'_>,
        object: &Map<String, Value>,
        location: &str,
    ) {
        for (key, value) in object {
            if key == "resourceType" && matches!(scope, Scope::Type(_)) {
                continue;
            }

            let element_location = format!("{location}.{key}");

            // Primitive extension siblings: `_birthDate` next to `birthDate`
            if let Some(base) = key.strip_prefix('_')
                && scope.element(&self.registry, base).is_some()
            {
                continue;
            }

            let Some(element) = scope.element(&self.registry, key) else {
                context.add_error(
                    DiagnosticCode::UnknownElement,
                    format!("Element {key} is unknown"),
                    &element_location,
                );
                continue;
            };

            if element.is_choice_base() {
                context.add_error(
                    DiagnosticCode::UnknownElement,
                    format!(
                        "Element {key} is unknown, use one of: {}",
                        element.choices.iter().flatten().cloned().collect::<Vec<_>>().join(", ")
                    ),
                    &element_location,
                );
                continue;
            }

            match (value, element.array) {
                (Value::Array(items), true) => {
                    for (index, item) in items.iter().enumerate() {
                        let item_location = format!("{element_location}[{index}]");
                        self.validate_element_value(context, element, item, &item_location);
                    }
                }
                (Value::Array(_), false) => {
                    context.add_error(
                        DiagnosticCode::UnexpectedArray,
                        "Unexpected array".to_string(),
                        &element_location,
                    );
                }
                (_, true) => {
                    context.add_error(
                        DiagnosticCode::ExpectedArray,
                        format!("Expected array for element at path: {element_location}"),
                        &element_location,
                    );
                }
                (_, false) => {
                    self.validate_element_value(context, element, value, &element_location);
                }
            }
        }

        for required in scope.required(&self.registry) {
            if !object.contains_key(required) {
                context.add_error(
                    DiagnosticCode::RequiredElementMissing,
                    format!("Required element {required} is missing"),
                    location,
                );
            }
        }
    }

    fn validate_element_value(
        &self,
        context: &mut SchemaValidationContext<'_>,
        element: &FhirSchemaElement,
        value: &Value,
        location: &str,
    ) {
        if let Some(type_name) = &element.type_name {
            self.validate_typed(context, type_name, value, location);
            return;
        }

        match value {
            Value::Object(object) => {
                self.validate_object(context, Scope::Backbone(element), object, location)
            }
            other => context.add_error(
                DiagnosticCode::WrongType,
                format!("Expected object, got: {}", json_type_name(other)),
                location,
            ),
        }
    }

    fn validate_primitive_value(
        &self,
        context: &mut SchemaValidationContext<'_>,
        type_name: &str,
        value: &Value,
        location: &str,
    ) {
        if !validate_primitive_type(value, type_name) {
            context.add_error(
                DiagnosticCode::WrongType,
                format!("Expected {type_name}, got: {}", json_type_name(value)),
                location,
            );
        }
    }
}

impl SchemaValidator for FhirSchemaValidator {
    fn validate(
        &self,
        type_name: &str,
        value: &Value,
        log: &mut DiagnosticLog,
        location: &str,
    ) -> bool {
        if !self.registry.contains(type_name) {
            log.fatal(
                DiagnosticCode::UnknownSchema,
                format!("Schema not found: {type_name}"),
                Some(location.to_string()),
            );
            return false;
        }

        let mut context = SchemaValidationContext { log, violations: 0 };
        self.validate_typed(&mut context, type_name, value, location);
        tracing::debug!(
            "Schema check of {location} against {type_name}: {} violation(s)",
            context.violations
        );
        context.violations == 0
    }
}

fn validate_primitive_type(value: &Value, expected_type: &str) -> bool {
    match expected_type {
        "boolean" => value.is_boolean(),
        "integer" => value.is_i64() || value.is_u64(),
        "unsignedInt" => value.is_u64(),
        "positiveInt" => value.as_u64().is_some_and(|n| n > 0),
        "decimal" => value.is_number(),
        "string" | "code" | "uri" | "url" | "canonical" | "base64Binary" | "instant" | "date"
        | "dateTime" | "time" | "oid" | "id" | "markdown" | "uuid" | "xhtml" => value.is_string(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::embedded_registry;
    use crate::validation::diagnostics::Severity;
    use serde_json::json;

    fn validator() -> FhirSchemaValidator {
        FhirSchemaValidator::new(Arc::new(embedded_registry().clone()))
    }

    fn codes(log: &DiagnosticLog) -> Vec<DiagnosticCode> {
        log.diagnostics().iter().map(|d| d.code).collect()
    }

    #[test]
    fn test_primitive_type_validation() {
        assert!(validate_primitive_type(&json!(true), "boolean"));
        assert!(!validate_primitive_type(&json!("true"), "boolean"));
        assert!(validate_primitive_type(&json!(-3), "integer"));
        assert!(!validate_primitive_type(&json!(-3), "unsignedInt"));
        assert!(!validate_primitive_type(&json!(0), "positiveInt"));
        assert!(validate_primitive_type(&json!(1.5), "decimal"));
        assert!(validate_primitive_type(&json!("2024-01-01"), "date"));
        assert!(!validate_primitive_type(&json!(null), "string"));
    }

    #[test]
    fn test_valid_patient_passes() {
        let patient = json!({
            "resourceType": "Patient",
            "identifier": [{"system": "urn:mrn", "value": "123"}],
            "name": [{"family": "Doe", "given": ["Jane"]}],
            "birthDate": "1980-01-01",
            "_birthDate": {"extension": []},
            "active": true
        });
        let mut log = DiagnosticLog::new();
        assert!(validator().validate("Patient", &patient, &mut log, "Patient"));
        assert!(log.is_empty());
    }

    #[test]
    fn test_unknown_element_detection() {
        let patient = json!({"resourceType": "Patient", "favouriteColour": "blue"});
        let mut log = DiagnosticLog::new();
        assert!(!validator().validate("Patient", &patient, &mut log, "Patient"));
        assert_eq!(codes(&log), vec![DiagnosticCode::UnknownElement]);
        assert_eq!(log.diagnostics()[0].location.as_deref(), Some("Patient.favouriteColour"));
        assert_eq!(log.diagnostics()[0].severity, Severity::Fatal);
        assert!(log.is_failed());
    }

    #[test]
    fn test_array_expectations() {
        let patient = json!({
            "resourceType": "Patient",
            "name": {"family": "Doe"},
            "gender": ["female"]
        });
        let mut log = DiagnosticLog::new();
        assert!(!validator().validate("Patient", &patient, &mut log, "Patient"));
        assert_eq!(
            codes(&log),
            vec![DiagnosticCode::ExpectedArray, DiagnosticCode::UnexpectedArray]
        );
    }

    #[test]
    fn test_required_elements_and_backbones() {
        let observation = json!({
            "resourceType": "Observation",
            "code": {"text": "x"},
            "component": [{"valueString": "y"}]
        });
        let mut log = DiagnosticLog::new();
        assert!(!validator().validate("Observation", &observation, &mut log, "Observation"));
        let locations: Vec<_> = log
            .diagnostics()
            .iter()
            .map(|d| (d.code, d.location.clone().unwrap_or_default()))
            .collect();
        assert_eq!(
            locations,
            vec![
                (DiagnosticCode::RequiredElementMissing, "Observation.component[0]".to_string()),
                (DiagnosticCode::RequiredElementMissing, "Observation".to_string()),
            ]
        );
    }

    #[test]
    fn test_choice_base_name_is_rejected() {
        let observation = json!({
            "resourceType": "Observation",
            "status": "final",
            "code": {},
            "value": 3
        });
        let mut log = DiagnosticLog::new();
        assert!(!validator().validate("Observation", &observation, &mut log, "Observation"));
        assert_eq!(codes(&log), vec![DiagnosticCode::UnknownElement]);
    }

    #[test]
    fn test_polymorphic_resource_checks_type_tag_only() {
        let bundle = json!({
            "resourceType": "Bundle",
            "type": "collection",
            "entry": [
                {"fullUrl": "resource:0", "resource": {"resourceType": "Patient", "bogus": 1}},
                {"fullUrl": "resource:1", "resource": {"resourceType": "Spaceship"}}
            ]
        });
        let mut log = DiagnosticLog::new();
        assert!(!validator().validate("Bundle", &bundle, &mut log, "Bundle"));
        assert_eq!(codes(&log), vec![DiagnosticCode::UnknownSchema]);
        assert_eq!(
            log.diagnostics()[0].location.as_deref(),
            Some("Bundle.entry[1].resource")
        );
    }

    #[test]
    fn test_resource_type_mismatch() {
        let mut log = DiagnosticLog::new();
        let valid = validator().validate(
            "Patient",
            &json!({"resourceType": "Observation"}),
            &mut log,
            "Bundle.entry[0].resource",
        );
        assert!(!valid);
        assert_eq!(codes(&log), vec![DiagnosticCode::ResourceTypeMismatch]);
    }

    #[test]
    fn test_unknown_schema() {
        let mut log = DiagnosticLog::new();
        assert!(!validator().validate("Spaceship", &json!({}), &mut log, "Bundle"));
        assert_eq!(codes(&log), vec![DiagnosticCode::UnknownSchema]);
    }

    #[test]
    fn test_wrong_primitive_type() {
        let patient = json!({"resourceType": "Patient", "active": "yes"});
        let mut log = DiagnosticLog::new();
        assert!(!validator().validate("Patient", &patient, &mut log, "Patient"));
        assert_eq!(log.diagnostics()[0].message, "Expected boolean, got: string");
    }
}
