use octofhir_bundle_validator::*;
use serde_json::{Value, json};

#[allow(dead_code)]
pub fn quiet_validator() -> BundleValidator {
    BundleValidator::with_embedded_schemas(ValidatorConfig::default().without_document_dump())
        .unwrap()
}

/// Wrap resources into a collection bundle with `resource:<i>` full URLs.
#[allow(dead_code)]
pub fn create_bundle(resources: Vec<Value>) -> Value {
    let entries: Vec<Value> = resources
        .into_iter()
        .enumerate()
        .map(|(index, resource)| json!({"fullUrl": format!("resource:{index}"), "resource": resource}))
        .collect();
    json!({
        "resourceType": "Bundle",
        "type": "collection",
        "entry": entries
    })
}

#[allow(dead_code)]
pub fn create_clean_patient() -> Value {
    json!({
        "resourceType": "Patient",
        "identifier": [{"system": "urn:oid:1.2.36.146.595.217.0.1", "value": "12345"}],
        "name": [{"family": "Chalmers", "given": ["Peter", "James"]}],
        "gender": "male",
        "birthDate": "1974-12-25",
        "maritalStatus": {
            "coding": [{"system": "http://terminology.hl7.org/CodeSystem/v3-MaritalStatus", "code": "M"}]
        },
        "managingOrganization": {"reference": "resource:1"}
    })
}

#[allow(dead_code)]
pub fn create_clean_observation() -> Value {
    json!({
        "resourceType": "Observation",
        "status": "final",
        "code": {"coding": [{"system": "http://loinc.org", "code": "8867-4"}]},
        "subject": {"reference": "resource:0"},
        "valueQuantity": {"value": 72, "unit": "/min"}
    })
}

#[allow(dead_code)]
pub fn to_text(document: &Value) -> String {
    serde_json::to_string_pretty(document).unwrap()
}

#[allow(dead_code)]
pub fn codes(result: &ValidationResult) -> Vec<DiagnosticCode> {
    result.diagnostics.iter().map(|d| d.code).collect()
}

/// Codes without the trailing summary diagnostics.
#[allow(dead_code)]
pub fn finding_codes(result: &ValidationResult) -> Vec<DiagnosticCode> {
    result
        .diagnostics
        .iter()
        .map(|d| d.code)
        .filter(|code| !matches!(code, DiagnosticCode::Validated | DiagnosticCode::DocumentDump))
        .collect()
}
