use once_cell::sync::Lazy;

use super::schema::SchemaRegistry;

/// Bundle, its common datatypes and a core set of clinical resources.
pub static BUNDLE_CORE_SCHEMAS: &str = include_str!("../../schemas/bundle-core.json");

static BUNDLE_CORE_REGISTRY: Lazy<SchemaRegistry> = Lazy::new(|| {
    SchemaRegistry::from_json(BUNDLE_CORE_SCHEMAS).unwrap_or_else(|e| {
        tracing::error!("Failed to deserialize embedded bundle schemas: {e}");
        SchemaRegistry::new()
    })
});

/// The embedded schema description, parsed on first use.
pub fn embedded_registry() -> &'static SchemaRegistry {
    &BUNDLE_CORE_REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_registry_parses() {
        let registry = embedded_registry();
        assert!(!registry.is_empty());
        assert!(registry.contains("Bundle"));
        assert!(registry.contains("CodeableConcept"));
        assert!(registry.is_abstract("Resource"));
    }

    #[test]
    fn test_embedded_resource_types() {
        let resources = embedded_registry().resource_types();
        for expected in [
            "Bundle",
            "Condition",
            "Encounter",
            "MedicationRequest",
            "Observation",
            "Organization",
            "Patient",
            "Practitioner",
        ] {
            assert!(resources.contains(&expected), "missing {expected}");
        }
        assert!(!resources.contains(&"DomainResource"));
    }

    #[test]
    fn test_inherited_elements_are_visible() {
        let registry = embedded_registry();
        assert!(registry.element("Patient", "meta").is_some());
        assert!(registry.element("Patient", "text").is_some());
        assert!(registry.element("Bundle", "text").is_none());
    }
}
