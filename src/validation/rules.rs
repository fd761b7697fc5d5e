//! House rules applied to bundle entries after the schema check passed.
//!
//! Entry rules look at the resource root and the entry's `fullUrl`. Node
//! rules run for every object the walker visits and are keyed by the type
//! the [`TypeResolver`] declares for the node's path.

use regex::Regex;
use serde_json::{Map, Value};

use super::diagnostics::{DiagnosticCode, DiagnosticLog};
use crate::error::Result;
use crate::types::{PropertyPath, TypeResolver};

/// `scheme:digits`, e.g. `resource:0`
pub const SHORT_URI_PATTERN: &str = r"^[A-Za-z][A-Za-z0-9+.\-]*:[0-9]+$";

/// Location of a resource inside the bundle: `Bundle.entry[<i>].resource`.
pub fn entry_location(entry_index: usize) -> String {
    format!("Bundle.entry[{entry_index}].resource")
}

/// Location of a node: the entry location plus every path segment after
/// the resource type.
pub fn node_location(entry_index: usize, segments: &[&str]) -> String {
    let mut location = entry_location(entry_index);
    for segment in segments.iter().skip(1) {
        location.push('.');
        location.push_str(segment);
    }
    location
}

/// Entry and node checks. Holds no per-call state, so one instance serves
/// any number of validation calls.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    short_uri: Regex,
}

impl RuleEngine {
    pub fn new() -> Result<Self> {
        Self::with_short_uri_pattern(SHORT_URI_PATTERN)
    }

    /// Use a different pattern for `fullUrl` and `Reference.reference`.
    pub fn with_short_uri_pattern(pattern: &str) -> Result<Self> {
        Ok(Self {
            short_uri: Regex::new(pattern)?,
        })
    }

    pub fn is_short_uri(&self, value: &str) -> bool {
        self.short_uri.is_match(value)
    }

    /// Entry-level rules. Returns the resource when the entry carries one,
    /// so the caller can go on and walk it.
    pub fn check_entry<'e>(
        &self,
        entry: &'e Value,
        entry_index: usize,
        log: &mut DiagnosticLog,
    ) -> Option<&'e Map<String, Value>> {
        let location = entry_location(entry_index);

        let Some(resource) = entry.get("resource").and_then(Value::as_object) else {
            log.error(
                DiagnosticCode::MissingResource,
                format!("Bundle.entry[{entry_index}] is missing a resource"),
                Some(format!("Bundle.entry[{entry_index}]")),
            );
            return None;
        };

        let resource_type = resource
            .get("resourceType")
            .and_then(Value::as_str)
            .unwrap_or("Resource");

        if resource.contains_key("id") {
            log.warn(
                DiagnosticCode::ForbiddenId,
                format!("{resource_type} must not carry .id, use fullUrl to identify the entry"),
                Some(format!("{location}.id")),
            );
        }

        if let Some(meta) = resource.get("meta") {
            let only_security = meta
                .as_object()
                .is_some_and(|meta| !meta.is_empty() && meta.keys().all(|key| key == "security"));
            if !only_security {
                log.warn(
                    DiagnosticCode::ForbiddenMeta,
                    format!("{resource_type}.meta may only contain .security"),
                    Some(format!("{location}.meta")),
                );
            }
        }

        if resource.contains_key("text") {
            log.warn(
                DiagnosticCode::ForbiddenText,
                format!("{resource_type} must not carry a .text narrative"),
                Some(format!("{location}.text")),
            );
        }

        match entry.get("fullUrl") {
            Some(Value::String(full_url)) if self.is_short_uri(full_url) => {}
            Some(other) => {
                log.warn(
                    DiagnosticCode::InvalidFullUrl,
                    format!(
                        "Bundle.entry[{entry_index}].fullUrl {other} does not match scheme:digits"
                    ),
                    Some(format!("Bundle.entry[{entry_index}].fullUrl")),
                );
            }
            None => {
                log.warn(
                    DiagnosticCode::InvalidFullUrl,
                    format!("Bundle.entry[{entry_index}] is missing fullUrl"),
                    Some(format!("Bundle.entry[{entry_index}].fullUrl")),
                );
            }
        }

        Some(resource)
    }

    /// Node-level rules for one visited object.
    pub fn check_node(
        &self,
        resolver: &TypeResolver,
        node: &Map<String, Value>,
        path: &PropertyPath<'_>,
        entry_index: usize,
        log: &mut DiagnosticLog,
    ) {
        let segments = path.segments();
        let resolved = resolver.resolve(&segments);
        let Some(type_name) = resolved.as_str() else {
            return;
        };

        let dotted = || segments.join(".");
        match type_name {
            "CodeableConcept" if node.contains_key("text") => {
                log.warn(
                    DiagnosticCode::CodeableConceptText,
                    format!("CodeableConcept at {} must not carry .text, use coding", dotted()),
                    Some(format!("{}.text", node_location(entry_index, &segments))),
                );
            }
            "Coding" if node.contains_key("display") => {
                log.warn(
                    DiagnosticCode::CodingDisplay,
                    format!("Coding at {} must not carry .display, use code and system", dotted()),
                    Some(format!("{}.display", node_location(entry_index, &segments))),
                );
            }
            "Reference" => {
                let Some(reference) = node.get("reference") else {
                    return;
                };
                if !reference.as_str().is_some_and(|r| self.is_short_uri(r)) {
                    log.warn(
                        DiagnosticCode::InvalidReference,
                        format!(
                            "Reference at {} has reference {reference}, expected scheme:digits",
                            dotted()
                        ),
                        Some(format!("{}.reference", node_location(entry_index, &segments))),
                    );
                }
            }
            _ => {}
        }
    }
}
