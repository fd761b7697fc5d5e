use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BundleValidatorError, Result};

/// Settings for a [`BundleValidator`](crate::validation::BundleValidator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidatorConfig {
    /// When set, the raw input text is written here before validation.
    pub debug_output_path: Option<PathBuf>,
    /// Append a debug diagnostic holding the whole document after a run.
    pub dump_document: bool,
    /// Schema type the whole document is checked against.
    pub bundle_type: String,
    /// Overrides the `scheme:digits` pattern for `fullUrl` and references.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_uri_pattern: Option<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            debug_output_path: None,
            dump_document: true,
            bundle_type: "Bundle".to_string(),
            short_uri_pattern: None,
        }
    }
}

impl ValidatorConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn with_debug_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_output_path = Some(path.into());
        self
    }

    pub fn without_document_dump(mut self) -> Self {
        self.dump_document = false;
        self
    }

    pub fn with_short_uri_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.short_uri_pattern = Some(pattern.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.bundle_type.trim().is_empty() {
            return Err(BundleValidatorError::config_error("bundleType must not be empty"));
        }
        if self.short_uri_pattern.as_deref().is_some_and(str::is_empty) {
            return Err(BundleValidatorError::config_error(
                "shortUriPattern must not be empty",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ValidatorConfig::default();
        assert!(config.debug_output_path.is_none());
        assert!(config.dump_document);
        assert_eq!(config.bundle_type, "Bundle");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ValidatorConfig::from_json(r#"{"debugOutputPath": "/tmp/raw.json"}"#).unwrap();
        assert_eq!(config.debug_output_path, Some(PathBuf::from("/tmp/raw.json")));
        assert!(config.dump_document);
        assert_eq!(config.bundle_type, "Bundle");
    }

    #[test]
    fn test_builder_methods() {
        let config = ValidatorConfig::default()
            .with_debug_output("raw.json")
            .without_document_dump();
        assert_eq!(config.debug_output_path, Some(PathBuf::from("raw.json")));
        assert!(!config.dump_document);
    }

    #[test]
    fn test_config_validation() {
        let err = ValidatorConfig::from_json(r#"{"bundleType": " "}"#).unwrap_err();
        assert!(matches!(err, BundleValidatorError::Config { .. }));

        let config = ValidatorConfig::default().with_short_uri_pattern("");
        assert!(config.validate().is_err());

        let config = ValidatorConfig::from_json(r#"{"shortUriPattern": "^urn:[0-9]+$"}"#).unwrap();
        assert_eq!(config.short_uri_pattern.as_deref(), Some("^urn:[0-9]+$"));
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(ValidatorConfig::from_json("[1, 2").is_err());
    }
}
