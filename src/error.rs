use thiserror::Error;

/// Errors raised outside of a validation call.
///
/// Findings about a bundle are never reported through this type; they go
/// into the [`DiagnosticLog`](crate::validation::DiagnosticLog) instead.
#[derive(Error, Debug)]
pub enum BundleValidatorError {
    #[error("Schema error: {message}")]
    Schema { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

impl BundleValidatorError {
    pub fn schema_error(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BundleValidatorError>;
