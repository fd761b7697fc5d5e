//! Diagnostics produced while validating a bundle.
//!
//! The [`DiagnosticLog`] is append-only: diagnostics are kept in emission
//! order and never changed once pushed. Each diagnostic is mirrored to
//! `tracing` at the matching level.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        };
        f.write_str(label)
    }
}

/// Classification of a diagnostic (rendered `BV<number>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // Document structure
    InvalidJson = 1001,
    TrailingCharacters = 1002,
    MissingEntries = 1003,
    MissingResource = 1004,

    // Schema
    UnknownElement = 2001,
    UnknownSchema = 2002,
    ExpectedArray = 2003,
    UnexpectedArray = 2004,
    WrongType = 2005,
    RequiredElementMissing = 2006,
    ResourceTypeMismatch = 2007,

    // House rules
    ForbiddenId = 3001,
    ForbiddenMeta = 3002,
    ForbiddenText = 3003,
    InvalidFullUrl = 3004,
    CodeableConceptText = 3005,
    CodingDisplay = 3006,
    InvalidReference = 3007,

    // Run summary
    Validated = 9001,
    DocumentDump = 9002,
}

impl DiagnosticCode {
    pub fn number(self) -> u16 {
        self as u16
    }

    pub fn is_schema_violation(self) -> bool {
        (2000..3000).contains(&self.number())
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BV{}", self.number())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " (at {location})")?;
        }
        Ok(())
    }
}

/// Append-only diagnostic sink shared by every stage of a validation call.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticLog {
    diagnostics: Vec<Diagnostic>,
    failed: bool,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) -> &mut Self {
        let location = diagnostic.location.as_deref().unwrap_or("-");
        match diagnostic.severity {
            Severity::Debug => {
                tracing::debug!(code = %diagnostic.code, location, "{}", diagnostic.message)
            }
            Severity::Info => {
                tracing::info!(code = %diagnostic.code, location, "{}", diagnostic.message)
            }
            Severity::Warning => {
                tracing::warn!(code = %diagnostic.code, location, "{}", diagnostic.message)
            }
            Severity::Error | Severity::Fatal => {
                tracing::error!(code = %diagnostic.code, location, "{}", diagnostic.message)
            }
        }
        if diagnostic.severity == Severity::Fatal {
            self.failed = true;
        }
        self.diagnostics.push(diagnostic);
        self
    }

    pub fn debug(&mut self, code: DiagnosticCode, message: impl Into<String>) -> &mut Self {
        self.push(Diagnostic::new(Severity::Debug, code, message))
    }

    pub fn info(&mut self, code: DiagnosticCode, message: impl Into<String>) -> &mut Self {
        self.push(Diagnostic::new(Severity::Info, code, message))
    }

    pub fn warn(
        &mut self,
        code: DiagnosticCode,
        message: impl Into<String>,
        location: Option<String>,
    ) -> &mut Self {
        let mut diagnostic = Diagnostic::new(Severity::Warning, code, message);
        diagnostic.location = location;
        self.push(diagnostic)
    }

    pub fn error(
        &mut self,
        code: DiagnosticCode,
        message: impl Into<String>,
        location: Option<String>,
    ) -> &mut Self {
        let mut diagnostic = Diagnostic::new(Severity::Error, code, message);
        diagnostic.location = location;
        self.push(diagnostic)
    }

    /// Append a fatal diagnostic; the log is marked as failed.
    pub fn fatal(
        &mut self,
        code: DiagnosticCode,
        message: impl Into<String>,
        location: Option<String>,
    ) -> &mut Self {
        let mut diagnostic = Diagnostic::new(Severity::Fatal, code, message);
        diagnostic.location = location;
        self.push(diagnostic)
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Outcome of one bundle validation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// The parsed document; `None` when the input was not JSON.
    pub document: Option<Value>,
    pub diagnostics: Vec<Diagnostic>,
    pub failed: bool,

    /// Summary statistics
    pub fatal_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
}

impl ValidationResult {
    pub fn from_log(document: Option<Value>, log: DiagnosticLog) -> Self {
        let failed = log.is_failed();
        let diagnostics = log.into_diagnostics();
        let count = |severity: Severity| diagnostics.iter().filter(|d| d.severity == severity).count();

        Self {
            fatal_count: count(Severity::Fatal),
            error_count: count(Severity::Error),
            warning_count: count(Severity::Warning),
            document,
            diagnostics,
            failed,
        }
    }

    /// No fatal diagnostics and no errors.
    pub fn is_valid(&self) -> bool {
        !self.failed && self.error_count == 0
    }

    pub fn issues_at(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.severity == severity)
    }

    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.code == code)
    }
}
