//! Diagnostic codes and error reporting
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they appear in build reports.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Discovery (1xxx)
    /// The build directory contains no SQL sources
    DiscoveryNoUnits,

    /// Two SQL sources normalise to the same unit name
    DiscoveryDuplicateUnit,

    // Graph (2xxx)
    /// The dependency graph contains a cycle
    GraphCycle,

    // Compilation (3xxx)
    /// The SQL engine rejected the unit's SQL text
    SqlValidationError,

    /// The standalone program could not be generated
    CodegenError,

    /// The compiler toolchain exited unsuccessfully
    ToolchainFailed,

    // Execution (4xxx)
    /// A compiled artifact exited unsuccessfully
    ExecutionFailed,

    // General (9xxx)
    /// Filesystem or process error
    IoError,

    /// General informational message
    Info,

    /// General warning message
    Warning,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DiscoveryNoUnits => "DISCOVERY_NO_UNITS",
            Self::DiscoveryDuplicateUnit => "DISCOVERY_DUPLICATE_UNIT",
            Self::GraphCycle => "GRAPH_CYCLE",
            Self::SqlValidationError => "SQL_VALIDATION_ERROR",
            Self::CodegenError => "CODEGEN_ERROR",
            Self::ToolchainFailed => "TOOLCHAIN_FAILED",
            Self::ExecutionFailed => "EXECUTION_FAILED",
            Self::IoError => "IO_ERROR",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - should be reviewed but not blocking
    Warn,

    /// Error - stops the pipeline
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source location in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// File path
    pub file: String,
}

impl Location {
    /// Create a new location with just a file path
    pub fn new(file: impl Into<String>) -> Self {
        Self { file: file.into() }
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Unit the diagnostic belongs to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Source location (best-effort)
    pub location: Option<Location>,

    /// Verbatim output of the failing collaborator (SQL engine, compiler, artifact)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Units that were not reached because of this issue
    pub impact: Vec<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            unit: None,
            location: None,
            detail: None,
            impact: Vec::new(),
        }
    }

    /// Shorthand for an error-severity diagnostic
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Error, message)
    }

    /// Set the owning unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Attach collaborator output
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Set the unreached units
    pub fn with_impact(mut self, impact: Vec<String>) -> Self {
        self.impact = impact;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_code_stability() {
        assert_eq!(DiagnosticCode::GraphCycle.as_str(), "GRAPH_CYCLE");
        assert_eq!(DiagnosticCode::SqlValidationError.as_str(), "SQL_VALIDATION_ERROR");
        assert_eq!(DiagnosticCode::ToolchainFailed.to_string(), "TOOLCHAIN_FAILED");
    }

    #[test]
    fn diagnostic_serialization() {
        let diag = Diagnostic::error(
            DiagnosticCode::SqlValidationError,
            "SQL in 'orders' failed validation",
        )
        .with_unit("orders")
        .with_location(Location::new("pipeline/orders.sql"))
        .with_detail("Expected: an expression, found: FROM");

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("SQL_VALIDATION_ERROR"));
        assert!(json.contains("\"error\""));
        assert!(json.contains("found: FROM"));
    }

    #[test]
    fn optional_fields_are_omitted() {
        let diag = Diagnostic::new(DiagnosticCode::Info, Severity::Info, "nothing to do");
        let json = serde_json::to_string(&diag).unwrap();
        assert!(!json.contains("\"unit\""));
        assert!(!json.contains("\"detail\""));
    }
}
