//! Build report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use serde::{Deserialize, Serialize};
use crate::diagnostic::{Diagnostic, Severity};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// What happened to a unit during an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitAction {
    /// Generated and compiled
    Compiled,

    /// Artifact was newer than the source; nothing done
    UpToDate,

    /// Artifact executed successfully
    Executed,
}

impl std::fmt::Display for UnitAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compiled => write!(f, "compiled"),
            Self::UpToDate => write!(f, "up to date"),
            Self::Executed => write!(f, "executed"),
        }
    }
}

/// One unit's entry in the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRecord {
    /// Unit name
    pub name: String,

    /// Action taken
    pub action: UnitAction,

    /// SHA-256 of the SQL source at the time of the action
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_sha256: Option<String>,
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Total number of diagnostics
    pub total: usize,

    /// Number of errors
    pub errors: usize,

    /// Number of warnings
    pub warnings: usize,

    /// Number of info messages
    pub info: usize,

    /// Units compiled in this invocation
    pub compiled: usize,

    /// Units skipped as up to date
    pub up_to_date: usize,

    /// Units executed in this invocation
    pub executed: usize,
}

/// Build report (report.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Subcommand that produced the report
    pub command: String,

    /// Build directory
    pub directory: String,

    /// Resolved build order (empty when resolution failed)
    pub order: Vec<String>,

    /// Summary statistics
    pub summary: ReportSummary,

    /// Per-unit actions, in the order they happened
    pub units: Vec<UnitRecord>,

    /// All diagnostics
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    /// Create a new empty report
    pub fn new(command: impl Into<String>, directory: impl Into<String>) -> Self {
        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            command: command.into(),
            directory: directory.into(),
            order: Vec::new(),
            summary: ReportSummary::default(),
            units: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Record the resolved build order
    pub fn set_order(&mut self, order: Vec<String>) {
        self.order = order;
    }

    /// Record a unit action
    pub fn add_unit(&mut self, record: UnitRecord) {
        match record.action {
            UnitAction::Compiled => self.summary.compiled += 1,
            UnitAction::UpToDate => self.summary.up_to_date += 1,
            UnitAction::Executed => self.summary.executed += 1,
        }

        self.units.push(record);
    }

    /// Add a diagnostic to the report
    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.summary.errors += 1,
            Severity::Warn => self.summary.warnings += 1,
            Severity::Info => self.summary.info += 1,
        }

        self.summary.total += 1;
        self.diagnostics.push(diagnostic);
    }

    /// Check if the report has any errors
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}
