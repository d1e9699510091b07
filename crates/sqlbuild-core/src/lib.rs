//! sqlbuild Core
//!
//! Core domain model shared by every sqlbuild crate.
//! Never rename diagnostic codes - they are part of the report format.

pub mod diagnostic;
pub mod unit;
pub mod report;
pub mod config;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity, Location};
pub use unit::{Unit, SOURCE_EXTENSION, PROGRAM_EXTENSION, OUTPUT_EXTENSION};
pub use report::{Report, ReportVersion, ReportSummary, UnitAction, UnitRecord};
pub use config::{Config, ConfigError, DialectConfig, ToolchainConfig, SqlConfig, CONFIG_FILE_NAME};
