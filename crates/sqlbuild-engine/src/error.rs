//! Build errors
//!
//! Every variant names the unit it concerns (where there is one) and keeps
//! the collaborator's own output, so the top level can report both.

use sqlbuild_codegen::CodegenError;
use sqlbuild_core::{Diagnostic, DiagnosticCode, Location};
use sqlbuild_graph::GraphError;
use sqlbuild_sql::ValidationError;
use std::path::PathBuf;

/// Errors that stop a build
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("{unit}: {source}")]
    Validation {
        unit: String,
        #[source]
        source: ValidationError,
    },

    #[error("{unit}: {source}")]
    Codegen {
        unit: String,
        #[source]
        source: CodegenError,
    },

    #[error("{unit}: compilation failed: {reason}")]
    Toolchain {
        unit: String,
        reason: String,
        stderr: String,
    },

    #[error("{unit}: execution failed: {reason}")]
    Execution {
        unit: String,
        reason: String,
        stderr: String,
    },

    #[error("{unit}: cannot access {}: {source}", .path.display())]
    Io {
        unit: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub(crate) fn io(unit: &str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            unit: unit.to_string(),
            path: path.into(),
            source,
        }
    }

    /// Unit the error belongs to, if any
    pub fn unit(&self) -> Option<&str> {
        match self {
            BuildError::Graph(GraphError::Cycle(cycle)) => Some(cycle.unit()),
            BuildError::Graph(_) => None,
            BuildError::Validation { unit, .. }
            | BuildError::Codegen { unit, .. }
            | BuildError::Toolchain { unit, .. }
            | BuildError::Execution { unit, .. }
            | BuildError::Io { unit, .. } => Some(unit),
        }
    }

    /// Convert to a sqlbuild diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = match self {
            BuildError::Graph(e) => return e.to_diagnostic(),
            BuildError::Validation { source, .. } => source.to_diagnostic(),
            BuildError::Codegen { source, .. } => source.to_diagnostic(),
            BuildError::Toolchain { stderr, .. } => {
                with_output(Diagnostic::error(DiagnosticCode::ToolchainFailed, self.to_string()), stderr)
            }
            BuildError::Execution { stderr, .. } => {
                with_output(Diagnostic::error(DiagnosticCode::ExecutionFailed, self.to_string()), stderr)
            }
            BuildError::Io { path, .. } => {
                Diagnostic::error(DiagnosticCode::IoError, self.to_string())
                    .with_location(Location::new(path.display().to_string()))
            }
        };

        match self.unit() {
            Some(unit) => Diagnostic {
                message: self.to_string(),
                ..diag.with_unit(unit)
            },
            None => diag,
        }
    }
}

fn with_output(diag: Diagnostic, stderr: &str) -> Diagnostic {
    let stderr = stderr.trim_end();
    if stderr.is_empty() {
        diag
    } else {
        diag.with_detail(stderr)
    }
}
