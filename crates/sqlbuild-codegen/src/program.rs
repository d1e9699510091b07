//! Generated program rendering
//!
//! Each unit compiles to a small DuckDB client whose only job is to run
//! `COPY (<query>) TO '<unit>.csv' WITH (FORMAT CSV, HEADER)` and report the
//! engine error, if any, on stderr with a non-zero exit status.

use crate::literal::{cpp_string_literal, sql_string_literal};
use minijinja::Environment;
use serde::Serialize;
use sqlbuild_core::{Diagnostic, DiagnosticCode, Location, Unit};
use sqlbuild_sql::strip_terminators;
use std::path::PathBuf;

const PROGRAM_TEMPLATE: &str = r#"// Generated by sqlbuild. Do not edit; regenerated on every compile.
#include <duckdb.hpp>
#include <iostream>
#include <string>

int main() {
    const char *unit = {{ unit }};

    duckdb::DuckDB db(nullptr);
    duckdb::Connection con(db);

    const std::string query =
        {{ query }};

    const std::string copy_sql =
        "COPY (\n" + query + "\n) TO " + {{ output }} + " WITH (FORMAT CSV, HEADER)";

    auto result = con.Query(copy_sql);
    if (result->HasError()) {
        std::cerr << unit << ": " << result->GetError() << std::endl;
        return 1;
    }
    return 0;
}
"#;

/// Template inputs; every value is an already-encoded C++ literal
#[derive(Debug, Serialize)]
struct ProgramContext {
    unit: String,
    query: String,
    output: String,
}

/// Error during program generation
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("template render error: {0}")]
    Render(#[from] minijinja::Error),

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CodegenError {
    /// Convert to sqlbuild diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(DiagnosticCode::CodegenError, self.to_string());

        match self {
            CodegenError::Io { path, .. } => {
                diag.with_location(Location::new(path.display().to_string()))
            }
            CodegenError::Render(_) => diag,
        }
    }
}

/// A rendered program for one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedProgram {
    /// Where the program is (or will be) written
    pub path: PathBuf,

    /// Program source text
    pub source: String,

    /// CSV the program writes when run
    pub output_path: PathBuf,
}

/// Renders and writes generated programs
pub struct ProgramGenerator {
    env: Environment<'static>,
}

impl ProgramGenerator {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        Self { env }
    }

    /// Render the program for `unit` running `sql`
    pub fn render(&self, unit: &Unit, sql: &str) -> Result<GeneratedProgram, CodegenError> {
        let output_path = unit.output_path();

        let context = ProgramContext {
            unit: cpp_string_literal(&unit.name),
            query: cpp_string_literal(strip_terminators(sql)),
            output: cpp_string_literal(&sql_string_literal(&output_path.display().to_string())),
        };

        let source = self.env.render_str(PROGRAM_TEMPLATE, &context)?;

        Ok(GeneratedProgram {
            path: unit.program_path(),
            source,
            output_path,
        })
    }

    /// Render and write the program next to the unit's SQL source
    pub fn write(&self, unit: &Unit, sql: &str) -> Result<GeneratedProgram, CodegenError> {
        let program = self.render(unit, sql)?;

        std::fs::write(&program.path, &program.source).map_err(|source| CodegenError::Io {
            path: program.path.clone(),
            source,
        })?;

        Ok(program)
    }
}

impl Default for ProgramGenerator {
    fn default() -> Self {
        Self::new()
    }
}
