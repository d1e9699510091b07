//! SQL validation using datafusion-sqlparser-rs
//!
//! Parses unit SQL without executing it. A unit is valid when it holds exactly
//! one query, since generated programs wrap it in `COPY (<query>) TO ...`.

use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, DuckDbDialect, GenericDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer, Whitespace};
use sqlbuild_core::{DialectConfig, Diagnostic, DiagnosticCode, Location};
use std::path::{Path, PathBuf};

/// Syntax validation: parse or prepare, never execute
pub trait SqlValidator {
    /// Validate SQL text; the error carries the engine's diagnostic verbatim
    fn validate(&self, sql: &str) -> Result<(), ValidationError>;
}

/// SQL rejected by the engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("SQL validation failed: {message}")]
pub struct ValidationError {
    /// Engine diagnostic, unmodified
    pub message: String,

    /// Source file path
    pub file_path: Option<PathBuf>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file_path: None,
        }
    }

    /// Attach the file the SQL came from
    pub fn with_file(mut self, path: &Path) -> Self {
        self.file_path = Some(path.to_path_buf());
        self
    }

    /// Convert to a sqlbuild diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(DiagnosticCode::SqlValidationError, self.to_string())
            .with_detail(self.message.clone());

        if let Some(path) = &self.file_path {
            diag = diag.with_location(Location::new(path.display().to_string()));
        }

        diag
    }
}

/// Validator backed by sqlparser with a configurable dialect
pub struct SqlParserValidator {
    dialect: Box<dyn Dialect>,
}

impl SqlParserValidator {
    /// Create a validator for DuckDB SQL
    pub fn new() -> Self {
        Self {
            dialect: Box::new(DuckDbDialect {}),
        }
    }

    /// Create a validator for PostgreSQL
    pub fn postgres() -> Self {
        Self {
            dialect: Box::new(PostgreSqlDialect {}),
        }
    }

    /// Create a validator for generic ANSI SQL
    pub fn ansi() -> Self {
        Self {
            dialect: Box::new(GenericDialect {}),
        }
    }

    /// Create a validator from a dialect config
    pub fn from_dialect(dialect: &DialectConfig) -> Self {
        match dialect {
            DialectConfig::DuckDb => Self::new(),
            DialectConfig::Postgres => Self::postgres(),
            DialectConfig::Ansi => Self::ansi(),
        }
    }
}

impl Default for SqlParserValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlValidator for SqlParserValidator {
    fn validate(&self, sql: &str) -> Result<(), ValidationError> {
        let statements = Parser::parse_sql(&*self.dialect, sql)
            .map_err(|e| ValidationError::new(e.to_string()))?;

        match statements.as_slice() {
            [Statement::Query(_)] => Ok(()),
            [] => Err(ValidationError::new("no SQL statement found")),
            [other] => Err(ValidationError::new(format!(
                "expected a query, found: {}",
                statement_kind(other)
            ))),
            many => Err(ValidationError::new(format!(
                "expected a single query, found {} statements",
                many.len()
            ))),
        }
    }
}

/// First keyword of a statement, for error messages
fn statement_kind(statement: &Statement) -> String {
    statement
        .to_string()
        .split_whitespace()
        .next()
        .unwrap_or("statement")
        .to_uppercase()
}

/// Remove trailing `;`, whitespace and comments so the query can sit inside `COPY (...)`
///
/// Works on tokens, so a `;` inside a string or followed by a comment is
/// handled correctly. Each trailing token must match the end of the text
/// exactly; otherwise, or when the text does not tokenize, only `;` and
/// whitespace are trimmed.
pub fn strip_terminators(sql: &str) -> &str {
    let tokens = match Tokenizer::new(&DuckDbDialect {}, sql).with_unescape(false).tokenize() {
        Ok(tokens) => tokens,
        Err(_) => return trim_terminator_chars(sql),
    };

    let mut rest = sql;
    for token in tokens.iter().rev() {
        let stripped = match token {
            Token::EOF => Some(rest),
            Token::SemiColon => rest.strip_suffix(';'),
            Token::Whitespace(Whitespace::Newline) => rest
                .strip_suffix("\r\n")
                .or_else(|| rest.strip_suffix('\n'))
                .or_else(|| rest.strip_suffix('\r')),
            Token::Whitespace(whitespace) => rest.strip_suffix(whitespace.to_string().as_str()),
            _ => break,
        };

        match stripped {
            Some(shorter) => rest = shorter,
            None => return trim_terminator_chars(sql),
        }
    }

    rest
}

fn trim_terminator_chars(sql: &str) -> &str {
    sql.trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}
