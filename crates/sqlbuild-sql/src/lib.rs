//! SQL engine collaborator
//!
//! This crate handles:
//! - Syntax validation of unit SQL before code generation
//! - Dialect selection from configuration
//! - Query text normalisation for embedding in COPY statements

pub mod validator;

pub use validator::{SqlValidator, SqlParserValidator, ValidationError, strip_terminators};
