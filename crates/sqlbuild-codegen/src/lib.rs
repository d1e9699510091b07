//! Standalone program generation for build units
//!
//! This crate handles:
//! - Encoding query text and paths as C++ string literals
//! - Rendering the DuckDB `COPY ... TO` program from a template
//! - Writing the generated program next to the unit's SQL source

pub mod literal;
pub mod program;

pub use literal::{cpp_string_literal, sql_string_literal};
pub use program::{ProgramGenerator, GeneratedProgram, CodegenError};
