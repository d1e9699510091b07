//! Dependency discovery and ordering
//!
//! This crate handles:
//! - Extracting CSV dependencies from SQL text
//! - Discovering the units of a build directory
//! - Building the dependency graph (DAG) between units
//! - Resolving a cycle-free build order

pub mod extractor;
pub mod dag;
pub mod discovery;

pub use extractor::{DependencyExtractor, CsvLiteralExtractor};
pub use dag::{DependencyGraph, NodeId, CycleError};
pub use discovery::{UnitGraph, GraphError};
