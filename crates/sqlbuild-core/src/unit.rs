//! Build units
//!
//! A unit is one SQL source file plus everything derived from it: the
//! generated program, the compiled artifact and the CSV it produces. All
//! four live side by side in the build directory.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Extension of SQL sources
pub const SOURCE_EXTENSION: &str = "sql";

/// Extension of generated programs
pub const PROGRAM_EXTENSION: &str = "cpp";

/// Extension of the CSV a unit writes when its artifact runs
pub const OUTPUT_EXTENSION: &str = "csv";

/// A named build target backed by one SQL source file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Source file stem, unique within the build directory
    pub name: String,

    /// Location of the SQL text
    pub source_path: PathBuf,

    /// Location of the compiled executable (`<dir>/<name>`)
    pub artifact_path: PathBuf,
}

impl Unit {
    /// Create a unit for a source file, deriving the artifact path from it
    pub fn from_source(name: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        let name = name.into();
        let source_path = source_path.into();
        let artifact_path = source_path.with_file_name(&name);

        Self {
            name,
            source_path,
            artifact_path,
        }
    }

    /// Create a unit named `name` in `directory` with the canonical `.sql` source
    pub fn in_directory(directory: &Path, name: impl Into<String>) -> Self {
        let name = name.into();
        let source_path = directory.join(format!("{}.{}", name, SOURCE_EXTENSION));
        Self::from_source(name, source_path)
    }

    /// Directory holding every file of this unit
    pub fn directory(&self) -> &Path {
        self.source_path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Generated program source (`<dir>/<name>.cpp`)
    pub fn program_path(&self) -> PathBuf {
        self.sibling(PROGRAM_EXTENSION)
    }

    /// CSV written by the artifact at run time (`<dir>/<name>.csv`)
    pub fn output_path(&self) -> PathBuf {
        self.sibling(OUTPUT_EXTENSION)
    }

    // Names may contain dots, so never `with_extension`.
    fn sibling(&self, extension: &str) -> PathBuf {
        self.directory().join(format!("{}.{}", self.name, extension))
    }

    /// Read the SQL text
    pub fn read_source(&self) -> std::io::Result<String> {
        std::fs::read_to_string(&self.source_path)
    }

    /// SHA-256 of the SQL source, hex encoded
    pub fn source_sha256(&self) -> std::io::Result<String> {
        let bytes = std::fs::read(&self.source_path)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
