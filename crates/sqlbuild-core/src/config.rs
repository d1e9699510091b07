//! Configuration schema (sqlbuild.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the build directory and the working directory
pub const CONFIG_FILE_NAME: &str = "sqlbuild.toml";

/// Environment variable overriding `toolchain.compiler`
pub const COMPILER_ENV: &str = "SQLBUILD_COMPILER";

/// SQL dialect used for validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectConfig {
    /// DuckDB, the engine embedded in generated programs
    DuckDb,

    /// PostgreSQL SQL dialect
    Postgres,

    /// Generic ANSI SQL
    Ansi,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self::DuckDb
    }
}

/// SQL validation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlConfig {
    /// Dialect the validator parses with
    #[serde(default)]
    pub dialect: DialectConfig,
}

/// Native compiler toolchain settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Compiler executable
    pub compiler: String,

    /// Language standard passed as `-std=<standard>`
    pub standard: Option<String>,

    /// Header search paths (`-I`)
    pub include_dirs: Vec<PathBuf>,

    /// Library search paths (`-L`)
    pub library_dirs: Vec<PathBuf>,

    /// Libraries to link (`-l`)
    pub libraries: Vec<String>,

    /// Flags appended verbatim
    pub extra_flags: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compiler: "g++".to_string(),
            standard: Some("c++17".to_string()),
            include_dirs: vec![PathBuf::from("duckdb/src/include")],
            library_dirs: vec![PathBuf::from("duckdb/build/release/src")],
            libraries: ["duckdb_static", "ssl", "crypto", "pthread", "dl"]
                .iter()
                .map(|lib| lib.to_string())
                .collect(),
            extra_flags: Vec::new(),
        }
    }
}

impl ToolchainConfig {
    /// Flags placed after `<program> -o <artifact>`
    ///
    /// Relative search paths are resolved against `root`.
    pub fn link_flags(&self, root: &Path) -> Vec<String> {
        let mut flags = Vec::new();

        if let Some(standard) = &self.standard {
            flags.push(format!("-std={}", standard));
        }

        for dir in &self.include_dirs {
            flags.push(format!("-I{}", resolve(root, dir).display()));
        }

        for dir in &self.library_dirs {
            flags.push(format!("-L{}", resolve(root, dir).display()));
        }

        for lib in &self.libraries {
            flags.push(format!("-l{}", lib));
        }

        flags.extend(self.extra_flags.iter().cloned());
        flags
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// SQL validation
    #[serde(default)]
    pub sql: SqlConfig,

    /// Compiler toolchain
    #[serde(default)]
    pub toolchain: ToolchainConfig,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sql: SqlConfig::default(),
            toolchain: ToolchainConfig::default(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut config = Self::from_toml(&contents)?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.project_root = std::env::current_dir().unwrap_or_default();
        Ok(config)
    }

    /// Find and load the config for a build directory
    ///
    /// Order: explicit path, `<build_dir>/sqlbuild.toml`, `./sqlbuild.toml`, defaults.
    /// Returns the config and the file it came from, if any.
    pub fn discover(
        explicit: Option<&Path>,
        build_dir: Option<&Path>,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::from_file(path)?, Some(path.to_path_buf())));
        }

        let candidates = build_dir
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .into_iter()
            .chain(std::iter::once(PathBuf::from(CONFIG_FILE_NAME)));

        for candidate in candidates {
            if candidate.is_file() {
                return Ok((Self::from_file(&candidate)?, Some(candidate)));
            }
        }

        Ok((Self::default(), None))
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(compiler) = lookup(COMPILER_ENV).filter(|c| !c.trim().is_empty()) {
            self.toolchain.compiler = compiler;
        }
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}
