//! Compiler toolchain collaborator

use crate::process::{self, ProcessOutput};
use sqlbuild_core::Config;
use std::path::Path;
use std::process::Command;

/// Turns a generated program into an executable artifact
pub trait Toolchain {
    /// Compile `program` into `artifact`; `Err` only when the compiler could not be run
    fn compile(&self, program: &Path, artifact: &Path) -> std::io::Result<ProcessOutput>;
}

/// Invokes an external compiler: `<compiler> <program> -o <artifact> <flags...>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandToolchain {
    compiler: String,
    flags: Vec<String>,
}

impl CommandToolchain {
    pub fn new(compiler: impl Into<String>, flags: Vec<String>) -> Self {
        Self {
            compiler: compiler.into(),
            flags,
        }
    }

    /// Build from `[toolchain]`, resolving relative search paths against the project root
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.toolchain.compiler.clone(),
            config.toolchain.link_flags(&config.project_root),
        )
    }

    /// Compiler executable
    pub fn compiler(&self) -> &str {
        &self.compiler
    }

    /// The command that compiles `program` into `artifact`
    pub fn command(&self, program: &Path, artifact: &Path) -> Command {
        let mut command = Command::new(&self.compiler);
        command.arg(program).arg("-o").arg(artifact).args(&self.flags);
        command
    }
}

impl Toolchain for CommandToolchain {
    fn compile(&self, program: &Path, artifact: &Path) -> std::io::Result<ProcessOutput> {
        let mut command = self.command(program, artifact);
        tracing::debug!(command = ?command, "invoking compiler");

        let output = process::run(&mut command)?;
        if output.success && !output.stderr.trim().is_empty() {
            tracing::warn!(program = %program.display(), "compiler output:\n{}", output.stderr.trim_end());
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::path::PathBuf;

    #[test]
    fn command_layout() {
        let toolchain = CommandToolchain::new("g++", vec!["-std=c++17".to_string(), "-lduckdb".to_string()]);
        let command = toolchain.command(Path::new("/p/a.cpp"), Path::new("/p/a"));

        assert_eq!(command.get_program(), OsStr::new("g++"));
        let args: Vec<&OsStr> = command.get_args().collect();
        assert_eq!(args, vec!["/p/a.cpp", "-o", "/p/a", "-std=c++17", "-lduckdb"]);
    }

    #[test]
    fn from_config_uses_project_root() {
        let mut config = Config::default();
        config.project_root = PathBuf::from("/project");
        config.toolchain.compiler = "clang++".to_string();

        let toolchain = CommandToolchain::from_config(&config);
        assert_eq!(toolchain.compiler(), "clang++");
        assert!(toolchain.flags.contains(&"-I/project/duckdb/src/include".to_string()));
        assert!(toolchain.flags.contains(&"-lduckdb_static".to_string()));
    }

    #[test]
    fn unknown_compiler_is_an_io_error() {
        let toolchain = CommandToolchain::new("/nonexistent/sqlbuild-cc", Vec::new());
        assert!(toolchain.compile(Path::new("a.cpp"), Path::new("a")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn failing_compiler_reports_status() {
        // `false` ignores its arguments and exits 1
        let toolchain = CommandToolchain::new("false", Vec::new());
        let output = toolchain.compile(Path::new("a.cpp"), Path::new("a")).unwrap();

        assert!(!output.success);
        assert_eq!(output.code, Some(1));
    }
}
