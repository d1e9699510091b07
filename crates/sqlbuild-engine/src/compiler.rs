//! Unit compilation: validate, generate, compile

use crate::error::BuildError;
use crate::toolchain::Toolchain;
use sqlbuild_codegen::{GeneratedProgram, ProgramGenerator};
use sqlbuild_core::Unit;
use sqlbuild_sql::SqlValidator;

/// Compiles one unit at a time against injected collaborators
pub struct UnitCompiler<'a> {
    validator: &'a dyn SqlValidator,
    generator: ProgramGenerator,
    toolchain: &'a dyn Toolchain,
}

impl<'a> UnitCompiler<'a> {
    pub fn new(validator: &'a dyn SqlValidator, toolchain: &'a dyn Toolchain) -> Self {
        Self {
            validator,
            generator: ProgramGenerator::new(),
            toolchain,
        }
    }

    /// Validate the unit's SQL and write its generated program
    ///
    /// Nothing is written when validation fails.
    pub fn generate(&self, unit: &Unit) -> Result<GeneratedProgram, BuildError> {
        let sql = unit
            .read_source()
            .map_err(|e| BuildError::io(&unit.name, &unit.source_path, e))?;

        self.validator
            .validate(&sql)
            .map_err(|source| BuildError::Validation {
                unit: unit.name.clone(),
                source: source.with_file(&unit.source_path),
            })?;

        let program = self
            .generator
            .write(unit, &sql)
            .map_err(|source| BuildError::Codegen {
                unit: unit.name.clone(),
                source,
            })?;

        tracing::debug!(unit = %unit.name, program = %program.path.display(), "program generated");
        Ok(program)
    }

    /// Generate the program and compile it into the unit's artifact
    pub fn compile(&self, unit: &Unit) -> Result<(), BuildError> {
        let program = self.generate(unit)?;

        let output = self
            .toolchain
            .compile(&program.path, &unit.artifact_path)
            .map_err(|e| BuildError::Toolchain {
                unit: unit.name.clone(),
                reason: format!("compiler could not be started: {}", e),
                stderr: String::new(),
            })?;

        if !output.success {
            return Err(BuildError::Toolchain {
                unit: unit.name.clone(),
                reason: output.describe_exit(),
                stderr: output.stderr,
            });
        }

        tracing::info!(unit = %unit.name, artifact = %unit.artifact_path.display(), "compiled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessOutput;
    use sqlbuild_sql::SqlParserValidator;
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};

    /// Writes the artifact on success, or fails with a fixed status
    struct FakeToolchain {
        fail_with: Option<ProcessOutput>,
        calls: RefCell<Vec<(PathBuf, PathBuf)>>,
    }

    impl FakeToolchain {
        fn ok() -> Self {
            Self { fail_with: None, calls: RefCell::new(Vec::new()) }
        }

        fn failing(output: ProcessOutput) -> Self {
            Self { fail_with: Some(output), calls: RefCell::new(Vec::new()) }
        }
    }

    impl Toolchain for FakeToolchain {
        fn compile(&self, program: &Path, artifact: &Path) -> std::io::Result<ProcessOutput> {
            self.calls.borrow_mut().push((program.to_path_buf(), artifact.to_path_buf()));
            match &self.fail_with {
                Some(output) => Ok(output.clone()),
                None => {
                    std::fs::write(artifact, "artifact")?;
                    Ok(ProcessOutput::succeeded())
                }
            }
        }
    }

    struct UnstartableToolchain;

    impl Toolchain for UnstartableToolchain {
        fn compile(&self, _program: &Path, _artifact: &Path) -> std::io::Result<ProcessOutput> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "g++: not found"))
        }
    }

    fn unit(dir: &Path, name: &str, sql: &str) -> Unit {
        let unit = Unit::in_directory(dir, name);
        std::fs::write(&unit.source_path, sql).unwrap();
        unit
    }

    #[test]
    fn compiles_valid_unit() {
        let dir = tempfile::tempdir().unwrap();
        let unit = unit(dir.path(), "a", "SELECT 1 AS one;");
        let validator = SqlParserValidator::new();
        let toolchain = FakeToolchain::ok();

        UnitCompiler::new(&validator, &toolchain).compile(&unit).unwrap();

        assert!(unit.program_path().exists());
        assert!(unit.artifact_path.exists());
        assert_eq!(
            toolchain.calls.borrow().as_slice(),
            &[(unit.program_path(), unit.artifact_path.clone())]
        );
    }

    #[test]
    fn invalid_sql_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let unit = unit(dir.path(), "b", "SELEC id FROM users");
        let validator = SqlParserValidator::new();
        let toolchain = FakeToolchain::ok();

        let err = UnitCompiler::new(&validator, &toolchain).compile(&unit).unwrap_err();

        assert!(matches!(err, BuildError::Validation { ref unit, .. } if unit == "b"));
        assert!(!unit.program_path().exists());
        assert!(!unit.artifact_path.exists());
        assert!(toolchain.calls.borrow().is_empty());
    }

    #[test]
    fn compiler_failure_keeps_status_and_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let unit = unit(dir.path(), "c", "SELECT 1");
        let validator = SqlParserValidator::new();
        let toolchain = FakeToolchain::failing(ProcessOutput::failed(1, "c.cpp:1: fatal error: duckdb.hpp"));

        let err = UnitCompiler::new(&validator, &toolchain).compile(&unit).unwrap_err();

        match err {
            BuildError::Toolchain { unit, reason, stderr } => {
                assert_eq!(unit, "c");
                assert_eq!(reason, "exited with status 1");
                assert!(stderr.contains("duckdb.hpp"));
            }
            other => panic!("expected toolchain error, got {:?}", other),
        }
    }

    #[test]
    fn unstartable_compiler_is_a_toolchain_error() {
        let dir = tempfile::tempdir().unwrap();
        let unit = unit(dir.path(), "d", "SELECT 1");
        let validator = SqlParserValidator::new();

        let err = UnitCompiler::new(&validator, &UnstartableToolchain).compile(&unit).unwrap_err();
        assert!(err.to_string().starts_with("d: compilation failed: compiler could not be started"));
    }

    #[test]
    fn generate_does_not_compile() {
        let dir = tempfile::tempdir().unwrap();
        let unit = unit(dir.path(), "e", "SELECT 2 AS two");
        let validator = SqlParserValidator::new();
        let toolchain = FakeToolchain::ok();

        let program = UnitCompiler::new(&validator, &toolchain).generate(&unit).unwrap();

        assert_eq!(program.path, unit.program_path());
        assert!(toolchain.calls.borrow().is_empty());
        assert!(!unit.artifact_path.exists());
    }

    #[test]
    fn missing_source_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let unit = Unit::in_directory(dir.path(), "ghost");
        let validator = SqlParserValidator::new();
        let toolchain = FakeToolchain::ok();

        let err = UnitCompiler::new(&validator, &toolchain).compile(&unit).unwrap_err();
        assert!(matches!(err, BuildError::Io { .. }));
    }
}
