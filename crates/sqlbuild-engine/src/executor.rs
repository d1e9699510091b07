//! Artifact execution collaborator

use crate::process::{self, ProcessOutput};
use sqlbuild_core::Unit;
use std::process::Command;

/// Runs a unit's compiled artifact
pub trait ArtifactExecutor {
    /// Execute the artifact; `Err` only when it could not be started
    fn execute(&self, unit: &Unit) -> std::io::Result<ProcessOutput>;
}

/// Spawns the artifact as a subprocess working in the unit's directory
///
/// Relative CSV paths inside the unit's SQL therefore resolve against the
/// build directory. Only the child's working directory is set; the
/// orchestrator's own never changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactExecutor for ProcessExecutor {
    fn execute(&self, unit: &Unit) -> std::io::Result<ProcessOutput> {
        let mut command = Command::new(&unit.artifact_path);
        command.current_dir(unit.directory());

        tracing::debug!(unit = %unit.name, artifact = %unit.artifact_path.display(), "executing artifact");
        process::run(&mut command)
    }
}
