//! Pipeline runner
//!
//! Walks the build order once per phase. The compile phase rebuilds stale
//! units; the run phase executes every artifact. A phase stops at its first
//! failure, and the two phases are never interleaved per unit.

use crate::compiler::UnitCompiler;
use crate::error::BuildError;
use crate::executor::ArtifactExecutor;
use crate::staleness::check_staleness;
use sqlbuild_core::{Diagnostic, Unit, UnitAction, UnitRecord};
use sqlbuild_graph::{DependencyExtractor, UnitGraph};
use std::collections::HashSet;
use std::path::Path;

/// A discovered directory with its resolved build order
#[derive(Debug, Clone)]
pub struct BuildPlan {
    graph: UnitGraph,
    order: Vec<Unit>,
}

impl BuildPlan {
    /// Discover the units of `dir` and resolve their build order
    ///
    /// A cycle fails the whole plan; no partial order is kept.
    pub fn resolve(dir: &Path, extractor: &dyn DependencyExtractor) -> Result<Self, BuildError> {
        let graph = UnitGraph::discover(dir, extractor)?;
        let order = graph.build_order()?;

        tracing::debug!(
            order = ?order.iter().map(|u| u.name.as_str()).collect::<Vec<_>>(),
            "build order resolved"
        );

        Ok(Self { graph, order })
    }

    /// Canonical build directory
    pub fn directory(&self) -> &Path {
        self.graph.directory()
    }

    /// Units in build order
    pub fn order(&self) -> &[Unit] {
        &self.order
    }

    pub fn graph(&self) -> &UnitGraph {
        &self.graph
    }

    /// Unit names in build order
    pub fn names(&self) -> Vec<String> {
        self.order.iter().map(|u| u.name.clone()).collect()
    }

    /// `target` and everything it depends on, in build order
    pub fn target_order(&self, target: &str) -> Option<Vec<&Unit>> {
        self.graph.unit(target)?;

        let mut wanted: HashSet<String> = self.graph.graph().upstream(target).into_iter().collect();
        wanted.insert(target.to_string());

        Some(self.order.iter().filter(|u| wanted.contains(&u.name)).collect())
    }
}

/// The two pipeline phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Compile,
    Run,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compile => write!(f, "compile"),
            Self::Run => write!(f, "run"),
        }
    }
}

/// Observer for per-unit progress
pub trait Progress {
    /// Work on `unit` is about to start (not called for up-to-date units)
    fn started(&self, _phase: Phase, _unit: &Unit) {}

    /// `unit` finished successfully
    fn finished(&self, _phase: Phase, _record: &UnitRecord) {}
}

/// Progress observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Compile every unit regardless of staleness
    pub force: bool,
}

/// A phase stopped at a failing unit
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct PipelineFailure {
    /// Phase that failed
    pub phase: Phase,

    /// The failure itself
    pub error: BuildError,

    /// Units that finished before the failure, in order
    pub completed: Vec<UnitRecord>,

    /// Transitive dependents of the failed unit, in build order
    pub blocked: Vec<String>,

    /// Every unit the phase never reached: `blocked` first, then the rest
    pub unreached: Vec<String>,
}

impl PipelineFailure {
    fn new(phase: Phase, error: BuildError, completed: Vec<UnitRecord>, plan: &BuildPlan, position: usize) -> Self {
        let failed = &plan.order[position].name;
        let dependents: HashSet<String> = plan.graph.graph().downstream(failed).into_iter().collect();

        let remaining = &plan.order[position + 1..];
        let (blocked, independent): (Vec<&Unit>, Vec<&Unit>) =
            remaining.iter().partition(|u| dependents.contains(&u.name));

        let blocked: Vec<String> = blocked.into_iter().map(|u| u.name.clone()).collect();
        let unreached = blocked
            .iter()
            .cloned()
            .chain(independent.into_iter().map(|u| u.name.clone()))
            .collect();

        Self {
            phase,
            error,
            completed,
            blocked,
            unreached,
        }
    }

    /// Name of the failed unit
    pub fn unit(&self) -> Option<&str> {
        self.error.unit()
    }

    /// Diagnostic for the failure; impact lists the unreached units
    pub fn to_diagnostic(&self) -> Diagnostic {
        self.error.to_diagnostic().with_impact(self.unreached.clone())
    }
}

/// Sequenced compile and run phases over a build plan
pub struct Pipeline<'a> {
    compiler: UnitCompiler<'a>,
    executor: &'a dyn ArtifactExecutor,
    options: PipelineOptions,
    progress: &'a dyn Progress,
}

impl<'a> Pipeline<'a> {
    pub fn new(compiler: UnitCompiler<'a>, executor: &'a dyn ArtifactExecutor) -> Self {
        Self {
            compiler,
            executor,
            options: PipelineOptions::default(),
            progress: &NoProgress,
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Compile every stale unit in build order
    pub fn compile(&self, plan: &BuildPlan) -> Result<Vec<UnitRecord>, PipelineFailure> {
        self.phase(Phase::Compile, plan, |unit| self.compile_unit(unit))
    }

    /// Execute every artifact in build order; never compiles
    pub fn run(&self, plan: &BuildPlan) -> Result<Vec<UnitRecord>, PipelineFailure> {
        self.phase(Phase::Run, plan, |unit| self.run_unit(unit))
    }

    /// Compile phase to completion, then run phase
    pub fn build(&self, plan: &BuildPlan) -> Result<Vec<UnitRecord>, PipelineFailure> {
        let mut records = self.compile(plan)?;

        match self.run(plan) {
            Ok(executed) => {
                records.extend(executed);
                Ok(records)
            }
            Err(mut failure) => {
                records.append(&mut failure.completed);
                failure.completed = records;
                Err(failure)
            }
        }
    }

    fn phase(
        &self,
        phase: Phase,
        plan: &BuildPlan,
        step: impl Fn(&Unit) -> Result<UnitRecord, BuildError>,
    ) -> Result<Vec<UnitRecord>, PipelineFailure> {
        let mut completed = Vec::with_capacity(plan.order.len());

        for (position, unit) in plan.order.iter().enumerate() {
            match step(unit) {
                Ok(record) => {
                    self.progress.finished(phase, &record);
                    completed.push(record);
                }
                Err(error) => {
                    tracing::debug!(phase = %phase, unit = %unit.name, "phase stopped");
                    return Err(PipelineFailure::new(phase, error, completed, plan, position));
                }
            }
        }

        Ok(completed)
    }

    fn compile_unit(&self, unit: &Unit) -> Result<UnitRecord, BuildError> {
        let staleness = check_staleness(&unit.source_path, &unit.artifact_path)
            .map_err(|e| BuildError::io(&unit.name, &unit.source_path, e))?;

        if !self.options.force && !staleness.needs_rebuild() {
            tracing::debug!(unit = %unit.name, "artifact up to date");
            return Ok(record(unit, UnitAction::UpToDate));
        }

        tracing::debug!(unit = %unit.name, staleness = %staleness, force = self.options.force, "rebuilding");
        self.progress.started(Phase::Compile, unit);
        self.compiler.compile(unit)?;

        Ok(record(unit, UnitAction::Compiled))
    }

    fn run_unit(&self, unit: &Unit) -> Result<UnitRecord, BuildError> {
        if !unit.artifact_path.is_file() {
            return Err(BuildError::Execution {
                unit: unit.name.clone(),
                reason: format!("artifact {} not found; compile first", unit.artifact_path.display()),
                stderr: String::new(),
            });
        }

        self.progress.started(Phase::Run, unit);

        let output = self.executor.execute(unit).map_err(|e| BuildError::Execution {
            unit: unit.name.clone(),
            reason: format!("could not be started: {}", e),
            stderr: String::new(),
        })?;

        if !output.success {
            return Err(BuildError::Execution {
                unit: unit.name.clone(),
                reason: output.describe_exit(),
                stderr: output.stderr,
            });
        }

        tracing::info!(unit = %unit.name, output = %unit.output_path().display(), "executed");
        Ok(record(unit, UnitAction::Executed))
    }
}

fn record(unit: &Unit, action: UnitAction) -> UnitRecord {
    UnitRecord {
        name: unit.name.clone(),
        action,
        source_sha256: unit.source_sha256().ok(),
    }
}
