//! sqlbuild engine - build orchestration
//!
//! This crate implements the incremental build for a directory of units:
//! - Staleness detection from file timestamps
//! - Compiling units (validate, generate, invoke the toolchain)
//! - Executing compiled artifacts
//! - The sequenced compile and run phases of the pipeline

pub mod error;
pub mod process;
pub mod staleness;
pub mod toolchain;
pub mod executor;
pub mod compiler;
pub mod pipeline;

pub use error::BuildError;
pub use process::ProcessOutput;
pub use staleness::{check_staleness, Staleness};
pub use toolchain::{Toolchain, CommandToolchain};
pub use executor::{ArtifactExecutor, ProcessExecutor};
pub use compiler::UnitCompiler;
pub use pipeline::{BuildPlan, Phase, Pipeline, PipelineFailure, PipelineOptions, Progress, NoProgress};
