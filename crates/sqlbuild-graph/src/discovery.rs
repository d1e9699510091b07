//! Unit discovery and graph construction for a build directory

use crate::dag::{CycleError, DependencyGraph};
use crate::extractor::DependencyExtractor;
use sqlbuild_core::{Diagnostic, DiagnosticCode, Location, Unit, SOURCE_EXTENSION};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Errors raised while discovering units or resolving their order
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("no .sql files found in {}", .dir.display())]
    NoUnitsFound { dir: PathBuf },

    #[error("unit '{name}' is defined by both {} and {}", .first.display(), .second.display())]
    DuplicateUnit {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GraphError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Convert to a sqlbuild diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            GraphError::NoUnitsFound { dir } => {
                Diagnostic::error(DiagnosticCode::DiscoveryNoUnits, self.to_string())
                    .with_location(Location::new(dir.display().to_string()))
            }
            GraphError::DuplicateUnit { name, second, .. } => {
                Diagnostic::error(DiagnosticCode::DiscoveryDuplicateUnit, self.to_string())
                    .with_unit(name.clone())
                    .with_location(Location::new(second.display().to_string()))
            }
            GraphError::Cycle(cycle) => {
                Diagnostic::error(DiagnosticCode::GraphCycle, self.to_string())
                    .with_unit(cycle.unit())
                    .with_impact(cycle.cycle.clone())
            }
            GraphError::Io { path, .. } => {
                Diagnostic::error(DiagnosticCode::IoError, self.to_string())
                    .with_location(Location::new(path.display().to_string()))
            }
        }
    }
}

/// The units of one build directory and the dependencies between them
#[derive(Debug, Clone)]
pub struct UnitGraph {
    /// Canonical build directory
    directory: PathBuf,

    /// Units in discovery order (sorted by file name)
    units: Vec<Unit>,

    /// Unit name -> position in `units`
    by_name: HashMap<String, usize>,

    /// Edges between known units
    graph: DependencyGraph,
}

impl UnitGraph {
    /// Discover every SQL source in `dir` (non-recursive) and link them
    ///
    /// References to CSV files that no unit produces are treated as external
    /// inputs and ignored.
    pub fn discover(dir: &Path, extractor: &dyn DependencyExtractor) -> Result<Self, GraphError> {
        let directory = dir.canonicalize().map_err(|e| GraphError::io(dir, e))?;
        let units = Self::scan(&directory)?;

        if units.is_empty() {
            return Err(GraphError::NoUnitsFound { dir: dir.to_path_buf() });
        }

        let mut graph = DependencyGraph::new();
        let mut by_name = HashMap::new();
        for (position, unit) in units.iter().enumerate() {
            graph.add_node(unit.name.clone());
            by_name.insert(unit.name.clone(), position);
        }

        for unit in &units {
            let sql = unit.read_source().map_err(|e| GraphError::io(&unit.source_path, e))?;

            for reference in extractor.extract(&sql) {
                if graph.add_edge(unit.name.clone(), reference.clone()) {
                    tracing::debug!(unit = %unit.name, dependency = %reference, "dependency edge");
                } else if !graph.contains(&reference) {
                    tracing::debug!(unit = %unit.name, reference = %reference, "external input, not a unit");
                }
            }
        }

        tracing::debug!(
            directory = %directory.display(),
            units = graph.len(),
            edges = graph.edge_count(),
            "dependency graph built"
        );

        Ok(Self {
            directory,
            units,
            by_name,
            graph,
        })
    }

    /// Flat scan for `*.sql`, extension matched case-insensitively
    ///
    /// Two files mapping to one unit name is an error rather than a silent pick.
    fn scan(directory: &Path) -> Result<Vec<Unit>, GraphError> {
        let mut units: Vec<Unit> = Vec::new();
        let mut seen: HashMap<String, PathBuf> = HashMap::new();

        let entries = WalkDir::new(directory)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in entries {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(directory).to_path_buf();
                GraphError::io(path, e.into())
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let is_sql = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION));
            if !is_sql {
                continue;
            }

            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                tracing::warn!(path = %path.display(), "skipping SQL file with a non UTF-8 name");
                continue;
            };

            if let Some(first) = seen.get(name) {
                return Err(GraphError::DuplicateUnit {
                    name: name.to_string(),
                    first: first.clone(),
                    second: path.to_path_buf(),
                });
            }

            seen.insert(name.to_string(), path.to_path_buf());
            units.push(Unit::from_source(name, path));
        }

        Ok(units)
    }

    /// Canonical build directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Units in discovery order
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Look up a unit by name
    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.by_name.get(name).map(|&position| &self.units[position])
    }

    /// The dependency graph between units
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Resolve the build order into units
    pub fn build_order(&self) -> Result<Vec<Unit>, GraphError> {
        let order = self.graph.resolve_order()?;

        Ok(order
            .iter()
            .filter_map(|name| self.unit(name).cloned())
            .collect())
    }
}
