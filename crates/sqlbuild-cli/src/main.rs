use clap::{Parser, Subcommand};
use colored::Colorize;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sqlbuild_core::{
    Config, Diagnostic, DiagnosticCode, Location, Report, Severity, Unit, UnitAction, UnitRecord,
};
use sqlbuild_engine::{
    check_staleness, BuildPlan, CommandToolchain, Phase, Pipeline, PipelineFailure, PipelineOptions,
    ProcessExecutor, Progress, UnitCompiler,
};
use sqlbuild_graph::CsvLiteralExtractor;
use sqlbuild_sql::SqlParserValidator;

/// sqlbuild - incremental builds for pipelines of SQL units
#[derive(Parser)]
#[command(name = "sqlbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: <dir>/sqlbuild.toml, then ./sqlbuild.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write a JSON build report to this path
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile every stale unit in dependency order
    Compile {
        /// Build directory holding the .sql units
        dir: PathBuf,

        /// Recompile units even when their artifacts are up to date
        #[arg(short, long)]
        force: bool,
    },

    /// Execute every compiled unit in dependency order
    Run {
        /// Build directory holding the .sql units
        dir: PathBuf,
    },

    /// Compile, then run
    All {
        /// Build directory holding the .sql units
        dir: PathBuf,

        /// Recompile units even when their artifacts are up to date
        #[arg(short, long)]
        force: bool,
    },

    /// Show the build order, dependencies and staleness
    Plan {
        /// Build directory holding the .sql units
        dir: PathBuf,

        /// Only show this unit and what it depends on
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Validate one SQL file and write its generated program without compiling
    Codegen {
        /// SQL source file
        file: PathBuf,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Compile { .. } => "compile",
            Commands::Run { .. } => "run",
            Commands::All { .. } => "all",
            Commands::Plan { .. } => "plan",
            Commands::Codegen { .. } => "codegen",
        }
    }

    /// Directory the command works in; config lookup starts here
    fn directory(&self) -> &Path {
        match self {
            Commands::Compile { dir, .. }
            | Commands::Run { dir }
            | Commands::All { dir, .. }
            | Commands::Plan { dir, .. } => dir.as_path(),
            Commands::Codegen { file } => file.parent().unwrap_or_else(|| Path::new(".")),
        }
    }
}

/// Which pipeline phases a command runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Compile,
    Run,
    All,
}

fn main() -> Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let directory = cli.command.directory();
    let config = load_config(cli.config.as_deref(), directory, cli.verbose)?;

    if cli.verbose {
        eprintln!("{} dialect: {:?}, compiler: {}", "Using".cyan(), config.sql.dialect, config.toolchain.compiler);
    }

    let mut report = Report::new(cli.command.name(), directory.display().to_string());

    match &cli.command {
        Commands::Compile { dir, force } => build_command(&config, dir, Mode::Compile, *force, &mut report),
        Commands::Run { dir } => build_command(&config, dir, Mode::Run, false, &mut report),
        Commands::All { dir, force } => build_command(&config, dir, Mode::All, *force, &mut report),
        Commands::Plan { dir, target } => plan_command(dir, target.as_deref(), &mut report)?,
        Commands::Codegen { file } => codegen_command(&config, file, &mut report)?,
    }

    if let Some(path) = &cli.report {
        report.save_to_file(path)?;
        if cli.verbose {
            eprintln!("{} {}", "Report saved to:".green(), path.display());
        }
    }

    if report.has_errors() {
        print_failures(&report);
        std::process::exit(1);
    }

    Ok(())
}

/// Logs go to stderr; `--verbose` forces debug, otherwise `RUST_LOG` or warn
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(explicit: Option<&Path>, directory: &Path, verbose: bool) -> Result<Config> {
    let (mut config, source) = Config::discover(explicit, Some(directory))?;
    config.apply_env_overrides();

    match source {
        Some(path) => tracing::debug!(path = %path.display(), "loaded config"),
        None if verbose => eprintln!("{}", "No config file found, using defaults".yellow()),
        None => {}
    }

    Ok(config)
}

/// Progress lines on stdout, interleaved with the artifacts' own output
struct ConsoleProgress;

impl Progress for ConsoleProgress {
    fn started(&self, phase: Phase, unit: &Unit) {
        match phase {
            Phase::Compile => println!("{} {}", "[compile]".cyan(), unit.name),
            Phase::Run => println!("{} {}", "[run]".green(), unit.name),
        }
    }

    fn finished(&self, _phase: Phase, record: &UnitRecord) {
        if record.action == UnitAction::UpToDate {
            println!("{} {}", "[skip]".dimmed(), record.name);
        }
    }
}

/// Discover and order the units, recording the outcome in the report
fn resolve_plan(dir: &Path, report: &mut Report) -> Option<BuildPlan> {
    match BuildPlan::resolve(dir, &CsvLiteralExtractor) {
        Ok(plan) => {
            report.set_order(plan.names());
            Some(plan)
        }
        Err(e) => {
            report.add_diagnostic(e.to_diagnostic());
            None
        }
    }
}

/// Compile, run or both
fn build_command(config: &Config, dir: &Path, mode: Mode, force: bool, report: &mut Report) {
    let Some(plan) = resolve_plan(dir, report) else {
        return;
    };

    let validator = SqlParserValidator::from_dialect(&config.sql.dialect);
    let toolchain = CommandToolchain::from_config(config);
    let executor = ProcessExecutor::new();

    let pipeline = Pipeline::new(UnitCompiler::new(&validator, &toolchain), &executor)
        .with_options(PipelineOptions { force })
        .with_progress(&ConsoleProgress);

    let outcome = match mode {
        Mode::Compile => pipeline.compile(&plan),
        Mode::Run => pipeline.run(&plan),
        Mode::All => pipeline.build(&plan),
    };

    match outcome {
        Ok(records) => {
            for record in records {
                report.add_unit(record);
            }
            print_summary(report);
        }
        Err(failure) => record_failure(failure, report),
    }
}

fn record_failure(failure: PipelineFailure, report: &mut Report) {
    let diagnostic = failure.to_diagnostic();

    for record in failure.completed {
        report.add_unit(record);
    }
    report.add_diagnostic(diagnostic);
}

/// Plan command - print the build order without building anything
fn plan_command(dir: &Path, target: Option<&str>, report: &mut Report) -> Result<()> {
    let Some(plan) = resolve_plan(dir, report) else {
        return Ok(());
    };

    let units: Vec<&Unit> = match target {
        Some(name) => plan.target_order(name).ok_or_else(|| {
            anyhow::anyhow!("Unit '{}' not found in {}", name, plan.directory().display())
        })?,
        None => plan.order().iter().collect(),
    };

    println!("{} {}", "Build order for".bold(), plan.directory().display());
    println!();

    for (i, unit) in units.iter().enumerate() {
        let staleness = check_staleness(&unit.source_path, &unit.artifact_path)?;
        let state = if staleness.needs_rebuild() {
            staleness.to_string().yellow()
        } else {
            staleness.to_string().green()
        };

        println!("  {}. {} ({})", i + 1, unit.name.bold(), state);

        let dependencies = plan.graph().graph().parents(&unit.name);
        if !dependencies.is_empty() {
            println!("       depends on: {}", dependencies.join(", "));
        }
    }

    Ok(())
}

/// Codegen command - validate one file and write its program next to it
fn codegen_command(config: &Config, file: &Path, report: &mut Report) -> Result<()> {
    let unit = match codegen_unit(file) {
        Ok(unit) => unit,
        Err(diagnostic) => {
            report.add_diagnostic(diagnostic);
            return Ok(());
        }
    };

    let validator = SqlParserValidator::from_dialect(&config.sql.dialect);
    let toolchain = CommandToolchain::from_config(config);

    match UnitCompiler::new(&validator, &toolchain).generate(&unit) {
        Ok(program) => println!("{} {}", "[codegen]".cyan(), program.path.display()),
        Err(e) => report.add_diagnostic(e.to_diagnostic()),
    }

    Ok(())
}

/// Unit for a single SQL file, resolved to an absolute path
///
/// The artifact runs in the unit's directory, so the CSV path embedded in
/// the program must not be relative to the caller's working directory.
fn codegen_unit(file: &Path) -> Result<Unit, Diagnostic> {
    let io_error = |message: String| {
        Diagnostic::error(DiagnosticCode::IoError, message).with_location(Location::new(file.display().to_string()))
    };

    let path = file
        .canonicalize()
        .map_err(|e| io_error(format!("failed to read {}: {}", file.display(), e)))?;

    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| io_error(format!("not a SQL source file: {}", file.display())))?;

    Ok(Unit::from_source(name, path.clone()))
}

fn print_summary(report: &Report) {
    let summary = &report.summary;

    match report.command.as_str() {
        "compile" => println!(
            "{} {} compiled, {} up to date",
            "✓".green().bold(),
            summary.compiled,
            summary.up_to_date
        ),
        "run" => println!("{} {} executed", "✓".green().bold(), summary.executed),
        _ => println!(
            "{} {} compiled, {} up to date, {} executed",
            "✓".green().bold(),
            summary.compiled,
            summary.up_to_date,
            summary.executed
        ),
    }
}

/// Print every diagnostic to stderr
fn print_failures(report: &Report) {
    eprintln!();

    for diag in &report.diagnostics {
        let severity_str = match diag.severity {
            Severity::Error => "ERROR".red().bold(),
            Severity::Warn => "WARN".yellow().bold(),
            Severity::Info => "INFO".cyan(),
        };

        eprintln!("[{}] {}: {}", severity_str, diag.code, diag.message);

        if let Some(loc) = &diag.location {
            eprintln!("    at {}", loc.file);
        }

        if let Some(detail) = &diag.detail {
            for line in detail.lines() {
                eprintln!("    {}", line.dimmed());
            }
        }

        if !diag.impact.is_empty() {
            eprintln!("    {} {}", "Not reached:".yellow(), diag.impact.join(", "));
        }
    }
}
