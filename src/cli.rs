//! Command-line interface for smellcheck.

use clap::{Args, Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{Config, DEFAULT_CONFIG_NAMES};
use crate::detect::{builtin_rules, Registry, Severity};
use crate::narrate::Narrator;
use crate::pipeline::{analyze, analyze_batch};
use crate::render::{self, Format};
use crate::report::Report;
use crate::source::{Language, SourceUnit};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &["node_modules", "vendor", "__pycache__", "venv", "site-packages"];

/// Default configuration written by `smellcheck init`.
const DEFAULT_CONFIG: &str = include_str!("templates/default.yaml");

/// Heuristic code smell detector for Python, JavaScript and TypeScript.
///
/// Smellcheck scans source files for a fixed catalogue of surface-level
/// issues: security anti-patterns (eval, innerHTML), style smells (var,
/// loose equality, any), swallowed errors and debugging leftovers.
#[derive(Parser)]
#[command(name = "smellcheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a file or directory
    #[command(visible_alias = "lint")]
    Check(CheckArgs),
    /// List the built-in rules
    Rules(RulesArgs),
    /// Write a default configuration file
    Init(InitArgs),
}

/// Arguments for the check command.
#[derive(Args)]
pub struct CheckArgs {
    /// Path to check (file or directory)
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty, json, or sarif
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Treat every file as this language (py, js, ts)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Lowest severity that fails the run (info, warning, critical)
    #[arg(long)]
    pub fail_on: Option<String>,

    /// Show suppressed findings in output
    #[arg(long)]
    pub show_suppressed: bool,

    /// Print each analysis step to stderr
    #[arg(long)]
    pub narrate: bool,
}

/// Arguments for the rules command.
#[derive(Args)]
pub struct RulesArgs {
    /// Only list rules for this language (py, js, ts)
    #[arg(short, long)]
    pub language: Option<String>,
}

/// Arguments for the init command.
#[derive(Args)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "smellcheck.yaml")]
    pub output: PathBuf,
}

/// Load the explicit config, or the first one found in the working directory.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => Config::discover(Path::new(".")),
    };

    let config = match path {
        Some(p) => {
            debug!("using config {}", p.display());
            Config::parse_file(&p)?
        }
        None => {
            debug!(
                "no config file found (looked for {}), using defaults",
                DEFAULT_CONFIG_NAMES.join(", ")
            );
            Config::default()
        }
    };
    config.validate()?;
    Ok(config)
}

/// Collect analyzable files under `root`.
fn collect_files(root: &Path, config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            // Skip hidden directories and dependency trees
            !name.starts_with('.') && !SKIPPED_DIRS.iter().any(|d| name == *d)
        })
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if Language::from_path(path).is_none() {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        if config.is_path_excluded(relative) {
            debug!("excluded {}", path.display());
            continue;
        }
        files.push(path.to_path_buf());
    }

    Ok(files)
}

fn load_source(path: &Path, language: Option<Language>) -> Result<SourceUnit, crate::source::InputError> {
    match language {
        Some(lang) => SourceUnit::load_as(path, lang),
        None => SourceUnit::load(path),
    }
}

/// Run the check command.
pub fn run_check(args: &CheckArgs) -> anyhow::Result<i32> {
    let format: Format = match args.format.parse() {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let language = match args.language.as_deref().map(str::parse::<Language>).transpose() {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: invalid config: {:#}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let fail_on = match args.fail_on.as_deref().map(str::parse::<Severity>).transpose() {
        Ok(s) => s.unwrap_or_else(|| config.fail_on()),
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let metadata = match std::fs::metadata(&args.path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let registry = Registry::from_config(&config);

    let reports = if metadata.is_dir() {
        let files = collect_files(&args.path, &config)?;
        if files.is_empty() {
            eprintln!("Warning: no files to scan");
            return Ok(EXIT_SUCCESS);
        }
        check_files(&files, language, &registry, args.narrate, format == Format::Pretty)?
    } else if args.narrate {
        let mut narrator = Narrator::new(io::stderr());
        match narrator.analyze_file(&args.path, language, &registry) {
            Ok(report) => vec![report],
            Err(e) => {
                eprintln!("Error: {:#}", e);
                return Ok(EXIT_ERROR);
            }
        }
    } else {
        match load_source(&args.path, language) {
            Ok(source) => vec![analyze(&source, &registry)],
            Err(e) => {
                eprintln!("Error: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        Format::Json => render::write_json(&mut out, &reports)?,
        Format::Sarif => render::write_sarif(&mut out, &reports, &args.path)?,
        Format::Pretty => render::write_pretty(&mut out, &reports, args.show_suppressed)?,
    }
    out.flush()?;

    if reports.iter().any(|r| r.has_findings_at_or_above(fail_on)) {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Load and analyze a set of files. Unloadable files are skipped with a warning.
fn check_files(
    files: &[PathBuf],
    language: Option<Language>,
    registry: &Registry,
    narrate: bool,
    show_progress: bool,
) -> anyhow::Result<Vec<Report>> {
    if narrate {
        let mut narrator = Narrator::new(io::stderr());
        let mut reports = Vec::new();
        for path in files {
            match narrator.analyze_file(path, language, registry) {
                Ok(report) => reports.push(report),
                Err(e) => warn!("skipping {}: {:#}", path.display(), e),
            }
        }
        return Ok(reports);
    }

    let progress = if show_progress && files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        if let Ok(style) =
            ProgressStyle::with_template("  {spinner} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("##-"));
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut sources = Vec::with_capacity(files.len());
    for path in files {
        progress.set_message(path.display().to_string());
        match load_source(path, language) {
            Ok(source) => sources.push(source),
            Err(e) => warn!("skipping {}: {}", path.display(), e),
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    Ok(analyze_batch(&sources, registry))
}

/// Run the rules command.
pub fn run_rules(args: &RulesArgs) -> anyhow::Result<i32> {
    let language = match args.language.as_deref().map(str::parse::<Language>).transpose() {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "Available rules:")?;
    writeln!(out)?;

    for rule in builtin_rules() {
        if language.is_some_and(|l| !rule.applies_to(l)) {
            continue;
        }
        let languages: Vec<&str> = rule.languages.iter().map(|l| l.as_str()).collect();
        let severity = match rule.default_severity {
            Severity::Critical => rule.default_severity.as_str().red(),
            Severity::Warning => rule.default_severity.as_str().yellow(),
            Severity::Info => rule.default_severity.as_str().blue(),
        };
        writeln!(out, "  {:<24} {:<10} {}", rule.id.bold(), severity, rule.description)?;
        writeln!(out, "  {:<24} {}", "", languages.join(", ").dimmed())?;
    }

    Ok(EXIT_SUCCESS)
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // Check if output already exists
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, DEFAULT_CONFIG) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to customize for your project", args.output.display());
    println!("  2. Run: smellcheck check . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}
