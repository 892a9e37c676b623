use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use cst_canonizer::config::{load_from_path, RewriteConfig};
use cst_canonizer::{Pipeline, ProgramReport, SyntacticModel, UnitId};
use similar::{ChangeTag, TextDiff};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "cst-canonizer")]
#[command(
    about = "Rewrite C# sources towards one canonical form (names, member order, usings, layout)",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Log filter, e.g. `debug` or `cst_canonizer=trace` (defaults to RUST_LOG, then `warn`)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report which files would change; exits with status 1 if any would
    Check(RunArgs),

    /// Show the rewrite of every file that would change as a unified diff
    Diff(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Directory to scan for `*.cs` files
    dir: PathBuf,

    /// Rewrite configuration (TOML); built-in defaults otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match cli.command {
        Commands::Check(args) => cmd_check(&args),
        Commands::Diff(args) => cmd_diff(&args),
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Sources loaded into a model, with their paths and original text.
struct Workspace {
    model: SyntacticModel,
    files: HashMap<UnitId, (PathBuf, String)>,
    rejected: usize,
}

/// Helper: find every `*.cs` file under `dir`, in a stable order.
fn discover_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some("cs")
        {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn load_workspace(dir: &Path) -> Result<Workspace> {
    if !dir.is_dir() {
        anyhow::bail!("{} is not a directory", dir.display());
    }
    let mut workspace = Workspace {
        model: SyntacticModel::new(),
        files: HashMap::new(),
        rejected: 0,
    };
    for path in discover_sources(dir)? {
        let source = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let name = path
            .strip_prefix(dir)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        match workspace.model.add_source(name, &source) {
            Ok(unit) => {
                workspace.files.insert(unit, (path, source));
            }
            Err(err) => {
                warn!(file = %path.display(), "not parsed: {err}");
                eprintln!(
                    "{}",
                    format!("Warning: skipping {}: {err}", path.display()).yellow()
                );
                workspace.rejected += 1;
            }
        }
    }
    Ok(workspace)
}

fn load_config(path: Option<&Path>) -> Result<RewriteConfig> {
    match path {
        Some(path) => Ok(load_from_path(path)?),
        None => Ok(RewriteConfig::default()),
    }
}

fn rewrite(args: &RunArgs) -> Result<(Workspace, ProgramReport)> {
    let config = load_config(args.config.as_deref())?;
    let mut workspace = load_workspace(&args.dir)?;
    let report = Pipeline::standard(config)
        .run_program(&mut workspace.model)
        .context("rewrite pipeline failed")?;
    Ok((workspace, report))
}

fn print_diagnostics(report: &ProgramReport) {
    for diagnostic in report.diagnostics() {
        eprintln!("{}", diagnostic.to_string().yellow());
    }
}

fn cmd_check(args: &RunArgs) -> Result<()> {
    let (workspace, report) = rewrite(args)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for unit in &report.units {
            if unit.changed {
                println!("{} {}: would change", "✗".red(), unit.name);
            } else {
                println!("{} {}: unchanged", "✓".green(), unit.name);
            }
        }
        print_diagnostics(&report);

        let changed = report.changed_units().count();
        println!();
        println!(
            "Summary: {} would change, {} unchanged, {} not parsed",
            changed,
            report.units.len() - changed,
            workspace.rejected
        );
    }

    if report.any_changed() {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_diff(args: &RunArgs) -> Result<()> {
    let (workspace, report) = rewrite(args)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    for unit in report.changed_units() {
        if let Some((path, original)) = workspace.files.get(&unit.unit) {
            display_diff(path, original, &unit.text);
        }
    }
    print_diagnostics(&report);
    Ok(())
}

/// Helper: Show unified diff between original and rewritten content
fn display_diff(file: &Path, original: &str, rewritten: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (canonical)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, rewritten);
    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        println!("{}", hunk.header().to_string().cyan());
        for change in hunk.iter_changes() {
            let line = match change.tag() {
                ChangeTag::Delete => format!("-{}", change).red(),
                ChangeTag::Insert => format!("+{}", change).green(),
                ChangeTag::Equal => format!(" {}", change).normal(),
            };
            print!("{}", line);
            if change.missing_newline() {
                println!();
            }
        }
    }
}
