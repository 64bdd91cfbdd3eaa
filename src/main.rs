//! Seoscan CLI - SEO and Render-Budget Linter

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use seoscan::host::{Host, HostOptions, DEFAULT_MAX_FILE_BYTES};
use seoscan::output::{JsonFormatter, OutputFormatter, TextFormatter};
use seoscan::policy::ProjectConfig;
use seoscan::{Engine, RuleRegistry, Severity};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "seoscan",
    version,
    about = "SEO and render-budget linter",
    long_about = "Static SEO, performance and render-budget checks for HTML and component files."
)]
struct Cli {
    /// Files or directories to scan
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Policy file (default: discovered in the project root)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,

    /// Minimum severity to report
    #[arg(long, value_enum, default_value = "info")]
    min_severity: MinSeverity,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value = "0")]
    jobs: usize,

    /// Skip files larger than this many KB
    #[arg(long, default_value_t = DEFAULT_MAX_FILE_BYTES / 1024)]
    max_size: u64,

    /// Disable specific rule codes (comma-separated)
    #[arg(long, value_delimiter = ',')]
    disable: Vec<String>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// List available rules and exit
    #[arg(long)]
    list_rules: bool,

    /// Exit with 0 even when findings are reported
    #[arg(long)]
    exit_zero: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum MinSeverity {
    Info,
    Warning,
    Error,
}

impl From<MinSeverity> for Severity {
    fn from(value: MinSeverity) -> Self {
        match value {
            MinSeverity::Info => Severity::Info,
            MinSeverity::Warning => Severity::Warning,
            MinSeverity::Error => Severity::Error,
        }
    }
}

fn print_rules(registry: &RuleRegistry) {
    for rule in registry.rules() {
        println!(
            "{} {} - {}",
            rule.id().cyan().bold(),
            format!("[{}]", rule.category()).dimmed(),
            rule.description()
        );
        for code in rule.codes() {
            println!("    {}", code);
        }
    }
}

/// Directory the policy file is looked up in
fn project_root(paths: &[PathBuf]) -> PathBuf {
    let first = paths.first().map(PathBuf::as_path).unwrap_or(Path::new("."));
    if first.is_dir() {
        first.to_path_buf()
    } else {
        first
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn run(cli: Cli) -> Result<i32> {
    if cli.list_rules {
        print_rules(&RuleRegistry::builtin());
        return Ok(0);
    }

    let project = match &cli.config {
        Some(path) => ProjectConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ProjectConfig::discover(&project_root(&cli.paths)),
    };
    let mut disabled_rules = project.disabled_rules.clone();
    disabled_rules.extend(cli.disable.iter().cloned());

    let options = HostOptions {
        max_file_bytes: cli.max_size.saturating_mul(1024),
        jobs: cli.jobs,
        min_severity: cli.min_severity.into(),
        disabled_rules,
    };
    let host = Host::new(Engine::new(project.policy), options);
    log::debug!(
        "{} rules, {} jobs, files up to {} bytes",
        host.engine().registry().len(),
        host.options().jobs,
        host.options().max_file_bytes
    );

    let report = host.scan_paths(&cli.paths);
    if report.files_scanned + report.files_skipped + report.files_failed == 0 {
        eprintln!("{}: no supported files found", "warning".yellow().bold());
    }

    let formatter: Box<dyn OutputFormatter> = match cli.format {
        Format::Text => {
            if cli.no_color {
                Box::new(TextFormatter::new().without_color())
            } else {
                Box::new(TextFormatter::new())
            }
        }
        Format::Json => Box::new(JsonFormatter::new().pretty()),
    };
    print!("{}", formatter.format(&report));

    if cli.exit_zero {
        Ok(0)
    } else {
        Ok(report.exit_code())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    match run(cli) {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::from(3)
        }
    }
}
