// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};
use std::io::Write;
use std::path::PathBuf;

use texprep::app_config::{Config, LogLevel};
use texprep::escaping::{EngineConfig, EscapingFixSession, EscapingRepairEngine, SessionOptions};
use texprep::pipeline::BuildOrchestrator;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate dependencies and run the basic and full build checks
    Check(CheckArgs),

    /// Repair escaping damage in every source file under a directory
    Fix(FixArgs),

    /// Generate shell completions for texprep
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Root document (overrides the config file)
    #[arg(value_name = "ROOT_DOCUMENT")]
    root: Option<PathBuf>,

    /// Do not write stubs for missing references
    #[arg(long)]
    no_stubs: bool,

    /// Print every error, warning and compiler output tail
    #[arg(short, long)]
    verbose: bool,

    /// Write the machine-readable report to this file
    #[arg(long, value_name = "FILE")]
    report_json: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FixArgs {
    /// Directory to repair
    #[arg(value_name = "DIR", default_value = ".")]
    dir: PathBuf,

    /// Report what would change without writing
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Overwrite files without writing a backup first
    #[arg(long)]
    no_backup: bool,

    /// Maximum number of repair passes per file
    #[arg(long)]
    max_passes: Option<usize>,
}

/// texprep - dependency validation and build checks for TeX projects
#[derive(Parser, Debug)]
#[command(name = "texprep")]
#[command(version)]
#[command(about = "Dependency validation, build checks and escaping repair for TeX projects")]
#[command(long_about = "texprep checks that a root document's packages and content modules exist,
writes placeholder stubs for missing ones, and verifies the project compiles in two steps.

EXAMPLES:
    texprep check                              # Check the root document from texprep.json
    texprep check thesis.tex -v                # Check another root, verbose summary
    texprep check --report-json report.json    # Also write the report as JSON
    texprep fix chapters/                      # Repair escaping damage, with backups
    texprep fix -n .                           # Show what would be repaired
    texprep completions bash > texprep.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in texprep.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "texprep.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Accept everything here; the effective level is set once the config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "texprep", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load_or_create(&cli.config_path)?;
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level.into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    match cli.command {
        Commands::Check(args) => {
            let code = run_check(config, args).await?;
            std::process::exit(code);
        }
        Commands::Fix(args) => run_fix(config, args),
        Commands::Completions { .. } => Ok(()),
    }
}

async fn run_check(mut config: Config, args: CheckArgs) -> Result<i32> {
    if let Some(root) = args.root {
        config.build.root_document = root;
    }
    if args.no_stubs {
        config.build.generate_stubs = false;
    }
    config.validate().context("Configuration validation failed")?;

    let orchestrator = BuildOrchestrator::from_config(config.build.clone());
    let report = orchestrator.run().await;

    println!("{}", report.summary(args.verbose));

    if let Some(path) = &args.report_json {
        let json = report.to_json().context("Failed to serialize build report")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write report to {:?}", path))?;
        info!("Report written to {:?}", path);
    }

    Ok(report.exit_code())
}

fn run_fix(mut config: Config, args: FixArgs) -> Result<()> {
    if let Some(max_passes) = args.max_passes {
        config.escaping.max_passes = max_passes;
    }
    if args.no_backup {
        config.escaping.backup = false;
    }
    config.validate().context("Configuration validation failed")?;

    if !args.dir.is_dir() {
        return Err(anyhow!("Directory does not exist: {:?}", args.dir));
    }

    let options = SessionOptions {
        dry_run: args.dry_run,
        ..SessionOptions::from(&config.escaping)
    };
    let engine = EscapingRepairEngine::with_config(EngineConfig::from(&config.escaping));
    let session = EscapingFixSession::new(engine, options);

    let progress_bar = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress_bar.set_style(style.progress_chars("█▓▒░"));
    progress_bar.set_message("Repairing escaping");

    let report = session.run_with_progress(&args.dir, |done, total| {
        progress_bar.set_length(total as u64);
        progress_bar.set_position(done as u64);
    })?;
    progress_bar.finish_and_clear();

    // Warnings and per-file failures were already logged by the session
    for result in report.results.iter().filter(|r| r.changed) {
        let verb = if args.dry_run { "would fix" } else { "fixed" };
        println!("{:?}: {} {} replacement(s)", result.path, verb, result.replacement_count);
    }
    println!("{}", report.summary.summary());

    if report.failed().next().is_some() {
        return Err(anyhow!("{} file(s) could not be repaired", report.failed().count()));
    }
    Ok(())
}
