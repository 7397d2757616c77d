// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use codex_translator::app_config::{Config, LogLevel};
use codex_translator::app_controller::build_endpoint_pool;
use codex_translator::providers::Provider;
use codex_translator::translation::PromptSet;
use codex_translator::{Checkpointer, Controller, DatasetFile, DatasetStatus, build_translator};

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
    /// Translate pending record fields (default command)
    Translate,

    /// Report how many records and fields still need translation
    Status,

    /// Check that every configured endpoint accepts our credentials
    Check,

    /// Generate shell completions for codex-translator
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// codex-translator - translate character codex records into Chinese
///
/// Walks a JSON codex in order, translating each record's description and
/// scenario through a rotating pool of chat endpoints, and checkpoints the
/// dataset file as it goes. Fields that already contain Chinese are skipped,
/// so an interrupted run can simply be restarted.
#[derive(Parser, Debug)]
#[command(name = "codex-translator")]
#[command(version)]
#[command(about = "Translate character codex records into Chinese with LLM endpoints")]
#[command(long_about = "Translates the description and scenario of every character record into Chinese.

EXAMPLES:
    codex-translator                            # Translate using conf.json
    codex-translator -c my.json                 # Use another config file
    codex-translator -d data/other.json         # Translate another dataset
    codex-translator --log-level debug          # Verbose logging
    codex-translator status                     # Count pending fields
    codex-translator check                      # Test every endpoint
    codex-translator completions bash > ct.bash # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the config file doesn't
    exist, a default one is created. API keys are read from the environment
    variables named in the providers section; a .env file is honored.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: PathBuf,

    /// Dataset file, overriding the config
    #[arg(short, long, global = true)]
    dataset: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Disable the progress bar
    #[arg(long, global = true)]
    no_progress: bool,
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

    // @returns: ANSI color code for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }

    // @returns: Short tag for log level
    fn tag_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "ERROR",
            Level::Warn => "WARN ",
            Level::Info => "INFO ",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
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
                "\x1B[{}m{} {} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                Self::tag_for_level(record.level()),
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
    // The logger accepts everything; the effective level is set through
    // max_level once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "codex-translator", &mut std::io::stdout());
        return Ok(());
    }

    dotenvy::dotenv().ok();
    let config = load_config(&cli)?;

    match cli.command {
        Some(Commands::Status) => run_status(&config),
        Some(Commands::Check) => run_check(&config).await,
        _ => run_translate(&config, !cli.no_progress).await,
    }
}

fn load_config(options: &CommandLineOptions) -> Result<Config> {
    if let Some(cmd_log_level) = &options.log_level {
        let level: LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let (mut config, created) = Config::load_or_create(&options.config_path)
        .with_context(|| format!("Failed to load config file: {:?}", options.config_path))?;
    if created {
        warn!("Config file not found at {:?}, created default config.", options.config_path);
    }

    // Override config with CLI options if provided
    if let Some(dataset) = &options.dataset {
        config.dataset_path = dataset.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());
    Ok(config)
}

fn run_status(config: &Config) -> Result<()> {
    let records = DatasetFile::new(&config.dataset_path).load()?;
    let status = DatasetStatus::of(&records);
    println!("Dataset: {}", config.dataset_path.display());
    println!("Records: {}", status.records);
    println!("Records pending: {}", status.pending_records);
    println!("Fields pending: {}", status.pending_fields);
    if status.is_complete() {
        info!("All records are translated");
    }
    Ok(())
}

async fn run_check(config: &Config) -> Result<()> {
    let pool = build_endpoint_pool(config)?;
    let mut failures = 0;
    for endpoint in pool.iter() {
        match endpoint.client.test_connection().await {
            Ok(()) => info!("{} is reachable", endpoint.label()),
            Err(e) => {
                failures += 1;
                error!("{} failed: {}", endpoint.label(), e);
            }
        }
    }
    if failures > 0 {
        return Err(anyhow!("{} of {} endpoints failed the connection check", failures, pool.len()));
    }
    Ok(())
}

async fn run_translate(config: &Config, show_progress: bool) -> Result<()> {
    let dataset = DatasetFile::new(&config.dataset_path);
    let mut records = dataset.load()?;
    info!("Loaded {} records from {}", records.len(), dataset.path().display());

    let prompts = PromptSet::load(&config.system_prompt_path, &config.input_prompt_path)
        .context("Failed to load prompt resources")?;
    let translator = build_translator(config, prompts)?;
    for endpoint in translator.pool().iter() {
        info!("Endpoint: {}", endpoint.label());
    }

    let controller = Controller::new(translator, Duration::from_millis(config.checkpoint.jitter_ms))
        .with_progress(show_progress);
    let mut checkpointer = Checkpointer::new(dataset, config.checkpoint.window());

    let summary = controller.run(&mut records, &mut checkpointer).await?;
    info!(
        "Done: {} of {} records changed",
        summary.changed, summary.processed
    );
    Ok(())
}
