// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, LevelFilter, Level, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use xliffsheet::app_config::{self, Config, StripStrategy};
use xliffsheet::app_controller::{Controller, RunSummary};
use xliffsheet::file_utils::PresetLocations;
use xliffsheet::language_utils::LanguageTagStyle;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for LanguageTagStyle
#[derive(Debug, Clone, ValueEnum)]
enum CliTagStyle {
    Verbatim,
    HyphenatedLowercase,
}

impl From<CliTagStyle> for LanguageTagStyle {
    fn from(style: CliTagStyle) -> Self {
        match style {
            CliTagStyle::Verbatim => LanguageTagStyle::Verbatim,
            CliTagStyle::HyphenatedLowercase => LanguageTagStyle::HyphenatedLowercase,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert XLSX workbooks (one sheet per language) to XLIFF files
    Export {
        /// Workbook or directory of workbooks
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,

        /// How language tags appear in target-language and filenames
        #[arg(long, value_enum)]
        tag_style: Option<CliTagStyle>,
    },

    /// Convert XLIFF files to XLSX workbooks
    Import {
        /// XLIFF file or directory of XLIFF files
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,

        /// Write a single workbook with one sheet per language
        #[arg(long)]
        combine: bool,
    },

    /// Convert XLIFF to a workbook and add reviewer feedback columns
    Review {
        /// XLIFF file or directory of XLIFF files
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,

        /// Reference translation (XLIFF or workbook) for the English column
        #[arg(short, long)]
        reference: Option<PathBuf>,
    },

    /// Add reviewer feedback columns to an existing workbook
    Feedback {
        /// Workbook to annotate
        #[arg(value_name = "WORKBOOK")]
        workbook: PathBuf,

        /// Reference translation (XLIFF or workbook) for the English column
        #[arg(short, long)]
        reference: Option<PathBuf>,
    },

    /// Build per-language deployment archives from metadata translation fragments
    Package {
        /// Directory holding <objectApiName>-<languageCode>.<extension> files
        #[arg(value_name = "FRAGMENT_DIR")]
        fragment_dir: PathBuf,

        /// Also write the unzipped package tree next to the archives
        #[arg(long)]
        write_tree: bool,

        /// Section removal strategy
        #[arg(long)]
        strip_strategy: Option<StripStrategy>,
    },

    /// Generate shell completions for xliffsheet
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct GlobalOptions {
    /// Directory outputs are written into (defaults to the input's directory)
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long, global = true)]
    force_overwrite: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// xliffsheet - spreadsheet and XLIFF conversion for translation workflows
#[derive(Parser, Debug)]
#[command(name = "xliffsheet")]
#[command(version)]
#[command(about = "Convert translation workbooks to XLIFF and back, and build deployment packages")]
#[command(long_about = "xliffsheet converts translation workbooks (one sheet per language) to XLIFF 1.2
and back, adds reviewer feedback columns, and bundles metadata translation
fragments into per-language deployment archives.

EXAMPLES:
    xliffsheet export translations.xlsx             # One XLIFF file per sheet
    xliffsheet import fr_output.xlf                 # XLIFF back to a workbook
    xliffsheet import --combine xliff/              # One workbook, a sheet per file
    xliffsheet review fr_output.xlf -r en_US.xlf    # Workbook with feedback columns
    xliffsheet package objectTranslations/ -o out/  # Deployment archive per language
    xliffsheet completions bash > xliffsheet.bash   # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
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

    // @returns: Prefix and ANSI color for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("ERROR", "\x1B[1;31m"),
            Level::Warn => ("WARN ", "\x1B[1;33m"),
            Level::Info => ("INFO ", "\x1B[1;32m"),
            Level::Debug => ("DEBUG", "\x1B[1;36m"),
            Level::Trace => ("TRACE", "\x1B[1;35m"),
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
            let (prefix, color) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, prefix, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() {
    // The logger accepts everything; the max level is adjusted once the config is known
    if let Err(e) = CustomLogger::init(LevelFilter::Trace) {
        eprintln!("Failed to initialize logger: {}", e);
    }
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match run(cli).await {
        Ok(summary) if summary.has_failures() => std::process::exit(2),
        Ok(_) => {}
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: CommandLineOptions) -> Result<RunSummary> {
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "xliffsheet", &mut std::io::stdout());
        return Ok(RunSummary::default());
    }

    let options = cli.global;
    if let Some(level) = &options.log_level {
        log::set_max_level(level_filter(&level.clone().into()));
    }

    let mut config = Config::load_or_create(Path::new(&options.config_path))?;

    // Override config with CLI options if provided
    if let Some(level) = &options.log_level {
        config.log_level = level.clone().into();
    }
    match &cli.command {
        Commands::Export { tag_style: Some(style), .. } => {
            config.conversion.language_tag_style = style.clone().into();
        }
        Commands::Package { strip_strategy: Some(strategy), .. } => {
            config.package.strip_strategy = *strategy;
        }
        _ => {}
    }

    config.validate().context("Configuration validation failed")?;

    if options.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    let (input, reference) = match &cli.command {
        Commands::Export { input_path, .. }
        | Commands::Import { input_path, .. } => (input_path.clone(), None),
        Commands::Review { input_path, reference } => (input_path.clone(), reference.clone()),
        Commands::Feedback { workbook, reference } => (workbook.clone(), reference.clone()),
        Commands::Package { fragment_dir, .. } => (fragment_dir.clone(), None),
        Commands::Completions { .. } => return Err(anyhow!("completions are handled above")),
    };

    let output_dir = options.output_dir.clone().unwrap_or_else(|| default_output_dir(&input));
    let locations = PresetLocations::new(reference, output_dir, options.force_overwrite);
    let controller = Controller::with_locations(config, locations)?;

    match cli.command {
        Commands::Export { input_path, .. } => controller.export(&input_path).await,
        Commands::Import { input_path, combine } => controller.import(&input_path, combine).await,
        Commands::Review { input_path, .. } => controller.review(&input_path).await,
        Commands::Feedback { workbook, .. } => controller.feedback(&workbook).await,
        Commands::Package { fragment_dir, write_tree, .. } => controller.package(&fragment_dir, write_tree).await,
        Commands::Completions { .. } => Ok(RunSummary::default()),
    }
}

// Outputs land next to a file input, or inside a directory input
fn default_output_dir(input: &Path) -> PathBuf {
    if input.is_dir() {
        input.to_path_buf()
    } else {
        input
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
