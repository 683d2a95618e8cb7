// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use log::{error, warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use caption_converter::app_config::{self, ConverterOptions, Cutoff, DEFAULT_CONVERSIONS_FILE};
use caption_converter::app_controller::Controller;
use caption_converter::codec::CaptionFormat;
use caption_converter::errors::CaptionError;

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

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for caption-converter
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// caption-converter - retime and rewrite caption tracks
///
/// Converts WebVTT, SRT, TTML and DFXP captions, shifting timestamps and
/// rewriting text with the rules from a conversions file.
#[derive(Parser, Debug)]
#[command(name = "caption-converter")]
#[command(version)]
#[command(about = "Retime, rewrite and convert caption files")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "caption-converter shifts caption timestamps, applies substitution rules and writes the result in one or more caption formats.

EXAMPLES:
    caption-converter talk.vtt                          # Apply conversions.json, write talk-converted.vtt
    caption-converter talk.vtt -c rules.json -d fixed   # Use rules.json, write fixed.vtt
    caption-converter talk.srt -o -1500                 # Shift 1.5 s earlier, no text rules
    caption-converter talk.vtt -e srt ttml              # Write talk-converted.srt and .ttml
    caption-converter talk.vtt --cutoff 100             # Drop captions starting after 100 s
    caption-converter captions/ -j 8                    # Convert a whole directory
    caption-converter completions bash > cc.bash        # Generate bash completions

CONVERSIONS FILE:
    A JSON object with exactly two keys: \"offset\" (milliseconds) and
    \"conversions\" (a list of {key, replacement, caseSensitive?,
    directConversion?, previous?} records).")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Caption file or directory to convert
    #[arg(value_name = "CAPTION_PATH")]
    caption_path: Option<PathBuf>,

    /// Conversions (rules) file
    #[arg(short = 'c', long = "conversions", default_value = DEFAULT_CONVERSIONS_FILE)]
    conversions: PathBuf,

    /// Destination filename, default '<source name>-converted'
    #[arg(short = 'd', long = "destination")]
    destination: Option<String>,

    /// Destination directory, default is the source directory
    #[arg(short = 'D', long = "dest-dir")]
    dest_dir: Option<PathBuf>,

    /// Offset in milliseconds; replaces the conversions file entirely
    #[arg(short = 'o', long = "offset", allow_negative_numbers = true, conflicts_with = "conversions")]
    offset: Option<i64>,

    /// Destination format extensions
    #[arg(short = 'e', long = "extensions", num_args = 1.., default_value = "vtt")]
    extensions: Vec<String>,

    /// Drop captions whose shifted start is later than this many seconds
    #[arg(long = "cutoff")]
    cutoff: Option<f64>,

    /// Files converted concurrently when CAPTION_PATH is a directory
    #[arg(short = 'j', long = "jobs", default_value_t = 4)]
    jobs: usize,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

impl CommandLineOptions {
    fn into_converter_options(self, caption_path: PathBuf) -> Result<ConverterOptions> {
        let destination_formats = self
            .extensions
            .iter()
            .map(|ext| ext.parse::<CaptionFormat>())
            .collect::<Result<Vec<_>, CaptionError>>()?;

        let mut options = ConverterOptions::new(caption_path)
            .with_conversions_file(self.conversions)
            .with_formats(destination_formats)
            .with_cutoff(Cutoff::from_seconds(self.cutoff));
        options.dest_filename = self.destination;
        options.dest_directory = self.dest_dir;
        options.offset_override = self.offset;
        options.jobs = self.jobs;
        if let Some(level) = self.log_level {
            options.log_level = level.into();
        }
        Ok(options)
    }
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

    // @returns: ANSI color and tag for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "ERROR"),
            Level::Warn => ("1;33", "WARN "),
            Level::Info => ("1;32", "INFO "),
            Level::Debug => ("1;36", "DEBUG"),
            Level::Trace => ("1;35", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let (color, tag) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    let cli = CommandLineOptions::parse();

    let level = cli
        .log_level
        .clone()
        .map(|level| LevelFilter::from(&app_config::LogLevel::from(level)))
        .unwrap_or(LevelFilter::Info);
    if let Err(e) = CustomLogger::init(level) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    if let Err(e) = run(cli).await {
        // Validation errors are user-facing messages, print them as-is
        match e.downcast_ref::<CaptionError>() {
            Some(CaptionError::ZeroOffset) => println!("{}", e),
            _ => error!("{:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: CommandLineOptions) -> Result<()> {
    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "caption-converter", &mut std::io::stdout());
        return Ok(());
    }

    let caption_path = cli.caption_path.clone().ok_or_else(|| {
        anyhow!("CAPTION_PATH is required when no subcommand is specified")
    })?;
    let options = cli.into_converter_options(caption_path)?;

    let controller = Controller::new();

    if options.source.is_dir() {
        let batch = controller.run_folder(&options).await?;
        if batch.failed > 0 {
            return Err(anyhow!("{} file(s) failed to convert", batch.failed));
        }
        return Ok(());
    }

    // Single files run on a blocking worker like batch files do
    let report = tokio::task::spawn_blocking(move || controller.run(&options)).await??;

    if report.is_empty() {
        warn!("All captions were dropped; no output written for {:?}", report.source);
    } else if !report.failed.is_empty() {
        return Err(anyhow!("{} output format(s) failed to write", report.failed.len()));
    } else {
        info!(
            "Converted {} of {} caption(s) into {} file(s)",
            report.captions_written,
            report.captions_read,
            report.written.len()
        );
    }

    Ok(())
}
