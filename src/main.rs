// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use cuecollide::app_config::{self, Config};
use cuecollide::app_controller::Controller;
use cuecollide::timecode::FrameRate;

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
    /// Check one caption file against one subtitle file
    Check {
        /// Caption file (DFXP/TTML, decoded from SCC)
        #[arg(value_name = "CAPTIONS")]
        captions: PathBuf,

        /// Subtitle file (iTT)
        #[arg(value_name = "SUBTITLES")]
        subtitles: PathBuf,
    },

    /// Check every iTT file in a directory against the caption file sharing its name
    Batch {
        /// Directory to scan (recursive)
        #[arg(value_name = "INPUT_DIR")]
        input_dir: PathBuf,
    },

    /// Generate shell completions for cuecollide
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct GlobalOptions {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Directory for the overlap reports
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Frame rate the caption timecodes were authored at
    #[arg(long, global = true)]
    caption_fps: Option<f64>,

    /// Frame rate the subtitle timecodes were authored at
    #[arg(long, global = true)]
    subtitle_fps: Option<f64>,

    /// Also write a JSON report
    #[arg(long, global = true)]
    json: bool,

    /// Exit with an error when any overlap is found
    #[arg(long, global = true)]
    fail_on_overlap: bool,
}

/// cuecollide - caption/subtitle collision checker
///
/// Flags every caption and subtitle whose display times intersect, so
/// forced subtitles never land on screen on top of closed captions.
#[derive(Parser, Debug)]
#[command(name = "cuecollide")]
#[command(version)]
#[command(about = "Detects timing collisions between caption and subtitle tracks")]
#[command(long_about = "cuecollide compares a caption track and a subtitle track authored at different frame rates and reports every pair of events displayed at the same time.

EXAMPLES:
    cuecollide check ep01.dfxp ep01.itt               # Check one pair using conf.json
    cuecollide check --subtitle-fps 25 ep01.dfxp ep01.itt
    cuecollide batch /deliveries/season1 -o results  # Check every iTT with a matching caption file
    cuecollide completions bash > cuecollide.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one is created automatically.

SCC CAPTIONS:
    SCC streams must be converted to DFXP with an external caption converter first.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    options: GlobalOptions,
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
        // The logger lets everything through; the max level does the filtering
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
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
                "{}{} {:<5} {}\x1B[0m",
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
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "cuecollide", &mut std::io::stdout());
            Ok(())
        }
        Commands::Check { captions, subtitles } => {
            let (controller, output_dir) = prepare(&cli.options)?;
            let report = controller.run(&captions, &subtitles, &output_dir)?;

            if cli.options.fail_on_overlap && !report.is_clean() {
                return Err(anyhow!("{} overlap(s) found", report.overlap_count()));
            }
            Ok(())
        }
        Commands::Batch { input_dir } => {
            if !input_dir.is_dir() {
                return Err(anyhow!("Input path is not a directory: {:?}", input_dir));
            }

            let (controller, output_dir) = prepare(&cli.options)?;
            let summary = controller.run_folder(&input_dir, &output_dir).await?;

            if summary.has_failures() {
                return Err(anyhow!("{} pair(s) could not be checked", summary.failed()));
            }
            if cli.options.fail_on_overlap && summary.total_overlaps() > 0 {
                return Err(anyhow!("{} overlap(s) found", summary.total_overlaps()));
            }
            Ok(())
        }
    }
}

/// Load the config, apply command line overrides and build the controller
fn prepare(options: &GlobalOptions) -> Result<(Controller, PathBuf)> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(Path::new(&options.config_path))?;

    if let Some(fps) = options.caption_fps {
        config.captions.frame_rate = FrameRate::new(fps)?;
    }

    if let Some(fps) = options.subtitle_fps {
        config.subtitles.frame_rate = FrameRate::new(fps)?;
    }

    if options.json {
        config.write_json = true;
    }

    if let Some(output_dir) = &options.output_dir {
        config.output_dir = output_dir.to_string_lossy().to_string();
    }

    match &options.log_level {
        Some(log_level) => config.log_level = log_level.clone().into(),
        // Just update the max level without reinitializing the logger
        None => log::set_max_level(config.log_level.to_level_filter()),
    }

    info!(
        "Captions at {}, subtitles at {}",
        config.captions.frame_rate, config.subtitles.frame_rate
    );

    let output_dir = PathBuf::from(&config.output_dir);
    let controller = Controller::with_config(config)?;

    Ok((controller, output_dir))
}
