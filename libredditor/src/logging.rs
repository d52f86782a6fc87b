//! Centralized logging configuration for all Redditor binaries
//!
//! Provides consistent logging setup with support for:
//! - Text, JSON, and pretty-printed console output on stderr
//! - A daily-rotated log file mirroring the console
//! - Environment variable configuration
//!
//! The library itself only emits `tracing` events; binaries install the sinks.
//!
//! # Examples
//!
//! ```no_run
//! use libredditor::config::LogConfig;
//! use libredditor::logging::LoggingConfig;
//!
//! # fn main() -> libredditor::error::Result<()> {
//! let logging = LoggingConfig::from_config(&LogConfig::default(), false)?;
//!
//! // Keep the guard alive for the life of the program so the file gets flushed
//! let _guard = logging.init();
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::config::LogConfig;
use crate::error::{ConfigError, Result};

pub const ENV_LOG_FORMAT: &str = "REDDITOR_LOG_FORMAT";
pub const ENV_LOG_LEVEL: &str = "REDDITOR_LOG_LEVEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text output (no colors, for piping)
    Text,
    /// Machine-parseable JSON (one JSON object per line)
    Json,
    /// Pretty-printed with colors (for development)
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!(
                "Invalid log format: '{}'. Valid options: text, json, pretty",
                s
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}

/// Where the rotated log file goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    pub directory: PathBuf,
    /// File name prefix; the date is appended on rotation
    pub prefix: String,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
    pub verbose: bool,
    pub file: Option<LogFile>,
}

impl LoggingConfig {
    /// Create a new console-only logging configuration
    ///
    /// # Arguments
    ///
    /// * `format` - Log output format (text, json, or pretty)
    /// * `level` - Minimum log level (error, warn, info, debug, trace)
    /// * `verbose` - If true, defaults to debug level
    pub fn new(format: LogFormat, level: String, verbose: bool) -> Self {
        Self {
            format,
            level,
            verbose,
            file: None,
        }
    }

    /// Mirror console output into a daily-rotated file
    pub fn with_file(mut self, directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        self.file = Some(LogFile {
            directory: directory.into(),
            prefix: prefix.into(),
        });
        self
    }

    /// Build from the `[logging]` config section
    ///
    /// `REDDITOR_LOG_FORMAT` and `REDDITOR_LOG_LEVEL` override the file values.
    pub fn from_config(config: &LogConfig, verbose: bool) -> Result<Self> {
        let format_name = std::env::var(ENV_LOG_FORMAT).unwrap_or_else(|_| config.format.clone());
        let format = format_name
            .parse::<LogFormat>()
            .map_err(ConfigError::Invalid)?;
        let level = std::env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| config.level.clone());

        let logging = Self::new(format, level, verbose);
        if config.to_file {
            let directory = shellexpand::tilde(&config.directory).to_string();
            Ok(logging.with_file(directory, config.file_prefix.clone()))
        } else {
            Ok(logging)
        }
    }

    fn filter(&self) -> EnvFilter {
        if self.verbose {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
        }
    }

    fn console_layer(&self) -> BoxedLayer {
        match self.format {
            LogFormat::Json => fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(true)
                .flatten_event(true)
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .boxed(),
            LogFormat::Pretty => fmt::layer()
                .pretty()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .boxed(),
            LogFormat::Text => fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false)
                .with_level(true)
                .boxed(),
        }
    }

    /// Initialize logging with the configured settings
    ///
    /// This should be called once at the start of your program. The returned
    /// guard flushes the log file when dropped.
    ///
    /// # Panics
    ///
    /// Panics if the logging subscriber has already been initialized
    pub fn init(&self) -> Option<WorkerGuard> {
        let mut layers = vec![self.console_layer()];

        let guard = self.file.as_ref().map(|file| {
            let appender = tracing_appender::rolling::daily(&file.directory, &file.prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer: BoxedLayer = match self.format {
                LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
                LogFormat::Text | LogFormat::Pretty => fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .boxed(),
            };
            layers.push(layer);
            guard
        });

        tracing_subscriber::registry()
            .with(layers)
            .with(self.filter())
            .init();

        guard
    }
}
