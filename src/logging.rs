//! Logging System
//!
//! Structured logging on `tracing`. Level, format and destination come from
//! [`LoggingConfig`], with environment overrides:
//!
//! - `POLARIS_LOG`: full `EnvFilter` directive string (wins over level/modules)
//! - `POLARIS_LOG_FORMAT`: `text` or `json`
//! - `POLARIS_LOG_OUTPUT`: `stdout`, `stderr`, `file`, `file+stderr`, `both`
//! - `POLARIS_LOG_FILE`: log file path

use crate::config::paths::xdg_root;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// json or text
    #[serde(default = "default_format")]
    pub format: String,

    /// stdout, stderr, file, file+stderr, both
    #[serde(default = "default_output")]
    pub output: String,

    /// None means the platform state directory
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Colored text output on stdout/stderr
    #[serde(default = "default_true")]
    pub color: bool,

    /// Per-module levels, e.g. `polaris::actions = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: default_true(),
            modules: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OutputDestinations {
    stdout: bool,
    stderr: bool,
    file: bool,
}

fn parse_output_destinations(output: &str) -> Result<OutputDestinations, ApiError> {
    let (stdout, stderr, file) = match output {
        "stdout" => (true, false, false),
        "stderr" => (false, true, false),
        "file" => (false, false, true),
        "file+stderr" => (false, true, true),
        "both" => (true, true, false),
        _ => {
            return Err(ApiError::ConfigError(format!(
                "Invalid log output: {} (must be 'stdout', 'stderr', 'file', 'file+stderr', or 'both')",
                output
            )))
        }
    };
    Ok(OutputDestinations {
        stdout,
        stderr,
        file,
    })
}

fn determine_format(config: &LoggingConfig) -> Result<String, ApiError> {
    let format = std::env::var("POLARIS_LOG_FORMAT").unwrap_or_else(|_| config.format.clone());
    match format.as_str() {
        "json" | "text" => Ok(format),
        other => Err(ApiError::ConfigError(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            other
        ))),
    }
}

fn determine_output(config: &LoggingConfig) -> Result<OutputDestinations, ApiError> {
    match std::env::var("POLARIS_LOG_OUTPUT") {
        Ok(output) => parse_output_destinations(&output),
        Err(_) => parse_output_destinations(&config.output),
    }
}

fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, ApiError> {
    if let Ok(filter) = EnvFilter::try_from_env("POLARIS_LOG") {
        return Ok(filter);
    }
    if config.level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::new(&config.level);
    for (module, level) in &config.modules {
        let directive = format!("{}={}", module, level)
            .parse()
            .map_err(|e| ApiError::ConfigError(format!("Invalid log directive: {}", e)))?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

/// Log file path: `POLARIS_LOG_FILE`, then config, then the platform default.
pub fn resolve_log_file_path(config: &LoggingConfig) -> Result<PathBuf, ApiError> {
    if let Ok(path) = std::env::var("POLARIS_LOG_FILE") {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    match &config.file {
        Some(path) if !path.as_os_str().is_empty() => Ok(path.clone()),
        _ => xdg_root::default_log_path(),
    }
}

fn open_log_file(config: &LoggingConfig) -> Result<Mutex<std::fs::File>, ApiError> {
    let path = resolve_log_file_path(config)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ApiError::ConfigError(format!("Failed to create log directory: {}", e))
        })?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| {
            ApiError::ConfigError(format!("Failed to open log file {}: {}", path.display(), e))
        })?;
    Ok(Mutex::new(file))
}

fn make_writer(
    config: &LoggingConfig,
    output: OutputDestinations,
) -> Result<BoxMakeWriter, ApiError> {
    let writer = match (output.file, output.stdout, output.stderr) {
        (true, _, true) => BoxMakeWriter::new(open_log_file(config)?.and(std::io::stderr)),
        (true, _, false) => BoxMakeWriter::new(open_log_file(config)?),
        (false, true, true) => BoxMakeWriter::new(std::io::stdout.and(std::io::stderr)),
        (false, true, false) => BoxMakeWriter::new(std::io::stdout),
        (false, false, _) => BoxMakeWriter::new(std::io::stderr),
    };
    Ok(writer)
}

/// Initialize the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ApiError> {
    let init_err =
        |e: tracing_subscriber::util::TryInitError| ApiError::ConfigError(e.to_string());

    if !config.enabled {
        return Registry::default()
            .with(EnvFilter::new("off"))
            .try_init()
            .map_err(init_err);
    }

    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let output = determine_output(config)?;
    let ansi = config.color && !output.file;
    let writer = make_writer(config, output)?;
    let registry = Registry::default().with(filter);

    if format == "json" {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init()
            .map_err(init_err)
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .try_init()
            .map_err(init_err)
    }
}
