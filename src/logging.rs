//! Logging setup for the `stuntman` binary
//!
//! The library only emits `tracing` events; this module decides where they
//! go: stderr (compact or JSON) and optionally a rolling file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::LoggingSettings;
use crate::error::{Error, Result};

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Dependencies that are only interesting when they fail.
const QUIET_DEPENDENCIES: &[&str] = &["hyper", "reqwest", "rustls"];

const DEFAULT_LOG_FILE_STEM: &str = "stuntman";
const DEFAULT_LOG_FILE_SUFFIX: &str = "log";

/// Keeps the file writer alive; drop it last so buffered lines are flushed.
pub struct LogGuards {
    _file_guard: Option<WorkerGuard>,
}

/// Install the global subscriber for a registry-building command.
///
/// `-v`/`-vv` and `--quiet` win over the configured level. A valid
/// `RUST_LOG` replaces both.
pub fn init_logging(settings: &LoggingSettings, verbose: u8, quiet: bool) -> Result<LogGuards> {
    let level = effective_level(settings, verbose, quiet);

    let (file_layer, file_guard) = match settings.file.as_deref() {
        Some(log_file) => {
            let (writer, guard) = rolling_writer(log_file, settings.max_file_size_mb, settings.max_files)?;
            (Some(format_layer(writer, settings.json_format, false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter(level, std::env::var("RUST_LOG").ok().as_deref())?)
        .with(format_layer(std::io::stderr, settings.json_format, true))
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to initialize logging: {}", e)))?;

    tracing::debug!(%level, file = ?settings.file, json = settings.json_format, "Logging initialized");

    Ok(LogGuards {
        _file_guard: file_guard,
    })
}

/// Stderr-only subscriber at a fixed level, for `config` subcommands.
pub fn init_simple(level: Level) -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .with(format_layer(std::io::stderr, false, true))
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to initialize logging: {}", e)))
}

fn effective_level(settings: &LoggingSettings, verbose: u8, quiet: bool) -> Level {
    match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => parse_level(&settings.level).unwrap_or(Level::INFO),
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    }
}

/// Level names accepted in `[logging] level`, case-insensitive.
pub fn parse_level(name: &str) -> Option<Level> {
    if name.eq_ignore_ascii_case("warning") {
        return Some(Level::WARN);
    }
    name.parse().ok()
}

/// A valid `rust_log` is used as given; otherwise `level` applies, with
/// noisy dependencies capped at warn.
fn env_filter(level: Level, rust_log: Option<&str>) -> Result<EnvFilter> {
    if let Some(filter) = rust_log.and_then(|spec| EnvFilter::try_new(spec).ok()) {
        return Ok(filter);
    }

    let level_name = level.as_str().to_lowercase();
    let directive = |text: String| -> Result<Directive> {
        text.parse()
            .map_err(|e| Error::config_field_invalid("logging.level", format!("{}: {}", text, e)))
    };

    let mut filter = EnvFilter::new(&level_name)
        .add_directive(directive(format!("stuntman={}", level_name))?);

    for dependency in QUIET_DEPENDENCIES {
        filter = filter.add_directive(directive(format!("{}=warn", dependency))?);
    }

    Ok(filter)
}

/// One formatting layer over `writer`. Files get source locations, never ANSI.
fn format_layer<S, W>(writer: W, json: bool, console: bool) -> BoxedLayer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_file(!console)
        .with_line_number(!console);

    match (json, console) {
        (true, _) => Box::new(layer.json()),
        (false, true) => Box::new(layer.with_ansi(true).compact()),
        (false, false) => Box::new(layer.with_ansi(false)),
    }
}

/// Split a configured log path into the appender's directory, file prefix
/// and suffix; rotated files are named `<prefix>.<date>.<suffix>`.
fn log_location(log_file: &str) -> (PathBuf, String, String) {
    let path = Path::new(log_file);
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let prefix = path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_LOG_FILE_STEM)
        .to_string();
    let suffix = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(DEFAULT_LOG_FILE_SUFFIX)
        .to_string();
    (directory, prefix, suffix)
}

/// tracing-appender rotates by time only; small size limits rotate hourly.
fn rotation_for(max_size_mb: u64) -> Rotation {
    if (1..10).contains(&max_size_mb) {
        Rotation::HOURLY
    } else {
        Rotation::DAILY
    }
}

fn rolling_writer(
    log_file: &str,
    max_size_mb: u64,
    max_files: u32,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let (directory, prefix, suffix) = log_location(log_file);

    fs::create_dir_all(&directory).map_err(|e| {
        Error::config_field_invalid(
            "logging.file",
            format!("Failed to create log directory '{}': {}", directory.display(), e),
        )
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(rotation_for(max_size_mb))
        .filename_prefix(prefix)
        .filename_suffix(suffix)
        .max_log_files(max_files.max(1) as usize)
        .build(&directory)
        .map_err(|e| Error::config_field_invalid("logging.file", e.to_string()))?;

    Ok(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("TRACE"), Some(Level::TRACE));
        assert_eq!(parse_level("Warning"), Some(Level::WARN));
        assert_eq!(parse_level("error"), Some(Level::ERROR));
        assert_eq!(parse_level("shouting"), None);
    }

    #[test]
    fn test_flags_override_configured_level() {
        let settings = LoggingSettings {
            level: "warn".to_string(),
            ..Default::default()
        };
        assert_eq!(effective_level(&settings, 0, false), Level::WARN);
        assert_eq!(effective_level(&settings, 1, false), Level::DEBUG);
        assert_eq!(effective_level(&settings, 3, false), Level::TRACE);
        assert_eq!(effective_level(&settings, 2, true), Level::ERROR);
    }

    #[test]
    fn test_unknown_configured_level_falls_back_to_info() {
        let settings = LoggingSettings {
            level: "loud".to_string(),
            ..Default::default()
        };
        assert_eq!(effective_level(&settings, 0, false), Level::INFO);
    }

    #[test]
    fn test_env_filter_from_level() {
        let filter = env_filter(Level::DEBUG, None).unwrap().to_string();
        assert!(filter.contains("stuntman=debug"));
        assert!(filter.contains("reqwest=warn"));
    }

    #[test]
    fn test_rust_log_wins_over_level() {
        let filter = env_filter(Level::INFO, Some("stuntman=trace")).unwrap().to_string();
        assert!(filter.contains("stuntman=trace"));
        assert!(!filter.contains("stuntman=info"));
    }

    #[test]
    fn test_invalid_rust_log_falls_back_to_level() {
        let filter = env_filter(Level::WARN, Some("stuntman=loudest")).unwrap().to_string();
        assert!(filter.contains("stuntman=warn"));
    }

    #[test]
    fn test_log_location() {
        assert_eq!(
            log_location("/var/log/stuntman/app.log"),
            (
                PathBuf::from("/var/log/stuntman"),
                "app".to_string(),
                "log".to_string()
            )
        );
        assert_eq!(
            log_location("stuntman"),
            (PathBuf::from("."), "stuntman".to_string(), "log".to_string())
        );
    }

    #[test]
    fn test_rotation_for_size() {
        assert_eq!(rotation_for(5), Rotation::HOURLY);
        assert_eq!(rotation_for(0), Rotation::DAILY);
        assert_eq!(rotation_for(100), Rotation::DAILY);
    }

    #[test]
    fn test_rolling_writer_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("logs").join("stuntman.log");

        let result = rolling_writer(log_path.to_str().unwrap(), 100, 5);

        assert!(result.is_ok());
        assert!(temp_dir.path().join("logs").exists());
    }
}
