//! Process-wide logging bootstrap.
//!
//! # Responsibility
//! - Install size-rotated file logs once per process.
//! - Turn panics into single-line log events.
//!
//! # Invariants
//! - A relative log directory is resolved against the working directory
//!   before anything is compared or created.
//! - Repeating `init_logging` with the same settings is a no-op; other
//!   settings are refused while logging is active.
//! - Initialization never panics.
//! - Events never carry record contents (patient names, measurement
//!   values, free-text notes). Store and log locations may appear in
//!   diagnostics.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::fmt::{Display, Formatter};
use std::path::{Component, Path, PathBuf};

const LOG_FILE_BASENAME: &str = "medianalyze";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_LOG_FILES: usize = 5;
const PANIC_PAYLOAD_LIMIT: usize = 160;
const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Settings of the logger currently installed in this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingStatus {
    pub level: &'static str,
    pub log_dir: PathBuf,
}

struct ActiveLogger {
    status: LoggingStatus,
    _handle: LoggerHandle,
}

#[derive(Debug)]
pub enum LoggingError {
    UnsupportedLevel(String),
    EmptyDirectory,
    WorkingDirectory(std::io::Error),
    CreateDirectory {
        log_dir: PathBuf,
        source: std::io::Error,
    },
    Backend(flexi_logger::FlexiLoggerError),
    AlreadyActive {
        active: LoggingStatus,
        requested: LoggingStatus,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected one of {}",
                LEVELS.join("|")
            ),
            Self::EmptyDirectory => write!(f, "log directory cannot be empty"),
            Self::WorkingDirectory(err) => {
                write!(f, "cannot resolve relative log directory: {err}")
            }
            Self::CreateDirectory { log_dir, source } => write!(
                f,
                "failed to create log directory `{}`: {source}",
                log_dir.display()
            ),
            Self::Backend(err) => write!(f, "failed to start logger: {err}"),
            Self::AlreadyActive { active, requested } => write!(
                f,
                "logging already active with level `{}` at `{}`; refusing level `{}` at `{}`",
                active.level,
                active.log_dir.display(),
                requested.level,
                requested.log_dir.display()
            ),
        }
    }
}

impl std::error::Error for LoggingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::WorkingDirectory(err) => Some(err),
            Self::CreateDirectory { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

/// Starts rolling file logs at `level` under `log_dir`.
///
/// `log_dir` may be relative; it is resolved against the current working
/// directory. Calling again with settings that resolve to the active ones
/// succeeds without touching the logger.
///
/// # Errors
/// - [`LoggingError::UnsupportedLevel`] for anything outside
///   trace|debug|info|warn|error (`warning` is accepted as `warn`).
/// - [`LoggingError::EmptyDirectory`] / [`LoggingError::WorkingDirectory`]
///   when the directory cannot be resolved.
/// - [`LoggingError::CreateDirectory`] / [`LoggingError::Backend`] when the
///   logger cannot be installed.
/// - [`LoggingError::AlreadyActive`] when different settings are active.
pub fn init_logging(level: &str, log_dir: &Path) -> Result<(), LoggingError> {
    let requested = LoggingStatus {
        level: parse_level(level)?,
        log_dir: resolve_log_dir(log_dir)?,
    };

    let active = ACTIVE.get_or_try_init(|| start_logger(requested.clone()))?;
    if active.status != requested {
        return Err(LoggingError::AlreadyActive {
            active: active.status.clone(),
            requested,
        });
    }
    Ok(())
}

/// Returns the active settings, or `None` before `init_logging` succeeded.
pub fn logging_status() -> Option<LoggingStatus> {
    ACTIVE.get().map(|active| active.status.clone())
}

/// `debug` in debug builds, `info` in release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

/// Resolves `log_dir` to the absolute directory `init_logging` would use.
pub fn resolve_log_dir(log_dir: &Path) -> Result<PathBuf, LoggingError> {
    if log_dir.as_os_str().is_empty() {
        return Err(LoggingError::EmptyDirectory);
    }
    if log_dir.is_absolute() {
        return Ok(join_lexically(Path::new(""), log_dir));
    }
    let cwd = std::env::current_dir().map_err(LoggingError::WorkingDirectory)?;
    Ok(join_lexically(&cwd, log_dir))
}

fn join_lexically(base: &Path, relative: &Path) -> PathBuf {
    let mut joined = base.to_path_buf();
    for component in relative.components() {
        match component {
            Component::CurDir => {}
            other => joined.push(other.as_os_str()),
        }
    }
    joined
}

fn parse_level(level: &str) -> Result<&'static str, LoggingError> {
    let lowered = level.trim().to_ascii_lowercase();
    let canonical = if lowered == "warning" {
        "warn"
    } else {
        lowered.as_str()
    };
    LEVELS
        .iter()
        .copied()
        .find(|known| *known == canonical)
        .ok_or(LoggingError::UnsupportedLevel(lowered))
}

fn start_logger(status: LoggingStatus) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&status.log_dir).map_err(|source| LoggingError::CreateDirectory {
        log_dir: status.log_dir.clone(),
        source,
    })?;

    let handle = Logger::try_with_str(status.level)
        .map_err(LoggingError::Backend)?
        .log_to_file(
            FileSpec::default()
                .directory(&status.log_dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(LoggingError::Backend)?;

    install_panic_hook();
    info!(
        "event=logging_init module=logging status=ok level={} log_dir={} version={} os={}",
        status.level,
        status.log_dir.display(),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    );

    Ok(ActiveLogger {
        status,
        _handle: handle,
    })
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }
    let chained = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!(
            "event=panic module=logging status=error location={} payload={}",
            location,
            single_line(panic_text(info.payload()), PANIC_PAYLOAD_LIMIT)
        );
        chained(info);
    }));
}

fn panic_text(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Flattens line breaks and caps the text at `limit` characters.
fn single_line(text: &str, limit: usize) -> String {
    let mut out: String = text
        .chars()
        .take(limit)
        .map(|ch| if matches!(ch, '\n' | '\r') { ' ' } else { ch })
        .collect();
    if text.chars().nth(limit).is_some() {
        out.push_str("...");
    }
    out
}
