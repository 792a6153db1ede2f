//! Stderr logging bootstrap.
//!
//! # Invariants
//! - Initialization happens at most once per process; later calls with the
//!   same level are no-ops, a different level is rejected.
//! - Initialization never panics.
//! - While a progress bar is attached, log lines are written with the bar
//!   suspended so the two never share a terminal line.

use flexi_logger::writers::LogWriter;
use flexi_logger::{DeferredNow, Logger, LoggerHandle, Record};
use indicatif::ProgressBar;
use log::info;
use once_cell::sync::OnceCell;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// Environment variable consulted when no level is passed explicitly.
pub const ENV_LOG_LEVEL: &str = "SHADOW_BATCH_LOG";

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static ACTIVE_BAR: Mutex<Option<ProgressBar>> = Mutex::new(None);

struct LoggingState {
    level: &'static str,
    _logger: LoggerHandle,
}

/// Starts the stderr logger at `level`.
///
/// # Errors
/// - `level` is not one of trace|debug|info|warn|error.
/// - Logging is already active at another level.
/// - The backend fails to start.
pub fn init_logging(level: &str) -> Result<(), String> {
    let normalized = normalize_level(level)?;

    let state = LOGGING_STATE.get_or_try_init(|| -> Result<LoggingState, String> {
        let logger = Logger::try_with_str(normalized)
            .map_err(|err| format!("invalid log level `{normalized}`: {err}"))?
            .log_to_writer(Box::new(StderrBelowProgress))
            .start()
            .map_err(|err| format!("failed to start logger: {err}"))?;

        info!(
            "event=app_start platform={} version={} level={}",
            std::env::consts::OS,
            env!("CARGO_PKG_VERSION"),
            normalized
        );

        Ok(LoggingState {
            level: normalized,
            _logger: logger,
        })
    })?;

    if state.level != normalized {
        return Err(format!(
            "logging already initialized with level `{}`; refusing to switch to `{}`",
            state.level, normalized
        ));
    }
    Ok(())
}

/// Routes log output around `bar` until [`detach_progress_bar`] is called.
pub fn attach_progress_bar(bar: &ProgressBar) {
    *ACTIVE_BAR.lock().unwrap_or_else(PoisonError::into_inner) = Some(bar.clone());
}

pub fn detach_progress_bar() {
    ACTIVE_BAR.lock().unwrap_or_else(PoisonError::into_inner).take();
}

#[cfg(test)]
fn progress_bar_attached() -> bool {
    ACTIVE_BAR
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .is_some()
}

/// Stderr writer that suspends the active progress bar around each line.
struct StderrBelowProgress;

impl LogWriter for StderrBelowProgress {
    fn write(&self, now: &mut DeferredNow, record: &Record) -> io::Result<()> {
        let mut line = Vec::with_capacity(128);
        flexi_logger::default_format(&mut line, now, record)?;
        line.push(b'\n');

        let bar = ACTIVE_BAR
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match bar {
            Some(bar) => bar.suspend(|| io::stderr().write_all(&line)),
            None => io::stderr().write_all(&line),
        }
    }

    fn flush(&self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// Level to use when the user gave none: `SHADOW_BATCH_LOG`, else by build mode.
pub fn resolve_level(explicit: Option<&str>) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| std::env::var(ENV_LOG_LEVEL).ok())
        .unwrap_or_else(|| default_log_level().to_string())
}

/// `debug` in debug builds, `info` in release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}
