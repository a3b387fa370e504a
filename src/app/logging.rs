//! File-backed debug log. The terminal is busy showing pixels, so nothing is ever
//! logged to stdout or stderr while playing.

use crate::config::AppConfig;
use std::{
    env, fs,
    io::Write,
    panic,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, OnceLock,
    },
    time::{SystemTime, UNIX_EPOCH},
};

const LOG_MAX_BYTES: u64 = 5 * 1024 * 1024;
const CRASH_LOG_MAX_BYTES: u64 = 256 * 1024;
static LOG_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_CONTENT_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_TIMINGS_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_STATE: OnceLock<Mutex<Option<CappedLog>>> = OnceLock::new();

/// Path to the temp log file we truncate once it grows past the cap.
pub fn log_file_path() -> PathBuf {
    env::var("PIXTERM_LOG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir().join("pixterm.log"))
}

/// Path to the crash log file (metadata only).
pub fn crash_log_path() -> PathBuf {
    env::temp_dir().join("pixterm_crash.log")
}

/// Append-only file that starts over once `max_bytes` would be exceeded.
struct CappedLog {
    path: PathBuf,
    file: fs::File,
    max_bytes: u64,
    written: u64,
}

impl CappedLog {
    fn open(path: PathBuf, max_bytes: u64) -> Option<Self> {
        let existing = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let file = open_log(&path, existing > max_bytes)?;
        let written = if existing > max_bytes { 0 } else { existing };
        Some(Self {
            path,
            file,
            max_bytes,
            written,
        })
    }

    fn append(&mut self, line: &str) {
        let len = line.len() as u64;
        if self.written.saturating_add(len) > self.max_bytes {
            if let Some(file) = open_log(&self.path, true) {
                self.file = file;
                self.written = 0;
            }
        }
        if self.file.write_all(line.as_bytes()).is_ok() {
            self.written = self.written.saturating_add(len);
        }
    }
}

fn open_log(path: &Path, truncate: bool) -> Option<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.create(true);
    if truncate {
        options.write(true).truncate(true);
    } else {
        options.append(true);
    }
    options.open(path).ok()
}

fn log_state() -> &'static Mutex<Option<CappedLog>> {
    LOG_STATE.get_or_init(|| Mutex::new(None))
}

fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn configure(enabled: bool, content_enabled: bool, timings_enabled: bool) {
    LOG_ENABLED.store(enabled, Ordering::Relaxed);
    LOG_CONTENT_ENABLED.store(enabled && content_enabled, Ordering::Relaxed);
    LOG_TIMINGS_ENABLED.store(enabled && timings_enabled, Ordering::Relaxed);
    let mut state = log_state()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *state = if enabled {
        CappedLog::open(log_file_path(), LOG_MAX_BYTES)
    } else {
        None
    };
}

/// Configure logging based on CLI flags or environment.
pub fn init_logging(config: &AppConfig) {
    configure(config.logging_enabled(), config.log_content, config.log_timings);
}

/// Write a timestamped line to the debug log when logging is on.
pub fn log_debug(msg: &str) {
    if !LOG_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    let line = format!("[{}] {msg}\n", unix_secs());
    let mut state = log_state()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(log) = state.as_mut() {
        log.append(&line);
    }
}

/// Write logs that may contain user content (file names, paths).
pub fn log_debug_content(msg: &str) {
    if !LOG_CONTENT_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    log_debug(msg);
}

/// Per-frame timing lines; chatty, so they need `--log-timings`.
pub fn log_timing(msg: &str) {
    if !LOG_TIMINGS_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    log_debug(msg);
}

/// Write a minimal crash log entry, omitting the panic message unless content logging is on.
pub fn log_panic(info: &panic::PanicHookInfo<'_>) {
    if !LOG_ENABLED.load(Ordering::Relaxed) {
        return;
    }

    let location = info
        .location()
        .map(|loc| format!("{}:{}", loc.file(), loc.line()))
        .unwrap_or_else(|| "unknown".to_string());
    let payload = if LOG_CONTENT_ENABLED.load(Ordering::Relaxed) {
        info.payload()
            .downcast_ref::<&str>()
            .map(|text| (*text).to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string())
    } else {
        "panic payload omitted (log-content disabled)".to_string()
    };

    let line = format!(
        "[{}] panic at {location}: {payload} (v{})\n",
        unix_secs(),
        env!("CARGO_PKG_VERSION")
    );
    if let Some(mut log) = CappedLog::open(crash_log_path(), CRASH_LOG_MAX_BYTES) {
        log.append(&line);
    }
}

#[cfg(test)]
pub(crate) fn set_logging_for_tests(enabled: bool, content_enabled: bool) {
    configure(enabled, content_enabled, false);
}
