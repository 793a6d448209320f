//! Debug logging for inkwell.
//!
//! All `log::info!()` etc. calls from every workspace crate are routed here by
//! [`init_log_bridge`]. The level comes from the settings `debug` flag and can
//! be overridden with the DEBUG_LEVEL environment variable:
//! - 0: No debugging
//! - 1: Errors and warnings
//! - 2: Warnings and info (session starts, cancellations)
//! - 3: Debug level (stream events, request setup)
//! - 4: Trace level (every operation, detailed info)
//!
//! Output goes to /tmp/inkwell_debug.log on Unix/macOS,
//! or %TEMP%\inkwell_debug.log on Windows, so it never mixes with the host's
//! own output.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

use chrono::Local;
use parking_lot::Mutex;

/// Debug level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugLevel {
    Off = 0,
    Error = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl DebugLevel {
    fn from_env() -> Option<Self> {
        let val = std::env::var("DEBUG_LEVEL").ok()?;
        Self::from_number(val.trim().parse::<u8>().ok()?)
    }

    fn from_number(n: u8) -> Option<Self> {
        match n {
            0 => Some(DebugLevel::Off),
            1 => Some(DebugLevel::Error),
            2 => Some(DebugLevel::Info),
            3 => Some(DebugLevel::Debug),
            4 => Some(DebugLevel::Trace),
            _ => None,
        }
    }

    /// Level implied by the settings `debug` flag.
    pub fn from_debug_flag(debug: bool) -> Self {
        if debug {
            DebugLevel::Debug
        } else {
            DebugLevel::Error
        }
    }

    fn to_level_filter(self) -> log::LevelFilter {
        match self {
            DebugLevel::Off => log::LevelFilter::Off,
            DebugLevel::Error => log::LevelFilter::Warn,
            DebugLevel::Info => log::LevelFilter::Info,
            DebugLevel::Debug => log::LevelFilter::Debug,
            DebugLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Path of the debug log file.
pub fn log_path() -> PathBuf {
    #[cfg(unix)]
    {
        PathBuf::from("/tmp/inkwell_debug.log")
    }
    #[cfg(not(unix))]
    {
        std::env::temp_dir().join("inkwell_debug.log")
    }
}

/// Global debug logger
struct DebugLogger {
    file: Option<std::fs::File>,
}

impl DebugLogger {
    fn open(level: DebugLevel) -> Self {
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(log_path())
            // No file means no log.
            .ok();
        let mut logger = DebugLogger { file };
        logger.write_raw(&format!(
            "\n{}\ninkwell debug session started at {} (level={:?})\n{}\n",
            "=".repeat(80),
            get_timestamp(),
            level,
            "=".repeat(80)
        ));
        logger
    }

    fn write_raw(&mut self, msg: &str) {
        if let Some(ref mut file) = self.file {
            let _ = file.write_all(msg.as_bytes());
            let _ = file.flush();
        }
    }
}

fn get_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

fn format_line(level: log::Level, target: &str, msg: &str) -> String {
    let level_str = match level {
        log::Level::Error => "ERROR",
        log::Level::Warn => "WARN ",
        log::Level::Info => "INFO ",
        log::Level::Debug => "DEBUG",
        log::Level::Trace => "TRACE",
    };
    format!("[{}] [{}] [{}] {}\n", get_timestamp(), level_str, target, msg)
}

/// `log::Log` implementation writing to the debug log file.
struct LogBridge {
    logger: Mutex<DebugLogger>,
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(record.level(), record.target(), &record.args().to_string());
        self.logger.lock().write_raw(&line);
    }

    fn flush(&self) {
        if let Some(ref mut file) = self.logger.lock().file {
            let _ = file.flush();
        }
    }
}

static BRIDGE: OnceLock<LogBridge> = OnceLock::new();

/// Route the `log` facade to the debug log file.
///
/// `level` is what the settings ask for; DEBUG_LEVEL takes precedence when
/// set. Safe to call more than once: later calls only change the max level.
pub fn init_log_bridge(level: DebugLevel) -> DebugLevel {
    let effective = DebugLevel::from_env().unwrap_or(level);
    log::set_max_level(effective.to_level_filter());

    if effective != DebugLevel::Off && BRIDGE.get().is_none() {
        let bridge = BRIDGE.get_or_init(|| LogBridge {
            logger: Mutex::new(DebugLogger::open(effective)),
        });
        // Another logger may already be installed by the host; keep it.
        let _ = log::set_logger(bridge);
    }
    effective
}
