use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Local;
use colored::*;
use glob::glob;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
/// # Log Level
///
/// Severity of a log line, ordered from the most verbose to the most severe.
pub enum LogLevel {
    /// Execution flow details.
    Trace = 1,
    /// Internal state useful while debugging.
    Debug = 2,
    /// Normal progress and request echoes.
    Info = 3,
    /// Something unusual that did not stop the operation.
    Warn = 4,
    /// A failed operation.
    Error = 5,
    /// A failure that leaves the application unusable.
    Fatal = 6,
}

impl LogLevel {
    /// Upper-case label used in console and file output.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
/// # Logger Options
///
/// Controls where and how `KitLogger` writes. A `None` threshold disables the target.
pub struct LoggerOptions {
    /// Minimum level printed to the TTY.
    pub console_level: Option<LogLevel>,
    /// Minimum level written to the `<app>-info-*.log` file.
    pub file_level: Option<LogLevel>,
    /// Minimum level additionally written to the `<app>-error-*.log` file.
    pub error_file_level: Option<LogLevel>,
    /// Directory for log files. Defaults to `./logs`.
    pub log_dir: Option<PathBuf>,
    /// How many older files of each kind survive pruning at startup.
    pub keep_files: usize,
}

impl Default for LoggerOptions {
    /// Console and info file take everything from `Debug` up, the error file takes
    /// `Error` and `Fatal`, and the last seven files of each kind are kept.
    fn default() -> Self {
        Self {
            console_level: Some(LogLevel::Debug),
            file_level: Some(LogLevel::Debug),
            error_file_level: Some(LogLevel::Error),
            log_dir: None,
            keep_files: 7,
        }
    }
}

/// # Kit Logger
///
/// A leveled logger that writes colored lines to the console and plain lines to
/// an info file and an error file. Construct one at startup, wrap it in an `Arc`
/// and hand it to every component that logs.
pub struct KitLogger {
    /// The name of the application associated with this logger instance.
    app_name: String,
    /// Configuration options determining logging behavior.
    options: LoggerOptions,
    /// Serializes file appends so concurrent lines never interleave.
    write_lock: Mutex<()>,
    /// Active all-levels log file, if file logging is enabled.
    info_file: Option<PathBuf>,
    /// Active error log file, if error file logging is enabled.
    error_file: Option<PathBuf>,
}

impl KitLogger {
    /// Creates a new `KitLogger`.
    ///
    /// When a file target is enabled the log directory is created, older files for
    /// `app_name` are pruned down to `keep_files`, and fresh timestamped file names
    /// are chosen. Files themselves are created lazily on the first write.
    ///
    /// # Arguments
    /// * `app_name` - The name of the application using this logger.
    /// * `options` - Optional `LoggerOptions`; `None` uses `LoggerOptions::default()`.
    pub fn new(app_name: impl Into<String>, options: Option<LoggerOptions>) -> Self {
        let app_name = app_name.into();
        let options = options.unwrap_or_default();

        let mut logger = Self {
            app_name,
            options,
            write_lock: Mutex::new(()),
            info_file: None,
            error_file: None,
        };

        if logger.options.file_level.is_none() && logger.options.error_file_level.is_none() {
            return logger;
        }

        let log_dir = logger
            .options
            .log_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("logs"));

        if let Err(e) = std::fs::create_dir_all(&log_dir) {
            eprintln!("Error creating log directory {}: {}", log_dir.display(), e);
        }

        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        if logger.options.file_level.is_some() {
            prune_logs(&log_dir, &logger.app_name, "info", logger.options.keep_files);
            logger.info_file =
                Some(log_dir.join(format!("{}-info-{}.log", logger.app_name, timestamp)));
        }
        if logger.options.error_file_level.is_some() {
            prune_logs(&log_dir, &logger.app_name, "error", logger.options.keep_files);
            logger.error_file =
                Some(log_dir.join(format!("{}-error-{}.log", logger.app_name, timestamp)));
        }

        logger
    }

    /// The application name stamped on every line.
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Paths of the active info and error files (either may be absent).
    pub fn log_files(&self) -> (Option<&Path>, Option<&Path>) {
        (self.info_file.as_deref(), self.error_file.as_deref())
    }

    /// Logs a message at `level` to every target whose threshold it reaches.
    ///
    /// `extras` is printed on its own line as compact JSON. Write failures are
    /// reported on stderr and otherwise ignored.
    pub async fn log(&self, level: LogLevel, message: &str, extras: Option<Value>) {
        let ts = Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();
        let extras_str = extras.as_ref().and_then(|v| serde_json::to_string(v).ok());

        if reaches(self.options.console_level, level) {
            let prefix = format!("{} {:<5} [{}]", ts, level, self.app_name).truecolor(128, 128, 128);
            let colored_message = match level {
                LogLevel::Fatal => message.bright_white().on_bright_red(),
                LogLevel::Error => message.bright_red(),
                LogLevel::Warn => message.bright_yellow(),
                LogLevel::Info => message.bright_green(),
                LogLevel::Debug => message.bright_white(),
                LogLevel::Trace => message.bright_cyan(),
            };
            println!("{} {}", prefix, colored_message);
            if let Some(extras) = &extras_str {
                println!("{} {}", prefix, extras.truecolor(128, 128, 128));
            }
        }

        let to_info = reaches(self.options.file_level, level);
        let to_error = reaches(self.options.error_file_level, level);
        if !to_info && !to_error {
            return;
        }

        let mut line = format!("{} {:<5} [{}] {}\n", ts, level, self.app_name, message);
        if let Some(extras) = &extras_str {
            line.push_str(extras);
            line.push('\n');
        }

        let _guard = self.write_lock.lock().await;
        if to_info {
            if let Some(path) = &self.info_file {
                append_line(path, &line).await;
            }
        }
        if to_error {
            if let Some(path) = &self.error_file {
                append_line(path, &line).await;
            }
        }
    }

    /// Logs a message at the `Trace` level.
    pub async fn trace(&self, message: &str, extras: Option<Value>) {
        self.log(LogLevel::Trace, message, extras).await;
    }

    /// Logs a message at the `Debug` level.
    pub async fn debug(&self, message: &str, extras: Option<Value>) {
        self.log(LogLevel::Debug, message, extras).await;
    }

    /// Logs a message at the `Info` level.
    pub async fn info(&self, message: &str, extras: Option<Value>) {
        self.log(LogLevel::Info, message, extras).await;
    }

    /// Logs a message at the `Warn` level.
    pub async fn warn(&self, message: &str, extras: Option<Value>) {
        self.log(LogLevel::Warn, message, extras).await;
    }

    /// Logs a message at the `Error` level.
    pub async fn error(&self, message: &str, extras: Option<Value>) {
        self.log(LogLevel::Error, message, extras).await;
    }

    /// Logs a message at the `Fatal` level.
    pub async fn fatal(&self, message: &str, extras: Option<Value>) {
        self.log(LogLevel::Fatal, message, extras).await;
    }
}

fn reaches(threshold: Option<LogLevel>, level: LogLevel) -> bool {
    threshold.is_some_and(|min| level >= min)
}

async fn append_line(path: &Path, line: &str) {
    let result = async {
        let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = result {
        eprintln!("Error writing log file {}: {}", path.display(), e);
    }
}

/// Deletes all but the newest `keep` files named `<app>-<kind>-*.log` in `log_dir`.
///
/// File names embed a sortable timestamp, so name order is age order.
fn prune_logs(log_dir: &Path, app_name: &str, kind: &str, keep: usize) {
    let pattern = format!("{}/{}-{}-*.log", log_dir.display(), app_name, kind);
    let paths = match glob(&pattern) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Invalid log pruning pattern {}: {}", pattern, e);
            return;
        }
    };

    let mut log_files: Vec<PathBuf> = paths.filter_map(Result::ok).collect();
    log_files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

    for old_file in log_files.iter().skip(keep) {
        if let Err(e) = std::fs::remove_file(old_file) {
            eprintln!("Error deleting old log file {}: {}", old_file.display(), e);
        }
    }
}
