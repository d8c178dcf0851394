//! Rolling Logger
//!
//! File logger for client applications. Lines go to `<dir>/<app>.log`, which
//! `file-rotate` moves to `<app>.log.1`, `<app>.log.2`, ... once it grows past
//! a size limit. The most recent lines are also kept in an in-memory ring so a
//! host can show them without touching the filesystem.

use std::collections::VecDeque;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use file_rotate::compression::Compression;
use file_rotate::suffix::AppendCount;
use file_rotate::{ContentLimit, FileRotate};
use thiserror::Error;
use tracing::Level;

/// Logger setup errors
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Log file error: {0}")]
    Io(#[from] io::Error),
    #[error("Logger already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Tuning knobs for rotation and the in-memory ring
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    pub max_file_bytes: usize,
    /// Rotated files kept besides the active one
    pub max_files: usize,
    pub buffer_lines: usize,
    pub level: Level,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            max_file_bytes: 1024 * 1024,
            max_files: 3,
            buffer_lines: 500,
            level: Level::INFO,
        }
    }
}

/// Last `capacity` complete lines written through the logger
struct RecentLines {
    capacity: usize,
    lines: VecDeque<String>,
    partial: String,
}

impl RecentLines {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            lines: VecDeque::with_capacity(capacity),
            partial: String::new(),
        }
    }

    fn push(&mut self, chunk: &[u8]) {
        if self.capacity == 0 {
            return;
        }
        self.partial.push_str(&String::from_utf8_lossy(chunk));
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            if self.lines.len() == self.capacity {
                self.lines.pop_front();
            }
            self.lines.push_back(line.trim_end().to_string());
        }
    }
}

struct Inner {
    file: FileRotate<AppendCount>,
    recent: RecentLines,
}

/// Writer shared between the subscriber and the handle. Every write goes to
/// the rotating file and to the ring.
#[derive(Clone)]
pub struct RollingWriter {
    path: PathBuf,
    inner: Arc<Mutex<Inner>>,
}

impl RollingWriter {
    pub fn new(dir: impl Into<PathBuf>, app_name: &str, options: LoggerOptions) -> Result<Self, LoggerError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.log", app_name));

        let file = FileRotate::new(
            &path,
            AppendCount::new(options.max_files.max(1)),
            ContentLimit::Bytes(options.max_file_bytes),
            Compression::None,
            #[cfg(unix)]
            None,
        );

        Ok(Self {
            path,
            inner: Arc::new(Mutex::new(Inner {
                file,
                recent: RecentLines::new(options.buffer_lines),
            })),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Handle for reading back recent lines
    pub fn handle(&self) -> LoggerHandle {
        LoggerHandle { writer: self.clone() }
    }
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.lock();
        inner.file.write_all(buf)?;
        inner.recent.push(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().file.flush()
    }
}

/// Read access to the logger after initialization
#[derive(Clone)]
pub struct LoggerHandle {
    writer: RollingWriter,
}

impl LoggerHandle {
    /// Most recent log lines, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        self.writer.lock().recent.lines.iter().cloned().collect()
    }

    /// Path of the active log file
    pub fn current_file(&self) -> PathBuf {
        self.writer.path.clone()
    }

    /// Active file followed by the rotated ones, newest first
    pub fn log_files(&self) -> Vec<PathBuf> {
        let mut files = vec![self.current_file()];
        files.extend(self.writer.lock().file.log_paths().into_iter().rev());
        files
    }
}

/// Install the global subscriber with default options
pub fn init_logger(log_dir: impl Into<PathBuf>, app_name: &str) -> Result<LoggerHandle, LoggerError> {
    init_logger_with(log_dir, app_name, LoggerOptions::default())
}

/// Install the global subscriber. Records from the `log` facade are bridged in.
pub fn init_logger_with(
    log_dir: impl Into<PathBuf>,
    app_name: &str,
    options: LoggerOptions,
) -> Result<LoggerHandle, LoggerError> {
    use tracing_subscriber::util::SubscriberInitExt;

    let level = options.level;
    let writer = RollingWriter::new(log_dir, app_name, options)?;
    let handle = writer.handle();

    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_target(true)
        .with_max_level(level)
        .with_writer(move || writer.clone())
        .finish()
        .try_init()
        .map_err(|e| LoggerError::AlreadyInitialized(e.to_string()))?;

    log::info!(
        "logger started at {} for {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        app_name
    );
    Ok(handle)
}
