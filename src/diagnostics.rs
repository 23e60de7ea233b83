//! # Diagnostics
//!
//! Leveled, location-tagged log lines for the display.
//!
//! Components never reach for a global logger. They hold a cloned
//! [`Diagnostics`] handle that was constructed once at start-up and passed in,
//! which keeps every layer testable with an in-memory sink.
//!
//! Lines are written as `[file][line][LEVEL]: message`. The file sink
//! serializes writers with a mutex around each write, so the handle can be
//! shared with a panic hook running on another thread.

use log::Level;
use std::backtrace::Backtrace;
use std::fs::File;
use std::io::Write;
use std::panic::Location;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Destination for diagnostic lines.
///
/// Implementations must never panic; a sink that cannot write simply drops
/// the line.
pub trait DiagnosticSink: Send + Sync {
    fn write(&self, level: Level, message: &str, location: &Location<'_>);

    /// Record a banner and the current stack, used when the process is about
    /// to die.
    fn backtrace(&self, _message: &str) {}
}

/// Human-readable level name used in log lines.
pub fn level_label(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARNING",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

/// Format a single diagnostic line.
pub fn format_line(level: Level, message: &str, location: &Location<'_>) -> String {
    let file = Path::new(location.file())
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(location.file());
    format!(
        "[{}][{}][{}]: {}",
        file,
        location.line(),
        level_label(level),
        message
    )
}

/// Cloneable handle components log through.
#[derive(Clone)]
pub struct Diagnostics {
    sink: Arc<dyn DiagnosticSink>,
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics").finish_non_exhaustive()
    }
}

impl Diagnostics {
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { sink }
    }

    /// A handle that forwards straight to the `log` facade.
    pub fn console() -> Self {
        Self::new(Arc::new(ConsoleSink))
    }

    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>) {
        self.sink
            .write(Level::Info, message.as_ref(), Location::caller());
    }

    #[track_caller]
    pub fn warning(&self, message: impl AsRef<str>) {
        self.sink
            .write(Level::Warn, message.as_ref(), Location::caller());
    }

    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>) {
        self.sink
            .write(Level::Error, message.as_ref(), Location::caller());
    }

    pub fn backtrace(&self, message: &str) {
        self.sink.backtrace(message);
    }
}

/// Sink that forwards every line to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl DiagnosticSink for ConsoleSink {
    fn write(&self, level: Level, message: &str, location: &Location<'_>) {
        log::log!(level, "{}", format_line(level, message, location));
    }
}

/// Append-only log file plus a separate backtrace file.
///
/// Both files are truncated when the sink is opened. A file that cannot be
/// opened is reported through the `log` facade and skipped; the sink keeps
/// working with whatever remains.
pub struct FileSink {
    log_file: Mutex<Option<File>>,
    backtrace_file: Mutex<Option<File>>,
    print_cli: bool,
}

impl FileSink {
    pub fn open(log_path: &Path, backtrace_path: &Path, print_cli: bool) -> Self {
        Self {
            log_file: Mutex::new(Self::create(log_path, "log")),
            backtrace_file: Mutex::new(Self::create(backtrace_path, "backtrace")),
            print_cli,
        }
    }

    fn create(path: &Path, kind: &str) -> Option<File> {
        match File::create(path) {
            Ok(file) => Some(file),
            Err(e) => {
                log::warn!("Failed to open {} file {}: {}", kind, path.display(), e);
                None
            }
        }
    }
}

impl DiagnosticSink for FileSink {
    fn write(&self, level: Level, message: &str, location: &Location<'_>) {
        let line = format_line(level, message, location);
        // A poisoned lock only means another writer panicked mid-line
        let mut guard = self.log_file.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(file) = guard.as_mut() {
            let _ = writeln!(file, "{}", line);
        }
        if self.print_cli {
            log::log!(level, "{}", line);
        }
    }

    fn backtrace(&self, message: &str) {
        let trace = Backtrace::force_capture().to_string();
        let banner = "====================================";
        let mut guard = self
            .backtrace_file
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(file) = guard.as_mut() {
            let _ = writeln!(file, "{banner}\n= {message}\n{banner}");
            let _ = writeln!(file, "{trace}");
            let _ = file.flush();
        }
        if self.print_cli {
            log::error!("{message}\n{trace}");
        }
    }
}

/// Route panics through the backtrace file before the default hook runs.
pub fn install_panic_hook(diagnostics: Diagnostics) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        diagnostics.backtrace(&format!("Caught panic: {info}"));
        default_hook(info);
    }));
}

/// In-memory sink used by tests to assert on logged lines.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemorySink {
    lines: Mutex<Vec<(Level, String)>>,
}

#[cfg(test)]
impl MemorySink {
    pub(crate) fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub(crate) fn errors(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(level, _)| *level == Level::Error)
            .map(|(_, line)| line)
            .collect()
    }
}

#[cfg(test)]
impl DiagnosticSink for MemorySink {
    fn write(&self, level: Level, message: &str, location: &Location<'_>) {
        self.lines
            .lock()
            .unwrap()
            .push((level, format_line(level, message, location)));
    }
}
