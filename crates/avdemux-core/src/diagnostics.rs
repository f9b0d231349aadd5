//! Diagnostics sink: leveled, fire-and-forget log routing.
//!
//! The demuxer reports open failures and stream discovery through a
//! [`DiagnosticsSink`]. It never inspects the outcome of a `log` call, so a
//! sink must not block indefinitely or panic.
//!
//! Call sites format with the `diag_*!` macros, which take `format!`-style
//! arguments:
//!
//! ```
//! use avdemux_core::diagnostics::{LogLevel, MemorySink};
//! use avdemux_core::diag_error;
//!
//! let sink = MemorySink::new();
//! diag_error!(sink, "Could not open file: {} (error code: {})", "a.mp4", -2);
//! assert_eq!(sink.count(LogLevel::Error), 1);
//! ```

use std::fmt::{Display, Formatter};
use std::io::{IsTerminal, Write};
use std::sync::Mutex;

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination for demuxer diagnostics.
pub trait DiagnosticsSink: Send + Sync {
    /// Deliver one already-formatted message. Best effort; never fails.
    fn log(&self, level: LogLevel, message: &str);
}

impl<S: DiagnosticsSink + ?Sized> DiagnosticsSink for std::sync::Arc<S> {
    fn log(&self, level: LogLevel, message: &str) {
        (**self).log(level, message);
    }
}

impl<S: DiagnosticsSink + ?Sized> DiagnosticsSink for &S {
    fn log(&self, level: LogLevel, message: &str) {
        (**self).log(level, message);
    }
}

#[macro_export]
macro_rules! diag_debug {
    ($sink:expr, $($arg:tt)+) => {
        $crate::diagnostics::DiagnosticsSink::log(
            &$sink,
            $crate::diagnostics::LogLevel::Debug,
            &format!($($arg)+),
        )
    };
}

#[macro_export]
macro_rules! diag_info {
    ($sink:expr, $($arg:tt)+) => {
        $crate::diagnostics::DiagnosticsSink::log(
            &$sink,
            $crate::diagnostics::LogLevel::Info,
            &format!($($arg)+),
        )
    };
}

#[macro_export]
macro_rules! diag_warn {
    ($sink:expr, $($arg:tt)+) => {
        $crate::diagnostics::DiagnosticsSink::log(
            &$sink,
            $crate::diagnostics::LogLevel::Warn,
            &format!($($arg)+),
        )
    };
}

#[macro_export]
macro_rules! diag_error {
    ($sink:expr, $($arg:tt)+) => {
        $crate::diagnostics::DiagnosticsSink::log(
            &$sink,
            $crate::diagnostics::LogLevel::Error,
            &format!($($arg)+),
        )
    };
}

// ─── Tracing ─────────────────────────────────────────────────────────────

/// Forwards diagnostics into `tracing` under the `avdemux` target.
///
/// This is the host-log route: whatever subscriber the host installed
/// decides rendering and filtering.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(target: "avdemux", "{message}"),
            LogLevel::Info => tracing::info!(target: "avdemux", "{message}"),
            LogLevel::Warn => tracing::warn!(target: "avdemux", "{message}"),
            LogLevel::Error => tracing::error!(target: "avdemux", "{message}"),
        }
    }
}

// ─── Terminal ────────────────────────────────────────────────────────────

const ANSI_RESET: &str = "\x1b[0m";
const ANSI_CYAN: &str = "\x1b[36m";
const ANSI_GREEN: &str = "\x1b[32m";
const ANSI_YELLOW: &str = "\x1b[33m";
const ANSI_RED: &str = "\x1b[31m";

/// Renders `[LEVEL] message` lines to stdout, optionally colored.
#[derive(Debug, Clone, Copy)]
pub struct TerminalSink {
    color: bool,
    min_level: LogLevel,
}

impl TerminalSink {
    /// Colors are on when stdout is a terminal and `NO_COLOR` is unset.
    pub fn new() -> Self {
        let color = std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal();
        Self {
            color,
            min_level: LogLevel::Debug,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Format one line exactly as it is written, without the newline.
    pub fn render(&self, level: LogLevel, message: &str) -> String {
        if !self.color {
            return format!("[{level}] {message}");
        }
        let color = match level {
            LogLevel::Debug => ANSI_CYAN,
            LogLevel::Info => ANSI_GREEN,
            LogLevel::Warn => ANSI_YELLOW,
            LogLevel::Error => ANSI_RED,
        };
        format!("{color}[{level}] {ANSI_RESET}{message}")
    }

    /// Write one rendered line to `out`, unless `level` is below the minimum.
    pub fn write_to(
        &self,
        out: &mut impl Write,
        level: LogLevel,
        message: &str,
    ) -> std::io::Result<()> {
        if level < self.min_level {
            return Ok(());
        }
        writeln!(out, "{}", self.render(level, message))
    }
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticsSink for TerminalSink {
    fn log(&self, level: LogLevel, message: &str) {
        // A closed stdout must not take the demuxer down.
        let _ = self.write_to(&mut std::io::stdout().lock(), level, message);
    }
}

// ─── Memory ──────────────────────────────────────────────────────────────

/// Records every message in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far, oldest first.
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.lock().clone()
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.lock().iter().filter(|(l, _)| *l == level).count()
    }

    /// Messages logged at `level`, oldest first.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(LogLevel, String)>> {
        // Poisoning only means another logger panicked mid-push; the Vec is still valid.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DiagnosticsSink for MemorySink {
    fn log(&self, level: LogLevel, message: &str) {
        self.lock().push((level, message.to_owned()));
    }
}

// ─── Null ────────────────────────────────────────────────────────────────

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn log(&self, _level: LogLevel, _message: &str) {}
}
