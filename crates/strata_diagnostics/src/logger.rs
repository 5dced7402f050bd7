//! Terminal logging with timing spans and diagnostic printing.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::time::Instant;

/// Minimum level a message must have to be printed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum LogLevel {
    /// Print everything, including debug detail.
    Debug,
    /// Print informational messages and above (the default).
    Info,
    /// Print warnings and errors only.
    Warn,
    /// Print errors only.
    Error,
}

/// A lightweight stderr logger shared across the build pipeline.
///
/// The logger is deliberately plain: the build's primary reporting channel
/// is the diagnostics list on the build context, and the logger only adds
/// progress lines and timing around it.
#[derive(Clone, Copy, Debug)]
pub struct Logger {
    level: LogLevel,
}

impl Logger {
    /// Creates a logger printing messages at `level` and above.
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// Logs a debug-level message.
    pub fn debug(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Debug, msg.as_ref());
    }

    /// Logs an info-level message.
    pub fn info(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Info, msg.as_ref());
    }

    /// Logs a warning message.
    pub fn warn(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Warn, msg.as_ref());
    }

    /// Logs an error message.
    pub fn error(&self, msg: impl AsRef<str>) {
        self.log(LogLevel::Error, msg.as_ref());
    }

    fn log(&self, level: LogLevel, msg: &str) {
        if level >= self.level {
            match level {
                LogLevel::Debug => eprintln!("[ debug ] {msg}"),
                LogLevel::Info => eprintln!("{msg}"),
                LogLevel::Warn => eprintln!("[ warn ] {msg}"),
                LogLevel::Error => eprintln!("[ error ] {msg}"),
            }
        }
    }

    /// Starts a timing span, logging `msg` at debug level.
    pub fn create_time_span(&self, msg: impl Into<String>) -> TimeSpan {
        let msg = msg.into();
        self.debug(&msg);
        TimeSpan {
            logger: *self,
            start: Instant::now(),
        }
    }

    /// Prints diagnostics grouped by severity: errors first, then
    /// warnings, then the rest.
    pub fn print_diagnostics(&self, diagnostics: &[Diagnostic]) {
        for severity in [Severity::Error, Severity::Warn, Severity::Info, Severity::Debug] {
            for d in diagnostics.iter().filter(|d| d.severity == severity) {
                let location = d
                    .rel_file_path
                    .as_deref()
                    .or(d.abs_file_path.as_deref())
                    .map(|p| format!(" ({p})"))
                    .unwrap_or_default();
                let line = format!("{}: {}{location}", d.header, d.message);
                match severity {
                    Severity::Error => self.error(&line),
                    Severity::Warn => self.warn(&line),
                    Severity::Info => self.info(&line),
                    Severity::Debug => self.debug(&line),
                }
            }
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}

/// Measures the duration of a pipeline step.
pub struct TimeSpan {
    logger: Logger,
    start: Instant,
}

impl TimeSpan {
    /// Finishes the span, logging `msg` with the elapsed time appended.
    pub fn finish(self, msg: &str) {
        let ms = self.start.elapsed().as_millis();
        self.logger.info(format!("{msg} in {ms} ms"));
    }

    /// Returns the elapsed time in milliseconds without ending the span.
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn time_span_elapsed() {
        let logger = Logger::default();
        let span = logger.create_time_span("step started");
        assert!(span.elapsed_ms() < 5_000);
        span.finish("step finished");
    }

    #[test]
    fn print_diagnostics_does_not_panic_on_empty() {
        Logger::default().print_diagnostics(&[]);
    }
}
