//! # Injectable Logging
//!
//! Components receive a [`Logger`] at construction instead of reaching for
//! the global `log` macros. A `Logger` is a thin handle over any
//! [`log::Log`] implementation:
//!
//! - [`Logger::facade`] forwards to whatever the binary installed with
//!   `env_logger`.
//! - [`Logger::null`] drops every record.
//! - [`Logger::new`] with a [`MemoryLog`] captures records so tests can
//!   assert on failures that are only reported through the log channel.
//!
//! ```
//! use repo_fleet::logging::{Logger, MemoryLog};
//! use std::sync::Arc;
//!
//! let sink = Arc::new(MemoryLog::default());
//! let logger = Logger::new(sink.clone());
//! logger.error(format_args!("acme/a: push failed"));
//! assert!(sink.contains(log::Level::Error, "push failed"));
//! ```

use log::{Level, Log, Metadata, Record};
use std::fmt;
use std::sync::{Arc, Mutex};

const TARGET: &str = "repo_fleet";

/// Handle to a logging sink, cheap to clone.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn Log>,
}

impl Logger {
    pub fn new(sink: Arc<dyn Log>) -> Self {
        Self { sink }
    }

    /// Logger that forwards to the global `log` facade.
    pub fn facade() -> Self {
        Self::new(Arc::new(Facade))
    }

    /// Logger that discards everything.
    pub fn null() -> Self {
        Self::new(Arc::new(NullLog))
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        let metadata = Metadata::builder().level(level).target(TARGET).build();
        if !self.sink.enabled(&metadata) {
            return;
        }
        self.sink.log(
            &Record::builder()
                .metadata(metadata)
                .args(args)
                .module_path_static(Some(module_path!()))
                .build(),
        );
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::facade()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}

struct Facade;

impl Log for Facade {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level() && log::logger().enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        log::logger().log(record);
    }

    fn flush(&self) {
        log::logger().flush();
    }
}

/// Sink that drops every record.
pub struct NullLog;

impl Log for NullLog {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        false
    }

    fn log(&self, _record: &Record<'_>) {}

    fn flush(&self) {}
}

/// Sink that keeps every record in memory.
#[derive(Default)]
pub struct MemoryLog {
    records: Mutex<Vec<(Level, String)>>,
}

impl MemoryLog {
    pub fn records(&self) -> Vec<(Level, String)> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Whether any record at `level` contains `needle`.
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.records()
            .iter()
            .any(|(l, message)| *l == level && message.contains(needle))
    }

    pub fn count(&self, level: Level) -> usize {
        self.records().iter().filter(|(l, _)| *l == level).count()
    }
}

impl Log for MemoryLog {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}
