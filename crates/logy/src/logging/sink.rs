use crate::error::SinkError;
use crate::logging::types::LogLevel;
use async_trait::async_trait;
use std::io::Write;
use std::sync::{Arc, Mutex};

// =============================================================================
// LogSink Trait
// =============================================================================

/// Destination for request log lines.
///
/// A sink receives one line per call, without a trailing newline. Errors
/// are reported back to the request logger, which records them through
/// `tracing` and carries on; a failing sink never changes the request's
/// outcome.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Writes one line at the given level.
    async fn write(&self, level: LogLevel, line: &str) -> Result<(), SinkError>;
}

#[async_trait]
impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    async fn write(&self, level: LogLevel, line: &str) -> Result<(), SinkError> {
        (**self).write(level, line).await
    }
}

// =============================================================================
// StdoutSink
// =============================================================================

/// Default sink: writes each line to standard output followed by a newline.
#[derive(Debug, Clone, Copy)]
pub struct StdoutSink {
    min_level: LogLevel,
}

impl StdoutSink {
    /// Creates a sink that writes every line.
    pub fn new() -> Self {
        Self {
            min_level: LogLevel::Trace,
        }
    }

    /// Only write lines at `level` or more severe.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogSink for StdoutSink {
    async fn write(&self, level: LogLevel, line: &str) -> Result<(), SinkError> {
        if !self.min_level.should_log(level) {
            return Ok(());
        }
        let mut out = std::io::stdout().lock();
        writeln!(out, "{line}")?;
        Ok(())
    }
}

// =============================================================================
// TracingSink
// =============================================================================

/// Forwards lines to `tracing` events under the `logy` target.
///
/// Blank separator lines are dropped since tracing output is already
/// one event per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

#[async_trait]
impl LogSink for TracingSink {
    async fn write(&self, level: LogLevel, line: &str) -> Result<(), SinkError> {
        if line.is_empty() {
            return Ok(());
        }
        match level {
            LogLevel::Trace => tracing::trace!(target: "logy", "{}", line),
            LogLevel::Debug => tracing::debug!(target: "logy", "{}", line),
            LogLevel::Info => tracing::info!(target: "logy", "{}", line),
            LogLevel::Warn => tracing::warn!(target: "logy", "{}", line),
            LogLevel::Error => tracing::error!(target: "logy", "{}", line),
            LogLevel::Off => {}
        }
        Ok(())
    }
}

// =============================================================================
// MemorySink
// =============================================================================

/// Captures lines in memory.
///
/// Clones share the same buffer, so a test can hand one clone to the
/// logger and inspect another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<(LogLevel, String)>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<R>(&self, f: impl FnOnce(&mut Vec<(LogLevel, String)>) -> R) -> R {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut entries)
    }

    /// All captured lines with their levels.
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.with_entries(|entries| entries.clone())
    }

    /// All captured lines.
    pub fn lines(&self) -> Vec<String> {
        self.with_entries(|entries| entries.iter().map(|(_, line)| line.clone()).collect())
    }

    /// Captured lines at `level`.
    pub fn lines_at(&self, level: LogLevel) -> Vec<String> {
        self.with_entries(|entries| {
            entries
                .iter()
                .filter(|(l, _)| *l == level)
                .map(|(_, line)| line.clone())
                .collect()
        })
    }

    /// Captured lines starting with `prefix`.
    pub fn lines_starting_with(&self, prefix: &str) -> Vec<String> {
        self.with_entries(|entries| {
            entries
                .iter()
                .filter(|(_, line)| line.starts_with(prefix))
                .map(|(_, line)| line.clone())
                .collect()
        })
    }

    /// Clears all captured lines.
    pub fn clear(&self) {
        self.with_entries(|entries| entries.clear());
    }

    /// Number of captured lines.
    pub fn len(&self) -> usize {
        self.with_entries(|entries| entries.len())
    }

    /// Returns true if nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.with_entries(|entries| entries.is_empty())
    }
}

#[async_trait]
impl LogSink for MemorySink {
    async fn write(&self, level: LogLevel, line: &str) -> Result<(), SinkError> {
        self.with_entries(|entries| entries.push((level, line.to_string())));
        Ok(())
    }
}
