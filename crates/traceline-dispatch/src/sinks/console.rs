use std::io::Write;

use traceline_format::Format;
use traceline_types::{Level, TraceEvent};

use crate::error::SinkError;
use crate::sink::Sink;

/// Writes rendered events to stdout, routing severe ones to stderr
pub struct ConsoleSink {
    name: String,
    format: Format,
    stderr_from: Level,
}

impl ConsoleSink {
    pub fn new(name: impl Into<String>, format: Format) -> Self {
        Self {
            name: name.into(),
            format,
            stderr_from: Level::Error,
        }
    }

    /// Route events at `level` or above to stderr instead of stdout
    pub fn stderr_from(mut self, level: Level) -> Self {
        self.stderr_from = level;
        self
    }
}

impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> &Format {
        &self.format
    }

    fn is_thread_safe(&self) -> bool {
        // Each line goes through one locked stdio write
        true
    }

    fn write_text(&self, text: &str) -> Result<(), SinkError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{text}")?;
        Ok(())
    }

    fn write(&self, event: &TraceEvent) -> Result<(), SinkError> {
        let text = self.format.render(event);
        if event.level.at_least(self.stderr_from) {
            let mut stderr = std::io::stderr().lock();
            writeln!(stderr, "{text}")?;
            Ok(())
        } else {
            self.write_text(&text)
        }
    }

    fn flush(&self) -> Result<(), SinkError> {
        std::io::stdout().lock().flush()?;
        Ok(())
    }
}
