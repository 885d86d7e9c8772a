use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use parking_lot::Mutex;

use traceline_format::Format;

use crate::error::SinkError;
use crate::sink::Sink;

/// Appends rendered events to a file, one line each
///
/// Declares itself not thread-safe so the pipeline serializes writes with
/// the sink-scoped lock; the inner mutex only satisfies the `&self` call
/// contract.
pub struct FileSink {
    name: String,
    format: Format,
    writer: Mutex<BufWriter<File>>,
}

impl FileSink {
    /// Open (or create) the file in append mode
    pub fn open(
        name: impl Into<String>,
        path: impl AsRef<Path>,
        format: Format,
    ) -> Result<Self, SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self {
            name: name.into(),
            format,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl Sink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> &Format {
        &self.format
    }

    fn write_text(&self, text: &str) -> Result<(), SinkError> {
        let mut writer = self.writer.lock();
        writeln!(writer, "{text}")?;
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        self.writer.lock().flush()?;
        Ok(())
    }

    fn close(&self) -> Result<(), SinkError> {
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use traceline_format::FormatEngine;
    use traceline_types::{Level, TraceEvent};

    #[test]
    fn test_append_and_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.log");

        let engine = FormatEngine::new();
        let format = engine.compile("{level}: {message}").unwrap();
        let sink = FileSink::open("file", &path, format).unwrap();

        sink.write(&TraceEvent::new("App", Level::Information, 0, "one"))
            .unwrap();
        sink.write(&TraceEvent::new("App", Level::Error, 0, "two"))
            .unwrap();
        sink.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Information: one\nError: two\n");
    }
}
