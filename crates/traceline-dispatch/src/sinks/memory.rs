use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use traceline_format::Format;

use crate::error::SinkError;
use crate::sink::Sink;

/// In-memory sink for tests and diagnostics
///
/// Records every rendered line and counts write attempts. `failing` builds a
/// sink whose writes always error, for exercising the pipeline's error
/// containment.
pub struct MemorySink {
    name: String,
    format: Format,
    lines: Mutex<Vec<String>>,
    writes: AtomicUsize,
    fail: bool,
}

impl MemorySink {
    pub fn new(name: impl Into<String>, format: Format) -> Self {
        Self {
            name: name.into(),
            format,
            lines: Mutex::new(Vec::new()),
            writes: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// A sink that rejects every write
    pub fn failing(name: impl Into<String>, format: Format) -> Self {
        Self {
            fail: true,
            ..Self::new(name, format)
        }
    }

    /// Recorded lines so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Number of write attempts, failed ones included
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Sink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> &Format {
        &self.format
    }

    fn is_thread_safe(&self) -> bool {
        true
    }

    fn write_text(&self, text: &str) -> Result<(), SinkError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SinkError::msg("memory sink configured to fail"));
        }
        self.lines.lock().push(text.to_string());
        Ok(())
    }
}
