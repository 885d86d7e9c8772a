use traceline_format::Format;
use traceline_types::TraceEvent;

use crate::error::SinkError;

/// A pluggable destination for rendered trace events
///
/// A sink owns a bound [`Format`] and whatever private mutable state its I/O
/// needs (file handle, connection, counters); the dispatch pipeline never
/// reaches past this trait. A sink returning `false` from `is_thread_safe`
/// gets its writes serialized by a sink-scoped pipeline lock; one returning
/// `true` promises to synchronize its own state.
pub trait Sink: Send + Sync {
    /// Name used in error reporting
    fn name(&self) -> &str;

    /// The format this sink renders events through
    fn format(&self) -> &Format;

    /// Whether the sink's own I/O tolerates concurrent writers
    fn is_thread_safe(&self) -> bool {
        false
    }

    /// One-time hook called when the sink binding is resolved
    fn initialize(&self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Write already-rendered text
    fn write_text(&self, text: &str) -> Result<(), SinkError>;

    /// Write an event: render through the bound format, then write the text
    fn write(&self, event: &TraceEvent) -> Result<(), SinkError> {
        self.write_text(&self.format().render(event))
    }

    /// Push buffered output to the destination
    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Release the destination; the sink is not used afterwards
    fn close(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
