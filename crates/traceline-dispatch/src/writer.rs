use std::sync::Arc;

use traceline_types::{Level, TraceEvent};

use crate::error::SinkWriteError;
use crate::pipeline::{DispatchPipeline, PipelineSettings};

/// The per-source handle callers emit events through
///
/// Resolves to an ordered sink list at construction and never changes
/// afterwards. Writers are handed out by [`crate::TraceManager`] behind an
/// `Arc` and cached weakly, so identity may change between lookups while
/// behavior stays stable for a given source.
pub struct TraceWriter {
    source: String,
    source_type: Option<String>,
    pipeline: DispatchPipeline,
    settings: Arc<PipelineSettings>,
}

impl TraceWriter {
    pub(crate) fn new(
        source: String,
        source_type: Option<String>,
        pipeline: DispatchPipeline,
        settings: Arc<PipelineSettings>,
    ) -> Self {
        Self {
            source,
            source_type,
            pipeline,
            settings,
        }
    }

    /// Logical source name this writer emits under
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Declared type name of the emitting component, if any
    pub fn source_type(&self) -> Option<&str> {
        self.source_type.as_deref()
    }

    /// Emit an informational message with event id 0
    pub fn write(&self, message: impl Into<String>) -> Result<(), SinkWriteError> {
        self.write_entry(Level::Information, 0, message)
    }

    /// Emit a message at an explicit level
    pub fn write_level(
        &self,
        level: Level,
        message: impl Into<String>,
    ) -> Result<(), SinkWriteError> {
        self.write_entry(level, 0, message)
    }

    /// Emit a message with an explicit level and event id
    pub fn write_entry(
        &self,
        level: Level,
        id: u32,
        message: impl Into<String>,
    ) -> Result<(), SinkWriteError> {
        self.dispatch(TraceEvent::new(&self.source, level, id, message))
    }

    /// Emit a message carrying a structured payload
    pub fn write_data(
        &self,
        level: Level,
        id: u32,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Result<(), SinkWriteError> {
        self.dispatch(TraceEvent::new(&self.source, level, id, message).with_data(data))
    }

    /// Emit an error, with its source chain joined into the message
    pub fn write_error(&self, error: &dyn std::error::Error) -> Result<(), SinkWriteError> {
        let mut message = error.to_string();
        let mut cause = error.source();
        while let Some(inner) = cause {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            cause = inner.source();
        }
        self.write_entry(Level::Error, 0, message)
    }

    fn dispatch(&self, mut event: TraceEvent) -> Result<(), SinkWriteError> {
        if let Some(source_type) = &self.source_type {
            event = event.with_source_type(source_type.clone());
        }
        if self.settings.capture_callstack {
            event = event.with_callstack(std::backtrace::Backtrace::force_capture().to_string());
        }
        self.pipeline.dispatch(&event)
    }

    /// Flush every resolved sink, best effort
    pub fn flush(&self) {
        self.pipeline.flush();
    }

    /// Close every resolved sink, best effort
    pub fn close(&self) {
        self.pipeline.flush();
        self.pipeline.close();
    }
}

impl Drop for TraceWriter {
    fn drop(&mut self) {
        // Last-chance flush when the final strong handle goes away
        self.pipeline.flush();
    }
}

impl std::fmt::Debug for TraceWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceWriter")
            .field("source", &self.source)
            .field("sinks", &self.pipeline.slots().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterChain;
    use crate::pipeline::SinkSlot;
    use crate::sinks::MemorySink;
    use traceline_format::FormatEngine;

    fn writer_with_memory_sink(template: &str) -> (TraceWriter, Arc<MemorySink>) {
        let engine = FormatEngine::new();
        let format = engine.compile(template).unwrap();
        let sink = Arc::new(MemorySink::new("memory", format));
        let settings = Arc::new(PipelineSettings::default());
        let pipeline = DispatchPipeline::new(
            vec![Arc::new(SinkSlot::new(sink.clone(), FilterChain::new()))],
            settings.clone(),
            DispatchPipeline::default_error_handler(),
        );
        (
            TraceWriter::new("App".to_string(), None, pipeline, settings),
            sink,
        )
    }

    #[test]
    fn test_write_variants() {
        let (writer, sink) = writer_with_memory_sink("{level}:{id}:{message}");
        writer.write("plain").unwrap();
        writer.write_level(Level::Warning, "warned").unwrap();
        writer.write_entry(Level::Error, 42, "coded").unwrap();

        assert_eq!(
            sink.lines(),
            vec![
                "Information:0:plain".to_string(),
                "Warning:0:warned".to_string(),
                "Error:42:coded".to_string(),
            ]
        );
    }

    #[test]
    fn test_write_error_joins_chain() {
        let (writer, sink) = writer_with_memory_sink("{message}");
        let inner = std::io::Error::other("disk gone");
        writer.write_error(&inner).unwrap();
        assert_eq!(sink.lines(), vec!["disk gone".to_string()]);
    }

    #[test]
    fn test_write_data_payload() {
        let (writer, sink) = writer_with_memory_sink("{message} {data}");
        writer
            .write_data(
                Level::Information,
                0,
                "payload",
                serde_json::json!({"n": 1}),
            )
            .unwrap();
        assert_eq!(sink.lines(), vec![r#"payload {"n":1}"#.to_string()]);
    }
}
