use std::sync::Arc;

use parking_lot::Mutex;

use traceline_types::TraceEvent;

use crate::error::{SinkError, SinkWriteError};
use crate::filter::FilterChain;
use crate::sink::Sink;

/// Global dispatch settings shared by every writer of one manager
#[derive(Clone, Copy, Debug, Default)]
pub struct PipelineSettings {
    /// Flush each sink immediately after every write
    pub auto_flush: bool,

    /// Re-raise the first sink error after dispatch completes for all sinks
    pub throw_on_error: bool,

    /// Capture a call stack into every emitted event
    pub capture_callstack: bool,

    /// Flush every cached writer once at process shutdown
    pub flush_on_exit: bool,
}

/// Side channel receiving sink write failures
pub type ErrorHandler = Arc<dyn Fn(&SinkWriteError) + Send + Sync>;

/// One sink bound to its filter chain
///
/// Created once when configuration is resolved and shared by every writer
/// that delivers to the sink, so the write lock of a not-thread-safe sink is
/// scoped to the sink rather than to any single writer.
pub struct SinkSlot {
    sink: Arc<dyn Sink>,
    filters: FilterChain,
    write_lock: Option<Mutex<()>>,
}

impl SinkSlot {
    pub fn new(sink: Arc<dyn Sink>, filters: FilterChain) -> Self {
        let write_lock = (!sink.is_thread_safe()).then(|| Mutex::new(()));
        Self {
            sink,
            filters,
            write_lock,
        }
    }

    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    /// Run the sink's and the filters' one-time initialization
    pub fn initialize(&self) -> Result<(), SinkError> {
        self.filters.initialize();
        self.sink.initialize()
    }

    fn deliver(&self, event: &TraceEvent, auto_flush: bool) -> Result<(), SinkError> {
        let _guard = self.write_lock.as_ref().map(|lock| lock.lock());
        self.sink.write(event)?;
        if auto_flush {
            self.sink.flush()?;
        }
        Ok(())
    }
}

/// Fans one event out to an ordered sink list
///
/// Sinks are visited sequentially within one dispatch; a slow sink delays
/// the sinks after it for that event, which is an accepted trade-off of the
/// synchronous model.
pub struct DispatchPipeline {
    slots: Vec<Arc<SinkSlot>>,
    settings: Arc<PipelineSettings>,
    on_error: ErrorHandler,
}

impl DispatchPipeline {
    pub fn new(
        slots: Vec<Arc<SinkSlot>>,
        settings: Arc<PipelineSettings>,
        on_error: ErrorHandler,
    ) -> Self {
        Self {
            slots,
            settings,
            on_error,
        }
    }

    /// Default side channel: report through the process's tracing subscriber
    pub fn default_error_handler() -> ErrorHandler {
        Arc::new(|err| tracing::warn!(sink = %err.sink, error = %err.source, "sink write failed"))
    }

    pub fn slots(&self) -> &[Arc<SinkSlot>] {
        &self.slots
    }

    /// Deliver one event to every sink whose filter chain accepts it
    ///
    /// Sink failures are reported through the error handler and never stop
    /// delivery to the remaining sinks; with `throw_on_error` set, the first
    /// failure is returned after all sinks were visited.
    pub fn dispatch(&self, event: &TraceEvent) -> Result<(), SinkWriteError> {
        let mut first_error = None;

        for slot in &self.slots {
            if !slot.filters.validate(event) {
                continue;
            }
            if let Err(source) = slot.deliver(event, self.settings.auto_flush) {
                let error = SinkWriteError {
                    sink: slot.sink.name().to_string(),
                    source,
                };
                (self.on_error)(&error);
                if self.settings.throw_on_error && first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Best-effort flush of every sink, continuing past individual errors
    pub fn flush(&self) {
        for slot in &self.slots {
            if let Err(source) = slot.sink.flush() {
                (self.on_error)(&SinkWriteError {
                    sink: slot.sink.name().to_string(),
                    source,
                });
            }
        }
    }

    /// Best-effort close of every sink, continuing past individual errors
    pub fn close(&self) {
        for slot in &self.slots {
            if let Err(source) = slot.sink.close() {
                (self.on_error)(&SinkWriteError {
                    sink: slot.sink.name().to_string(),
                    source,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Condition, LevelFilter};
    use crate::sinks::MemorySink;
    use traceline_format::FormatEngine;
    use traceline_types::Level;

    fn slot(sink: Arc<MemorySink>, filters: FilterChain) -> Arc<SinkSlot> {
        Arc::new(SinkSlot::new(sink, filters))
    }

    fn pipeline(slots: Vec<Arc<SinkSlot>>, settings: PipelineSettings) -> DispatchPipeline {
        DispatchPipeline::new(
            slots,
            Arc::new(settings),
            DispatchPipeline::default_error_handler(),
        )
    }

    #[test]
    fn test_filtered_sink_is_skipped() {
        let engine = FormatEngine::new();
        let format = engine.compile("{message}").unwrap();

        let unfiltered = Arc::new(MemorySink::new("all", format.clone()));
        let no_debug = Arc::new(MemorySink::new("no-debug", format));
        let slots = vec![
            slot(unfiltered.clone(), FilterChain::new()),
            slot(
                no_debug.clone(),
                FilterChain::new().with(Arc::new(
                    LevelFilter::at_least(Level::Information).with_condition(Condition::And),
                )),
            ),
        ];

        pipeline(slots, PipelineSettings::default())
            .dispatch(&TraceEvent::new("App", Level::Debug, 0, "dbg"))
            .unwrap();

        assert_eq!(unfiltered.write_count(), 1);
        assert_eq!(no_debug.write_count(), 0);
    }

    #[test]
    fn test_failing_sink_does_not_block_remaining() {
        let engine = FormatEngine::new();
        let format = engine.compile("{message}").unwrap();

        let broken = Arc::new(MemorySink::failing("broken", format.clone()));
        let healthy = Arc::new(MemorySink::new("healthy", format));
        let slots = vec![
            slot(broken.clone(), FilterChain::new()),
            slot(healthy.clone(), FilterChain::new()),
        ];

        pipeline(slots, PipelineSettings::default())
            .dispatch(&TraceEvent::new("App", Level::Error, 0, "x"))
            .unwrap();

        assert_eq!(broken.write_count(), 1);
        assert_eq!(healthy.lines(), vec!["x".to_string()]);
    }

    #[test]
    fn test_throw_on_error_raises_after_full_dispatch() {
        let engine = FormatEngine::new();
        let format = engine.compile("{message}").unwrap();

        let broken = Arc::new(MemorySink::failing("broken", format.clone()));
        let healthy = Arc::new(MemorySink::new("healthy", format));
        let slots = vec![
            slot(broken, FilterChain::new()),
            slot(healthy.clone(), FilterChain::new()),
        ];

        let settings = PipelineSettings {
            throw_on_error: true,
            ..Default::default()
        };
        let err = pipeline(slots, settings)
            .dispatch(&TraceEvent::new("App", Level::Error, 0, "x"))
            .unwrap_err();

        assert_eq!(err.sink, "broken");
        // The healthy sink still received the event before the error rose
        assert_eq!(healthy.write_count(), 1);
    }
}
