use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::pipeline::{DispatchPipeline, ErrorHandler, PipelineSettings, SinkSlot};
use crate::writer::TraceWriter;

/// Process-wide cache of writers keyed by logical source name
///
/// Writers are held weakly: when the last caller drops its handle the writer
/// is reclaimed (flushing on the way out) and transparently rebuilt on the
/// next request. Callers must not assume writer identity persists, only that
/// a given source keeps resolving to the same sinks and filters while the
/// configuration is unchanged.
pub struct TraceManager {
    writers: RwLock<HashMap<String, Weak<TraceWriter>>>,
    default_slots: Vec<Arc<SinkSlot>>,
    source_slots: HashMap<String, Vec<Arc<SinkSlot>>>,
    source_types: HashMap<String, String>,
    settings: Arc<PipelineSettings>,
    on_error: ErrorHandler,
}

impl TraceManager {
    pub(crate) fn new(
        default_slots: Vec<Arc<SinkSlot>>,
        source_slots: HashMap<String, Vec<Arc<SinkSlot>>>,
        source_types: HashMap<String, String>,
        settings: PipelineSettings,
        on_error: ErrorHandler,
    ) -> Self {
        Self {
            writers: RwLock::new(HashMap::new()),
            default_slots,
            source_slots,
            source_types,
            settings: Arc::new(settings),
            on_error,
        }
    }

    /// Dispatch settings shared by every writer of this manager
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Get the writer for a source, building it on first use
    ///
    /// Fast path: shared lock and an upgrade of the cached weak handle.
    /// Slow path: exclusive lock with a re-check, so two racing callers do
    /// not both construct (beyond the tolerated duplicate window between the
    /// two locks).
    pub fn get_writer(&self, source: &str) -> Arc<TraceWriter> {
        if let Some(writer) = self.writers.read().get(source).and_then(Weak::upgrade) {
            return writer;
        }

        let mut writers = self.writers.write();
        if let Some(writer) = writers.get(source).and_then(Weak::upgrade) {
            return writer;
        }

        let writer = Arc::new(self.build_writer(source));
        writers.insert(source.to_string(), Arc::downgrade(&writer));
        writer
    }

    fn build_writer(&self, source: &str) -> TraceWriter {
        let slots = self
            .source_slots
            .get(source)
            .cloned()
            .unwrap_or_else(|| self.default_slots.clone());
        let pipeline = DispatchPipeline::new(slots, Arc::clone(&self.settings), self.on_error.clone());
        TraceWriter::new(
            source.to_string(),
            self.source_types.get(source).cloned(),
            pipeline,
            Arc::clone(&self.settings),
        )
    }

    /// Drop the cache entry for a source
    ///
    /// Live handles keep working; the next `get_writer` builds fresh.
    pub fn release(&self, source: &str) -> bool {
        self.writers.write().remove(source).is_some()
    }

    /// Number of writers currently alive
    pub fn live_writers(&self) -> usize {
        self.writers
            .read()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Flush every live writer, best effort
    pub fn flush_all(&self) {
        for writer in self.collect_live() {
            writer.flush();
        }
    }

    /// Close every live writer and clear the cache
    pub fn close_all(&self) {
        for writer in self.collect_live() {
            writer.close();
        }
        self.writers.write().clear();
    }

    /// Process-exit integration: flush once if `flush_on_exit` is set
    ///
    /// The exit hook itself belongs to the embedding application; it calls
    /// this before the process goes away.
    pub fn shutdown(&self) {
        if self.settings.flush_on_exit {
            self.flush_all();
        }
    }

    fn collect_live(&self) -> Vec<Arc<TraceWriter>> {
        self.writers
            .read()
            .values()
            .filter_map(Weak::upgrade)
            .collect()
    }
}

impl std::fmt::Debug for TraceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceManager")
            .field("default_sinks", &self.default_slots.len())
            .field("configured_sources", &self.source_slots.len())
            .field("live_writers", &self.live_writers())
            .finish()
    }
}
