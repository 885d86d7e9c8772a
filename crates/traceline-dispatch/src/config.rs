use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use traceline_format::{FormatEngine, FormatError};
use traceline_types::Level;

use crate::error::SinkError;
use crate::filter::{Condition, Filter, FilterChain, LevelFilter, SourceFilter, TextMatchFilter};
use crate::manager::TraceManager;
use crate::pipeline::{DispatchPipeline, ErrorHandler, PipelineSettings, SinkSlot};
use crate::sink::Sink;
use crate::sinks::{ConsoleSink, FileSink};

/// Template used when a descriptor does not name one
pub const DEFAULT_TEMPLATE: &str = "{timestamp} [{level}] {source}: {message}";

/// Errors raised while resolving configuration into a manager
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Kind of a declaratively described sink
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Console,
    File,
}

/// Declarative description of one sink binding
///
/// This is the external-collaborator boundary: how these get populated (TOML
/// file, code, anything else) is the embedding application's business.
#[derive(Clone, Debug, Deserialize)]
pub struct SinkDescriptor {
    pub name: String,
    pub kind: SinkKind,

    /// Output path, required for file sinks
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Format template; [`DEFAULT_TEMPLATE`] when absent
    #[serde(default)]
    pub format: Option<String>,

    /// Console only: route events at this level or above to stderr
    #[serde(default)]
    pub stderr_from: Option<Level>,

    #[serde(default)]
    pub filters: Vec<FilterDescriptor>,
}

/// Kind of a declaratively described filter
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    MinLevel,
    Source,
    Match,
}

/// Declarative description of one filter in a sink's chain
#[derive(Clone, Debug, Deserialize)]
pub struct FilterDescriptor {
    pub kind: FilterKind,

    #[serde(default)]
    pub condition: Condition,

    /// For `min_level`
    #[serde(default)]
    pub level: Option<Level>,

    /// For `source`
    #[serde(default)]
    pub source: Option<String>,

    /// For `match`
    #[serde(default)]
    pub pattern: Option<String>,
}

impl FilterDescriptor {
    fn resolve(&self) -> Result<Arc<dyn Filter>, ConfigError> {
        match self.kind {
            FilterKind::MinLevel => {
                let level = self.level.ok_or_else(|| {
                    ConfigError::Invalid("min_level filter needs 'level'".to_string())
                })?;
                Ok(Arc::new(
                    LevelFilter::at_least(level).with_condition(self.condition),
                ))
            }
            FilterKind::Source => {
                let source = self.source.clone().ok_or_else(|| {
                    ConfigError::Invalid("source filter needs 'source'".to_string())
                })?;
                Ok(Arc::new(
                    SourceFilter::new(source).with_condition(self.condition),
                ))
            }
            FilterKind::Match => {
                let pattern = self.pattern.as_deref().ok_or_else(|| {
                    ConfigError::Invalid("match filter needs 'pattern'".to_string())
                })?;
                let filter = TextMatchFilter::new(pattern).map_err(|e| {
                    ConfigError::Invalid(format!("bad pattern {pattern:?}: {e}"))
                })?;
                Ok(Arc::new(filter.with_condition(self.condition)))
            }
        }
    }
}

/// Assembles sinks, filters, and settings into a [`TraceManager`]
///
/// Sink bindings registered without a source apply to every writer; bindings
/// registered for a source replace the defaults for that source.
pub struct ManagerBuilder {
    engine: Arc<FormatEngine>,
    settings: PipelineSettings,
    on_error: ErrorHandler,
    default_slots: Vec<Arc<SinkSlot>>,
    source_slots: HashMap<String, Vec<Arc<SinkSlot>>>,
    source_types: HashMap<String, String>,
}

impl ManagerBuilder {
    pub fn new() -> Self {
        Self {
            engine: Arc::new(FormatEngine::new()),
            settings: PipelineSettings::default(),
            on_error: DispatchPipeline::default_error_handler(),
            default_slots: Vec::new(),
            source_slots: HashMap::new(),
            source_types: HashMap::new(),
        }
    }

    /// Use a caller-supplied engine (custom keywords, shared cache)
    pub fn with_engine(mut self, engine: Arc<FormatEngine>) -> Self {
        self.engine = engine;
        self
    }

    /// The engine formats compile through
    pub fn engine(&self) -> &Arc<FormatEngine> {
        &self.engine
    }

    pub fn auto_flush(mut self, enabled: bool) -> Self {
        self.settings.auto_flush = enabled;
        self
    }

    pub fn throw_on_error(mut self, enabled: bool) -> Self {
        self.settings.throw_on_error = enabled;
        self
    }

    pub fn capture_callstack(mut self, enabled: bool) -> Self {
        self.settings.capture_callstack = enabled;
        self
    }

    pub fn flush_on_exit(mut self, enabled: bool) -> Self {
        self.settings.flush_on_exit = enabled;
        self
    }

    /// Replace the sink-error side channel
    pub fn on_error(mut self, handler: ErrorHandler) -> Self {
        self.on_error = handler;
        self
    }

    /// Bind an unfiltered sink for every source
    pub fn sink(self, sink: Arc<dyn Sink>) -> Self {
        self.sink_filtered(sink, FilterChain::new())
    }

    /// Bind a sink with a filter chain for every source
    pub fn sink_filtered(mut self, sink: Arc<dyn Sink>, filters: FilterChain) -> Self {
        self.default_slots.push(Arc::new(SinkSlot::new(sink, filters)));
        self
    }

    /// Bind a sink that applies only to one source
    pub fn sink_for(
        mut self,
        source: impl Into<String>,
        sink: Arc<dyn Sink>,
        filters: FilterChain,
    ) -> Self {
        self.source_slots
            .entry(source.into())
            .or_default()
            .push(Arc::new(SinkSlot::new(sink, filters)));
        self
    }

    /// Declare the type name stamped on every event from one source
    ///
    /// Writers for `source` carry `type_name` into each event, where the
    /// `sourcetype` keyword can render it.
    pub fn source_type(
        mut self,
        source: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        self.source_types.insert(source.into(), type_name.into());
        self
    }

    /// Resolve a declarative sink descriptor into a default binding
    pub fn descriptor(self, descriptor: &SinkDescriptor) -> Result<Self, ConfigError> {
        let template = descriptor.format.as_deref().unwrap_or(DEFAULT_TEMPLATE);
        let format = self.engine.compile(template)?;

        let sink: Arc<dyn Sink> = match descriptor.kind {
            SinkKind::Console => {
                let mut console = ConsoleSink::new(descriptor.name.as_str(), format);
                if let Some(level) = descriptor.stderr_from {
                    console = console.stderr_from(level);
                }
                Arc::new(console)
            }
            SinkKind::File => {
                let path = descriptor.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid(format!("file sink {:?} needs 'path'", descriptor.name))
                })?;
                Arc::new(FileSink::open(descriptor.name.as_str(), path, format)?)
            }
        };

        let mut filters = FilterChain::new();
        for filter in &descriptor.filters {
            filters.push(filter.resolve()?);
        }

        Ok(self.sink_filtered(sink, filters))
    }

    /// Initialize every binding and produce the manager
    pub fn build(self) -> Result<TraceManager, ConfigError> {
        for slot in self
            .default_slots
            .iter()
            .chain(self.source_slots.values().flatten())
        {
            slot.initialize()?;
        }
        Ok(TraceManager::new(
            self.default_slots,
            self.source_slots,
            self.source_types,
            self.settings,
            self.on_error,
        ))
    }
}

impl Default for ManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::MemorySink;
    use traceline_types::Level;

    #[test]
    fn test_file_descriptor_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");

        let descriptor = SinkDescriptor {
            name: "file".to_string(),
            kind: SinkKind::File,
            path: Some(path.clone()),
            format: Some("{level}: {message}".to_string()),
            stderr_from: None,
            filters: vec![FilterDescriptor {
                kind: FilterKind::MinLevel,
                condition: Condition::And,
                level: Some(Level::Warning),
                source: None,
                pattern: None,
            }],
        };

        let manager = ManagerBuilder::new()
            .descriptor(&descriptor)
            .unwrap()
            .build()
            .unwrap();

        let writer = manager.get_writer("App");
        writer.write("ignored").unwrap();
        writer.write_level(Level::Error, "kept").unwrap();
        writer.flush();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Error: kept\n");
    }

    #[test]
    fn test_file_descriptor_without_path_fails() {
        let descriptor = SinkDescriptor {
            name: "file".to_string(),
            kind: SinkKind::File,
            path: None,
            format: None,
            stderr_from: None,
            filters: vec![],
        };
        assert!(matches!(
            ManagerBuilder::new().descriptor(&descriptor).err().unwrap(),
            ConfigError::Invalid(_)
        ));
    }

    #[test]
    fn test_bad_template_surfaces_at_resolution() {
        let descriptor = SinkDescriptor {
            name: "console".to_string(),
            kind: SinkKind::Console,
            path: None,
            format: Some("{unclosed".to_string()),
            stderr_from: None,
            filters: vec![],
        };
        assert!(matches!(
            ManagerBuilder::new().descriptor(&descriptor).err().unwrap(),
            ConfigError::Format(FormatError::Syntax { .. })
        ));
    }

    #[test]
    fn test_shared_engine_cache_across_descriptors() {
        let engine = Arc::new(FormatEngine::new());
        let format = engine.compile("{message}").unwrap();
        let sink = Arc::new(MemorySink::new("memory", format));

        let manager = ManagerBuilder::new()
            .with_engine(engine.clone())
            .sink(sink)
            .build()
            .unwrap();
        manager.get_writer("App").write("hi").unwrap();

        assert_eq!(engine.cache().len(), 1);
    }
}
