//! Filtered sink dispatch for traceline
//!
//! This crate fans trace events out to pluggable sinks: each sink carries a
//! boolean filter chain and a thread-safety declaration, the
//! [`DispatchPipeline`] applies both per event, and the [`TraceManager`]
//! hands out weakly cached [`TraceWriter`]s keyed by logical source name.

mod config;
mod error;
mod filter;
mod manager;
mod pipeline;
mod sink;
pub mod sinks;
mod writer;

pub use config::{ConfigError, FilterDescriptor, FilterKind, ManagerBuilder, SinkDescriptor, SinkKind};
pub use error::{SinkError, SinkWriteError};
pub use filter::{Condition, Filter, FilterChain, LevelFilter, SourceFilter, TextMatchFilter};
pub use manager::TraceManager;
pub use pipeline::{DispatchPipeline, ErrorHandler, PipelineSettings, SinkSlot};
pub use sink::Sink;
pub use writer::TraceWriter;

// Re-export types used in our public API
pub use traceline_format::{Format, FormatEngine, FormatError};
pub use traceline_types::{Level, TraceEvent};
