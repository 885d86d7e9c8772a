//! Template compiler and renderer for traceline
//!
//! A format template is a string in which `{name}` placeholders expand to
//! static or event-derived text. This crate scans templates into phrases,
//! resolves placeholder names through a [`KeywordRegistry`], builds keyword
//! instances through each descriptor's build function, memoizes them in a
//! [`FormatCache`], and renders compiled [`Format`]s against trace events.

mod args;
mod cache;
mod error;
mod format;
mod keyword;
pub mod keywords;
mod registry;
mod scan;

pub use args::KeywordArgs;
pub use cache::FormatCache;
pub use error::FormatError;
pub use format::{Format, FormatEngine, Token};
pub use keyword::{Keyword, KeywordBuildFn, KeywordDescriptor, StaticText};
pub use registry::KeywordRegistry;
pub use scan::{scan, Phrase};

// Re-export types used in our public API
pub use traceline_types::{Level, TraceEvent};
