use thiserror::Error;

/// Failure inside a sink's own I/O
#[derive(Debug, Error)]
pub enum SinkError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Message(String),
}

impl SinkError {
    pub fn msg(text: impl Into<String>) -> Self {
        Self::Message(text.into())
    }
}

/// A sink failure caught at the dispatch pipeline boundary
///
/// Wraps the sink's error together with the sink name so the side-channel
/// error handler can attribute it. One failing sink never prevents delivery
/// to the remaining sinks of the same dispatch.
#[derive(Debug, Error)]
#[error("sink {sink:?} failed: {source}")]
pub struct SinkWriteError {
    /// Name of the failing sink
    pub sink: String,

    #[source]
    pub source: SinkError,
}
