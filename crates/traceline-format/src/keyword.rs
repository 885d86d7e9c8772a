use std::sync::Arc;

use traceline_types::TraceEvent;

use crate::args::KeywordArgs;
use crate::error::FormatError;

/// A compiled placeholder implementation
///
/// Dynamic keywords compute their text from the event on every render;
/// static keywords fix their text at construction time. Returning `None` or
/// an empty string contributes nothing to the rendered output.
pub trait Keyword: Send + Sync {
    fn render(&self, event: &TraceEvent) -> Option<String>;
}

/// A static keyword whose text is fixed at construction
pub struct StaticText {
    text: String,
}

impl StaticText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Keyword for StaticText {
    fn render(&self, _event: &TraceEvent) -> Option<String> {
        Some(self.text.clone())
    }
}

/// Constructor signature for a registered keyword
pub type KeywordBuildFn =
    Arc<dyn Fn(&KeywordArgs) -> Result<Arc<dyn Keyword>, FormatError> + Send + Sync>;

/// A registered keyword implementation
///
/// Registration is explicit: each keyword type contributes a descriptor at
/// startup instead of being discovered by scanning for a marker attribute.
#[derive(Clone)]
pub struct KeywordDescriptor {
    /// Placeholder name used in templates
    pub name: String,

    /// Module-path-style name for last-chance resolution of keywords that
    /// were never registered under a short name
    pub qualified_name: String,

    /// Whether this registration may replace an existing one
    pub allow_override: bool,

    /// Builds an instance from a placeholder's parsed arguments
    pub build: KeywordBuildFn,
}

impl KeywordDescriptor {
    pub fn new<F>(name: &str, qualified_name: &str, build: F) -> Self
    where
        F: Fn(&KeywordArgs) -> Result<Arc<dyn Keyword>, FormatError> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            qualified_name: qualified_name.to_string(),
            allow_override: false,
            build: Arc::new(build),
        }
    }

    /// Allow this registration to replace an existing name
    pub fn overriding(mut self) -> Self {
        self.allow_override = true;
        self
    }
}

impl std::fmt::Debug for KeywordDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeywordDescriptor")
            .field("name", &self.name)
            .field("qualified_name", &self.qualified_name)
            .field("allow_override", &self.allow_override)
            .finish()
    }
}
