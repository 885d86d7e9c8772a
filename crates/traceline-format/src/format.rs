use std::sync::Arc;

use traceline_types::TraceEvent;

use crate::args::KeywordArgs;
use crate::cache::FormatCache;
use crate::error::FormatError;
use crate::keyword::Keyword;
use crate::registry::KeywordRegistry;
use crate::scan::{scan, Phrase};

/// One element of a compiled format
#[derive(Clone)]
pub enum Token {
    /// Fixed text emitted verbatim
    Literal(String),

    /// A built keyword instance, shared through the format cache
    Keyword(Arc<dyn Keyword>),
}

/// A compiled format template
///
/// Owns the ordered token sequence plus the original template string, kept
/// for diagnostics. Tokens never mutate after compilation, so one `Format`
/// may render events concurrently from any number of threads.
#[derive(Clone)]
pub struct Format {
    template: String,
    tokens: Vec<Token>,
}

impl Format {
    /// The template this format was compiled from
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Number of compiled tokens
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Render one event through the compiled token sequence
    ///
    /// Literal tokens append their fixed text; keyword tokens append their
    /// render result, with `None` and empty contributing nothing.
    pub fn render(&self, event: &TraceEvent) -> String {
        let mut out = String::with_capacity(self.template.len() + 32);
        for token in &self.tokens {
            match token {
                Token::Literal(text) => out.push_str(text),
                Token::Keyword(keyword) => {
                    if let Some(text) = keyword.render(event) {
                        out.push_str(&text);
                    }
                }
            }
        }
        out
    }
}

impl std::fmt::Debug for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Format")
            .field("template", &self.template)
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

/// Compiles templates into [`Format`]s
///
/// Owns the keyword registry and the compiled-format cache. Process-wide
/// scope comes from sharing one engine (usually behind an `Arc`), not from
/// ambient globals, so tests can run isolated engines side by side.
#[derive(Default)]
pub struct FormatEngine {
    registry: KeywordRegistry,
    cache: FormatCache,
}

impl FormatEngine {
    /// Create an engine with the built-in keyword set
    pub fn new() -> Self {
        Self {
            registry: KeywordRegistry::with_builtins(),
            cache: FormatCache::new(),
        }
    }

    /// Create an engine around a caller-populated registry
    pub fn with_registry(registry: KeywordRegistry) -> Self {
        Self {
            registry,
            cache: FormatCache::new(),
        }
    }

    pub fn registry(&self) -> &KeywordRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &FormatCache {
        &self.cache
    }

    /// Compile a template into a format
    ///
    /// Placeholder instances are resolved through the registry and memoized
    /// in the cache by their exact body text, so identical placeholders are
    /// built once per engine lifetime.
    pub fn compile(&self, template: &str) -> Result<Format, FormatError> {
        let mut tokens = Vec::new();
        for phrase in scan(template)? {
            match phrase {
                Phrase::Text(text) => tokens.push(Token::Literal(text)),
                Phrase::Placeholder { raw, name, attrs } => {
                    let keyword = self.cache.get_or_build(&raw, || {
                        let descriptor = self.registry.resolve(&name)?;
                        let args = KeywordArgs::new(name.clone(), raw.clone(), attrs.clone());
                        (descriptor.build)(&args)
                    })?;
                    tokens.push(Token::Keyword(keyword));
                }
            }
        }
        Ok(Format {
            template: template.to_string(),
            tokens,
        })
    }
}
