use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::FormatError;
use crate::keyword::KeywordDescriptor;
use crate::keywords;

/// Maps placeholder names to keyword implementations
///
/// Read-mostly after startup: registration takes the exclusive lock,
/// resolution the shared one. Lookup is a hash probe since it runs for every
/// distinct placeholder of an uncached format.
pub struct KeywordRegistry {
    inner: RwLock<Maps>,
}

#[derive(Default)]
struct Maps {
    by_name: HashMap<String, KeywordDescriptor>,
    by_qualified: HashMap<String, KeywordDescriptor>,
}

impl KeywordRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Maps::default()),
        }
    }

    /// Create a registry populated with the built-in keyword set
    ///
    /// Built-ins register first; extension descriptors registered afterwards
    /// may replace them only by setting the override flag.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for descriptor in keywords::builtin_descriptors() {
            // Built-in names are distinct, so this cannot collide
            let _ = registry.register(descriptor);
        }
        registry
    }

    /// Register a keyword descriptor
    ///
    /// Fails with [`FormatError::DuplicateKeyword`] if the name is taken and
    /// the incoming descriptor does not allow override; an overriding
    /// descriptor replaces the earlier registration.
    pub fn register(&self, descriptor: KeywordDescriptor) -> Result<(), FormatError> {
        let mut maps = self.inner.write();
        if maps.by_name.contains_key(&descriptor.name) && !descriptor.allow_override {
            return Err(FormatError::DuplicateKeyword {
                name: descriptor.name.clone(),
            });
        }
        maps.by_qualified
            .insert(descriptor.qualified_name.clone(), descriptor.clone());
        maps.by_name.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Resolve a placeholder name to its descriptor
    ///
    /// Checks the name map first, then falls back to a lookup by qualified
    /// name for keyword types referenced explicitly in a template without a
    /// short-name registration.
    pub fn resolve(&self, name: &str) -> Result<KeywordDescriptor, FormatError> {
        let maps = self.inner.read();
        maps.by_name
            .get(name)
            .or_else(|| maps.by_qualified.get(name))
            .cloned()
            .ok_or_else(|| FormatError::UnknownKeyword {
                name: name.to_string(),
            })
    }

    /// Number of registered names
    pub fn len(&self) -> usize {
        self.inner.read().by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().by_name.is_empty()
    }
}

impl Default for KeywordRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyword::StaticText;
    use std::sync::Arc;

    fn descriptor(name: &str, text: &'static str) -> KeywordDescriptor {
        KeywordDescriptor::new(name, &format!("tests::{name}"), move |_args| {
            Ok(Arc::new(StaticText::new(text)) as Arc<_>)
        })
    }

    #[test]
    fn test_register_and_resolve() {
        let registry = KeywordRegistry::new();
        registry.register(descriptor("id", "first")).unwrap();
        assert_eq!(registry.resolve("id").unwrap().name, "id");
    }

    #[test]
    fn test_duplicate_without_override_fails() {
        let registry = KeywordRegistry::new();
        registry.register(descriptor("id", "first")).unwrap();
        let err = registry.register(descriptor("id", "second")).unwrap_err();
        assert_eq!(
            err,
            FormatError::DuplicateKeyword {
                name: "id".to_string()
            }
        );
    }

    #[test]
    fn test_override_replaces() {
        let registry = KeywordRegistry::new();
        registry.register(descriptor("id", "first")).unwrap();

        let replacement = KeywordDescriptor::new("id", "tests::replacement", |_args| {
            Ok(Arc::new(StaticText::new("second")) as Arc<_>)
        })
        .overriding();
        registry.register(replacement).unwrap();

        let resolved = registry.resolve("id").unwrap();
        assert_eq!(resolved.qualified_name, "tests::replacement");
    }

    #[test]
    fn test_unknown_keyword() {
        let registry = KeywordRegistry::new();
        assert_eq!(
            registry.resolve("nope").unwrap_err(),
            FormatError::UnknownKeyword {
                name: "nope".to_string()
            }
        );
    }

    #[test]
    fn test_qualified_name_fallback() {
        let registry = KeywordRegistry::new();
        registry.register(descriptor("id", "first")).unwrap();
        let resolved = registry.resolve("tests::id").unwrap();
        assert_eq!(resolved.name, "id");
    }

    #[test]
    fn test_builtins_present() {
        let registry = KeywordRegistry::with_builtins();
        for name in ["message", "level", "id", "source", "timestamp"] {
            assert!(registry.resolve(name).is_ok(), "missing builtin {name}");
        }
    }
}
