use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::FormatError;
use crate::keyword::Keyword;

/// Memoizes built keyword instances by exact placeholder text
///
/// Keyed by the body text as it appeared between delimiters, attributes
/// included, so repeated identical placeholders across every format compiled
/// through the owning engine are built once. Two callers racing on a
/// never-seen key may both build; the later insert wins and the transient
/// duplicate is dropped, which is harmless because correctness depends on
/// equivalent rendered output, not instance identity.
#[derive(Default)]
pub struct FormatCache {
    entries: RwLock<HashMap<String, Arc<dyn Keyword>>>,
}

impl FormatCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached instance for `raw`, building and inserting on miss
    pub fn get_or_build<F>(&self, raw: &str, build: F) -> Result<Arc<dyn Keyword>, FormatError>
    where
        F: FnOnce() -> Result<Arc<dyn Keyword>, FormatError>,
    {
        if let Some(keyword) = self.entries.read().get(raw) {
            return Ok(Arc::clone(keyword));
        }

        // Build outside the lock; duplicate compiles are tolerated
        let keyword = build()?;
        self.entries
            .write()
            .insert(raw.to_string(), Arc::clone(&keyword));
        Ok(keyword)
    }

    /// Number of cached placeholder instances
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyword::StaticText;

    #[test]
    fn test_miss_then_hit() {
        let cache = FormatCache::new();
        let mut builds = 0;

        for _ in 0..3 {
            cache
                .get_or_build("machinename", || {
                    builds += 1;
                    Ok(Arc::new(StaticText::new("host")) as Arc<_>)
                })
                .unwrap();
        }

        assert_eq!(builds, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_attribute_text_is_distinct_key() {
        fn build() -> Result<Arc<dyn Keyword>, FormatError> {
            Ok(Arc::new(StaticText::new("x")))
        }

        let cache = FormatCache::new();
        cache.get_or_build("timestamp?format=%H", build).unwrap();
        cache.get_or_build("timestamp?format=%M", build).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_build_error_is_not_cached() {
        let cache = FormatCache::new();
        let err = cache.get_or_build("bad", || {
            Err(FormatError::UnknownKeyword {
                name: "bad".to_string(),
            })
        });
        assert!(err.is_err());
        assert!(cache.is_empty());
    }
}
