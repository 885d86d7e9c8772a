use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;

use traceline_types::{Level, TraceEvent};

/// How a filter's result composes with the running chain result
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// Same as `And`
    #[default]
    None,
    And,
    Or,
    Xor,
}

/// A named predicate over trace events
///
/// Constructed once from configuration and reused for the lifetime of the
/// owning sink binding; `initialize` runs once at resolution time.
pub trait Filter: Send + Sync {
    /// Decide whether the event passes this filter
    fn validate(&self, event: &TraceEvent) -> bool;

    /// Combination tag for the chain evaluator
    fn condition(&self) -> Condition;

    /// One-time hook called when the owning binding is resolved
    fn initialize(&self) {}
}

/// An ordered chain of filters evaluated per (sink, event) pair
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter, preserving declaration order
    pub fn with(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn push(&mut self, filter: Arc<dyn Filter>) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run every filter's `initialize` hook once
    pub fn initialize(&self) {
        for filter in &self.filters {
            filter.initialize();
        }
    }

    /// Evaluate the chain against one event
    ///
    /// Accumulator starts true and filters run in declaration order:
    /// `And` (and unset) intersects; `Or` returns true immediately when the
    /// running result or its own predicate is true, and otherwise continues
    /// with a false accumulator; `Xor` applies exclusive-or between the
    /// running result and its predicate, which is deliberately
    /// order-dependent. An empty chain is always valid.
    pub fn validate(&self, event: &TraceEvent) -> bool {
        let mut valid = true;
        for filter in &self.filters {
            match filter.condition() {
                Condition::None | Condition::And => {
                    valid = valid && filter.validate(event);
                }
                Condition::Or => {
                    if valid || filter.validate(event) {
                        return true;
                    }
                    valid = false;
                }
                Condition::Xor => {
                    valid ^= filter.validate(event);
                }
            }
        }
        valid
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.filters.len())
            .finish()
    }
}

// ============================================================================
// Built-in Filters
// ============================================================================

/// Passes events by severity level
pub struct LevelFilter {
    min: Level,
    condition: Condition,
}

impl LevelFilter {
    /// Pass events at `min` severity or above
    pub fn at_least(min: Level) -> Self {
        Self {
            min,
            condition: Condition::None,
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }
}

impl Filter for LevelFilter {
    fn validate(&self, event: &TraceEvent) -> bool {
        event.level.at_least(self.min)
    }

    fn condition(&self) -> Condition {
        self.condition
    }
}

/// Passes events from one exact source
pub struct SourceFilter {
    source: String,
    condition: Condition,
}

impl SourceFilter {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            condition: Condition::None,
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }
}

impl Filter for SourceFilter {
    fn validate(&self, event: &TraceEvent) -> bool {
        event.source == self.source
    }

    fn condition(&self) -> Condition {
        self.condition
    }
}

/// Passes events whose message matches a regex
pub struct TextMatchFilter {
    regex: Regex,
    condition: Condition,
}

impl TextMatchFilter {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            condition: Condition::None,
        })
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }
}

impl Filter for TextMatchFilter {
    fn validate(&self, event: &TraceEvent) -> bool {
        self.regex.is_match(&event.message)
    }

    fn condition(&self) -> Condition {
        self.condition
    }
}
