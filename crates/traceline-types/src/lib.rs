//! Shared types for traceline
//!
//! This crate contains the data model used across the traceline crates:
//! the severity [`Level`], the [`TraceEvent`] record, and the thread and
//! process snapshots captured when an event is emitted.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Severity Levels
// ============================================================================

/// Event severity level
///
/// Ordering: `Debug < Information < Start = Stop = Suspend = Resume <
/// Warning < Error < Critical`. The four activity levels share one severity
/// band, so comparison goes through [`Level::ordinal`] rather than a derived
/// `Ord`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    #[default]
    Information,
    Start,
    Stop,
    Suspend,
    Resume,
    Warning,
    Error,
    Critical,
}

impl Level {
    /// Parse a level from common spellings
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debug" | "dbg" | "verbose" => Some(Self::Debug),
            "info" | "information" => Some(Self::Information),
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            "suspend" => Some(Self::Suspend),
            "resume" => Some(Self::Resume),
            "warn" | "warning" => Some(Self::Warning),
            "error" | "err" => Some(Self::Error),
            "critical" | "crit" | "fatal" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Ordinal for severity comparison (activity levels share a band)
    pub fn ordinal(self) -> u8 {
        match self {
            Self::Debug => 0,
            Self::Information => 1,
            Self::Start | Self::Stop | Self::Suspend | Self::Resume => 2,
            Self::Warning => 3,
            Self::Error => 4,
            Self::Critical => 5,
        }
    }

    /// Check whether this level is at least as severe as `min`
    pub fn at_least(self, min: Level) -> bool {
        self.ordinal() >= min.ordinal()
    }

    /// Canonical display name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Information => "Information",
            Self::Start => "Start",
            Self::Stop => "Stop",
            Self::Suspend => "Suspend",
            Self::Resume => "Resume",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Ambient Context Snapshots
// ============================================================================

/// Snapshot of the emitting thread, taken once per event
#[derive(Clone, Debug)]
pub struct ThreadSnapshot {
    /// Numeric thread id
    pub id: u64,
    /// Thread name, if the thread was named
    pub name: Option<String>,
}

impl ThreadSnapshot {
    /// Capture the current thread
    pub fn capture() -> Self {
        let current = std::thread::current();
        Self {
            id: thread_id_value(current.id()),
            name: current.name().map(str::to_string),
        }
    }
}

/// Extract the numeric value from std's opaque ThreadId
fn thread_id_value(id: std::thread::ThreadId) -> u64 {
    // Debug-renders as "ThreadId(N)"
    let repr = format!("{id:?}");
    repr.chars()
        .filter(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}

/// Snapshot of the owning process, captured once per process
#[derive(Clone, Debug)]
pub struct ProcessSnapshot {
    /// OS process id
    pub id: u32,
    /// Executable name
    pub name: String,
    /// Host machine name
    pub machine: String,
}

impl ProcessSnapshot {
    /// Get the shared process snapshot
    pub fn current() -> &'static Self {
        static SNAPSHOT: OnceLock<ProcessSnapshot> = OnceLock::new();
        SNAPSHOT.get_or_init(|| Self {
            id: std::process::id(),
            name: std::env::current_exe()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .unwrap_or_else(|| "unknown".to_string()),
            machine: machine_name(),
        })
    }
}

fn machine_name() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "localhost".to_string())
}

// ============================================================================
// Trace Events
// ============================================================================

/// A single emitted trace event
///
/// Immutable after construction: built once per logging call, read-only to
/// every downstream consumer, dropped when dispatch completes.
#[derive(Clone, Debug)]
pub struct TraceEvent {
    /// Emission time (UTC)
    pub timestamp: DateTime<Utc>,

    /// Severity level
    pub level: Level,

    /// Numeric event id
    pub id: u32,

    /// Logical source name of the owning writer
    pub source: String,

    /// Type name of the emitting component, when the writer declares one
    pub source_type: Option<String>,

    /// Message text
    pub message: String,

    /// Optional structured payload
    pub data: Option<serde_json::Value>,

    /// Optional captured call stack
    pub callstack: Option<String>,

    /// Emitting thread snapshot
    pub thread: ThreadSnapshot,

    /// Owning process snapshot
    pub process: ProcessSnapshot,
}

impl TraceEvent {
    /// Create a new event, capturing timestamp and ambient context
    pub fn new(source: impl Into<String>, level: Level, id: u32, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            id,
            source: source.into(),
            source_type: None,
            message: message.into(),
            data: None,
            callstack: None,
            thread: ThreadSnapshot::capture(),
            process: ProcessSnapshot::current().clone(),
        }
    }

    /// Attach the emitting component's type name
    pub fn with_source_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = Some(source_type.into());
        self
    }

    /// Attach a structured payload
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Attach a captured call stack
    pub fn with_callstack(mut self, callstack: String) -> Self {
        self.callstack = Some(callstack);
        self
    }
}
