//! Built-in keyword set
//!
//! Each keyword self-registers through [`builtin_descriptors`], which
//! [`crate::KeywordRegistry::with_builtins`] consumes at startup. Dynamic
//! keywords read from the event; static ones (`machinename`, `newline`,
//! `text`) fix their output when the placeholder is built.

use std::sync::Arc;

use traceline_types::{ProcessSnapshot, TraceEvent};

use crate::args::KeywordArgs;
use crate::error::FormatError;
use crate::keyword::{Keyword, KeywordDescriptor, StaticText};

/// Message text of the event
pub struct MessageKeyword;

impl Keyword for MessageKeyword {
    fn render(&self, event: &TraceEvent) -> Option<String> {
        Some(event.message.clone())
    }
}

/// Severity level display name
pub struct LevelKeyword;

impl Keyword for LevelKeyword {
    fn render(&self, event: &TraceEvent) -> Option<String> {
        Some(event.level.as_str().to_string())
    }
}

/// Numeric event id
pub struct IdKeyword;

impl Keyword for IdKeyword {
    fn render(&self, event: &TraceEvent) -> Option<String> {
        Some(event.id.to_string())
    }
}

/// Logical source name
pub struct SourceKeyword;

impl Keyword for SourceKeyword {
    fn render(&self, event: &TraceEvent) -> Option<String> {
        Some(event.source.clone())
    }
}

/// Type name of the emitting component, empty when the writer declares none
pub struct SourceTypeKeyword;

impl Keyword for SourceTypeKeyword {
    fn render(&self, event: &TraceEvent) -> Option<String> {
        event.source_type.clone()
    }
}

/// Time zone selector for [`TimestampKeyword`]
enum TimeKind {
    Utc,
    Local,
}

/// Event timestamp
///
/// Attributes: `format` (alias `f`) takes a chrono strftime pattern,
/// defaulting to RFC 3339; `kind` selects `utc` or `local`.
pub struct TimestampKeyword {
    format: Option<String>,
    kind: TimeKind,
}

impl TimestampKeyword {
    fn from_args(args: &KeywordArgs) -> Result<Self, FormatError> {
        let kind = match args.get_enum(&["kind"], &["utc", "local"])? {
            Some(1) => TimeKind::Local,
            _ => TimeKind::Utc,
        };
        let format = args.get(&["format", "f"]).map(str::to_string);
        if let Some(fmt) = &format {
            // An invalid strftime pattern must fail here, not panic in render
            let mut items = chrono::format::strftime::StrftimeItems::new(fmt);
            if items.any(|item| matches!(item, chrono::format::Item::Error)) {
                return Err(FormatError::AttributeConversion {
                    keyword: args.keyword().to_string(),
                    attribute: "format".to_string(),
                    value: fmt.clone(),
                });
            }
        }
        Ok(Self { format, kind })
    }
}

impl Keyword for TimestampKeyword {
    fn render(&self, event: &TraceEvent) -> Option<String> {
        let text = match (&self.kind, &self.format) {
            (TimeKind::Utc, Some(fmt)) => event.timestamp.format(fmt).to_string(),
            (TimeKind::Utc, None) => event.timestamp.to_rfc3339(),
            (TimeKind::Local, Some(fmt)) => event
                .timestamp
                .with_timezone(&chrono::Local)
                .format(fmt)
                .to_string(),
            (TimeKind::Local, None) => event.timestamp.with_timezone(&chrono::Local).to_rfc3339(),
        };
        Some(text)
    }
}

/// Emitting thread id
pub struct ThreadIdKeyword;

impl Keyword for ThreadIdKeyword {
    fn render(&self, event: &TraceEvent) -> Option<String> {
        Some(event.thread.id.to_string())
    }
}

/// Emitting thread name, empty for unnamed threads
pub struct ThreadNameKeyword;

impl Keyword for ThreadNameKeyword {
    fn render(&self, event: &TraceEvent) -> Option<String> {
        event.thread.name.clone()
    }
}

/// Owning process id
pub struct ProcessIdKeyword;

impl Keyword for ProcessIdKeyword {
    fn render(&self, event: &TraceEvent) -> Option<String> {
        Some(event.process.id.to_string())
    }
}

/// Owning process executable name
pub struct ProcessNameKeyword;

impl Keyword for ProcessNameKeyword {
    fn render(&self, event: &TraceEvent) -> Option<String> {
        Some(event.process.name.clone())
    }
}

/// Structured payload rendered as compact JSON
pub struct DataKeyword;

impl Keyword for DataKeyword {
    fn render(&self, event: &TraceEvent) -> Option<String> {
        event.data.as_ref().map(|data| data.to_string())
    }
}

/// Captured call stack, when the owning writer captures one
pub struct CallstackKeyword;

impl Keyword for CallstackKeyword {
    fn render(&self, event: &TraceEvent) -> Option<String> {
        event.callstack.clone()
    }
}

fn descriptor<F>(name: &str, type_name: &str, build: F) -> KeywordDescriptor
where
    F: Fn(&KeywordArgs) -> Result<Arc<dyn Keyword>, FormatError> + Send + Sync + 'static,
{
    KeywordDescriptor::new(
        name,
        &format!("traceline_format::keywords::{type_name}"),
        build,
    )
}

/// Descriptors for the built-in keyword set, registered before any extension
pub fn builtin_descriptors() -> Vec<KeywordDescriptor> {
    vec![
        descriptor("message", "MessageKeyword", |_| Ok(Arc::new(MessageKeyword))),
        descriptor("level", "LevelKeyword", |_| Ok(Arc::new(LevelKeyword))),
        descriptor("id", "IdKeyword", |_| Ok(Arc::new(IdKeyword))),
        descriptor("source", "SourceKeyword", |_| Ok(Arc::new(SourceKeyword))),
        descriptor("sourcetype", "SourceTypeKeyword", |_| {
            Ok(Arc::new(SourceTypeKeyword))
        }),
        descriptor("timestamp", "TimestampKeyword", |args| {
            Ok(Arc::new(TimestampKeyword::from_args(args)?))
        }),
        descriptor("threadid", "ThreadIdKeyword", |_| Ok(Arc::new(ThreadIdKeyword))),
        descriptor("threadname", "ThreadNameKeyword", |_| {
            Ok(Arc::new(ThreadNameKeyword))
        }),
        descriptor("processid", "ProcessIdKeyword", |_| {
            Ok(Arc::new(ProcessIdKeyword))
        }),
        descriptor("processname", "ProcessNameKeyword", |_| {
            Ok(Arc::new(ProcessNameKeyword))
        }),
        descriptor("machinename", "MachineNameKeyword", |_| {
            // Static: the machine name cannot change under a running process
            Ok(Arc::new(StaticText::new(
                ProcessSnapshot::current().machine.clone(),
            )))
        }),
        descriptor("newline", "NewlineKeyword", |_| {
            let ending = if cfg!(windows) { "\r\n" } else { "\n" };
            Ok(Arc::new(StaticText::new(ending)))
        }),
        descriptor("data", "DataKeyword", |_| Ok(Arc::new(DataKeyword))),
        descriptor("callstack", "CallstackKeyword", |_| {
            Ok(Arc::new(CallstackKeyword))
        }),
        descriptor("text", "TextKeyword", |args| {
            let value = args.require(&["value", "v"])?;
            Ok(Arc::new(StaticText::new(value)))
        }),
    ]
}
