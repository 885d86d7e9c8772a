use thiserror::Error;

/// Errors raised while compiling a format template
///
/// All of these indicate a configuration defect and surface synchronously to
/// whoever triggers compilation, typically the first use of a sink's format.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// Malformed template text
    #[error("syntax error in template {template:?}: {detail}")]
    Syntax { template: String, detail: String },

    /// Placeholder name not present in the registry
    #[error("unknown keyword {name:?}")]
    UnknownKeyword { name: String },

    /// Registration collision without the override flag
    #[error("keyword {name:?} is already registered")]
    DuplicateKeyword { name: String },

    /// A keyword requires an attribute the placeholder did not supply
    #[error("keyword {keyword:?} requires attribute {attribute:?}")]
    MissingAttribute { keyword: String, attribute: String },

    /// An attribute value could not be converted to its declared type
    #[error("keyword {keyword:?}: attribute {attribute:?} has unconvertible value {value:?}")]
    AttributeConversion {
        keyword: String,
        attribute: String,
        value: String,
    },
}

impl FormatError {
    pub(crate) fn syntax(template: &str, detail: impl Into<String>) -> Self {
        Self::Syntax {
            template: template.to_string(),
            detail: detail.into(),
        }
    }
}
