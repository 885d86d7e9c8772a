use crate::error::FormatError;

/// A raw phrase produced by scanning a template
///
/// Scanning is a pure function of the template text: no I/O, no shared
/// state, deterministic output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phrase {
    /// Literal text between placeholders
    Text(String),

    /// A parsed placeholder
    Placeholder {
        /// Exact body text between the delimiters, attributes included.
        /// This is the compiled-format cache key.
        raw: String,
        /// Keyword name (the part before `?`)
        name: String,
        /// Attribute pairs in declaration order
        attrs: Vec<(String, String)>,
    },
}

/// Scan a template into an ordered phrase list
///
/// Placeholders use `{` `}` delimiters with the body syntax
/// `name[?attr=value[&attr2=value2...]]`. A doubled delimiter (`{{` or `}}`)
/// emits one literal delimiter character. An unmatched `{` or an empty
/// placeholder name is a syntax error; a lone `}` is literal text.
pub fn scan(template: &str) -> Result<Vec<Phrase>, FormatError> {
    let mut phrases = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    literal.push('{');
                    continue;
                }

                let mut body = String::new();
                let mut closed = false;
                for b in chars.by_ref() {
                    if b == '}' {
                        closed = true;
                        break;
                    }
                    body.push(b);
                }
                if !closed {
                    return Err(FormatError::syntax(template, "unmatched '{'"));
                }

                if !literal.is_empty() {
                    phrases.push(Phrase::Text(std::mem::take(&mut literal)));
                }

                let (name, attrs) = parse_body(template, &body)?;
                phrases.push(Phrase::Placeholder {
                    raw: body,
                    name,
                    attrs,
                });
            }
            '}' => {
                // "}}" collapses to one literal brace; a lone "}" stays literal
                if chars.peek() == Some(&'}') {
                    chars.next();
                }
                literal.push('}');
            }
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        phrases.push(Phrase::Text(literal));
    }

    Ok(phrases)
}

/// Split a placeholder body into its name and attribute pairs
fn parse_body(template: &str, body: &str) -> Result<(String, Vec<(String, String)>), FormatError> {
    let (name, attr_text) = match body.split_once('?') {
        Some((name, rest)) => (name, Some(rest)),
        None => (body, None),
    };

    if name.is_empty() {
        return Err(FormatError::syntax(template, "empty placeholder name"));
    }

    let mut attrs = Vec::new();
    if let Some(attr_text) = attr_text {
        for pair in attr_text.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(FormatError::syntax(
                    template,
                    format!("attribute {pair:?} is missing '='"),
                ));
            };
            if key.is_empty() {
                return Err(FormatError::syntax(template, "empty attribute name"));
            }
            attrs.push((key.to_string(), value.to_string()));
        }
    }

    Ok((name.to_string(), attrs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        let phrases = scan("hello world").unwrap();
        assert_eq!(phrases, vec![Phrase::Text("hello world".to_string())]);
    }

    #[test]
    fn test_placeholder_with_surrounding_text() {
        let phrases = scan("a {message} b").unwrap();
        assert_eq!(phrases.len(), 3);
        assert_eq!(phrases[0], Phrase::Text("a ".to_string()));
        assert_eq!(
            phrases[1],
            Phrase::Placeholder {
                raw: "message".to_string(),
                name: "message".to_string(),
                attrs: vec![],
            }
        );
        assert_eq!(phrases[2], Phrase::Text(" b".to_string()));
    }

    #[test]
    fn test_attributes() {
        let phrases = scan("{timestamp?format=%H:%M&kind=utc}").unwrap();
        assert_eq!(
            phrases,
            vec![Phrase::Placeholder {
                raw: "timestamp?format=%H:%M&kind=utc".to_string(),
                name: "timestamp".to_string(),
                attrs: vec![
                    ("format".to_string(), "%H:%M".to_string()),
                    ("kind".to_string(), "utc".to_string()),
                ],
            }]
        );
    }

    #[test]
    fn test_doubled_delimiters_are_literal() {
        let phrases = scan("a {{b}} c").unwrap();
        assert_eq!(phrases, vec![Phrase::Text("a {b} c".to_string())]);
    }

    #[test]
    fn test_lone_closing_brace_is_literal() {
        let phrases = scan("a } b").unwrap();
        assert_eq!(phrases, vec![Phrase::Text("a } b".to_string())]);
    }

    #[test]
    fn test_unmatched_open_is_error() {
        let err = scan("a {message").unwrap_err();
        assert!(matches!(err, FormatError::Syntax { .. }));
    }

    #[test]
    fn test_empty_name_is_error() {
        assert!(matches!(
            scan("{}").unwrap_err(),
            FormatError::Syntax { .. }
        ));
        assert!(matches!(
            scan("{?a=b}").unwrap_err(),
            FormatError::Syntax { .. }
        ));
    }

    #[test]
    fn test_attribute_without_assignment_is_error() {
        assert!(matches!(
            scan("{id?flag}").unwrap_err(),
            FormatError::Syntax { .. }
        ));
    }

    #[test]
    fn test_adjacent_placeholders() {
        let phrases = scan("{level}{id}").unwrap();
        assert_eq!(phrases.len(), 2);
    }
}
