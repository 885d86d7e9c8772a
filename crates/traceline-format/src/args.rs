use std::collections::HashMap;
use std::time::Duration;

use crate::error::FormatError;

/// Parsed placeholder arguments handed to a keyword's build function
///
/// Carries the raw body text and the attribute map, with typed accessors for
/// the closed set of supported value types: string, integer, bool,
/// enum-by-name, and duration. Each accessor takes a list of accepted
/// attribute names so keywords can declare short-name aliases.
#[derive(Clone, Debug)]
pub struct KeywordArgs {
    keyword: String,
    raw: String,
    attrs: HashMap<String, String>,
}

impl KeywordArgs {
    pub fn new(keyword: String, raw: String, attrs: Vec<(String, String)>) -> Self {
        Self {
            keyword,
            raw,
            attrs: attrs.into_iter().collect(),
        }
    }

    /// The keyword name this placeholder resolved to
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Exact placeholder body text as written in the template
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Look up a string attribute under any of the accepted names
    pub fn get(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .find_map(|name| self.attrs.get(*name))
            .map(String::as_str)
    }

    /// Require a string attribute
    pub fn require(&self, names: &[&str]) -> Result<&str, FormatError> {
        self.get(names).ok_or_else(|| self.missing(names))
    }

    /// Look up an integer attribute
    pub fn get_i64(&self, names: &[&str]) -> Result<Option<i64>, FormatError> {
        match self.get(names) {
            None => Ok(None),
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| self.unconvertible(names, value)),
        }
    }

    /// Look up a boolean attribute (`true`/`false`, `yes`/`no`, `1`/`0`)
    pub fn get_bool(&self, names: &[&str]) -> Result<Option<bool>, FormatError> {
        match self.get(names) {
            None => Ok(None),
            Some(value) => match value.to_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(Some(true)),
                "false" | "no" | "0" => Ok(Some(false)),
                _ => Err(self.unconvertible(names, value)),
            },
        }
    }

    /// Look up an enum-by-name attribute against a caller-supplied name list
    ///
    /// Returns the index into `allowed` of the matched name (case-insensitive).
    pub fn get_enum(&self, names: &[&str], allowed: &[&str]) -> Result<Option<usize>, FormatError> {
        match self.get(names) {
            None => Ok(None),
            Some(value) => allowed
                .iter()
                .position(|candidate| candidate.eq_ignore_ascii_case(value))
                .map(Some)
                .ok_or_else(|| self.unconvertible(names, value)),
        }
    }

    /// Look up a duration attribute (`250ms`, `10s`, `5m`, `2h`, or bare seconds)
    pub fn get_duration(&self, names: &[&str]) -> Result<Option<Duration>, FormatError> {
        match self.get(names) {
            None => Ok(None),
            Some(value) => {
                parse_duration(value).ok_or_else(|| self.unconvertible(names, value)).map(Some)
            }
        }
    }

    fn missing(&self, names: &[&str]) -> FormatError {
        FormatError::MissingAttribute {
            keyword: self.keyword.clone(),
            attribute: names.first().copied().unwrap_or_default().to_string(),
        }
    }

    fn unconvertible(&self, names: &[&str], value: &str) -> FormatError {
        FormatError::AttributeConversion {
            keyword: self.keyword.clone(),
            attribute: names.first().copied().unwrap_or_default().to_string(),
            value: value.to_string(),
        }
    }
}

fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Some(ms) = value.strip_suffix("ms") {
        return ms.trim().parse().ok().map(Duration::from_millis);
    }
    if let Some(h) = value.strip_suffix('h') {
        return h.trim().parse::<u64>().ok().map(|n| Duration::from_secs(n * 3600));
    }
    if let Some(m) = value.strip_suffix('m') {
        return m.trim().parse::<u64>().ok().map(|n| Duration::from_secs(n * 60));
    }
    if let Some(s) = value.strip_suffix('s') {
        return s.trim().parse().ok().map(Duration::from_secs);
    }
    value.parse().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, &str)]) -> KeywordArgs {
        KeywordArgs::new(
            "test".to_string(),
            "test".to_string(),
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_alias_lookup() {
        let a = args(&[("f", "%H:%M")]);
        assert_eq!(a.get(&["format", "f"]), Some("%H:%M"));
        assert_eq!(a.get(&["format"]), None);
    }

    #[test]
    fn test_require_missing() {
        let a = args(&[]);
        let err = a.require(&["value"]).unwrap_err();
        assert_eq!(
            err,
            FormatError::MissingAttribute {
                keyword: "test".to_string(),
                attribute: "value".to_string(),
            }
        );
    }

    #[test]
    fn test_int_and_bool() {
        let a = args(&[("n", "42"), ("flag", "yes"), ("bad", "maybe")]);
        assert_eq!(a.get_i64(&["n"]).unwrap(), Some(42));
        assert_eq!(a.get_bool(&["flag"]).unwrap(), Some(true));
        assert!(matches!(
            a.get_bool(&["bad"]).unwrap_err(),
            FormatError::AttributeConversion { .. }
        ));
    }

    #[test]
    fn test_enum_by_name() {
        let a = args(&[("kind", "UTC")]);
        assert_eq!(a.get_enum(&["kind"], &["utc", "local"]).unwrap(), Some(0));
        let a = args(&[("kind", "martian")]);
        assert!(a.get_enum(&["kind"], &["utc", "local"]).is_err());
    }

    #[test]
    fn test_durations() {
        let a = args(&[("a", "250ms"), ("b", "10s"), ("c", "5m"), ("d", "2h"), ("e", "30")]);
        assert_eq!(a.get_duration(&["a"]).unwrap(), Some(Duration::from_millis(250)));
        assert_eq!(a.get_duration(&["b"]).unwrap(), Some(Duration::from_secs(10)));
        assert_eq!(a.get_duration(&["c"]).unwrap(), Some(Duration::from_secs(300)));
        assert_eq!(a.get_duration(&["d"]).unwrap(), Some(Duration::from_secs(7200)));
        assert_eq!(a.get_duration(&["e"]).unwrap(), Some(Duration::from_secs(30)));
    }
}
