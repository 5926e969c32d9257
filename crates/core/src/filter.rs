//! Single-predicate record filter.
//!
//! Compiled once per run from a `predicate:search:value` expression and
//! evaluated against every decoded record.

use tracing::trace;

use crate::error::{Error, Result};
use crate::record::AuditRecord;

const DELIMITER: char = ':';

/// A compiled filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    predicate: String,
    /// Parsed from the middle segment but not consulted when matching.
    /// It is kept so expressions round-trip and can be inspected.
    search: String,
    value: String,
}

impl FilterSpec {
    /// Compile `predicate:search:value`.
    ///
    /// The value is everything after the second colon, so values that
    /// contain colons (timestamps, addresses) survive intact. All three
    /// segments must be non-empty. Segments are taken verbatim, surrounding
    /// whitespace included.
    pub fn compile(expression: &str) -> Result<Self> {
        if expression.trim().is_empty() {
            return Err(Error::config("filter expression is empty"));
        }

        let mut parts = expression.splitn(3, DELIMITER);
        let (Some(predicate), Some(search), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::config(format!(
                "filter '{expression}' must have the form predicate:search:value"
            )));
        };

        if predicate.is_empty() || search.is_empty() || value.is_empty() {
            return Err(Error::config(format!(
                "filter '{expression}' has an empty segment"
            )));
        }

        Ok(Self {
            predicate: predicate.to_string(),
            search: search.to_string(),
            value: value.to_string(),
        })
    }

    /// Compile an optional expression. `None` means no filter; a present
    /// but blank expression is still a configuration error.
    pub fn parse_optional(expression: Option<&str>) -> Result<Option<Self>> {
        expression.map(Self::compile).transpose()
    }

    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Exact, case-sensitive string equality on the predicate field.
    ///
    /// A missing or non-string field is a non-match, never an error.
    pub fn matches(&self, record: &AuditRecord) -> bool {
        match record.str_field(&self.predicate) {
            Ok(actual) => actual == self.value,
            Err(e) => {
                trace!(predicate = %self.predicate, error = %e, "Filter field unusable, skipping record");
                false
            }
        }
    }
}

impl std::fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.predicate, self.search, self.value)
    }
}

impl std::str::FromStr for FilterSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::compile(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> AuditRecord {
        AuditRecord::parse(json).unwrap()
    }

    #[test]
    fn compiles_three_segments() {
        let spec = FilterSpec::compile("hostname:*:web-01").unwrap();
        assert_eq!(spec.predicate(), "hostname");
        assert_eq!(spec.search(), "*");
        assert_eq!(spec.value(), "web-01");
        assert_eq!(spec.to_string(), "hostname:*:web-01");
    }

    #[test]
    fn value_may_contain_colons() {
        let spec = FilterSpec::compile("timestamp:eq:2020-09-23T14:00:00").unwrap();
        assert_eq!(spec.value(), "2020-09-23T14:00:00");
    }

    #[test]
    fn value_keeps_surrounding_whitespace() {
        let spec = FilterSpec::compile("hostname:*:web ").unwrap();
        assert_eq!(spec.value(), "web ");
        assert!(spec.matches(&record(r#"{"hostname":"web "}"#)));
        assert!(!spec.matches(&record(r#"{"hostname":"web"}"#)));
    }

    #[test]
    fn rejects_too_few_segments() {
        assert!(FilterSpec::compile("hostname").unwrap_err().is_config());
        assert!(FilterSpec::compile("hostname:web-01").unwrap_err().is_config());
    }

    #[test]
    fn rejects_empty_segments() {
        assert!(FilterSpec::compile("::").is_err());
        assert!(FilterSpec::compile(":*:web-01").is_err());
        assert!(FilterSpec::compile("hostname::web-01").is_err());
        assert!(FilterSpec::compile("hostname:*:").is_err());
    }

    #[test]
    fn rejects_blank_expression() {
        assert!(FilterSpec::compile("").is_err());
        assert!(FilterSpec::compile("   ").is_err());
        assert!(FilterSpec::parse_optional(Some("")).is_err());
    }

    #[test]
    fn absent_expression_means_no_filter() {
        assert_eq!(FilterSpec::parse_optional(None).unwrap(), None);
    }

    #[test]
    fn matches_equal_value() {
        let spec: FilterSpec = "action:*:READ".parse().unwrap();
        assert!(spec.matches(&record(r#"{"action":"READ"}"#)));
    }

    #[test]
    fn rejects_different_value_case_sensitive() {
        let spec = FilterSpec::compile("action:*:READ").unwrap();
        assert!(!spec.matches(&record(r#"{"action":"read"}"#)));
        assert!(!spec.matches(&record(r#"{"action":"READS"}"#)));
    }

    #[test]
    fn missing_field_is_non_match() {
        let spec = FilterSpec::compile("action:*:READ").unwrap();
        assert!(!spec.matches(&record(r#"{"hostname":"h"}"#)));
    }

    #[test]
    fn non_string_field_is_non_match() {
        let spec = FilterSpec::compile("pid:*:42").unwrap();
        assert!(!spec.matches(&record(r#"{"pid":42}"#)));
        assert!(spec.matches(&record(r#"{"pid":"42"}"#)));
    }

    #[test]
    fn search_segment_does_not_change_matching() {
        let a = FilterSpec::compile("action:*:READ").unwrap();
        let b = FilterSpec::compile("action:regex:READ").unwrap();
        let r = record(r#"{"action":"READ"}"#);
        assert_eq!(a.matches(&r), b.matches(&r));
    }
}
