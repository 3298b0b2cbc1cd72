//! Grammar checks for metric names, units, help text and label names.
//!
//! All functions are pure. Label values and help text are not restricted
//! beyond UTF-8 well-formedness, which `&str` already guarantees; their
//! content is escaped by the [`writer`](crate::writer) instead of rejected.

use crate::error::{Error, Result};

/// Upper bound for help text, in bytes.
pub const MAX_HELP_LEN: usize = 4096;

/// Suffixes appended by the exposition format. A metric name ending in one of
/// these would be ambiguous on the wire.
pub const RESERVED_SUFFIXES: [&str; 8] = [
    "_total", "_created", "_count", "_sum", "_bucket", "_gcount", "_gsum", "_info",
];

/// Returns `true` if `s` matches `[a-zA-Z_:][a-zA-Z0-9_:]*`.
///
/// ```rust
/// use openmetrics::validation::is_valid_metric_name;
///
/// assert!(is_valid_metric_name("http_requests"));
/// assert!(is_valid_metric_name(":ns:requests"));
/// assert!(!is_valid_metric_name("9lives"));
/// assert!(!is_valid_metric_name(""));
/// ```
pub fn is_valid_metric_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// Returns `true` if `s` matches `[a-zA-Z][a-zA-Z0-9_]*`.
pub fn is_valid_label_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Returns `true` if `s` is empty or matches `[a-zA-Z0-9_:]+`.
pub fn is_valid_metric_unit(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// Returns the reserved suffix `name` ends with, if any.
pub fn ambiguous_suffix(name: &str) -> Option<&'static str> {
    RESERVED_SUFFIXES
        .iter()
        .copied()
        .find(|sfx| name.ends_with(sfx))
}

/// Returns `true` if the non-empty `unit` already forms the trailing segment of `name`.
pub fn ends_with_unit(name: &str, unit: &str) -> bool {
    !unit.is_empty()
        && name
            .strip_suffix(unit)
            .is_some_and(|rest| rest.is_empty() || rest.ends_with('_'))
}

/// Validates a metric name.
pub fn check_metric_name(name: &str) -> Result<()> {
    if !is_valid_metric_name(name) {
        return Err(Error::InvalidName(name.to_string()));
    }
    if let Some(suffix) = ambiguous_suffix(name) {
        return Err(Error::AmbiguousSuffix {
            name: name.to_string(),
            suffix,
        });
    }
    Ok(())
}

/// Validates a unit against the metric name it qualifies.
pub fn check_metric_unit(name: &str, unit: &str) -> Result<()> {
    if !is_valid_metric_unit(unit) {
        return Err(Error::InvalidUnit(unit.to_string()));
    }
    if ends_with_unit(name, unit) {
        return Err(Error::RedundantUnit {
            name: name.to_string(),
            unit: unit.to_string(),
        });
    }
    Ok(())
}

/// Validates help text.
pub fn check_help(help: &str) -> Result<()> {
    if help.len() > MAX_HELP_LEN {
        return Err(Error::HelpTooLong {
            len: help.len(),
            max: MAX_HELP_LEN,
        });
    }
    Ok(())
}

/// Validates an ordered list of label names: each must be well formed and
/// appear once.
pub fn check_label_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let names: Vec<&str> = names.into_iter().collect();
    for (i, name) in names.iter().enumerate() {
        if !is_valid_label_name(name) {
            return Err(Error::InvalidLabelName(name.to_string()));
        }
        if names[i + 1..].contains(name) {
            return Err(Error::DuplicateLabel(name.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_name() {
        assert!(is_valid_metric_name("foo"));
        assert!(is_valid_metric_name("_foo"));
        assert!(is_valid_metric_name("foo:bar_baz9"));
        assert!(!is_valid_metric_name("1foo"));
        assert!(!is_valid_metric_name("foo-bar"));
        assert!(!is_valid_metric_name("foo bar"));
        assert!(!is_valid_metric_name("föo"));
    }

    #[test]
    fn test_label_name() {
        assert!(is_valid_label_name("status"));
        assert!(is_valid_label_name("status_code2"));
        assert!(!is_valid_label_name("_status"));
        assert!(!is_valid_label_name("9"));
        assert!(!is_valid_label_name("a:b"));
        assert!(!is_valid_label_name(""));
    }

    #[test]
    fn test_metric_unit() {
        assert!(is_valid_metric_unit(""));
        assert!(is_valid_metric_unit("seconds"));
        assert!(is_valid_metric_unit("9bytes"));
        assert!(!is_valid_metric_unit("kilo bytes"));
        assert!(!is_valid_metric_unit("µs"));
    }

    #[test]
    fn test_ambiguous_suffix() {
        assert_eq!(ambiguous_suffix("requests_total"), Some("_total"));
        assert_eq!(ambiguous_suffix("build_info"), Some("_info"));
        assert_eq!(ambiguous_suffix("latency_bucket"), Some("_bucket"));
        assert_eq!(ambiguous_suffix("totals"), None);
        assert_eq!(ambiguous_suffix("summary"), None);
    }

    #[test]
    fn test_ends_with_unit() {
        assert!(ends_with_unit("request_seconds", "seconds"));
        assert!(ends_with_unit("seconds", "seconds"));
        assert!(!ends_with_unit("request_milliseconds", "seconds"));
        assert!(!ends_with_unit("request", "seconds"));
        assert!(!ends_with_unit("request", ""));
    }

    #[test]
    fn test_check_metric_unit() {
        assert!(check_metric_unit("req", "seconds").is_ok());
        assert!(matches!(
            check_metric_unit("req_seconds", "seconds"),
            Err(Error::RedundantUnit { .. })
        ));
        assert!(matches!(
            check_metric_unit("req", "sec onds"),
            Err(Error::InvalidUnit(_))
        ));
    }

    #[test]
    fn test_check_help() {
        assert!(check_help("").is_ok());
        assert!(check_help("Line one\nline \"two\"").is_ok());
        let long = "x".repeat(MAX_HELP_LEN + 1);
        assert!(matches!(check_help(&long), Err(Error::HelpTooLong { .. })));
    }

    #[test]
    fn test_check_label_names() {
        assert!(check_label_names(["a", "b", "c"]).is_ok());
        assert!(check_label_names([]).is_ok());
        assert!(matches!(
            check_label_names(["a", "b", "a"]),
            Err(Error::DuplicateLabel(name)) if name == "a"
        ));
        assert!(matches!(
            check_label_names(["a", "b b"]),
            Err(Error::InvalidLabelName(_))
        ));
    }
}
