//! Scalar extension types carried inline as single-character tagged strings.

use std::fmt;

use crate::util::datetime::{DateTimeParseError, format_timestamp_millis, parse_timestamp_millis};

/// Splits a `namespace/name` identifier.
///
/// The lone `/` is a name with no namespace.
fn split_namespace(s: &str) -> (Option<&str>, &str) {
    if s == "/" {
        return (None, s);
    }
    match s.find('/') {
        Some(i) => (Some(&s[..i]), &s[i + 1..]),
        None => (None, s),
    }
}

/// A keyword: an interned, self-evaluating identifier (tag `:`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Keyword(String);

impl Keyword {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Builds `namespace/name`.
    pub fn namespaced(namespace: &str, name: &str) -> Self {
        Self(format!("{}/{}", namespace, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn namespace(&self) -> Option<&str> {
        split_namespace(&self.0).0
    }

    pub fn name(&self) -> &str {
        split_namespace(&self.0).1
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

/// A symbolic identifier (tag `$`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn namespace(&self) -> Option<&str> {
        split_namespace(&self.0).0
    }

    pub fn name(&self) -> &str {
        split_namespace(&self.0).1
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A URI (tag `r`). The text is carried verbatim; no normalisation is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uri(String);

impl Uri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the scheme, if the URI has one.
    pub fn scheme(&self) -> Option<&str> {
        let (scheme, _) = self.0.split_once(':')?;
        let mut chars = scheme.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        valid.then_some(scheme)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A point in time with millisecond resolution, always UTC.
///
/// Written with tag `m` (epoch milliseconds) in compact formats and tag `t`
/// (`YYYY-MM-DDTHH:MM:SS.mmmZ`) in verbose JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp {
    millis: i64,
}

impl Timestamp {
    /// Creates a timestamp from milliseconds since the Unix epoch.
    pub fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    /// Creates a timestamp from seconds and nanoseconds since the Unix epoch,
    /// truncating to millisecond resolution. Saturates at the `i64`
    /// millisecond range.
    pub fn from_secs_nanos(secs: i64, nanos: u32) -> Self {
        Self {
            millis: secs
                .saturating_mul(1000)
                .saturating_add(i64::from(nanos / 1_000_000)),
        }
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        let since_epoch = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        Self::from_millis(since_epoch.as_millis() as i64)
    }

    /// Parses an RFC 3339 date-time, normalising any offset to UTC.
    pub fn parse_rfc3339(s: &str) -> Result<Self, DateTimeParseError> {
        parse_timestamp_millis(s).map(Self::from_millis)
    }

    pub fn millis(&self) -> i64 {
        self.millis
    }

    /// Formats as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
    pub fn to_rfc3339(&self) -> String {
        format_timestamp_millis(self.millis)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}
