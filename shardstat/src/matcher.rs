//! Label matchers and the `key=value` filter builder.
//!
//! A run selects series with a conjunction of equality matchers built once
//! from user input. When no filter is given, the run uses a single matcher
//! with an empty name and an empty value. A missing label reads as the empty
//! string, so that sentinel matches every series.

use std::fmt;
use std::str::FromStr;

use crate::error::FilterError;
use crate::labels::Labels;

/// How a matcher compares a label value.
///
/// Only equality is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchType {
    /// The label value must equal the matcher value.
    #[default]
    Equal,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => f.write_str("="),
        }
    }
}

/// A predicate over one label name/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelMatcher {
    name: String,
    match_type: MatchType,
    value: String,
}

impl LabelMatcher {
    /// Creates an equality matcher.
    pub fn equal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            match_type: MatchType::Equal,
            value: value.into(),
        }
    }

    /// Creates the empty-name, empty-value matcher that matches every series.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shardstat::{LabelMatcher, Labels};
    ///
    /// let matcher = LabelMatcher::match_all();
    /// assert!(matcher.matches(&Labels::new([("job", "api")])));
    /// assert!(matcher.matches(&Labels::default()));
    /// ```
    pub fn match_all() -> Self {
        Self::equal("", "")
    }

    /// The label name this matcher inspects.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The comparison this matcher applies.
    pub fn match_type(&self) -> MatchType {
        self.match_type
    }

    /// The value the label is compared against.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether this is the match-everything sentinel.
    pub fn is_match_all(&self) -> bool {
        self.name.is_empty() && self.value.is_empty()
    }

    /// Tests a label set against this matcher.
    pub fn matches(&self, labels: &Labels) -> bool {
        let actual = labels.get(&self.name).unwrap_or("");
        match self.match_type {
            MatchType::Equal => actual == self.value,
        }
    }
}

impl fmt::Display for LabelMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{:?}", self.name, self.match_type, self.value)
    }
}

impl FromStr for LabelMatcher {
    type Err = FilterError;

    /// Parses a single `key=value` entry.
    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        let Some((name, value)) = entry.split_once('=') else {
            return Err(FilterError::MissingSeparator {
                entry: entry.to_string(),
            });
        };

        if value.contains('=') {
            return Err(FilterError::MultipleSeparators {
                entry: entry.to_string(),
                count: entry.matches('=').count(),
            });
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(FilterError::EmptyName {
                entry: entry.to_string(),
            });
        }

        Ok(Self::equal(name, value.trim()))
    }
}

/// Returns true when every matcher accepts the label set.
pub fn matches_all(matchers: &[LabelMatcher], labels: &Labels) -> bool {
    matchers.iter().all(|m| m.matches(labels))
}

/// Builds the run's matchers from raw `key=value` entries.
///
/// One equality matcher is produced per entry, in input order. An empty
/// input yields the single [`LabelMatcher::match_all`] sentinel.
///
/// # Errors
///
/// Returns [`FilterError`] for the first malformed entry: a missing or
/// repeated `=` separator, or an empty label name.
///
/// # Examples
///
/// ```rust
/// use shardstat::matcher::parse_filters;
///
/// let matchers = parse_filters(&["job=api", "env=prod"]).unwrap();
/// assert_eq!(matchers[0].name(), "job");
/// assert_eq!(matchers[1].value(), "prod");
///
/// let all = parse_filters::<&str>(&[]).unwrap();
/// assert!(all[0].is_match_all());
/// ```
pub fn parse_filters<S: AsRef<str>>(entries: &[S]) -> Result<Vec<LabelMatcher>, FilterError> {
    if entries.is_empty() {
        return Ok(vec![LabelMatcher::match_all()]);
    }

    entries.iter().map(|entry| entry.as_ref().parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filters_preserves_order() {
        let matchers = parse_filters(&["a=b", "c=d"]).unwrap();
        assert_eq!(
            matchers,
            vec![LabelMatcher::equal("a", "b"), LabelMatcher::equal("c", "d")]
        );
        assert!(matchers.iter().all(|m| m.match_type() == MatchType::Equal));
    }

    #[test]
    fn test_parse_filters_empty_input() {
        let matchers = parse_filters::<String>(&[]).unwrap();
        assert_eq!(matchers.len(), 1);
        assert_eq!(matchers[0].name(), "");
        assert_eq!(matchers[0].value(), "");
        assert!(matchers[0].is_match_all());
    }

    #[test]
    fn test_parse_filters_malformed() {
        assert_eq!(
            parse_filters(&["a=b", "cluster"]),
            Err(FilterError::MissingSeparator {
                entry: "cluster".to_string()
            })
        );
        assert_eq!(
            parse_filters(&["a=b=c"]),
            Err(FilterError::MultipleSeparators {
                entry: "a=b=c".to_string(),
                count: 2
            })
        );
        assert_eq!(
            parse_filters(&["a=b", " "]),
            Err(FilterError::MissingSeparator {
                entry: " ".to_string()
            })
        );
        assert_eq!(
            parse_filters(&["=b"]),
            Err(FilterError::EmptyName {
                entry: "=b".to_string()
            })
        );
    }

    #[test]
    fn test_parse_trims_and_allows_empty_value() {
        let m: LabelMatcher = " job = api ".parse().unwrap();
        assert_eq!(m, LabelMatcher::equal("job", "api"));

        let m: LabelMatcher = "pod=".parse().unwrap();
        assert_eq!(m.value(), "");
        assert!(!m.is_match_all());
    }

    #[test]
    fn test_matches() {
        let labels = Labels::new([("job", "api"), ("env", "prod")]);

        assert!(LabelMatcher::equal("job", "api").matches(&labels));
        assert!(!LabelMatcher::equal("job", "web").matches(&labels));
        assert!(!LabelMatcher::equal("pod", "x").matches(&labels));
        // An absent label compares as empty.
        assert!(LabelMatcher::equal("pod", "").matches(&labels));
        assert!(LabelMatcher::match_all().matches(&labels));

        let matchers = parse_filters(&["job=api", "env=dev"]).unwrap();
        assert!(!matches_all(&matchers, &labels));
    }

    #[test]
    fn test_display() {
        assert_eq!(LabelMatcher::equal("job", "api").to_string(), r#"job="api""#);
        assert_eq!(LabelMatcher::match_all().to_string(), r#"="""#);
    }
}
