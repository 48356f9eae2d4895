//! Label sets and series fingerprints.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Stable numeric identity of a series, derived from its label set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub u64);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// The label set identifying a series.
///
/// Labels are kept sorted by name, so two sets with the same pairs compare
/// equal and share a fingerprint regardless of the order they were built in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Labels(BTreeMap<String, String>);

impl Labels {
    /// Creates a label set from name/value pairs.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use shardstat::Labels;
    ///
    /// let labels = Labels::new([("job", "api"), ("env", "prod")]);
    /// assert_eq!(labels.get("job"), Some("api"));
    /// assert_eq!(labels.to_string(), r#"{env="prod", job="api"}"#);
    /// ```
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns the value of `name`, if the label is present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Iterates the pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of labels in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no labels.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Computes the fingerprint of this label set.
    ///
    /// The hash covers the sorted pairs, so it only changes when the pairs do.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = DefaultHasher::new();
        for (name, value) in &self.0 {
            name.hash(&mut hasher);
            value.hash(&mut hasher);
        }
        Fingerprint(hasher.finish())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Labels {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value:?}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_ignores_insertion_order() {
        let a = Labels::new([("job", "api"), ("env", "prod")]);
        let b = Labels::new([("env", "prod"), ("job", "api")]);
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());

        let c = Labels::new([("env", "dev"), ("job", "api")]);
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_display() {
        assert_eq!(Labels::default().to_string(), "{}");
        let labels: Labels = [("b", "2"), ("a", "1")].into_iter().collect();
        assert_eq!(labels.to_string(), r#"{a="1", b="2"}"#);
    }
}
