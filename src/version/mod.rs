// src/version/mod.rs

//! Version identifiers for installed and published releases.
//!
//! Versions are dotted numeric components ("1.2", "1.2.3", "3.1.0.7").
//! They are totally ordered, usable as directory names, and usable as
//! map keys. Ordering compares component-wise with missing trailing
//! components treated as zero, so "1.2" and "1.2.0" are the same
//! version; display keeps the text the version was parsed from.

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A release version: dotted numeric components
#[derive(Debug, Clone)]
pub struct Version {
    text: String,
    /// Parsed components with trailing zeros trimmed, the canonical
    /// form used for equality and hashing
    normalized: Vec<u64>,
}

impl Version {
    /// Parse a version string
    ///
    /// Accepts one or more dot-separated decimal components:
    /// "2" → [2], "1.2.3" → [1, 2, 3], "3.1" → [3, 1].
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::ParseError("Empty version string".to_string()));
        }

        let mut components = Vec::new();
        for part in s.split('.') {
            let n = part.parse::<u64>().map_err(|e| {
                Error::ParseError(format!("Invalid version component '{part}' in '{s}': {e}"))
            })?;
            components.push(n);
        }

        while components.len() > 1 && components.last() == Some(&0) {
            components.pop();
        }

        Ok(Self {
            text: s.to_string(),
            normalized: components,
        })
    }

    /// The version as it was originally written
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Compare two versions component-wise
    ///
    /// Missing trailing components count as zero.
    pub fn compare(&self, other: &Version) -> Ordering {
        let len = self.normalized.len().max(other.normalized.len());
        for i in 0..len {
            let a = self.normalized.get(i).copied().unwrap_or(0);
            let b = other.normalized.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_simple() {
        let version = v("1.2.3");
        assert_eq!(version.as_str(), "1.2.3");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("1.a.3").is_err());
        assert!(Version::parse("1..3").is_err());
        assert!(Version::parse("-1.0").is_err());
    }

    #[test]
    fn test_ordering() {
        assert!(v("1.2.3") < v("1.2.4"));
        assert!(v("1.2.3") < v("1.10.0"));
        assert!(v("2.0") > v("1.9.9"));
        assert!(v("3.1") > v("1.2.3"));
    }

    #[test]
    fn test_missing_components_are_zero() {
        assert_eq!(v("1.2"), v("1.2.0"));
        assert!(v("1.2") < v("1.2.1"));
        assert_eq!(v("1.2").cmp(&v("1.2.0.0")), Ordering::Equal);
    }

    #[test]
    fn test_display_preserves_text() {
        assert_eq!(v("1.2.0").to_string(), "1.2.0");
        assert_eq!(v("1.2").to_string(), "1.2");
    }

    #[test]
    fn test_usable_as_map_key() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(v("1.2"));
        assert!(set.contains(&v("1.2.0")));
        assert!(!set.contains(&v("1.2.1")));
    }
}
