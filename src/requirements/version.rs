//! Numeric version tuples and how they are compared.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A version as an ordered tuple of non-negative integers.
///
/// `"1.13.0"` parses to `[1, 13, 0]`. Only purely numeric, dot-separated
/// segments are accepted; anything else (`2.0.0rc1`, `2.*`, `latest`) is
/// rejected rather than partially parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Version(Vec<u64>);

impl Version {
    /// Create a version from its segments.
    pub fn new(segments: Vec<u64>) -> Self {
        Self(segments)
    }

    /// Parse a dot-separated numeric version.
    ///
    /// Returns `None` for empty input, non-numeric segments, or segments
    /// that overflow `u64`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        text.split('.')
            .map(|segment| {
                if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                    None
                } else {
                    segment.parse::<u64>().ok()
                }
            })
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    /// The version segments.
    pub fn segments(&self) -> &[u64] {
        &self.0
    }

    /// Whether the version has no segments (unknown).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u64>> for Version {
    fn from(segments: Vec<u64>) -> Self {
        Self(segments)
    }
}

impl From<&[u64]> for Version {
    fn from(segments: &[u64]) -> Self {
        Self(segments.to_vec())
    }
}

impl<const N: usize> From<[u64; N]> for Version {
    fn from(segments: [u64; N]) -> Self {
        Self(segments.to_vec())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u64::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// How two versions of different lengths are compared.
///
/// `CommonPrefix` compares only up to the shorter length, so `1.2` and
/// `1.2.7` are equal. `ZeroPad` pads the shorter tuple with zeros, so
/// `1.2 == 1.2.0` but `1.2 < 1.2.7`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionComparison {
    #[default]
    CommonPrefix,
    ZeroPad,
}

impl VersionComparison {
    /// The config spelling of this policy.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CommonPrefix => "common-prefix",
            Self::ZeroPad => "zero-pad",
        }
    }

    /// Compare two versions under this policy.
    pub fn compare(self, left: &Version, right: &Version) -> Ordering {
        match self {
            Self::CommonPrefix => left
                .0
                .iter()
                .zip(right.0.iter())
                .map(|(l, r)| l.cmp(r))
                .find(|ord| ord.is_ne())
                .unwrap_or(Ordering::Equal),
            Self::ZeroPad => {
                let len = left.0.len().max(right.0.len());
                (0..len)
                    .map(|i| {
                        let l = left.0.get(i).copied().unwrap_or(0);
                        let r = right.0.get(i).copied().unwrap_or(0);
                        l.cmp(&r)
                    })
                    .find(|ord| ord.is_ne())
                    .unwrap_or(Ordering::Equal)
            }
        }
    }
}

impl FromStr for VersionComparison {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "common-prefix" | "prefix" => Ok(Self::CommonPrefix),
            "zero-pad" | "pad" => Ok(Self::ZeroPad),
            _ => Err(format!("unknown version comparison: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dotted_numbers() {
        assert_eq!(Version::parse("1.13.0"), Some(Version::from([1, 13, 0])));
        assert_eq!(Version::parse("2"), Some(Version::from([2])));
        assert_eq!(Version::parse(" 3.1 "), Some(Version::from([3, 1])));
    }

    #[test]
    fn rejects_non_numeric_segments() {
        assert_eq!(Version::parse("2.0.0rc1"), None);
        assert_eq!(Version::parse("2.*"), None);
        assert_eq!(Version::parse("latest"), None);
        assert_eq!(Version::parse("1..2"), None);
        assert_eq!(Version::parse(""), None);
        assert_eq!(Version::parse("-1"), None);
    }

    #[test]
    fn rejects_overflowing_segments() {
        assert_eq!(Version::parse("1.99999999999999999999999"), None);
    }

    #[test]
    fn displays_dotted() {
        assert_eq!(Version::from([2, 12, 0]).to_string(), "2.12.0");
    }

    #[test]
    fn common_prefix_ignores_trailing_segments() {
        let policy = VersionComparison::CommonPrefix;
        let short = Version::from([1, 2]);
        assert_eq!(policy.compare(&short, &Version::from([1, 2, 0])), Ordering::Equal);
        assert_eq!(policy.compare(&short, &Version::from([1, 2, 7])), Ordering::Equal);
        assert_eq!(policy.compare(&short, &Version::from([1, 3])), Ordering::Less);
        assert_eq!(policy.compare(&Version::from([2, 0, 1]), &short), Ordering::Greater);
    }

    #[test]
    fn zero_pad_distinguishes_trailing_segments() {
        let policy = VersionComparison::ZeroPad;
        let short = Version::from([1, 2]);
        assert_eq!(policy.compare(&short, &Version::from([1, 2, 0])), Ordering::Equal);
        assert_eq!(policy.compare(&short, &Version::from([1, 2, 7])), Ordering::Less);
        assert_eq!(policy.compare(&Version::from([1, 2, 0, 1]), &short), Ordering::Greater);
    }

    #[test]
    fn comparison_from_str() {
        assert_eq!(
            "zero-pad".parse::<VersionComparison>(),
            Ok(VersionComparison::ZeroPad)
        );
        assert_eq!(
            "Common-Prefix".parse::<VersionComparison>(),
            Ok(VersionComparison::CommonPrefix)
        );
        assert!("exact".parse::<VersionComparison>().is_err());
    }

    #[test]
    fn comparison_deserializes_kebab_case() {
        let policy: VersionComparison = serde_json::from_str("\"zero-pad\"").unwrap();
        assert_eq!(policy, VersionComparison::ZeroPad);
    }
}
