//! Structured-pattern detection on sampled text values.
//!
//! Kinds are not exclusive: `"00123"` is both a numeric string and a
//! zero-padded code.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::inference::DateFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Email,
    Url,
    Phone,
    IsoDate,
    NumericString,
    /// Digit string with a leading zero, typically a code that must stay text.
    ZeroPaddedCode,
}

impl PatternKind {
    pub const ALL: [PatternKind; 6] = [
        Self::Email,
        Self::Url,
        Self::Phone,
        Self::IsoDate,
        Self::NumericString,
        Self::ZeroPaddedCode,
    ];

    pub fn matches(self, value: &str) -> bool {
        let value = value.trim();
        match self {
            Self::Email => EMAIL.is_match(value),
            Self::Url => URL.is_match(value),
            Self::Phone => PHONE.is_match(value),
            Self::IsoDate => DateFormat::detect(value) == Some(DateFormat::IsoDate),
            Self::NumericString => NUMERIC.is_match(value),
            Self::ZeroPaddedCode => ZERO_PADDED.is_match(value),
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Email => "email",
            Self::Url => "url",
            Self::Phone => "phone",
            Self::IsoDate => "iso_date",
            Self::NumericString => "numeric_string",
            Self::ZeroPaddedCode => "zero_padded_code",
        })
    }
}

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        #[allow(clippy::expect_used)]
        static $name: Lazy<Regex> =
            Lazy::new(|| Regex::new($re).expect("hard-coded pattern regex"));
    };
}

pattern!(EMAIL, r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$");
pattern!(URL, r"(?i)^(https?|ftp)://[^\s/$.?#][^\s]*$");
pattern!(
    PHONE,
    r"^(\+\d{1,3}[\s.-]?)?(\(\d{3}\)|\d{3})[\s.-]?\d{3}[\s.-]?\d{4}$"
);
pattern!(NUMERIC, r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$");
pattern!(ZERO_PADDED, r"^0\d+$");

/// How many sampled values matched one pattern kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub kind: PatternKind,
    pub matches: usize,
    pub sampled: usize,
    /// `matches / sampled` in percent.
    pub pct: f64,
}

impl std::fmt::Display for PatternMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}/{} sampled values ({:.1}%)",
            self.kind, self.matches, self.sampled, self.pct
        )
    }
}

/// Counts every pattern kind over `sample`, keeping kinds with at least
/// one match, most frequent first.
///
/// ```
/// use u_profile::patterns::{detect_patterns, PatternKind};
///
/// let found = detect_patterns(&["a@b.io", "c@d.org", "n/a"]);
/// assert_eq!(found[0].kind, PatternKind::Email);
/// assert_eq!(found[0].matches, 2);
/// ```
pub fn detect_patterns(sample: &[&str]) -> Vec<PatternMatch> {
    if sample.is_empty() {
        return Vec::new();
    }
    let sampled = sample.len();
    let mut found: Vec<PatternMatch> = PatternKind::ALL
        .iter()
        .filter_map(|&kind| {
            let matches = sample.iter().filter(|v| kind.matches(v)).count();
            (matches > 0).then(|| PatternMatch {
                kind,
                matches,
                sampled,
                pct: matches as f64 / sampled as f64 * 100.0,
            })
        })
        .collect();
    found.sort_by(|a, b| b.matches.cmp(&a.matches).then(a.kind.cmp(&b.kind)));
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_kind_recognized() {
        assert!(PatternKind::Email.matches("first.last+tag@example.co.uk"));
        assert!(!PatternKind::Email.matches("first.last@localhost"));
        assert!(PatternKind::Url.matches("HTTPS://example.com/path?q=1"));
        assert!(!PatternKind::Url.matches("example.com"));
        assert!(PatternKind::Phone.matches("(555) 123-4567"));
        assert!(PatternKind::Phone.matches("+1 555.123.4567"));
        assert!(!PatternKind::Phone.matches("2024-01-01"));
        assert!(PatternKind::IsoDate.matches("2024-01-01"));
        assert!(!PatternKind::IsoDate.matches("01/01/2024"));
        assert!(PatternKind::NumericString.matches(" -3.5e2 "));
        assert!(!PatternKind::NumericString.matches("3,5"));
        assert!(PatternKind::ZeroPaddedCode.matches("007"));
        assert!(!PatternKind::ZeroPaddedCode.matches("0"));
    }

    #[test]
    fn overlapping_kinds_both_reported() {
        let found = detect_patterns(&["00123", "00456", "789"]);
        let numeric = found
            .iter()
            .find(|p| p.kind == PatternKind::NumericString)
            .expect("numeric");
        assert_eq!(numeric.matches, 3);
        assert!((numeric.pct - 100.0).abs() < 1e-12);
        let padded = found
            .iter()
            .find(|p| p.kind == PatternKind::ZeroPaddedCode)
            .expect("padded");
        assert_eq!(padded.matches, 2);
        assert_eq!(found[0].kind, PatternKind::NumericString);
    }

    #[test]
    fn nothing_structured() {
        assert!(detect_patterns(&["alpha", "beta gamma"]).is_empty());
        assert!(detect_patterns(&[]).is_empty());
    }

    #[test]
    fn display_carries_share() {
        let found = detect_patterns(&["https://a.io", "b"]);
        assert_eq!(found[0].to_string(), "url: 1/2 sampled values (50.0%)");
    }
}
