//! Weighted-penalty data-quality score.
//!
//! Each column starts at 100 points. Missingness, duplication, outliers
//! and (for text) casing and whitespace irregularities deduct points; the
//! result is clamped to `[0, 100]`. Every deduction is recorded as a
//! [`QualityIssue`] carrying the measured percentage.
//!
//! # Example
//!
//! ```
//! use u_profile::quality::{assess_quality, QualityInputs, QualityPenalties};
//!
//! let inputs = QualityInputs {
//!     missing_pct: 25.0,
//!     duplicate_pct: 60.0,
//!     outlier_pct: Some(1.0),
//!     text_sample: None,
//! };
//! let q = assess_quality(&inputs, &QualityPenalties::default());
//! assert_eq!(q.score, 75.0);
//! assert_eq!(q.issues.len(), 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ProfileError;

// ── Penalties ─────────────────────────────────────────────────────────

/// Deduct `penalty` points when a measured percentage exceeds `above_pct`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyTier {
    pub above_pct: f64,
    pub penalty: f64,
}

impl PenaltyTier {
    pub const fn new(above_pct: f64, penalty: f64) -> Self {
        Self { above_pct, penalty }
    }
}

/// Penalty schedule. Within a tier list only the highest exceeded tier applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityPenalties {
    /// Default: >50% → 30, >20% → 15, >5% → 5.
    pub missing: Vec<PenaltyTier>,
    /// Default: >90% → 20, >50% → 10.
    pub duplicates: Vec<PenaltyTier>,
    /// Numeric columns only. Default: >10% → 10, >5% → 5.
    pub outliers: Vec<PenaltyTier>,
    /// Text columns mixing upper/lower/title case. Default: 5.
    pub inconsistent_casing: f64,
    /// Text columns with leading or trailing whitespace. Default: 5.
    pub untrimmed_whitespace: f64,
}

impl Default for QualityPenalties {
    fn default() -> Self {
        Self {
            missing: vec![
                PenaltyTier::new(50.0, 30.0),
                PenaltyTier::new(20.0, 15.0),
                PenaltyTier::new(5.0, 5.0),
            ],
            duplicates: vec![PenaltyTier::new(90.0, 20.0), PenaltyTier::new(50.0, 10.0)],
            outliers: vec![PenaltyTier::new(10.0, 10.0), PenaltyTier::new(5.0, 5.0)],
            inconsistent_casing: 5.0,
            untrimmed_whitespace: 5.0,
        }
    }
}

impl QualityPenalties {
    pub fn validate(&self) -> Result<(), ProfileError> {
        let lists = [
            ("missing", &self.missing),
            ("duplicates", &self.duplicates),
            ("outliers", &self.outliers),
        ];
        for (name, tiers) in lists {
            for tier in tiers {
                if !(0.0..=100.0).contains(&tier.above_pct) {
                    return Err(ProfileError::invalid_config(
                        name,
                        format!("tier threshold {} is outside [0, 100]", tier.above_pct),
                    ));
                }
                if !(tier.penalty >= 0.0) {
                    return Err(ProfileError::invalid_config(
                        name,
                        format!("penalty {} is negative", tier.penalty),
                    ));
                }
            }
        }
        for (name, penalty) in [
            ("inconsistent_casing", self.inconsistent_casing),
            ("untrimmed_whitespace", self.untrimmed_whitespace),
        ] {
            if !(penalty >= 0.0) {
                return Err(ProfileError::invalid_config(
                    name,
                    format!("penalty {penalty} is negative"),
                ));
            }
        }
        Ok(())
    }
}

/// Highest tier whose threshold `pct` exceeds.
fn tier_penalty(tiers: &[PenaltyTier], pct: f64) -> Option<f64> {
    tiers
        .iter()
        .filter(|t| pct > t.above_pct)
        .max_by(|a, b| a.above_pct.total_cmp(&b.above_pct))
        .map(|t| t.penalty)
}

// ── Issues ────────────────────────────────────────────────────────────

/// A triggered deduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum QualityIssue {
    HighMissing { pct: f64, penalty: f64 },
    HighDuplication { pct: f64, penalty: f64 },
    Outliers { pct: f64, penalty: f64 },
    /// `pct` is the share of cased sample values outside the dominant style.
    InconsistentCasing { pct: f64, penalty: f64 },
    /// `pct` is the share of sampled values with surrounding whitespace.
    UntrimmedWhitespace { pct: f64, penalty: f64 },
}

impl QualityIssue {
    pub fn pct(&self) -> f64 {
        match *self {
            Self::HighMissing { pct, .. }
            | Self::HighDuplication { pct, .. }
            | Self::Outliers { pct, .. }
            | Self::InconsistentCasing { pct, .. }
            | Self::UntrimmedWhitespace { pct, .. } => pct,
        }
    }

    pub fn penalty(&self) -> f64 {
        match *self {
            Self::HighMissing { penalty, .. }
            | Self::HighDuplication { penalty, .. }
            | Self::Outliers { penalty, .. }
            | Self::InconsistentCasing { penalty, .. }
            | Self::UntrimmedWhitespace { penalty, .. } => penalty,
        }
    }
}

impl std::fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HighMissing { pct, .. } => write!(f, "{pct:.1}% of values are missing"),
            Self::HighDuplication { pct, .. } => write!(f, "{pct:.1}% of values are duplicates"),
            Self::Outliers { pct, .. } => write!(f, "{pct:.1}% of values are IQR outliers"),
            Self::InconsistentCasing { pct, .. } => {
                write!(f, "inconsistent casing ({pct:.1}% differ from the dominant style)")
            }
            Self::UntrimmedWhitespace { pct, .. } => {
                write!(f, "{pct:.1}% of sampled values have leading or trailing whitespace")
            }
        }
    }
}

// ── Text checks ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Casing {
    Upper,
    Lower,
    Title,
    Other,
}

fn casing(value: &str) -> Casing {
    if !value.chars().any(char::is_alphabetic) {
        return Casing::Other;
    }
    if !value.chars().any(char::is_lowercase) {
        return Casing::Upper;
    }
    if !value.chars().any(char::is_uppercase) {
        return Casing::Lower;
    }
    let title = value.split_whitespace().all(|word| {
        let mut letters = word.chars().filter(|c| c.is_alphabetic());
        match letters.next() {
            Some(first) => first.is_uppercase() && letters.all(char::is_lowercase),
            None => true,
        }
    });
    if title {
        Casing::Title
    } else {
        Casing::Other
    }
}

/// Share (percent) of cased values outside the most common style, or
/// `None` when fewer than two of upper/lower/title appear.
pub fn casing_inconsistency(sample: &[&str]) -> Option<f64> {
    let mut counts = [0usize; 3];
    for value in sample {
        match casing(value) {
            Casing::Upper => counts[0] += 1,
            Casing::Lower => counts[1] += 1,
            Casing::Title => counts[2] += 1,
            Casing::Other => {}
        }
    }
    if counts.iter().filter(|&&c| c > 0).count() < 2 {
        return None;
    }
    let cased: usize = counts.iter().sum();
    let dominant = counts.iter().copied().max().unwrap_or(0);
    Some((cased - dominant) as f64 / cased as f64 * 100.0)
}

/// Share (percent) of values that differ from their trimmed form, or
/// `None` when none do.
pub fn untrimmed_share(sample: &[&str]) -> Option<f64> {
    let untrimmed = sample.iter().filter(|v| v.trim() != **v).count();
    (untrimmed > 0).then(|| untrimmed as f64 / sample.len() as f64 * 100.0)
}

// ── Assessment ────────────────────────────────────────────────────────

/// Measurements the score is computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityInputs<'a> {
    pub missing_pct: f64,
    /// `(1 − unique / non_missing) · 100`.
    pub duplicate_pct: f64,
    /// Outlier share; `Some` only for numeric columns.
    pub outlier_pct: Option<f64>,
    /// Sampled values; `Some` only for Text storage.
    pub text_sample: Option<&'a [&'a str]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// 0 (worst) to 100 (best).
    pub score: f64,
    pub issues: Vec<QualityIssue>,
}

pub fn assess_quality(inputs: &QualityInputs<'_>, penalties: &QualityPenalties) -> QualityAssessment {
    let mut issues = Vec::new();

    if let Some(penalty) = tier_penalty(&penalties.missing, inputs.missing_pct) {
        issues.push(QualityIssue::HighMissing {
            pct: inputs.missing_pct,
            penalty,
        });
    }
    if let Some(penalty) = tier_penalty(&penalties.duplicates, inputs.duplicate_pct) {
        issues.push(QualityIssue::HighDuplication {
            pct: inputs.duplicate_pct,
            penalty,
        });
    }
    if let Some(pct) = inputs.outlier_pct {
        if let Some(penalty) = tier_penalty(&penalties.outliers, pct) {
            issues.push(QualityIssue::Outliers { pct, penalty });
        }
    }
    if let Some(sample) = inputs.text_sample {
        if let Some(pct) = casing_inconsistency(sample) {
            issues.push(QualityIssue::InconsistentCasing {
                pct,
                penalty: penalties.inconsistent_casing,
            });
        }
        if let Some(pct) = untrimmed_share(sample) {
            issues.push(QualityIssue::UntrimmedWhitespace {
                pct,
                penalty: penalties.untrimmed_whitespace,
            });
        }
    }

    let deducted: f64 = issues.iter().map(QualityIssue::penalty).sum();
    QualityAssessment {
        score: (100.0 - deducted).clamp(0.0, 100.0),
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(missing: f64, dup: f64, outliers: Option<f64>) -> QualityInputs<'static> {
        QualityInputs {
            missing_pct: missing,
            duplicate_pct: dup,
            outlier_pct: outliers,
            text_sample: None,
        }
    }

    fn score(i: &QualityInputs<'_>) -> f64 {
        assess_quality(i, &QualityPenalties::default()).score
    }

    // ── Tiers ────────────────────────────────────────────────────

    #[test]
    fn only_highest_missing_tier_applies() {
        assert_eq!(score(&inputs(5.0, 0.0, None)), 100.0);
        assert_eq!(score(&inputs(5.1, 0.0, None)), 95.0);
        assert_eq!(score(&inputs(20.5, 0.0, None)), 85.0);
        assert_eq!(score(&inputs(75.0, 0.0, None)), 70.0);
    }

    #[test]
    fn duplicates_and_outliers() {
        assert_eq!(score(&inputs(0.0, 95.0, None)), 80.0);
        assert_eq!(score(&inputs(0.0, 50.0, None)), 100.0);
        assert_eq!(score(&inputs(0.0, 0.0, Some(12.0))), 90.0);
        assert_eq!(score(&inputs(0.0, 0.0, Some(6.0))), 95.0);
    }

    #[test]
    fn issues_carry_measurements() {
        let q = assess_quality(&inputs(30.0, 0.0, Some(7.5)), &QualityPenalties::default());
        assert_eq!(
            q.issues,
            vec![
                QualityIssue::HighMissing {
                    pct: 30.0,
                    penalty: 15.0
                },
                QualityIssue::Outliers {
                    pct: 7.5,
                    penalty: 5.0
                },
            ]
        );
        assert_eq!(q.issues[0].to_string(), "30.0% of values are missing");
        assert_eq!(q.score, 80.0);
    }

    #[test]
    fn score_floors_at_zero() {
        let harsh = QualityPenalties {
            missing: vec![PenaltyTier::new(0.0, 80.0)],
            duplicates: vec![PenaltyTier::new(0.0, 80.0)],
            ..QualityPenalties::default()
        };
        let q = assess_quality(&inputs(10.0, 10.0, None), &harsh);
        assert_eq!(q.score, 0.0);
    }

    // ── Text checks ──────────────────────────────────────────────

    #[test]
    fn casing_styles() {
        assert_eq!(casing("NEW YORK"), Casing::Upper);
        assert_eq!(casing("new york"), Casing::Lower);
        assert_eq!(casing("New York"), Casing::Title);
        assert_eq!(casing("nEw york"), Casing::Other);
        assert_eq!(casing("123"), Casing::Other);
    }

    #[test]
    fn mixed_casing_penalized() {
        let sample = ["Paris", "Paris", "PARIS", "london"];
        let pct = casing_inconsistency(&sample).expect("mixed");
        assert!((pct - 50.0).abs() < 1e-12);

        assert!(casing_inconsistency(&["paris", "london", "42"]).is_none());

        let q = assess_quality(
            &QualityInputs {
                text_sample: Some(&sample),
                ..inputs(0.0, 0.0, None)
            },
            &QualityPenalties::default(),
        );
        assert_eq!(q.score, 95.0);
        assert!(matches!(q.issues[0], QualityIssue::InconsistentCasing { .. }));
    }

    #[test]
    fn whitespace_penalized() {
        let sample = ["a", " b", "c ", "d"];
        assert_eq!(untrimmed_share(&sample), Some(50.0));
        assert_eq!(untrimmed_share(&["a", "b"]), None);
        let q = assess_quality(
            &QualityInputs {
                text_sample: Some(&sample),
                ..inputs(0.0, 0.0, None)
            },
            &QualityPenalties::default(),
        );
        assert_eq!(q.score, 95.0);
    }

    // ── Configuration ────────────────────────────────────────────

    #[test]
    fn penalties_validate() {
        assert!(QualityPenalties::default().validate().is_ok());
        let bad = QualityPenalties {
            outliers: vec![PenaltyTier::new(120.0, 5.0)],
            ..QualityPenalties::default()
        };
        assert!(bad.validate().is_err());
        let bad = QualityPenalties {
            untrimmed_whitespace: -1.0,
            ..QualityPenalties::default()
        };
        assert!(bad.validate().is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn score_bounded_and_monotone(
            missing in 0.0_f64..=100.0,
            dup in 0.0_f64..=100.0,
            outliers in proptest::option::of(0.0_f64..=100.0),
        ) {
            let penalties = QualityPenalties::default();
            let base = QualityInputs { missing_pct: missing, duplicate_pct: dup, outlier_pct: outliers, text_sample: None };
            let q = assess_quality(&base, &penalties);
            prop_assert!((0.0..=100.0).contains(&q.score));

            let worse = QualityInputs { missing_pct: (missing + 30.0).min(100.0), ..base };
            prop_assert!(assess_quality(&worse, &penalties).score <= q.score);
        }
    }
}
