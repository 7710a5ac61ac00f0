//! Two-sample distribution comparison.
//!
//! Runs five tests on a pair of numeric samples and returns one
//! [`ComparisonReport`]:
//!
//! | Test | Statistic | p-value | Verdict |
//! |------|-----------|---------|---------|
//! | Kolmogorov-Smirnov | max ECDF gap | asymptotic | `p < alpha` → different |
//! | Mann-Whitney U | U of sample A | normal approx. | `p < alpha` → different |
//! | Anderson-Darling (k-sample) | standardized A²kN | none | above the 5% critical value → different |
//! | Cramér-von Mises | T | asymptotic | `p < alpha` → different |
//! | Wasserstein-1 | transport cost | none | none |
//!
//! Integer, Float and Boolean (as 0/1) storage is used directly; Text is
//! parsed value by value after trimming. Missing, unparseable and
//! non-finite entries are dropped before testing.
//!
//! # Example
//!
//! ```
//! use u_profile::comparison::{compare_distributions, ComparisonConfig, TestKind, Verdict};
//! use u_profile::dataframe::Column;
//!
//! let before = Column::from_f64s((1..=20).map(f64::from));
//! let after = Column::from_f64s((101..=120).map(f64::from));
//! let report = compare_distributions(&before, &after, &ComparisonConfig::default()).unwrap();
//!
//! assert_eq!(report.verdict(TestKind::KolmogorovSmirnov), Some(Verdict::Different));
//! assert_eq!(report.verdict(TestKind::Wasserstein), None);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::dataframe::{Column, DataFrame, StorageType};
use crate::error::ProfileError;
use crate::moments::{compute_moments, Moments};
use crate::two_sample::{
    anderson_darling_ksamp, cramer_von_mises_two_sample, ks_two_sample, mann_whitney_u,
    wasserstein_distance,
};

/// Percentile levels reported for each sample.
pub const PERCENTILES: [f64; 5] = [0.01, 0.25, 0.5, 0.75, 0.99];

/// Significance level of the Anderson-Darling critical value.
const AD_LEVEL: f64 = 0.05;

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Significance level, strictly between 0 and 1. Default: 0.05.
    pub alpha: f64,
    /// Histogram bin count (display only). Default: 30.
    pub bins: usize,
    /// Most frequent values listed per sample. Default: 5.
    pub top_n: usize,
    pub label_a: String,
    pub label_b: String,
    /// Whether to compute shared-edge histograms. Default: true.
    pub show_histograms: bool,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            bins: 30,
            top_n: 5,
            label_a: "sample_a".to_string(),
            label_b: "sample_b".to_string(),
            show_histograms: true,
        }
    }
}

impl ComparisonConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = n;
        self
    }

    pub fn labels(mut self, a: impl Into<String>, b: impl Into<String>) -> Self {
        self.label_a = a.into();
        self.label_b = b.into();
        self
    }

    pub fn show_histograms(mut self, show: bool) -> Self {
        self.show_histograms = show;
        self
    }

    /// # Errors
    ///
    /// [`ProfileError::InvalidConfiguration`] if `alpha` is not in `(0, 1)`
    /// or `bins` is zero.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ProfileError::invalid_config(
                "alpha",
                format!("must lie in (0, 1), got {}", self.alpha),
            ));
        }
        if self.bins == 0 {
            return Err(ProfileError::invalid_config("bins", "must be at least 1"));
        }
        Ok(())
    }
}

// ── Result Types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    KolmogorovSmirnov,
    MannWhitneyU,
    AndersonDarling,
    CramerVonMises,
    Wasserstein,
}

impl TestKind {
    /// Report order.
    pub const ALL: [TestKind; 5] = [
        Self::KolmogorovSmirnov,
        Self::MannWhitneyU,
        Self::AndersonDarling,
        Self::CramerVonMises,
        Self::Wasserstein,
    ];
}

impl std::fmt::Display for TestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::KolmogorovSmirnov => "Kolmogorov-Smirnov",
            Self::MannWhitneyU => "Mann-Whitney U",
            Self::AndersonDarling => "Anderson-Darling",
            Self::CramerVonMises => "Cramér-von Mises",
            Self::Wasserstein => "Wasserstein",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Similar,
    Different,
    /// The statistic or its reference value could not be computed.
    Unknown,
}

impl Verdict {
    fn from_p_value(p_value: f64, alpha: f64) -> Self {
        if p_value < alpha {
            Self::Different
        } else {
            Self::Similar
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Similar => "similar",
            Self::Different => "different",
            Self::Unknown => "unknown",
        })
    }
}

/// Outcome of one test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub test: TestKind,
    pub statistic: Option<f64>,
    /// Absent for the Anderson-Darling test and the Wasserstein distance.
    pub p_value: Option<f64>,
    /// Absent for the Wasserstein distance.
    pub verdict: Option<Verdict>,
    pub rationale: String,
    /// Anderson-Darling only.
    pub critical_value: Option<f64>,
}

impl TestResult {
    fn from_p_value(test: TestKind, outcome: Option<(f64, f64)>, alpha: f64) -> Self {
        let (statistic, p_value, verdict, rationale) = match outcome {
            Some((statistic, p)) => {
                let verdict = Verdict::from_p_value(p, alpha);
                let rationale = match verdict {
                    Verdict::Different => format!("p = {p:.4} < alpha = {alpha}"),
                    _ => format!("p = {p:.4} >= alpha = {alpha}"),
                };
                (Some(statistic), Some(p), verdict, rationale)
            }
            None => (None, None, Verdict::Unknown, "statistic undefined".to_string()),
        };
        Self {
            test,
            statistic,
            p_value,
            verdict: Some(verdict),
            rationale,
            critical_value: None,
        }
    }
}

/// How often one value occurs in a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericCount {
    pub value: f64,
    pub count: usize,
}

/// Descriptive statistics of one cleaned sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleDescription {
    pub label: String,
    /// Entries removed as missing, unparseable or non-finite.
    pub dropped: usize,
    /// Moments with the percentiles in [`PERCENTILES`].
    pub moments: Moments,
    /// Most frequent value, smallest on ties.
    pub mode: Option<f64>,
    /// Most frequent first, ties by ascending value.
    pub top_values: Vec<NumericCount>,
}

/// Histograms of both samples over the same bin edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedHistogram {
    /// `bins + 1` ascending edges; the last bin is closed.
    pub edges: Vec<f64>,
    pub counts_a: Vec<usize>,
    pub counts_b: Vec<usize>,
}

/// Complete result of comparing two samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub alpha: f64,
    pub sample_a: SampleDescription,
    pub sample_b: SampleDescription,
    /// One entry per [`TestKind`], in [`TestKind::ALL`] order.
    pub tests: Vec<TestResult>,
    /// Present when [`ComparisonConfig::show_histograms`] is set.
    pub histogram: Option<SharedHistogram>,
}

impl ComparisonReport {
    pub fn test(&self, kind: TestKind) -> Option<&TestResult> {
        self.tests.iter().find(|t| t.test == kind)
    }

    pub fn verdict(&self, kind: TestKind) -> Option<Verdict> {
        self.test(kind).and_then(|t| t.verdict)
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Compares two samples.
///
/// # Errors
///
/// - [`ProfileError::InvalidConfiguration`] if the config does not validate
/// - [`ProfileError::NonNumericSample`] if a Text sample has values but none parse
/// - [`ProfileError::EmptyAfterCleaning`] if a sample has no finite values left
#[instrument(skip(a, b, config), fields(label_a = %config.label_a, label_b = %config.label_b))]
pub fn compare_distributions(
    a: &Column,
    b: &Column,
    config: &ComparisonConfig,
) -> Result<ComparisonReport, ProfileError> {
    config.validate()?;
    let (xs, dropped_a) = clean_sample(a, &config.label_a)?;
    let (ys, dropped_b) = clean_sample(b, &config.label_b)?;

    let alpha = config.alpha;
    let tests = vec![
        TestResult::from_p_value(
            TestKind::KolmogorovSmirnov,
            ks_two_sample(&xs, &ys).map(|r| (r.statistic, r.p_value)),
            alpha,
        ),
        TestResult::from_p_value(
            TestKind::MannWhitneyU,
            mann_whitney_u(&xs, &ys).map(|r| (r.u, r.p_value)),
            alpha,
        ),
        anderson_darling_result(&xs, &ys),
        TestResult::from_p_value(
            TestKind::CramerVonMises,
            cramer_von_mises_two_sample(&xs, &ys).map(|r| (r.statistic, r.p_value)),
            alpha,
        ),
        TestResult {
            test: TestKind::Wasserstein,
            statistic: wasserstein_distance(&xs, &ys),
            p_value: None,
            verdict: None,
            rationale: "distance only, no hypothesis test".to_string(),
            critical_value: None,
        },
    ];
    for t in &tests {
        debug!(test = %t.test, statistic = ?t.statistic, p_value = ?t.p_value, verdict = ?t.verdict, "test evaluated");
    }

    let histogram = if config.show_histograms {
        shared_histogram(&xs, &ys, config.bins)
    } else {
        None
    };

    Ok(ComparisonReport {
        alpha,
        sample_a: describe(&config.label_a, xs, dropped_a, config.top_n)?,
        sample_b: describe(&config.label_b, ys, dropped_b, config.top_n)?,
        tests,
        histogram,
    })
}

/// Compares two columns of `df`; the column names become the labels.
///
/// # Errors
///
/// [`ProfileError::ColumnNotFound`], or any error of [`compare_distributions`].
pub fn compare_table_columns(
    df: &DataFrame,
    name_a: &str,
    name_b: &str,
    config: &ComparisonConfig,
) -> Result<ComparisonReport, ProfileError> {
    let a = df.require_column(name_a)?;
    let b = df.require_column(name_b)?;
    compare_distributions(a, b, &config.clone().labels(name_a, name_b))
}

// ── Batch comparison ────────────────────────────────────────────────

/// A pair that could not be compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonFailure {
    /// Position of the pair in the input.
    pub index: usize,
    pub label_a: String,
    pub label_b: String,
    pub error: ProfileError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComparisonOutcome {
    Compared(Box<ComparisonReport>),
    Failed(ComparisonFailure),
}

impl ComparisonOutcome {
    pub fn report(&self) -> Option<&ComparisonReport> {
        match self {
            Self::Compared(report) => Some(report),
            Self::Failed(_) => None,
        }
    }
}

/// Compares every pair, recording data problems per pair.
///
/// # Errors
///
/// Configuration errors, before any pair is compared.
#[instrument(skip(pairs, config), fields(pairs = pairs.len()))]
pub fn compare_many(
    pairs: &[(&Column, &Column)],
    config: &ComparisonConfig,
) -> Result<Vec<ComparisonOutcome>, ProfileError> {
    config.validate()?;
    pairs
        .iter()
        .enumerate()
        .map(|(index, &(a, b))| record(index, config, compare_distributions(a, b, config)))
        .collect()
}

/// Compares named column pairs of `df`, labelling each pair with its
/// column names.
///
/// # Errors
///
/// Configuration errors and [`ProfileError::ColumnNotFound`], before any
/// pair is compared.
#[instrument(skip(df, pairs, config), fields(pairs = pairs.len()))]
pub fn compare_many_columns(
    df: &DataFrame,
    pairs: &[(&str, &str)],
    config: &ComparisonConfig,
) -> Result<Vec<ComparisonOutcome>, ProfileError> {
    config.validate()?;
    let resolved = pairs
        .iter()
        .map(|&(name_a, name_b)| Ok((df.require_column(name_a)?, df.require_column(name_b)?)))
        .collect::<Result<Vec<_>, ProfileError>>()?;

    pairs
        .iter()
        .zip(resolved)
        .enumerate()
        .map(|(index, (&(name_a, name_b), (a, b)))| {
            let pair_config = config.clone().labels(name_a, name_b);
            let result = compare_distributions(a, b, &pair_config);
            record(index, &pair_config, result)
        })
        .collect()
}

fn record(
    index: usize,
    config: &ComparisonConfig,
    result: Result<ComparisonReport, ProfileError>,
) -> Result<ComparisonOutcome, ProfileError> {
    match result {
        Ok(report) => Ok(ComparisonOutcome::Compared(Box::new(report))),
        Err(error) if error.is_fatal() => Err(error),
        Err(error) => {
            warn!(index, label_a = %config.label_a, label_b = %config.label_b, %error, "pair skipped");
            Ok(ComparisonOutcome::Failed(ComparisonFailure {
                index,
                label_a: config.label_a.clone(),
                label_b: config.label_b.clone(),
                error,
            }))
        }
    }
}

// ── Internal helpers ────────────────────────────────────────────────

/// Finite values of `column` and the number of entries dropped.
fn clean_sample(column: &Column, label: &str) -> Result<(Vec<f64>, usize), ProfileError> {
    let coerced: Vec<f64> = match column.storage_type() {
        StorageType::Integer | StorageType::Float => column.numeric_values().unwrap_or_default(),
        StorageType::Boolean => column
            .bool_values()
            .unwrap_or_default()
            .into_iter()
            .map(|v| if v { 1.0 } else { 0.0 })
            .collect(),
        StorageType::Text => {
            let parsed: Vec<f64> = column
                .text_values()
                .unwrap_or_default()
                .iter()
                .filter_map(|v| v.trim().parse::<f64>().ok())
                .collect();
            if parsed.is_empty() && column.non_missing_count() > 0 {
                return Err(ProfileError::NonNumericSample {
                    sample: label.to_string(),
                });
            }
            parsed
        }
    };

    let values: Vec<f64> = coerced.into_iter().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return Err(ProfileError::EmptyAfterCleaning {
            sample: label.to_string(),
        });
    }
    let dropped = column.len() - values.len();
    if dropped > 0 {
        debug!(sample = label, dropped, "entries dropped before testing");
    }
    Ok((values, dropped))
}

fn anderson_darling_result(xs: &[f64], ys: &[f64]) -> TestResult {
    let ad = anderson_darling_ksamp(&[xs, ys]);
    let critical_value = ad.as_ref().and_then(|r| r.critical_value(AD_LEVEL));
    let (verdict, rationale) = match (&ad, critical_value) {
        (Some(r), Some(cv)) if r.statistic > cv => (
            Verdict::Different,
            format!("statistic {:.4} > 5% critical value {cv:.3}", r.statistic),
        ),
        (Some(r), Some(cv)) => (
            Verdict::Similar,
            format!("statistic {:.4} <= 5% critical value {cv:.3}", r.statistic),
        ),
        (Some(_), None) => (Verdict::Unknown, "critical value unavailable".to_string()),
        (None, _) => (
            Verdict::Unknown,
            "statistic undefined for these samples".to_string(),
        ),
    };
    TestResult {
        test: TestKind::AndersonDarling,
        statistic: ad.map(|r| r.statistic),
        p_value: None,
        verdict: Some(verdict),
        rationale,
        critical_value,
    }
}

fn describe(
    label: &str,
    values: Vec<f64>,
    dropped: usize,
    top_n: usize,
) -> Result<SampleDescription, ProfileError> {
    let moments = compute_moments(&values, &PERCENTILES)?;
    let counts = value_counts(values);
    Ok(SampleDescription {
        label: label.to_string(),
        dropped,
        moments,
        mode: counts.first().map(|c| c.value),
        top_values: counts.into_iter().take(top_n).collect(),
    })
}

/// Distinct values by count descending, then value ascending.
fn value_counts(mut values: Vec<f64>) -> Vec<NumericCount> {
    for v in values.iter_mut() {
        // fold -0.0 into 0.0
        if *v == 0.0 {
            *v = 0.0;
        }
    }
    values.sort_by(f64::total_cmp);
    let mut counts: Vec<NumericCount> = Vec::new();
    for v in values {
        match counts.last_mut() {
            Some(last) if last.value == v => last.count += 1,
            _ => counts.push(NumericCount { value: v, count: 1 }),
        }
    }
    // stable sort keeps ascending values within equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Bins both samples over edges spanning their combined range.
///
/// A zero-width range is widened by 0.5 on each side. Returns `None`
/// when `bins` is zero, either sample is empty, or the range overflows
/// `f64`.
pub fn shared_histogram(a: &[f64], b: &[f64], bins: usize) -> Option<SharedHistogram> {
    if bins == 0 || a.is_empty() || b.is_empty() {
        return None;
    }
    let all = a.iter().chain(b);
    let lo = all.clone().copied().fold(f64::INFINITY, f64::min);
    let hi = all.copied().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
    let width = (hi - lo) / bins as f64;
    if !width.is_finite() {
        return None;
    }

    let mut edges: Vec<f64> = (0..=bins).map(|i| lo + i as f64 * width).collect();
    edges[bins] = hi;

    let count = |values: &[f64]| {
        let mut counts = vec![0usize; bins];
        for &v in values {
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        counts
    };
    Some(SharedHistogram {
        edges,
        counts_a: count(a),
        counts_b: count(b),
    })
}

// ── Tests ───────────────────────────────────────────────────────────
