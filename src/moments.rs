//! Moments and quantiles of a numeric sample.
//!
//! [`compute_moments`] is the primitive shared by the profiler and the
//! distribution comparator. Statistics that cannot be computed for the
//! given sample are `None` and listed in [`Moments::undefined`] with the
//! reason, so nothing is silently replaced by zero.
//!
//! # Example
//!
//! ```
//! use u_profile::moments::compute_moments;
//!
//! let m = compute_moments(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0], &[0.25, 0.5, 0.75])
//!     .unwrap();
//! assert!((m.mean.unwrap() - 14.5).abs() < 1e-12);
//! assert!((m.median().unwrap() - 5.5).abs() < 1e-12);
//! assert!((m.iqr().unwrap() - 4.5).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use u_numflow::stats;

use crate::error::ProfileError;

/// Quartile and median levels.
pub const QUARTILES: [f64; 3] = [0.25, 0.5, 0.75];

const LEVEL_EPS: f64 = 1e-12;

// ── Undefined statistics ──────────────────────────────────────────────

/// Why a statistic has no value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UndefinedReason {
    /// The sample has no values.
    NoValues,
    /// The statistic needs at least `required` values.
    TooFewValues { required: usize, actual: usize },
    /// All values are equal, so the statistic divides by zero.
    ZeroVariance,
    /// The mean is undefined or zero where it is a divisor.
    ZeroMean,
    /// The inputs it derives from are themselves undefined.
    MissingInputs,
    /// The result exceeds the range of `f64`.
    Overflow,
}

impl std::fmt::Display for UndefinedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoValues => write!(f, "no values"),
            Self::TooFewValues { required, actual } => {
                write!(f, "needs at least {required} values, got {actual}")
            }
            Self::ZeroVariance => write!(f, "zero variance"),
            Self::ZeroMean => write!(f, "zero mean"),
            Self::MissingInputs => write!(f, "inputs undefined"),
            Self::Overflow => write!(f, "overflows f64"),
        }
    }
}

/// A named statistic that could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndefinedStatistic {
    pub statistic: String,
    pub reason: UndefinedReason,
}

impl UndefinedStatistic {
    pub fn new(statistic: &str, reason: UndefinedReason) -> Self {
        Self {
            statistic: statistic.to_string(),
            reason,
        }
    }
}

// ── Moments ───────────────────────────────────────────────────────────

/// A requested quantile level and its value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantileValue {
    pub level: f64,
    pub value: Option<f64>,
}

/// Descriptive statistics of a finite numeric sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample variance (n − 1 denominator).
    pub variance: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// R-7 (linear interpolation) quantiles in the requested order.
    pub quantiles: Vec<QuantileValue>,
    /// Bias-corrected G1.
    pub skewness: Option<f64>,
    /// Bias-corrected G2 (excess; normal = 0).
    pub kurtosis: Option<f64>,
    pub undefined: Vec<UndefinedStatistic>,
}

impl Moments {
    /// Value at a requested level, if that level was requested and defined.
    pub fn quantile(&self, level: f64) -> Option<f64> {
        self.quantiles
            .iter()
            .find(|q| (q.level - level).abs() < LEVEL_EPS)
            .and_then(|q| q.value)
    }

    pub fn median(&self) -> Option<f64> {
        self.quantile(0.5)
    }

    /// Q3 − Q1, when both quartiles were requested and are defined.
    pub fn iqr(&self) -> Option<f64> {
        Some(self.quantile(0.75)? - self.quantile(0.25)?).filter(|v| v.is_finite())
    }

    pub fn is_undefined(&self, statistic: &str) -> bool {
        self.undefined.iter().any(|u| u.statistic == statistic)
    }
}

/// Fails with [`ProfileError::InvalidQuantile`] on the first level that
/// is not a finite number in `[0, 1]`.
pub fn validate_levels(levels: &[f64]) -> Result<(), ProfileError> {
    match levels
        .iter()
        .find(|l| !l.is_finite() || **l < 0.0 || **l > 1.0)
    {
        Some(&level) => Err(ProfileError::InvalidQuantile { level }),
        None => Ok(()),
    }
}

/// Computes moments and the requested quantiles of `values`.
///
/// Non-finite entries are ignored. Fewer than two values leave the
/// dispersion statistics undefined; skewness needs three values and
/// kurtosis four. A constant sample has `std_dev == Some(0.0)` and
/// undefined shape statistics. Results that overflow `f64` are undefined
/// with [`UndefinedReason::Overflow`].
///
/// # Errors
///
/// [`ProfileError::InvalidQuantile`] if any level is outside `[0, 1]`.
pub fn compute_moments(values: &[f64], levels: &[f64]) -> Result<Moments, ProfileError> {
    validate_levels(levels)?;

    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let n = finite.len();
    let mut undefined = Vec::new();

    let mut track = |name: &str, value: Option<f64>, reason: UndefinedReason| match value {
        Some(v) if v.is_finite() => Some(v),
        Some(_) => {
            undefined.push(UndefinedStatistic::new(name, UndefinedReason::Overflow));
            None
        }
        None => {
            undefined.push(UndefinedStatistic::new(name, reason));
            None
        }
    };

    let empty_or_short = |required: usize| {
        if n == 0 {
            UndefinedReason::NoValues
        } else {
            UndefinedReason::TooFewValues {
                required,
                actual: n,
            }
        }
    };

    let mean = track("mean", stats::mean(&finite), UndefinedReason::NoValues);
    let min = track("min", stats::min(&finite), UndefinedReason::NoValues);
    let max = track("max", stats::max(&finite), UndefinedReason::NoValues);
    // exact zero for constant data
    let constant = n > 0 && min == max;
    let raw_variance = if constant && n >= 2 {
        Some(0.0)
    } else {
        stats::variance(&finite)
    };
    let variance = track("variance", raw_variance, empty_or_short(2));
    let std_dev_reason = if n >= 2 {
        UndefinedReason::MissingInputs
    } else {
        empty_or_short(2)
    };
    let std_dev = track("std_dev", variance.map(f64::sqrt), std_dev_reason);

    let quantiles = levels
        .iter()
        .map(|&level| QuantileValue {
            level,
            value: stats::quantile(&finite, level),
        })
        .collect::<Vec<_>>();
    if n == 0 && !levels.is_empty() {
        track("quantiles", None, UndefinedReason::NoValues);
    }

    let shape = |required: usize, f: fn(&[f64]) -> Option<f64>| {
        if n < required {
            (None, empty_or_short(required))
        } else if constant {
            (None, UndefinedReason::ZeroVariance)
        } else {
            (f(&finite), UndefinedReason::ZeroVariance)
        }
    };
    let (skew, skew_reason) = shape(3, stats::skewness);
    let skewness = track("skewness", skew, skew_reason);
    let (kurt, kurt_reason) = shape(4, stats::kurtosis);
    let kurtosis = track("kurtosis", kurt, kurt_reason);

    Ok(Moments {
        count: n,
        mean,
        variance,
        std_dev,
        min,
        max,
        quantiles,
        skewness,
        kurtosis,
        undefined,
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn quartiles_are_ordered(data in prop::collection::vec(-1e6_f64..1e6, 1..200)) {
            let m = compute_moments(&data, &QUARTILES).expect("valid levels");
            let (q1, med, q3) = (
                m.quantile(0.25).expect("q1"),
                m.median().expect("median"),
                m.quantile(0.75).expect("q3"),
            );
            prop_assert!(q1 <= med + 1e-9);
            prop_assert!(med <= q3 + 1e-9);
            prop_assert!(m.iqr().expect("iqr") >= -1e-9);
            prop_assert!(m.min.expect("min") <= q1 + 1e-9);
            prop_assert!(q3 <= m.max.expect("max") + 1e-9);
        }

        #[test]
        fn std_dev_non_negative(data in prop::collection::vec(-1e6_f64..1e6, 2..100)) {
            let m = compute_moments(&data, &[]).expect("no levels");
            prop_assert!(m.std_dev.expect("two or more values") >= 0.0);
        }
    }
}
