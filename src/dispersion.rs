//! Coefficient of variation and its variability bucket.

use serde::{Deserialize, Serialize};

/// CV = |std / mean|, with the degenerate cases made explicit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CoefficientOfVariation {
    /// Mean or standard deviation unavailable.
    Undefined,
    Finite(f64),
    /// Zero mean with non-zero spread, or a ratio beyond `f64`.
    Infinite,
}

impl CoefficientOfVariation {
    /// Derives the CV from an optional mean and standard deviation.
    ///
    /// ```
    /// use u_profile::dispersion::CoefficientOfVariation as Cv;
    ///
    /// assert_eq!(Cv::from_moments(Some(10.0), Some(2.0)), Cv::Finite(0.2));
    /// assert_eq!(Cv::from_moments(Some(0.0), Some(1.0)), Cv::Infinite);
    /// assert_eq!(Cv::from_moments(Some(0.0), Some(0.0)), Cv::Finite(0.0));
    /// assert_eq!(Cv::from_moments(None, Some(1.0)), Cv::Undefined);
    /// ```
    pub fn from_moments(mean: Option<f64>, std_dev: Option<f64>) -> Self {
        match (mean, std_dev) {
            (Some(_), Some(s)) if s == 0.0 => Self::Finite(0.0),
            (Some(m), Some(_)) if m == 0.0 => Self::Infinite,
            (Some(m), Some(s)) => match (s / m).abs() {
                cv if cv.is_finite() => Self::Finite(cv),
                _ => Self::Infinite,
            },
            _ => Self::Undefined,
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Self::Finite(v) => Some(v),
            Self::Infinite => Some(f64::INFINITY),
            Self::Undefined => None,
        }
    }

    pub fn variability(self) -> Variability {
        match self {
            Self::Undefined => Variability::NotApplicable,
            Self::Infinite => Variability::High,
            Self::Finite(cv) if cv < 0.1 => Variability::Low,
            Self::Finite(cv) if cv < 0.3 => Variability::Moderate,
            Self::Finite(_) => Variability::High,
        }
    }
}

/// Bucketed CV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variability {
    Low,
    Moderate,
    High,
    NotApplicable,
}

impl std::fmt::Display for Variability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Low => "Low variability",
            Self::Moderate => "Moderate variability",
            Self::High => "High variability",
            Self::NotApplicable => "N/A",
        })
    }
}

/// CV plus its bucket, as embedded in numeric profiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dispersion {
    pub cv: CoefficientOfVariation,
    pub variability: Variability,
}

pub fn classify_dispersion(mean: Option<f64>, std_dev: Option<f64>) -> Dispersion {
    let cv = CoefficientOfVariation::from_moments(mean, std_dev);
    Dispersion {
        cv,
        variability: cv.variability(),
    }
}
