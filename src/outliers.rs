//! IQR-fence outlier detection.
//!
//! Values strictly outside `[Q1 − k·IQR, Q3 + k·IQR]` are outliers. When
//! the IQR is zero every value off the central plateau would be flagged,
//! so a zero IQR reports no outliers and sets [`OutlierSummary::zero_iqr`].
//! Fences that overflow `f64` leave the scan undefined.

use serde::{Deserialize, Serialize};

/// Tukey's fence multiplier.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// Result of an IQR outlier scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierSummary {
    pub lower_fence: f64,
    pub upper_fence: f64,
    pub multiplier: f64,
    /// Number of values strictly outside the fences.
    pub count: usize,
    /// `count` relative to the number of scanned values, in percent.
    pub pct: f64,
    /// Positions (within the scanned slice) of the outliers.
    pub indices: Vec<usize>,
    /// IQR was zero; detection was suppressed.
    pub zero_iqr: bool,
}

impl OutlierSummary {
    pub fn has_outliers(&self) -> bool {
        self.count > 0
    }
}

/// Flags values of `values` outside the fences built from `q1`/`q3`.
///
/// Returns `None` when a fence is not finite.
///
/// ```
/// use u_profile::outliers::detect_iqr_outliers;
///
/// let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0];
/// let s = detect_iqr_outliers(&data, 3.25, 7.75, 1.5).unwrap();
/// assert_eq!(s.count, 1);
/// assert_eq!(s.indices, vec![9]);
/// assert!((s.upper_fence - 14.5).abs() < 1e-12);
/// ```
pub fn detect_iqr_outliers(
    values: &[f64],
    q1: f64,
    q3: f64,
    multiplier: f64,
) -> Option<OutlierSummary> {
    let iqr = q3 - q1;
    let lower_fence = q1 - multiplier * iqr;
    let upper_fence = q3 + multiplier * iqr;
    if !lower_fence.is_finite() || !upper_fence.is_finite() {
        return None;
    }

    if iqr == 0.0 {
        return Some(OutlierSummary {
            lower_fence,
            upper_fence,
            multiplier,
            count: 0,
            pct: 0.0,
            indices: Vec::new(),
            zero_iqr: true,
        });
    }

    let indices: Vec<usize> = values
        .iter()
        .enumerate()
        .filter(|(_, &v)| v < lower_fence || v > upper_fence)
        .map(|(i, _)| i)
        .collect();
    let count = indices.len();
    let pct = if values.is_empty() {
        0.0
    } else {
        count as f64 / values.len() as f64 * 100.0
    };

    Some(OutlierSummary {
        lower_fence,
        upper_fence,
        multiplier,
        count,
        pct,
        indices,
        zero_iqr: false,
    })
}
