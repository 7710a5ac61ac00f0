//! Two-sample (and k-sample) distribution tests.
//!
//! All functions take finite values; callers drop missing and non-finite
//! entries first. Each returns `None` when its minimum sample
//! requirements are not met.
//!
//! | Test | Statistic | p-value |
//! |------|-----------|---------|
//! | [`ks_two_sample`] | max ECDF gap D | asymptotic Kolmogorov |
//! | [`mann_whitney_u`] | U of the first sample | normal approximation, tie + continuity corrected |
//! | [`anderson_darling_ksamp`] | standardized A²akN (midrank) | none, critical values instead |
//! | [`cramer_von_mises_two_sample`] | T (Anderson 1962) | asymptotic limiting distribution |
//! | [`wasserstein_distance`] | W₁ transport cost | none |
//!
//! # References
//!
//! - Scholz & Stephens (1987). "K-sample Anderson–Darling tests". JASA 82(399).
//! - Anderson (1962). "On the distribution of the two-sample Cramér–von Mises
//!   criterion". Ann. Math. Statist. 33(3).
//! - Csörgő & Faraway (1996). "The exact and asymptotic distributions of
//!   Cramér–von Mises statistics". JRSS B 58(1).

use serde::{Deserialize, Serialize};
use u_numflow::special;

// ── Shared helpers ────────────────────────────────────────────────────

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);
    v
}

/// Number of entries `< x` and `<= x` in a sorted slice.
#[inline]
fn bounds(sorted: &[f64], x: f64) -> (usize, usize) {
    (
        sorted.partition_point(|&v| v < x),
        sorted.partition_point(|&v| v <= x),
    )
}

/// Average (1-based) rank of `x` within `pooled`, ties sharing the mean rank.
#[inline]
fn midrank(pooled: &[f64], x: f64) -> f64 {
    let (below, through) = bounds(pooled, x);
    (below + 1 + through) as f64 / 2.0
}

/// Distinct values of a sorted slice with their multiplicities.
fn runs(sorted: &[f64]) -> Vec<(f64, usize)> {
    let mut out: Vec<(f64, usize)> = Vec::new();
    for &v in sorted {
        match out.last_mut() {
            Some((last, count)) if *last == v => *count += 1,
            _ => out.push((v, 1)),
        }
    }
    out
}

fn pooled_sorted(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut pooled = Vec::with_capacity(a.len() + b.len());
    pooled.extend_from_slice(a);
    pooled.extend_from_slice(b);
    pooled.sort_by(f64::total_cmp);
    pooled
}

// ── Kolmogorov–Smirnov ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KsTest {
    /// Largest absolute gap between the two empirical CDFs.
    pub statistic: f64,
    pub p_value: f64,
}

/// Kolmogorov survival function `Q(λ) = 2 Σ (−1)^{j−1} exp(−2 j² λ²)`.
///
/// Uses the theta-function form below λ = 1.18 where the alternating
/// series converges slowly.
pub fn kolmogorov_survival(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    if lambda < 1.18 {
        let y = (-1.233_700_550_136_169_8 / (lambda * lambda)).exp();
        let cdf = 2.256_758_334_191_025 * (-y.ln()).sqrt()
            * (y + y.powi(9) + y.powi(25) + y.powi(49));
        (1.0 - cdf).clamp(0.0, 1.0)
    } else {
        let x = (-2.0 * lambda * lambda).exp();
        (2.0 * (x - x.powi(4) + x.powi(9))).clamp(0.0, 1.0)
    }
}

/// Two-sample Kolmogorov–Smirnov test.
///
/// The p-value uses the effective size `en = √(n·m/(n+m))` with the
/// Stephens correction `λ = (en + 0.12 + 0.11/en)·D`.
///
/// ```
/// use u_profile::two_sample::ks_two_sample;
///
/// let a = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let r = ks_two_sample(&a, &a).unwrap();
/// assert_eq!(r.statistic, 0.0);
/// assert_eq!(r.p_value, 1.0);
/// ```
pub fn ks_two_sample(a: &[f64], b: &[f64]) -> Option<KsTest> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let (a, b) = (sorted(a), sorted(b));
    let (n1, n2) = (a.len() as f64, b.len() as f64);

    let (mut i, mut j) = (0usize, 0usize);
    let mut d: f64 = 0.0;
    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / n1 - j as f64 / n2).abs());
    }

    let en = (n1 * n2 / (n1 + n2)).sqrt();
    let p_value = kolmogorov_survival((en + 0.12 + 0.11 / en) * d);
    Some(KsTest {
        statistic: d,
        p_value,
    })
}

// ── Mann–Whitney U ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MannWhitneyTest {
    /// U of the first sample: `R₁ − n₁(n₁+1)/2`.
    pub u: f64,
    /// Continuity-corrected standard score of `|U − n₁n₂/2|`.
    pub z: f64,
    /// Two-sided.
    pub p_value: f64,
}

/// Mann–Whitney U test with average ranks for ties.
///
/// `σ² = n₁n₂/12 · (N + 1 − Σ(t³ − t)/(N(N − 1)))`. When every value is
/// tied the variance vanishes and the samples are indistinguishable:
/// `z = 0`, `p = 1`.
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> Option<MannWhitneyTest> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let pooled = pooled_sorted(a, b);
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let n = n1 + n2;

    let r1: f64 = a.iter().map(|&x| midrank(&pooled, x)).sum();
    let u = r1 - n1 * (n1 + 1.0) / 2.0;

    let ties: f64 = runs(&pooled)
        .iter()
        .map(|&(_, t)| {
            let t = t as f64;
            t * t * t - t
        })
        .sum();
    let mu = n1 * n2 / 2.0;
    let sigma_sq = n1 * n2 / 12.0 * (n + 1.0 - ties / (n * (n - 1.0)));

    if !(sigma_sq > 0.0) {
        return Some(MannWhitneyTest {
            u,
            z: 0.0,
            p_value: 1.0,
        });
    }

    let z = ((u - mu).abs() - 0.5).max(0.0) / sigma_sq.sqrt();
    let p_value = if z == 0.0 {
        1.0
    } else {
        (2.0 * (1.0 - special::standard_normal_cdf(z))).clamp(0.0, 1.0)
    };
    Some(MannWhitneyTest { u, z, p_value })
}

// ── Anderson–Darling k-sample ─────────────────────────────────────────

/// Significance levels of [`AndersonDarlingTest::critical_values`].
pub const AD_SIGNIFICANCE_LEVELS: [f64; 7] = [0.25, 0.10, 0.05, 0.025, 0.01, 0.005, 0.001];

const AD_B0: [f64; 7] = [0.675, 1.281, 1.645, 1.96, 2.326, 2.573, 3.085];
const AD_B1: [f64; 7] = [-0.245, 0.25, 0.678, 1.149, 1.822, 2.364, 3.615];
const AD_B2: [f64; 7] = [-0.105, -0.305, -0.362, -0.391, -0.396, -0.345, -0.154];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AndersonDarlingTest {
    /// `(A²akN − (k − 1)) / σ`.
    pub statistic: f64,
    /// Unstandardized midrank statistic A²akN.
    pub a2akn: f64,
    /// Critical values at [`AD_SIGNIFICANCE_LEVELS`].
    pub critical_values: [f64; 7],
}

impl AndersonDarlingTest {
    /// Critical value for one of the tabulated significance levels.
    pub fn critical_value(&self, level: f64) -> Option<f64> {
        AD_SIGNIFICANCE_LEVELS
            .iter()
            .position(|&l| (l - level).abs() < 1e-9)
            .map(|i| self.critical_values[i])
    }
}

/// Critical values of the standardized statistic for `k` samples.
pub fn ad_critical_values(k: usize) -> [f64; 7] {
    let m = (k as f64 - 1.0).max(1.0);
    let mut out = [0.0; 7];
    for (i, cv) in out.iter_mut().enumerate() {
        *cv = AD_B0[i] + AD_B1[i] / m.sqrt() + AD_B2[i] / m;
    }
    out
}

/// Scholz–Stephens k-sample Anderson–Darling test, midrank version
/// (suited to data with ties).
///
/// `None` for fewer than two samples, an empty sample, fewer than four
/// pooled values, or a pooled sample with a single distinct value.
pub fn anderson_darling_ksamp(samples: &[&[f64]]) -> Option<AndersonDarlingTest> {
    let k = samples.len();
    if k < 2 || samples.iter().any(|s| s.is_empty()) {
        return None;
    }
    let sorted_samples: Vec<Vec<f64>> = samples.iter().map(|s| sorted(s)).collect();
    let pooled: Vec<f64> = sorted(&samples.concat());
    let n_total = pooled.len();
    if n_total < 4 {
        return None;
    }
    let distinct = runs(&pooled);
    if distinct.len() < 2 {
        return None;
    }
    let big_n = n_total as f64;

    let mut a2 = 0.0;
    for s in &sorted_samples {
        let ni = s.len() as f64;
        let mut inner = 0.0;
        for &(z, lj) in &distinct {
            let lj = lj as f64;
            let (left, _) = bounds(&pooled, z);
            let bj = left as f64 + lj / 2.0;
            let (s_left, s_right) = bounds(s, z);
            let fij = (s_right - s_left) as f64;
            let mij = s_right as f64 - fij / 2.0;
            let denom = bj * (big_n - bj) - big_n * lj / 4.0;
            inner += lj / big_n * (big_n * mij - bj * ni).powi(2) / denom;
        }
        a2 += inner / ni;
    }
    a2 *= (big_n - 1.0) / big_n;

    let kf = k as f64;
    let h_sum: f64 = sorted_samples.iter().map(|s| 1.0 / s.len() as f64).sum();
    // acc runs over the harmonic tail 1/(N-1) + ... + 1/(N-1-i)
    let mut acc = 0.0;
    let mut g = 0.0;
    for (i, denom) in (2..n_total).rev().enumerate() {
        acc += 1.0 / denom as f64;
        g += acc / (i + 2) as f64;
    }
    let h = acc + 1.0;

    let a = (4.0 * g - 6.0) * (kf - 1.0) + (10.0 - 6.0 * g) * h_sum;
    let b = (2.0 * g - 4.0) * kf * kf + 8.0 * h * kf + (2.0 * g - 14.0 * h - 4.0) * h_sum
        - 8.0 * h
        + 4.0 * g
        - 6.0;
    let c = (6.0 * h + 2.0 * g - 2.0) * kf * kf + (4.0 * h - 4.0 * g + 6.0) * kf
        + (2.0 * h - 6.0) * h_sum
        + 4.0 * h;
    let d = (2.0 * h + 6.0) * kf * kf - 4.0 * h * kf;
    let sigma_sq = (a * big_n.powi(3) + b * big_n.powi(2) + c * big_n + d)
        / ((big_n - 1.0) * (big_n - 2.0) * (big_n - 3.0));
    if !(sigma_sq > 0.0) {
        return None;
    }

    let statistic = (a2 - (kf - 1.0)) / sigma_sq.sqrt();
    statistic.is_finite().then(|| AndersonDarlingTest {
        statistic,
        a2akn: a2,
        critical_values: ad_critical_values(k),
    })
}

// ── Cramér–von Mises ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CramerVonMisesTest {
    /// T criterion.
    pub statistic: f64,
    pub p_value: f64,
}

/// `e^{−q}·K_{1/4}(q)` by trapezoid integration of
/// `∫₀^∞ exp(−q(1 + cosh t))·cosh(t/4) dt`.
fn scaled_bessel_k_quarter(q: f64) -> f64 {
    const STEPS: usize = 800;
    let upper = (40.0 / q).max(2.0).acosh() + 1.0;
    let h = upper / STEPS as f64;
    let f = |t: f64| (-q * (1.0 + t.cosh())).exp() * (t / 4.0).cosh();
    let interior: f64 = (1..STEPS).map(|i| f(i as f64 * h)).sum();
    h * (interior + 0.5 * (f(0.0) + f(upper)))
}

/// Limiting CDF of the Cramér–von Mises statistic (Csörgő & Faraway, eq. 1.3).
pub fn cvm_limiting_cdf(x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    let scale = std::f64::consts::PI.powf(1.5) * x.sqrt();
    // Γ(k + ½)/Γ(k + 1), starting at Γ(½) = √π
    let mut gamma_ratio = std::f64::consts::PI.sqrt();
    let mut total = 0.0;
    for k in 0..200 {
        let kf = k as f64;
        let y = 4.0 * kf + 1.0;
        let q = y * y / (16.0 * x);
        let term = gamma_ratio / scale * y.sqrt() * scaled_bessel_k_quarter(q);
        total += term;
        if term.abs() < 1e-7 {
            break;
        }
        gamma_ratio *= (kf + 0.5) / (kf + 1.0);
    }
    total.clamp(0.0, 1.0)
}

/// Two-sample Cramér–von Mises test with the asymptotic p-value.
///
/// ```
/// use u_profile::two_sample::cramer_von_mises_two_sample;
///
/// let a = [0.5, 1.5, 2.5, 3.5];
/// let r = cramer_von_mises_two_sample(&a, &a).unwrap();
/// assert_eq!(r.p_value, 1.0);
/// ```
pub fn cramer_von_mises_two_sample(a: &[f64], b: &[f64]) -> Option<CramerVonMisesTest> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let (xs, ys) = (sorted(a), sorted(b));
    let pooled = pooled_sorted(&xs, &ys);
    let (nx, ny) = (xs.len() as f64, ys.len() as f64);

    let spread = |values: &[f64]| -> f64 {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| (midrank(&pooled, v) - (i + 1) as f64).powi(2))
            .sum()
    };
    let u = nx * spread(&xs) + ny * spread(&ys);

    let k = nx * ny;
    let n = nx + ny;
    let t = u / (k * n) - (4.0 * k - 1.0) / (6.0 * n);

    let et = (1.0 + 1.0 / n) / 6.0;
    let vt = (n + 1.0) * (4.0 * k * n - 3.0 * (nx * nx + ny * ny) - 2.0 * k)
        / (45.0 * n * n * 4.0 * k);
    let tn = if vt > 0.0 {
        1.0 / 6.0 + (t - et) / (45.0 * vt).sqrt()
    } else {
        0.0
    };
    let p_value = if tn < 0.003 {
        1.0
    } else {
        (1.0 - cvm_limiting_cdf(tn)).max(0.0)
    };

    Some(CramerVonMisesTest {
        statistic: t,
        p_value,
    })
}

// ── Wasserstein ───────────────────────────────────────────────────────

/// First Wasserstein (earth mover's) distance between the empirical
/// distributions: `∫ |F_a − F_b| dx`. `None` for an empty sample or a
/// distance beyond `f64`.
///
/// ```
/// use u_profile::two_sample::wasserstein_distance;
///
/// let w = wasserstein_distance(&[0.0, 1.0, 3.0], &[5.0, 6.0, 8.0]).unwrap();
/// assert!((w - 5.0).abs() < 1e-12);
/// ```
pub fn wasserstein_distance(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let (a, b) = (sorted(a), sorted(b));
    let pooled = pooled_sorted(&a, &b);
    let (na, nb) = (a.len() as f64, b.len() as f64);

    let distance = pooled
        .windows(2)
        .map(|w| {
            let fa = bounds(&a, w[0]).1 as f64 / na;
            let fb = bounds(&b, w[0]).1 as f64 / nb;
            (fa - fb).abs() * (w[1] - w[0])
        })
        .sum::<f64>();
    Some(distance).filter(|d| d.is_finite())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn self_comparison_is_similar(data in prop::collection::vec(-1e3_f64..1e3, 2..80)) {
            let ks = ks_two_sample(&data, &data).expect("ks");
            prop_assert_eq!(ks.statistic, 0.0);
            prop_assert_eq!(ks.p_value, 1.0);
            let mw = mann_whitney_u(&data, &data).expect("mw");
            prop_assert!((mw.p_value - 1.0).abs() < 1e-12);
            prop_assert_eq!(wasserstein_distance(&data, &data), Some(0.0));
        }

        #[test]
        fn p_values_in_unit_interval(
            a in prop::collection::vec(-1e3_f64..1e3, 1..60),
            b in prop::collection::vec(-1e3_f64..1e3, 1..60),
        ) {
            let ks = ks_two_sample(&a, &b).expect("ks");
            prop_assert!((0.0..=1.0).contains(&ks.p_value));
            prop_assert!((0.0..=1.0).contains(&ks.statistic));
            let mw = mann_whitney_u(&a, &b).expect("mw");
            prop_assert!((0.0..=1.0).contains(&mw.p_value));
            let cvm = cramer_von_mises_two_sample(&a, &b).expect("cvm");
            prop_assert!((0.0..=1.0).contains(&cvm.p_value));
            prop_assert!(wasserstein_distance(&a, &b).expect("w") >= 0.0);
        }
    }
}
