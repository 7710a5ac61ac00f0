#![allow(clippy::unwrap_used)]
//! Five-test comparison on generated samples.

mod common;

use u_profile::comparison::{
    compare_distributions, compare_many, ComparisonConfig, ComparisonOutcome, TestKind, Verdict,
};
use u_profile::dataframe::Column;
use u_profile::moments::Moments;
use u_profile::ProfileError;

use common::{init_tracing, lognormal_sample, normal_sample};

const P_VALUE_TESTS: [TestKind; 3] = [
    TestKind::KolmogorovSmirnov,
    TestKind::MannWhitneyU,
    TestKind::CramerVonMises,
];

#[test]
fn normal_vs_lognormal_is_different() {
    init_tracing();
    let normal = Column::from_f64s(normal_sample(7, 400, 100.0, 10.0));
    let lognormal = Column::from_f64s(lognormal_sample(11, 400, 130f64.ln(), 0.25));
    let config = ComparisonConfig::default().labels("normal", "lognormal");

    let report = compare_distributions(&normal, &lognormal, &config).unwrap();
    for kind in P_VALUE_TESTS {
        let t = report.test(kind).unwrap();
        assert_eq!(t.verdict, Some(Verdict::Different), "{kind}: {}", t.rationale);
        assert!(t.p_value.unwrap() < 1e-6, "{kind}: p = {:?}", t.p_value);
    }
    assert_eq!(report.verdict(TestKind::AndersonDarling), Some(Verdict::Different));
    assert!(report.test(TestKind::Wasserstein).unwrap().statistic.unwrap() > 10.0);
    assert_eq!(report.sample_a.label, "normal");
    assert_eq!(report.sample_a.moments.count, 400);
}

#[test]
fn nearby_normals_overlap_with_moderate_distance() {
    init_tracing();
    let a = Column::from_f64s(normal_sample(13, 1000, 100.0, 10.0));
    let b = Column::from_f64s(normal_sample(17, 1000, 102.0, 12.0));
    let report = compare_distributions(&a, &b, &ComparisonConfig::default()).unwrap();

    let quartiles = |m: &Moments| (m.quantile(0.25).unwrap(), m.quantile(0.75).unwrap());
    let (a_lo, a_hi) = quartiles(&report.sample_a.moments);
    let (b_lo, b_hi) = quartiles(&report.sample_b.moments);
    assert!(a_lo <= b_hi && b_lo <= a_hi, "[{a_lo}, {a_hi}] vs [{b_lo}, {b_hi}]");

    // 2·E|1 + Z| ≈ 2.33 for these parameters
    let w = report.test(TestKind::Wasserstein).unwrap().statistic.unwrap();
    assert!((0.5..6.0).contains(&w), "wasserstein {w}");
    assert_eq!(report.tests.len(), 5);
}

#[test]
fn identical_copy_is_similar_at_any_alpha() {
    init_tracing();
    let sample = Column::from_f64s(normal_sample(3, 250, 100.0, 10.0));
    for alpha in [0.01, 0.05, 0.5, 0.99] {
        let config = ComparisonConfig::default().alpha(alpha);
        let report = compare_distributions(&sample, &sample.clone(), &config).unwrap();

        let ks = report.test(TestKind::KolmogorovSmirnov).unwrap();
        assert_eq!(ks.p_value, Some(1.0));
        let mw = report.test(TestKind::MannWhitneyU).unwrap();
        assert!((mw.p_value.unwrap() - 1.0).abs() < 1e-12);
        let w = report.test(TestKind::Wasserstein).unwrap();
        assert!(w.statistic.unwrap().abs() < 1e-12);
        assert_eq!(w.verdict, None);

        for kind in [
            TestKind::KolmogorovSmirnov,
            TestKind::MannWhitneyU,
            TestKind::AndersonDarling,
            TestKind::CramerVonMises,
        ] {
            assert_eq!(report.verdict(kind), Some(Verdict::Similar), "{kind} at alpha {alpha}");
        }
    }
}

#[test]
fn text_samples_are_coerced() {
    let numbers: Vec<String> = normal_sample(5, 60, 0.0, 1.0)
        .iter()
        .map(|v| format!(" {v:.6} "))
        .chain(["n/a".to_string()])
        .collect();
    let text = Column::from_strs(&numbers);
    let numeric = Column::from_f64s(normal_sample(5, 60, 0.0, 1.0));

    let report = compare_distributions(&text, &numeric, &ComparisonConfig::default()).unwrap();
    assert_eq!(report.sample_a.moments.count, 60);
    assert_eq!(report.sample_a.dropped, 1);
    // six decimals keep the two samples within rounding of each other
    assert_eq!(report.verdict(TestKind::KolmogorovSmirnov), Some(Verdict::Similar));
}

#[test]
fn batch_continues_past_bad_pairs() {
    init_tracing();
    let a = Column::from_f64s(normal_sample(1, 100, 0.0, 1.0));
    let b = Column::from_f64s(normal_sample(2, 100, 5.0, 1.0));
    let empty = Column::float([None, None]);
    let words = Column::from_strs(&["low", "high"]);

    let outcomes = compare_many(
        &[(&a, &b), (&a, &empty), (&words, &b), (&b, &a)],
        &ComparisonConfig::default(),
    )
    .unwrap();

    let status: Vec<&str> = outcomes
        .iter()
        .map(|o| match o {
            ComparisonOutcome::Compared(_) => "compared",
            ComparisonOutcome::Failed(f) => match f.error {
                ProfileError::EmptyAfterCleaning { .. } => "empty",
                ProfileError::NonNumericSample { .. } => "non_numeric",
                _ => "other",
            },
        })
        .collect();
    assert_eq!(status, vec!["compared", "empty", "non_numeric", "compared"]);

    let shifted = outcomes[0].report().unwrap();
    assert_eq!(shifted.verdict(TestKind::MannWhitneyU), Some(Verdict::Different));
}
