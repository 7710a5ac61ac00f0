#![allow(clippy::unwrap_used)]
//! JSON round trips of every report type.

mod common;

use u_profile::comparison::{
    compare_distributions, compare_many, ComparisonConfig, ComparisonOutcome, ComparisonReport,
};
use u_profile::dataframe::Column;
use u_profile::profiling::{profile_column, ProfileConfig, ProfileReport};

use common::{lognormal_sample, normal_sample};

fn round_trip<T>(value: &T) -> T
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    let json = serde_json::to_string(value).unwrap();
    serde_json::from_str(&json).unwrap()
}

#[test]
fn profile_reports_survive_json() {
    let columns = [
        Column::from_f64s(normal_sample(4, 150, 10.0, 3.0)),
        Column::from_f64s([-1.0, 1.0, -1.0, 1.0]),
        Column::from_f64s([7.0; 6]),
        Column::integer([Some(1), None, Some(3)]),
        Column::from_strs(&["a", "a", "a", "b"]),
        Column::from_strs(&["2024-01-05", "2024-02-10 08:30", "2024-03-01"]),
        Column::from_strs(&["  Hello there  ", "general kenobi", "YOU ARE A BOLD ONE"]),
        Column::boolean([Some(true), None, Some(false)]),
        Column::float([None, None]),
        Column::from_f64s([f64::MAX, f64::MAX, 1.0]),
    ];
    let config = ProfileConfig::default();
    for (i, column) in columns.iter().enumerate() {
        let report = profile_column(&format!("c{i}"), column, &config).unwrap();
        let back: ProfileReport = round_trip(&report);
        assert_eq!(back, report, "column c{i}");
    }
}

#[test]
fn stats_blocks_are_tagged() {
    let report = profile_column("x", &Column::from_f64s([0.0, 1.0]), &ProfileConfig::default()).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["stats"]["kind"], "numeric");
    assert_eq!(json["storage_type"], "Float");
    assert!(json["stats"]["moments"]["skewness"].is_null());
}

#[test]
fn comparison_reports_survive_json() {
    let a = Column::from_f64s(normal_sample(8, 120, 100.0, 10.0));
    let b = Column::from_f64s(lognormal_sample(9, 90, 4.7, 0.3));
    let report = compare_distributions(&a, &b, &ComparisonConfig::default()).unwrap();
    let back: ComparisonReport = round_trip(&report);
    assert_eq!(back, report);
}

#[test]
fn overflowing_samples_survive_json() {
    let huge = Column::from_f64s([-f64::MAX, f64::MAX, 0.0]);
    let small = Column::from_f64s([1.0, 2.0, 3.0]);
    let report = compare_distributions(&huge, &small, &ComparisonConfig::default()).unwrap();
    let back: ComparisonReport = round_trip(&report);
    assert_eq!(back, report);

    let profile = profile_column("huge", &huge, &ProfileConfig::default()).unwrap();
    let json = serde_json::to_value(&profile).unwrap();
    assert_eq!(json["stats"]["moments"]["undefined"][0]["reason"]["kind"], "overflow");
    assert_eq!(round_trip(&profile), profile);
}

#[test]
fn batch_outcomes_survive_json() {
    let a = Column::from_f64s(normal_sample(8, 50, 0.0, 1.0));
    let words = Column::from_strs(&["x"]);
    let outcomes = compare_many(&[(&a, &a), (&a, &words)], &ComparisonConfig::default()).unwrap();

    let back: Vec<ComparisonOutcome> = round_trip(&outcomes);
    assert_eq!(back, outcomes);

    let json = serde_json::to_value(&outcomes).unwrap();
    assert_eq!(json[0]["status"], "compared");
    assert_eq!(json[1]["status"], "failed");
    assert_eq!(json[1]["error"]["code"], "non_numeric_sample");
    assert_eq!(json[1]["error"]["sample"], "sample_b");
}
