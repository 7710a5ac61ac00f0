//! # u-profile
//!
//! Univariate column profiling and two-sample distribution comparison.
//!
//! u-profile turns one column of raw values into a structured report, and
//! answers whether two numeric samples plausibly share a distribution.
//! It operates in two pipelines that share the same moment and quantile
//! primitives:
//!
//! - **Profiling**: tolerates dirty data; infers a semantic type, computes
//!   the matching statistics block and scores data quality
//! - **Comparison**: cleans two samples and runs a five-test battery
//!
//! ## Modules
//!
//! - [`dataframe`]: typed columns with validity bitmaps, named-column table
//! - [`moments`]: mean, variance, R-7 quantiles, skewness, kurtosis
//! - [`outliers`]: IQR fences
//! - [`dispersion`]: coefficient of variation and variability buckets
//! - [`entropy`]: frequency tables, Shannon entropy, diversity buckets
//! - [`inference`]: seeded type inference and date layouts
//! - [`patterns`]: email/URL/phone/date/code detection on text
//! - [`quality`]: 0–100 quality score with structured issues
//! - [`profiling`]: per-column [`ProfileReport`](profiling::ProfileReport)
//! - [`two_sample`]: KS, Mann-Whitney U, Anderson-Darling k-sample, Cramér-von Mises, Wasserstein
//! - [`comparison`]: [`ComparisonReport`](comparison::ComparisonReport) and batch comparison
//! - [`error`]: error types
//!
//! ## Quick Start
//!
//! ```
//! use u_profile::comparison::{compare_distributions, ComparisonConfig, TestKind, Verdict};
//! use u_profile::dataframe::{Column, DataFrame};
//! use u_profile::profiling::{profile_dataframe, ProfileConfig};
//!
//! let df = DataFrame::new()
//!     .with_column("price", Column::from_f64s([9.5, 10.0, 10.5, 11.0, 250.0]))
//!     .unwrap()
//!     .with_column("grade", Column::from_strs(&["a", "b", "a", "a", "c"]))
//!     .unwrap();
//!
//! let reports = profile_dataframe(&df, &ProfileConfig::default()).unwrap();
//! assert_eq!(reports.len(), 2);
//! assert!(reports[0].quality.score <= 100.0);
//!
//! let a = Column::from_f64s((0..30).map(f64::from));
//! let report = compare_distributions(&a, &a.clone(), &ComparisonConfig::default()).unwrap();
//! assert_eq!(report.verdict(TestKind::KolmogorovSmirnov), Some(Verdict::Similar));
//! ```

pub mod comparison;
pub mod dataframe;
pub mod dispersion;
pub mod entropy;
pub mod error;
pub mod inference;
pub mod moments;
pub mod outliers;
pub mod patterns;
pub mod profiling;
pub mod quality;
pub mod two_sample;

pub use comparison::{compare_distributions, compare_many, ComparisonConfig, ComparisonReport};
pub use dataframe::{Column, DataFrame};
pub use error::ProfileError;
pub use profiling::{profile_column, profile_dataframe, ProfileConfig, ProfileReport};
