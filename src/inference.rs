//! Heuristic semantic-type inference.
//!
//! Storage type decides numeric and boolean columns outright. Text
//! columns are classified from a bounded, seeded random sample: date
//! patterns first, then cardinality, length and whitespace heuristics.
//!
//! # Example
//!
//! ```
//! use rand::{rngs::StdRng, SeedableRng};
//! use u_profile::dataframe::Column;
//! use u_profile::inference::{infer_type, InferenceConfig, SemanticType};
//!
//! let col = Column::from_strs(&["2024-01-05", "2024-02-11", "2023-12-30"]);
//! let mut rng = StdRng::seed_from_u64(42);
//! let t = infer_type(&col, &InferenceConfig::default(), &mut rng);
//! assert_eq!(t.semantic_type, SemanticType::Datetime);
//! assert_eq!(t.confidence, 1.0);
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataframe::{Column, StorageType};
use crate::entropy::FrequencyTable;
use crate::error::ProfileError;

// ── Semantic types ────────────────────────────────────────────────────

/// What a column's values mean, as opposed to how they are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    /// No present values.
    Empty,
    Integer,
    Float,
    /// Integer storage with few distinct values (codes, ratings).
    CategoricalNumeric,
    Boolean,
    Datetime,
    Categorical,
    /// Long or multi-word free text.
    Text,
    /// Nearly all values distinct (keys, ids).
    Identifier,
    Mixed,
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Empty => "empty",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::CategoricalNumeric => "categorical_numeric",
            Self::Boolean => "boolean",
            Self::Datetime => "datetime",
            Self::Categorical => "categorical",
            Self::Text => "text",
            Self::Identifier => "identifier",
            Self::Mixed => "mixed",
        })
    }
}

/// Inferred type with a confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypeInference {
    pub semantic_type: SemanticType,
    pub confidence: f64,
    /// Number of values inspected by the sampling heuristics.
    pub sampled: usize,
}

impl TypeInference {
    fn new(semantic_type: SemanticType, confidence: f64, sampled: usize) -> Self {
        Self {
            semantic_type,
            confidence,
            sampled,
        }
    }
}

// ── Date formats ──────────────────────────────────────────────────────

/// Recognized date layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// `YYYY-MM-DD`, optionally followed by a time.
    IsoDate,
    /// `YYYY/MM/DD`
    YearSlash,
    /// `MM/DD/YYYY`
    UsSlash,
    /// `DD-MM-YYYY`
    DayDash,
    /// `DD.MM.YYYY`
    DayDot,
}

static DATE_REGEXES: Lazy<Vec<(DateFormat, Regex)>> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    let compile = |p: &str| Regex::new(p).expect("hard-coded date regex");
    vec![
        (
            DateFormat::IsoDate,
            compile(r"^\d{4}-\d{2}-\d{2}([T ]\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?)?$"),
        ),
        (DateFormat::YearSlash, compile(r"^\d{4}/\d{2}/\d{2}$")),
        (DateFormat::UsSlash, compile(r"^\d{1,2}/\d{1,2}/\d{4}$")),
        (DateFormat::DayDash, compile(r"^\d{1,2}-\d{1,2}-\d{4}$")),
        (DateFormat::DayDot, compile(r"^\d{1,2}\.\d{1,2}\.\d{4}$")),
    ]
});

impl DateFormat {
    /// First layout whose shape matches `value` (after trimming).
    pub fn detect(value: &str) -> Option<Self> {
        let value = value.trim();
        DATE_REGEXES
            .iter()
            .find(|(_, re)| re.is_match(value))
            .map(|(fmt, _)| *fmt)
    }

    /// Parses a value of this layout. Shape matches that are not real
    /// calendar dates (`2024-02-30`) yield `None`.
    pub fn parse(self, value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        let date_only = |fmt: &str| {
            NaiveDate::parse_from_str(value, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        };
        match self {
            Self::IsoDate => {
                if value.len() == 10 {
                    return date_only("%Y-%m-%d");
                }
                let normalized = value.replacen(' ', "T", 1);
                chrono::DateTime::parse_from_rfc3339(&normalized)
                    .map(|dt| dt.naive_utc())
                    .ok()
                    .or_else(|| {
                        ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
                            .iter()
                            .find_map(|f| NaiveDateTime::parse_from_str(&normalized, f).ok())
                    })
            }
            Self::YearSlash => date_only("%Y/%m/%d"),
            Self::UsSlash => date_only("%m/%d/%Y"),
            Self::DayDash => date_only("%d-%m-%Y"),
            Self::DayDot => date_only("%d.%m.%Y"),
        }
    }
}

pub fn looks_like_date(value: &str) -> bool {
    DateFormat::detect(value).is_some()
}

// ── Configuration ─────────────────────────────────────────────────────

/// Thresholds of the inference heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Maximum number of values sampled for pattern heuristics. Default: 100.
    pub sample_size: usize,
    /// Share of sampled values that must look like dates. Default: 0.7.
    pub datetime_ratio: f64,
    /// Unique ratio below which values are clearly categorical. Default: 0.1.
    pub categorical_ratio: f64,
    /// Unique ratio below which values are still categorical. Default: 0.5.
    pub loose_categorical_ratio: f64,
    /// Mean sampled length above which values are free text. Default: 50.
    pub text_length: f64,
    /// Share of sampled values containing whitespace that marks free text. Default: 0.5.
    pub whitespace_share: f64,
    /// Unique ratio at or above which values are identifiers. Default: 0.95.
    pub identifier_ratio: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            sample_size: 100,
            datetime_ratio: 0.7,
            categorical_ratio: 0.1,
            loose_categorical_ratio: 0.5,
            text_length: 50.0,
            whitespace_share: 0.5,
            identifier_ratio: 0.95,
        }
    }
}

impl InferenceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_size(mut self, n: usize) -> Self {
        self.sample_size = n;
        self
    }

    pub fn datetime_ratio(mut self, ratio: f64) -> Self {
        self.datetime_ratio = ratio;
        self
    }

    pub fn text_length(mut self, length: f64) -> Self {
        self.text_length = length;
        self
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.sample_size == 0 {
            return Err(ProfileError::invalid_config(
                "sample_size",
                "must be at least 1",
            ));
        }
        let ratios = [
            ("datetime_ratio", self.datetime_ratio),
            ("categorical_ratio", self.categorical_ratio),
            ("loose_categorical_ratio", self.loose_categorical_ratio),
            ("whitespace_share", self.whitespace_share),
            ("identifier_ratio", self.identifier_ratio),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(ProfileError::invalid_config(
                    name,
                    format!("must lie in [0, 1], got {value}"),
                ));
            }
        }
        if self.categorical_ratio > self.loose_categorical_ratio {
            return Err(ProfileError::invalid_config(
                "categorical_ratio",
                "must not exceed loose_categorical_ratio",
            ));
        }
        if !(self.text_length >= 0.0) {
            return Err(ProfileError::invalid_config(
                "text_length",
                format!("must be non-negative, got {}", self.text_length),
            ));
        }
        Ok(())
    }
}

// ── Sampling ──────────────────────────────────────────────────────────

/// Draws up to `size` items without replacement, preserving input order.
/// Returns everything when `items` is not larger than `size`.
pub fn sample_items<'a, T, R: Rng + ?Sized>(items: &'a [T], size: usize, rng: &mut R) -> Vec<&'a T> {
    if items.len() <= size {
        return items.iter().collect();
    }
    let mut picked = rand::seq::index::sample(rng, items.len(), size).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| &items[i]).collect()
}

/// Seeded sample of the present values of a Text column.
pub fn sample_text<'a, R: Rng + ?Sized>(
    column: &'a Column,
    size: usize,
    rng: &mut R,
) -> Vec<&'a str> {
    let values = column.text_values().unwrap_or_default();
    sample_items(&values, size, rng).into_iter().copied().collect()
}

// ── Inference ─────────────────────────────────────────────────────────

/// Classifies `column`; the first matching rule wins.
///
/// Sampling draws from `rng`, so a fixed seed gives a fixed answer.
pub fn infer_type<R: Rng + ?Sized>(
    column: &Column,
    config: &InferenceConfig,
    rng: &mut R,
) -> TypeInference {
    let present = column.non_missing_count();
    if present == 0 {
        return TypeInference::new(SemanticType::Empty, 1.0, 0);
    }
    let unique_ratio = FrequencyTable::from_column(column).distinct_count() as f64 / present as f64;

    let inferred = match column.storage_type() {
        StorageType::Integer if unique_ratio < config.categorical_ratio => {
            TypeInference::new(SemanticType::CategoricalNumeric, 0.8, 0)
        }
        StorageType::Integer => TypeInference::new(SemanticType::Integer, 1.0, 0),
        StorageType::Float => TypeInference::new(SemanticType::Float, 1.0, 0),
        StorageType::Boolean => TypeInference::new(SemanticType::Boolean, 1.0, 0),
        StorageType::Text => {
            let sample = sample_text(column, config.sample_size, rng);
            infer_text(&sample, unique_ratio, config)
        }
    };
    debug!(
        semantic_type = %inferred.semantic_type,
        confidence = inferred.confidence,
        unique_ratio,
        "type inferred"
    );
    inferred
}

fn infer_text(sample: &[&str], unique_ratio: f64, config: &InferenceConfig) -> TypeInference {
    let n = sample.len();
    let share = |count: usize| if n == 0 { 0.0 } else { count as f64 / n as f64 };

    let date_share = share(sample.iter().filter(|v| looks_like_date(v)).count());
    if date_share > config.datetime_ratio {
        return TypeInference::new(SemanticType::Datetime, date_share, n);
    }

    if unique_ratio < config.categorical_ratio {
        return TypeInference::new(SemanticType::Categorical, 0.9, n);
    }
    if unique_ratio < config.loose_categorical_ratio {
        return TypeInference::new(SemanticType::Categorical, 0.7, n);
    }

    let mean_len = if n == 0 {
        0.0
    } else {
        sample.iter().map(|v| v.chars().count()).sum::<usize>() as f64 / n as f64
    };
    let spaced = share(
        sample
            .iter()
            .filter(|v| v.chars().any(char::is_whitespace))
            .count(),
    );
    if mean_len > config.text_length || spaced > config.whitespace_share {
        return TypeInference::new(SemanticType::Text, 0.8, n);
    }

    if unique_ratio >= config.identifier_ratio {
        TypeInference::new(SemanticType::Identifier, 0.6, n)
    } else {
        TypeInference::new(SemanticType::Mixed, 0.5, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn infer(col: &Column) -> TypeInference {
        let mut rng = StdRng::seed_from_u64(42);
        infer_type(col, &InferenceConfig::default(), &mut rng)
    }

    // ── Storage-driven rules ─────────────────────────────────────

    #[test]
    fn all_missing_is_empty() {
        let t = infer(&Column::float([None, Some(f64::NAN)]));
        assert_eq!(t.semantic_type, SemanticType::Empty);
        assert_eq!(t.confidence, 1.0);
    }

    #[test]
    fn integer_cardinality() {
        let t = infer(&Column::integer((0..100).map(Some)));
        assert_eq!(t.semantic_type, SemanticType::Integer);
        assert_eq!(t.confidence, 1.0);

        let t = infer(&Column::integer((0..100).map(|i| Some(i % 3))));
        assert_eq!(t.semantic_type, SemanticType::CategoricalNumeric);
        assert_eq!(t.confidence, 0.8);
    }

    #[test]
    fn float_and_boolean() {
        let low_cardinality = Column::from_f64s((0..100).map(|i| (i % 2) as f64));
        assert_eq!(infer(&low_cardinality).semantic_type, SemanticType::Float);
        let flags = Column::boolean([Some(true), Some(false), None]);
        assert_eq!(infer(&flags).semantic_type, SemanticType::Boolean);
    }

    // ── Text heuristics ──────────────────────────────────────────

    #[test]
    fn datetime_confidence_is_match_share() {
        let mut values: Vec<String> = (1..=8).map(|d| format!("2024-03-{d:02}")).collect();
        values.extend(["n/a".to_string(), "unknown".to_string()]);
        let t = infer(&Column::from_strs(&values));
        assert_eq!(t.semantic_type, SemanticType::Datetime);
        assert!((t.confidence - 0.8).abs() < 1e-12);
    }

    #[test]
    fn date_share_must_exceed_threshold() {
        let mut values: Vec<String> = (1..=7).map(|d| format!("01/{d:02}/2024")).collect();
        values.extend(["x", "y", "z"].map(String::from));
        let t = infer(&Column::from_strs(&values));
        assert_ne!(t.semantic_type, SemanticType::Datetime);
    }

    #[test]
    fn categorical_confidence_tiers() {
        let strong: Vec<&str> = (0..100).map(|i| ["red", "green", "blue"][i % 3]).collect();
        let t = infer(&Column::from_strs(&strong));
        assert_eq!((t.semantic_type, t.confidence), (SemanticType::Categorical, 0.9));

        let loose: Vec<String> = (0..100).map(|i| format!("k{}", i % 30)).collect();
        let t = infer(&Column::from_strs(&loose));
        assert_eq!((t.semantic_type, t.confidence), (SemanticType::Categorical, 0.7));
    }

    #[test]
    fn free_text_by_whitespace_or_length() {
        let sentences: Vec<String> = (0..40).map(|i| format!("note number {i}")).collect();
        assert_eq!(infer(&Column::from_strs(&sentences)).semantic_type, SemanticType::Text);

        let long: Vec<String> = (0..40).map(|i| format!("{i}{}", "x".repeat(60))).collect();
        let t = infer(&Column::from_strs(&long));
        assert_eq!((t.semantic_type, t.confidence), (SemanticType::Text, 0.8));
    }

    #[test]
    fn identifier_and_mixed_fallbacks() {
        let ids: Vec<String> = (0..50).map(|i| format!("ID-{i:04}")).collect();
        let t = infer(&Column::from_strs(&ids));
        assert_eq!((t.semantic_type, t.confidence), (SemanticType::Identifier, 0.6));

        // 60 distinct of 80 present: ratio 0.75
        let mixed: Vec<String> = (0..80).map(|i| format!("v{}", i % 60)).collect();
        let t = infer(&Column::from_strs(&mixed));
        assert_eq!((t.semantic_type, t.confidence), (SemanticType::Mixed, 0.5));
    }

    #[test]
    fn same_seed_same_answer() {
        let values: Vec<String> = (0..500)
            .map(|i| if i % 4 == 0 { format!("2024-01-{:02}", i % 28 + 1) } else { format!("w{i}") })
            .collect();
        let col = Column::from_strs(&values);
        assert_eq!(infer(&col), infer(&col));
        assert_eq!(infer(&col).sampled, 100);
    }

    // ── Date formats ─────────────────────────────────────────────

    #[test]
    fn date_format_detection() {
        assert_eq!(DateFormat::detect("2024-01-31"), Some(DateFormat::IsoDate));
        assert_eq!(DateFormat::detect("2024-01-31T08:15:00Z"), Some(DateFormat::IsoDate));
        assert_eq!(DateFormat::detect("2024-01-31 08:15"), Some(DateFormat::IsoDate));
        assert_eq!(DateFormat::detect("2024/01/31"), Some(DateFormat::YearSlash));
        assert_eq!(DateFormat::detect("01/31/2024"), Some(DateFormat::UsSlash));
        assert_eq!(DateFormat::detect("31-01-2024"), Some(DateFormat::DayDash));
        assert_eq!(DateFormat::detect("31.01.2024"), Some(DateFormat::DayDot));
        assert_eq!(DateFormat::detect("20240131"), None);
        assert_eq!(DateFormat::detect("Jan 31"), None);
    }

    #[test]
    fn date_parsing() {
        let d = DateFormat::UsSlash.parse("02/29/2024").expect("leap day");
        assert_eq!(d.format("%Y-%m-%d").to_string(), "2024-02-29");
        assert!(DateFormat::IsoDate.parse("2023-02-29").is_none());
        let t = DateFormat::IsoDate.parse("2024-05-01 13:45:10").expect("datetime");
        assert_eq!(t.format("%H:%M:%S").to_string(), "13:45:10");
        let z = DateFormat::IsoDate.parse("2024-05-01T13:45:10+02:00").expect("offset");
        assert_eq!(z.format("%H").to_string(), "11");
    }

    // ── Configuration ────────────────────────────────────────────

    #[test]
    fn config_validation() {
        assert!(InferenceConfig::default().validate().is_ok());
        assert!(InferenceConfig::new().sample_size(0).validate().is_err());
        let err = InferenceConfig::new()
            .datetime_ratio(1.2)
            .validate()
            .expect_err("out of range");
        assert!(matches!(err, ProfileError::InvalidConfiguration { ref parameter, .. } if parameter == "datetime_ratio"));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: InferenceConfig =
            serde_json::from_str(r#"{"sample_size": 25}"#).expect("partial config");
        assert_eq!(cfg.sample_size, 25);
        assert_eq!(cfg.identifier_ratio, 0.95);
    }
}
