//! Column profiling: one structured [`ProfileReport`] per column.
//!
//! The profiler runs type inference first and lets the inferred
//! [`SemanticType`] pick the statistics block ([`ColumnStats`]). Missing
//! values are expected input, not errors; they are counted and excluded.
//!
//! | Inferred type | Statistics block |
//! |---------------|------------------|
//! | `Integer`, `Float` | [`NumericStats`] (moments, dispersion, IQR outliers) |
//! | `CategoricalNumeric`, `Categorical`, `Identifier`, `Mixed` | [`CategoricalStats`] (mode, top-N, entropy) |
//! | `Text` | [`TextStats`] (lengths, word counts, frequencies) |
//! | `Datetime` | [`DatetimeStats`] (parsed range and layouts) |
//! | `Boolean` | [`BooleanStats`] |
//! | `Empty` | none |
//!
//! Sampling heuristics draw from a `StdRng` seeded with
//! [`ProfileConfig::seed`], so the same input always yields the same report.
//!
//! # Example
//!
//! ```
//! use u_profile::dataframe::Column;
//! use u_profile::profiling::{profile_column, ColumnStats, ProfileConfig};
//!
//! let col = Column::integer((1..=9).chain([100]).map(Some));
//! let report = profile_column("x", &col, &ProfileConfig::default()).unwrap();
//!
//! let ColumnStats::Numeric(stats) = &report.stats else { panic!() };
//! assert_eq!(stats.moments.median(), Some(5.5));
//! assert_eq!(stats.outliers.as_ref().map(|o| o.indices.clone()), Some(vec![9]));
//! ```

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::dataframe::{Column, DataFrame, StorageType};
use crate::dispersion::{classify_dispersion, Dispersion};
use crate::entropy::{entropy_summary, EntropySummary, FrequencyTable};
use crate::error::ProfileError;
use crate::inference::{infer_type, sample_text, DateFormat, InferenceConfig, SemanticType, TypeInference};
use crate::moments::{compute_moments, validate_levels, Moments, QUARTILES};
use crate::outliers::{detect_iqr_outliers, OutlierSummary, DEFAULT_IQR_MULTIPLIER};
use crate::patterns::{detect_patterns, PatternMatch};
use crate::quality::{assess_quality, QualityAssessment, QualityInputs, QualityPenalties};

// ── Configuration ─────────────────────────────────────────────────────

/// Profiling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Seed for every sampling heuristic.
    pub seed: u64,
    /// Number of most frequent values kept in categorical blocks.
    pub top_n: usize,
    /// Quantile levels reported in addition to the quartiles.
    pub extra_quantiles: Vec<f64>,
    pub iqr_multiplier: f64,
    pub inference: InferenceConfig,
    pub penalties: QualityPenalties,
    /// Run pattern detection on Text storage.
    pub detect_patterns: bool,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            top_n: 10,
            extra_quantiles: vec![0.05, 0.95],
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            inference: InferenceConfig::default(),
            penalties: QualityPenalties::default(),
            detect_patterns: true,
        }
    }
}

impl ProfileConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = n;
        self
    }

    pub fn extra_quantiles(mut self, levels: Vec<f64>) -> Self {
        self.extra_quantiles = levels;
        self
    }

    pub fn iqr_multiplier(mut self, k: f64) -> Self {
        self.iqr_multiplier = k;
        self
    }

    pub fn inference(mut self, config: InferenceConfig) -> Self {
        self.inference = config;
        self
    }

    pub fn penalties(mut self, penalties: QualityPenalties) -> Self {
        self.penalties = penalties;
        self
    }

    pub fn detect_patterns(mut self, enabled: bool) -> Self {
        self.detect_patterns = enabled;
        self
    }

    /// Checks every parameter, including the nested configs.
    ///
    /// # Errors
    ///
    /// [`ProfileError::InvalidQuantile`] for an extra level outside
    /// `[0, 1]`; [`ProfileError::InvalidConfiguration`] otherwise.
    pub fn validate(&self) -> Result<(), ProfileError> {
        validate_levels(&self.extra_quantiles)?;
        if !(self.iqr_multiplier.is_finite() && self.iqr_multiplier > 0.0) {
            return Err(ProfileError::invalid_config(
                "iqr_multiplier",
                format!("must be positive, got {}", self.iqr_multiplier),
            ));
        }
        self.inference.validate()?;
        self.penalties.validate()
    }

    /// Quartiles followed by the extra levels, ascending, without repeats.
    fn quantile_levels(&self) -> Vec<f64> {
        let mut levels: Vec<f64> = QUARTILES.to_vec();
        for &level in &self.extra_quantiles {
            if !levels.iter().any(|l| (l - level).abs() < 1e-12) {
                levels.push(level);
            }
        }
        levels.sort_by(f64::total_cmp);
        levels
    }
}

// ── Statistics blocks ─────────────────────────────────────────────────

/// One entry of a top-N list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
    /// Share of non-missing values, in percent.
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    /// Moments over the finite values; quartiles plus the extra levels.
    pub moments: Moments,
    pub dispersion: Dispersion,
    /// `None` when the quartiles are undefined. `indices` are column rows.
    pub outliers: Option<OutlierSummary>,
    pub zero_count: usize,
    /// Finite negative values.
    pub negative_count: usize,
    pub infinity_count: usize,
    pub distinct_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalStats {
    pub distinct_count: usize,
    /// Most frequent value, smallest on ties.
    pub mode: Option<String>,
    pub mode_freq: usize,
    pub mode_pct: f64,
    pub top_values: Vec<ValueCount>,
    pub entropy: EntropySummary,
}

/// Free-text lengths are measured in characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStats {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub mean_length: Option<f64>,
    pub empty_count: usize,
    pub mean_word_count: Option<f64>,
    pub frequencies: CategoricalStats,
}

/// Number of values parsed under one layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatCount {
    pub format: DateFormat,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatetimeStats {
    pub parsed_count: usize,
    /// Present values that match no layout or are not calendar dates.
    pub unparsed_count: usize,
    pub earliest: Option<NaiveDateTime>,
    pub latest: Option<NaiveDateTime>,
    pub span_days: Option<f64>,
    /// Most common layout first.
    pub formats: Vec<FormatCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BooleanStats {
    pub true_count: usize,
    pub false_count: usize,
    /// `None` when no values are present.
    pub true_ratio: Option<f64>,
}

/// Type-specific statistics, selected by the inferred semantic type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnStats {
    Numeric(NumericStats),
    Categorical(CategoricalStats),
    Text(TextStats),
    Datetime(DatetimeStats),
    Boolean(BooleanStats),
    Empty,
}

// ── Report ────────────────────────────────────────────────────────────

/// Counts and their percentages. `unique_pct` is relative to the
/// non-missing values; the others to `total`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnCounts {
    pub total: usize,
    pub non_missing: usize,
    pub missing: usize,
    pub unique: usize,
    pub non_missing_pct: f64,
    pub missing_pct: f64,
    pub unique_pct: f64,
}

impl ColumnCounts {
    /// `(1 − unique / non_missing) · 100`, zero for an all-missing column.
    pub fn duplicate_pct(&self) -> f64 {
        if self.non_missing == 0 {
            0.0
        } else {
            100.0 - self.unique_pct
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileReport {
    pub name: String,
    pub storage_type: StorageType,
    pub inference: TypeInference,
    pub counts: ColumnCounts,
    pub stats: ColumnStats,
    pub quality: QualityAssessment,
    /// Empty unless the column has Text storage and detection is on.
    pub patterns: Vec<PatternMatch>,
}

// ── Profiling functions ───────────────────────────────────────────────

/// Profiles every column of `df` in column order.
///
/// # Errors
///
/// Configuration errors from [`ProfileConfig::validate`].
#[instrument(skip(df, config), fields(columns = df.column_count(), rows = df.row_count()))]
pub fn profile_dataframe(df: &DataFrame, config: &ProfileConfig) -> Result<Vec<ProfileReport>, ProfileError> {
    config.validate()?;
    df.iter()
        .map(|(name, column)| profile_column(name, column, config))
        .collect()
}

/// Looks `name` up in `df` and profiles it.
///
/// # Errors
///
/// [`ProfileError::ColumnNotFound`], or a configuration error.
pub fn profile_table_column(
    df: &DataFrame,
    name: &str,
    config: &ProfileConfig,
) -> Result<ProfileReport, ProfileError> {
    profile_column(name, df.require_column(name)?, config)
}

/// Profiles a single column.
///
/// # Errors
///
/// Configuration errors from [`ProfileConfig::validate`].
#[instrument(skip(column, config), fields(storage = %column.storage_type(), len = column.len()))]
pub fn profile_column(name: &str, column: &Column, config: &ProfileConfig) -> Result<ProfileReport, ProfileError> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let inference = infer_type(column, &config.inference, &mut rng);
    let table = FrequencyTable::from_column(column);
    let counts = column_counts(column, &table);

    let stats = match inference.semantic_type {
        SemanticType::Empty => ColumnStats::Empty,
        SemanticType::Integer | SemanticType::Float => {
            ColumnStats::Numeric(numeric_stats(column, config)?)
        }
        SemanticType::Boolean => ColumnStats::Boolean(boolean_stats(column)),
        SemanticType::Datetime => ColumnStats::Datetime(datetime_stats(column)),
        SemanticType::Text => ColumnStats::Text(text_stats(column, &table, config.top_n)),
        SemanticType::CategoricalNumeric
        | SemanticType::Categorical
        | SemanticType::Identifier
        | SemanticType::Mixed => ColumnStats::Categorical(categorical_stats(&table, config.top_n)),
    };

    let text_sample = match column.storage_type() {
        StorageType::Text => Some(sample_text(column, config.inference.sample_size, &mut rng)),
        _ => None,
    };
    let outlier_pct = match &stats {
        ColumnStats::Numeric(numeric) => numeric.outliers.as_ref().map(|o| o.pct),
        _ => None,
    };
    let quality = assess_quality(
        &QualityInputs {
            missing_pct: counts.missing_pct,
            duplicate_pct: counts.duplicate_pct(),
            outlier_pct,
            text_sample: text_sample.as_deref(),
        },
        &config.penalties,
    );
    let patterns = match (&text_sample, config.detect_patterns) {
        (Some(sample), true) => detect_patterns(sample),
        _ => Vec::new(),
    };

    debug!(
        column = name,
        semantic_type = %inference.semantic_type,
        score = quality.score,
        issues = quality.issues.len(),
        "column profiled"
    );

    Ok(ProfileReport {
        name: name.to_string(),
        storage_type: column.storage_type(),
        inference,
        counts,
        stats,
        quality,
        patterns,
    })
}

// ── Internal profiling helpers ────────────────────────────────────────

fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn column_counts(column: &Column, table: &FrequencyTable) -> ColumnCounts {
    let total = column.len();
    let non_missing = column.non_missing_count();
    let missing = column.missing_count();
    let unique = table.distinct_count();
    ColumnCounts {
        total,
        non_missing,
        missing,
        unique,
        non_missing_pct: pct(non_missing, total),
        missing_pct: pct(missing, total),
        unique_pct: pct(unique, non_missing),
    }
}

fn numeric_stats(column: &Column, config: &ProfileConfig) -> Result<NumericStats, ProfileError> {
    let rows = column.numeric_rows().unwrap_or_default();
    let (finite_rows, values): (Vec<usize>, Vec<f64>) =
        rows.iter().filter(|(_, v)| v.is_finite()).copied().unzip();

    let moments = compute_moments(&values, &config.quantile_levels())?;
    let dispersion = classify_dispersion(moments.mean, moments.std_dev);

    let outliers = match (moments.quantile(0.25), moments.quantile(0.75)) {
        (Some(q1), Some(q3)) => {
            detect_iqr_outliers(&values, q1, q3, config.iqr_multiplier).map(|mut summary| {
                summary.indices = summary.indices.iter().map(|&i| finite_rows[i]).collect();
                summary
            })
        }
        _ => None,
    };

    // -0.0 and 0.0 count as one value
    let distinct: HashSet<u64> = rows
        .iter()
        .map(|&(_, v)| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() })
        .collect();

    Ok(NumericStats {
        moments,
        dispersion,
        outliers,
        zero_count: values.iter().filter(|&&v| v == 0.0).count(),
        negative_count: values.iter().filter(|&&v| v < 0.0).count(),
        infinity_count: rows.iter().filter(|(_, v)| v.is_infinite()).count(),
        distinct_count: distinct.len(),
    })
}

fn categorical_stats(table: &FrequencyTable, top_n: usize) -> CategoricalStats {
    let present = table.non_missing_count();
    let (mode, mode_freq) = match table.mode() {
        Some((value, count)) => (Some(value.to_string()), count),
        None => (None, 0),
    };
    CategoricalStats {
        distinct_count: table.distinct_count(),
        mode,
        mode_freq,
        mode_pct: pct(mode_freq, present),
        top_values: table
            .top(top_n)
            .iter()
            .map(|(value, count)| ValueCount {
                value: value.clone(),
                count: *count,
                pct: pct(*count, present),
            })
            .collect(),
        entropy: entropy_summary(table),
    }
}

fn text_stats(column: &Column, table: &FrequencyTable, top_n: usize) -> TextStats {
    let values = column.text_values().unwrap_or_default();
    let lengths: Vec<usize> = values.iter().map(|v| v.chars().count()).collect();
    let mean = |total: usize| (!values.is_empty()).then(|| total as f64 / values.len() as f64);

    TextStats {
        min_length: lengths.iter().copied().min(),
        max_length: lengths.iter().copied().max(),
        mean_length: mean(lengths.iter().sum()),
        empty_count: values.iter().filter(|v| v.is_empty()).count(),
        mean_word_count: mean(values.iter().map(|v| v.split_whitespace().count()).sum()),
        frequencies: categorical_stats(table, top_n),
    }
}

fn datetime_stats(column: &Column) -> DatetimeStats {
    let values = column.text_values().unwrap_or_default();
    let mut parsed: Vec<NaiveDateTime> = Vec::new();
    let mut formats: BTreeMap<DateFormat, usize> = BTreeMap::new();

    for value in &values {
        let Some(format) = DateFormat::detect(value) else {
            continue;
        };
        if let Some(dt) = format.parse(value) {
            parsed.push(dt);
            *formats.entry(format).or_insert(0) += 1;
        }
    }

    let earliest = parsed.iter().min().copied();
    let latest = parsed.iter().max().copied();
    let span_days = match (earliest, latest) {
        (Some(lo), Some(hi)) => Some((hi - lo).num_seconds() as f64 / 86_400.0),
        _ => None,
    };
    let mut formats: Vec<FormatCount> = formats
        .into_iter()
        .map(|(format, count)| FormatCount { format, count })
        .collect();
    formats.sort_by(|a, b| b.count.cmp(&a.count).then(a.format.cmp(&b.format)));

    DatetimeStats {
        parsed_count: parsed.len(),
        unparsed_count: values.len() - parsed.len(),
        earliest,
        latest,
        span_days,
        formats,
    }
}

fn boolean_stats(column: &Column) -> BooleanStats {
    let values = column.bool_values().unwrap_or_default();
    let true_count = values.iter().filter(|&&v| v).count();
    BooleanStats {
        true_count,
        false_count: values.len() - true_count,
        true_ratio: (!values.is_empty()).then(|| true_count as f64 / values.len() as f64),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
