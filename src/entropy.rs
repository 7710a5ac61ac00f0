//! Frequency tables and Shannon-entropy diversity.
//!
//! ```
//! use u_profile::entropy::{entropy_summary, Diversity, FrequencyTable};
//!
//! let table = FrequencyTable::from_keys(["a", "a", "a", "b"]);
//! assert_eq!(table.mode(), Some(("a", 3)));
//! let e = entropy_summary(&table);
//! assert!((e.entropy - 0.811_278_124_459_132_9).abs() < 1e-12);
//! assert_eq!(e.diversity, Diversity::High);
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dataframe::{Column, StorageType};

// ── FrequencyTable ────────────────────────────────────────────────────

/// Distinct values with their counts, most frequent first.
///
/// Ties are broken by ascending value so the order is deterministic:
/// numeric columns order tied values numerically (9 before 10), all other
/// keys compare as text. Missing entries are counted separately and never
/// appear as a category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrequencyTable {
    entries: Vec<(String, usize)>,
    missing: usize,
}

impl FrequencyTable {
    pub fn from_keys<S, I>(keys: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for key in keys {
            *counts.entry(key.into()).or_insert(0) += 1;
        }
        let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Self {
            entries,
            missing: 0,
        }
    }

    /// Counts the present values of any column by their canonical key.
    pub fn from_column(column: &Column) -> Self {
        let mut table = Self::from_keys(column.value_keys()).with_missing(column.missing_count());
        match column.storage_type() {
            StorageType::Integer => table.break_ties(|a, b| {
                a.parse::<i64>().ok().cmp(&b.parse::<i64>().ok())
            }),
            StorageType::Float => table.break_ties(|a, b| {
                let parse = |k: &str| k.parse::<f64>().unwrap_or(f64::NAN);
                parse(a).total_cmp(&parse(b))
            }),
            StorageType::Boolean | StorageType::Text => {}
        }
        table
    }

    fn break_ties(&mut self, by: impl Fn(&str, &str) -> Ordering) {
        self.entries
            .sort_by(|a, b| b.1.cmp(&a.1).then_with(|| by(&a.0, &b.0)));
    }

    pub fn with_missing(mut self, missing: usize) -> Self {
        self.missing = missing;
        self
    }

    pub fn entries(&self) -> &[(String, usize)] {
        &self.entries
    }

    pub fn distinct_count(&self) -> usize {
        self.entries.len()
    }

    /// Sum of all category counts.
    pub fn non_missing_count(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn missing_count(&self) -> usize {
        self.missing
    }

    /// Sum of counts when missing is treated as one more category.
    pub fn total_with_missing(&self) -> usize {
        self.non_missing_count() + self.missing
    }

    /// Most frequent value (smallest value on ties).
    pub fn mode(&self) -> Option<(&str, usize)> {
        self.entries.first().map(|(v, c)| (v.as_str(), *c))
    }

    pub fn top(&self, n: usize) -> &[(String, usize)] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Entropy ───────────────────────────────────────────────────────────

/// Diversity bucket from normalized entropy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diversity {
    /// At most one distinct value.
    None,
    Low,
    Moderate,
    High,
}

impl std::fmt::Display for Diversity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::None => "No diversity",
            Self::Low => "Low diversity",
            Self::Moderate => "Moderate diversity",
            Self::High => "High diversity",
        })
    }
}

/// Entropy of a frequency table in bits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntropySummary {
    pub entropy: f64,
    /// `log2(distinct_count)`, 0 for one or no category.
    pub max_entropy: f64,
    /// `entropy / max_entropy`, 0 for one or no category.
    pub normalized: f64,
    pub diversity: Diversity,
}

/// `H = -Σ p·log2(p)` over the non-missing categories.
pub fn shannon_entropy(table: &FrequencyTable) -> f64 {
    let total = table.non_missing_count() as f64;
    if total == 0.0 {
        return 0.0;
    }
    let h: f64 = table
        .entries()
        .iter()
        .filter(|(_, c)| *c > 0)
        .map(|(_, c)| {
            let p = *c as f64 / total;
            p * p.log2()
        })
        .sum();
    // avoid reporting -0.0 for a single category
    (-h).max(0.0)
}

pub fn entropy_summary(table: &FrequencyTable) -> EntropySummary {
    let distinct = table.distinct_count();
    let entropy = shannon_entropy(table);
    if distinct <= 1 {
        return EntropySummary {
            entropy,
            max_entropy: 0.0,
            normalized: 0.0,
            diversity: Diversity::None,
        };
    }
    let max_entropy = (distinct as f64).log2();
    let normalized = (entropy / max_entropy).clamp(0.0, 1.0);
    let diversity = if normalized < 0.3 {
        Diversity::Low
    } else if normalized < 0.7 {
        Diversity::Moderate
    } else {
        Diversity::High
    };
    EntropySummary {
        entropy,
        max_entropy,
        normalized,
        diversity,
    }
}
