//! Typed columns and a named-column table.
//!
//! A [`Column`] is an ordered sample of scalar values with a declared
//! [`StorageType`]. Missing entries are tagged in a [`ValidityBitmap`]
//! rather than dropped, so `len() == non_missing_count() + missing_count()`
//! always holds.
//!
//! | Storage | Values | Missing slot holds |
//! |---------|--------|--------------------|
//! | [`Integer`](StorageType::Integer) | `Vec<i64>` | `0` |
//! | [`Float`](StorageType::Float) | `Vec<f64>` | `0.0` |
//! | [`Boolean`](StorageType::Boolean) | `Vec<bool>` | `false` |
//! | [`Text`](StorageType::Text) | `Vec<String>` | `""` |
//!
//! # Example
//!
//! ```
//! use u_profile::dataframe::{Column, DataFrame};
//!
//! let mut df = DataFrame::new();
//! df.add_column("temperature", Column::float([Some(20.5), None, Some(f64::NAN)]))
//!     .unwrap();
//! let col = df.require_column("temperature").unwrap();
//! assert_eq!(col.len(), 3);
//! assert_eq!(col.missing_count(), 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ProfileError;

// ── ValidityBitmap ────────────────────────────────────────────────────

/// One bit per row: set means the row holds a value, clear means missing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidityBitmap {
    words: Vec<u64>,
    len: usize,
}

#[inline]
fn locate(idx: usize) -> (usize, u64) {
    (idx / 64, 1u64 << (idx % 64))
}

impl ValidityBitmap {
    /// Bitmap of `len` rows, all present.
    pub fn all_valid(len: usize) -> Self {
        let mut bitmap = Self::all_missing(len);
        for word in bitmap.words.iter_mut() {
            *word = u64::MAX;
        }
        if len % 64 != 0 {
            if let Some(last) = bitmap.words.last_mut() {
                *last = (1u64 << (len % 64)) - 1;
            }
        }
        bitmap
    }

    /// Bitmap of `len` rows, all missing.
    pub fn all_missing(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
        }
    }

    /// Builds a bitmap from per-row presence flags.
    pub fn from_flags<I: IntoIterator<Item = bool>>(flags: I) -> Self {
        let mut bitmap = Self::default();
        for flag in flags {
            bitmap.push(flag);
        }
        bitmap
    }

    #[inline]
    pub fn is_valid(&self, idx: usize) -> bool {
        debug_assert!(idx < self.len, "row {idx} out of bounds (len={})", self.len);
        let (word, mask) = locate(idx);
        self.words[word] & mask != 0
    }

    #[inline]
    pub fn set_valid(&mut self, idx: usize) {
        let (word, mask) = locate(idx);
        self.words[word] |= mask;
    }

    #[inline]
    pub fn set_missing(&mut self, idx: usize) {
        let (word, mask) = locate(idx);
        self.words[word] &= !mask;
    }

    /// Appends one row.
    pub fn push(&mut self, valid: bool) {
        let (word, mask) = locate(self.len);
        if word == self.words.len() {
            self.words.push(0);
        }
        if valid {
            self.words[word] |= mask;
        }
        self.len += 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of present rows (popcount over the words).
    pub fn valid_count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Number of missing rows.
    pub fn missing_count(&self) -> usize {
        self.len - self.valid_count()
    }

    /// Indices of present rows in ascending order.
    pub fn valid_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&i| self.is_valid(i))
    }
}

// ── StorageType ───────────────────────────────────────────────────────

/// Declared physical type of a column's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageType {
    Integer,
    Float,
    Boolean,
    Text,
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Text => "text",
        };
        f.write_str(name)
    }
}

// ── Column ────────────────────────────────────────────────────────────

/// A typed sample with explicit missing-value tagging.
///
/// Prefer the option-based constructors ([`Column::integer`],
/// [`Column::float`], [`Column::boolean`], [`Column::text`]); they keep
/// the values and the bitmap aligned and record `NaN` as missing.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Integer {
        values: Vec<i64>,
        validity: ValidityBitmap,
    },
    Float {
        values: Vec<f64>,
        validity: ValidityBitmap,
    },
    Boolean {
        values: Vec<bool>,
        validity: ValidityBitmap,
    },
    Text {
        values: Vec<String>,
        validity: ValidityBitmap,
    },
}

fn split_options<T: Default, I: IntoIterator<Item = Option<T>>>(
    items: I,
) -> (Vec<T>, ValidityBitmap) {
    let mut values = Vec::new();
    let mut validity = ValidityBitmap::default();
    for item in items {
        validity.push(item.is_some());
        values.push(item.unwrap_or_default());
    }
    (values, validity)
}

impl Column {
    pub fn integer<I: IntoIterator<Item = Option<i64>>>(items: I) -> Self {
        let (values, validity) = split_options(items);
        Self::Integer { values, validity }
    }

    /// Float column; `None` and `NaN` are both recorded as missing.
    /// Infinities are kept as present values.
    pub fn float<I: IntoIterator<Item = Option<f64>>>(items: I) -> Self {
        let (values, validity) =
            split_options(items.into_iter().map(|v| v.filter(|x| !x.is_nan())));
        Self::Float { values, validity }
    }

    pub fn boolean<I: IntoIterator<Item = Option<bool>>>(items: I) -> Self {
        let (values, validity) = split_options(items);
        Self::Boolean { values, validity }
    }

    pub fn text<S: Into<String>, I: IntoIterator<Item = Option<S>>>(items: I) -> Self {
        let (values, validity) = split_options(items.into_iter().map(|v| v.map(Into::into)));
        Self::Text { values, validity }
    }

    /// Dense float column; `NaN` entries become missing.
    pub fn from_f64s<I: IntoIterator<Item = f64>>(values: I) -> Self {
        Self::float(values.into_iter().map(Some))
    }

    /// Dense text column with every entry present.
    pub fn from_strs<S: AsRef<str>>(values: &[S]) -> Self {
        Self::text(values.iter().map(|s| Some(s.as_ref().to_string())))
    }

    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::Integer { .. } => StorageType::Integer,
            Self::Float { .. } => StorageType::Float,
            Self::Boolean { .. } => StorageType::Boolean,
            Self::Text { .. } => StorageType::Text,
        }
    }

    pub fn validity(&self) -> &ValidityBitmap {
        match self {
            Self::Integer { validity, .. }
            | Self::Float { validity, .. }
            | Self::Boolean { validity, .. }
            | Self::Text { validity, .. } => validity,
        }
    }

    /// Total number of entries, missing included.
    pub fn len(&self) -> usize {
        self.validity().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn missing_count(&self) -> usize {
        self.validity().missing_count()
    }

    pub fn non_missing_count(&self) -> usize {
        self.validity().valid_count()
    }

    pub fn is_valid(&self, idx: usize) -> bool {
        self.validity().is_valid(idx)
    }

    /// `(row, value)` pairs of Integer/Float storage widened to `f64`.
    /// Infinities are included. `None` for Boolean and Text.
    pub fn numeric_rows(&self) -> Option<Vec<(usize, f64)>> {
        match self {
            Self::Integer { values, validity } => Some(
                validity
                    .valid_indices()
                    .map(|i| (i, values[i] as f64))
                    .collect(),
            ),
            Self::Float { values, validity } => Some(
                validity
                    .valid_indices()
                    .map(|i| (i, values[i]))
                    .filter(|(_, v)| !v.is_nan())
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Present values of Integer/Float storage in row order.
    pub fn numeric_values(&self) -> Option<Vec<f64>> {
        self.numeric_rows()
            .map(|rows| rows.into_iter().map(|(_, v)| v).collect())
    }

    /// Present values of Boolean storage.
    pub fn bool_values(&self) -> Option<Vec<bool>> {
        match self {
            Self::Boolean { values, validity } => {
                Some(validity.valid_indices().map(|i| values[i]).collect())
            }
            _ => None,
        }
    }

    /// Present values of Text storage, borrowed.
    pub fn text_values(&self) -> Option<Vec<&str>> {
        match self {
            Self::Text { values, validity } => {
                Some(validity.valid_indices().map(|i| values[i].as_str()).collect())
            }
            _ => None,
        }
    }

    pub fn text_at(&self, idx: usize) -> Option<&str> {
        match self {
            Self::Text { values, validity } if validity.is_valid(idx) => Some(&values[idx]),
            _ => None,
        }
    }

    /// Canonical string key of the value at `idx`, used to count
    /// categories regardless of storage. `None` when missing.
    pub fn value_key(&self, idx: usize) -> Option<String> {
        if !self.is_valid(idx) {
            return None;
        }
        Some(match self {
            Self::Integer { values, .. } => values[idx].to_string(),
            Self::Float { values, .. } => {
                let v = values[idx];
                // -0.0 and 0.0 are the same category
                if v == 0.0 {
                    "0".to_string()
                } else {
                    v.to_string()
                }
            }
            Self::Boolean { values, .. } => values[idx].to_string(),
            Self::Text { values, .. } => values[idx].clone(),
        })
    }

    /// Keys of all present values in row order.
    pub fn value_keys(&self) -> Vec<String> {
        self.validity()
            .valid_indices()
            .filter_map(|i| self.value_key(i))
            .collect()
    }
}

// ── DataFrame ─────────────────────────────────────────────────────────

/// Named columns of equal length.
#[derive(Debug, Clone, Default)]
pub struct DataFrame {
    names: Vec<String>,
    columns: Vec<Column>,
    row_count: usize,
}

impl DataFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column. The first column fixes the row count; later
    /// columns of a different length are rejected.
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        column: Column,
    ) -> Result<(), ProfileError> {
        if self.columns.is_empty() {
            self.row_count = column.len();
        } else if column.len() != self.row_count {
            return Err(ProfileError::DimensionMismatch {
                expected: self.row_count,
                actual: column.len(),
            });
        }
        self.names.push(name.into());
        self.columns.push(column);
        Ok(())
    }

    /// Builder form of [`add_column`](Self::add_column).
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        column: Column,
    ) -> Result<Self, ProfileError> {
        self.add_column(name, column)?;
        Ok(self)
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
    }

    /// Like [`column`](Self::column) but fails with
    /// [`ProfileError::ColumnNotFound`].
    pub fn require_column(&self, name: &str) -> Result<&Column, ProfileError> {
        self.column(name).ok_or_else(|| ProfileError::ColumnNotFound {
            name: name.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    pub fn schema(&self) -> Vec<(&str, StorageType)> {
        self.iter().map(|(n, c)| (n, c.storage_type())).collect()
    }

    pub fn total_missing_count(&self) -> usize {
        self.columns.iter().map(Column::missing_count).sum()
    }
}
