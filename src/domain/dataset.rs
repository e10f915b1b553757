use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Name of the timestamp column in every table.
pub const TIME_COLUMN: &str = "Time";

/// Column-oriented table of samples keyed by timestamp.
///
/// Every column has exactly one entry per timestamp; `None` marks a missing
/// sample. NaN values are treated as missing on read.
///
/// Serializes as `{"Time": [...], "<column>": [...], ...}`. Deserializing a
/// column whose length differs from `Time` fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Dataset {
    #[serde(rename = "Time")]
    time: Vec<DateTime<Utc>>,
    #[serde(flatten)]
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("column {column} has {len} values for {rows} timestamps")]
pub struct MisalignedColumn {
    pub column: String,
    pub len: usize,
    pub rows: usize,
}

/// Wire shape of a table before the column lengths are checked
#[derive(Deserialize)]
struct RawTable {
    #[serde(rename = "Time")]
    time: Vec<DateTime<Utc>>,
    #[serde(flatten)]
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl TryFrom<RawTable> for Dataset {
    type Error = MisalignedColumn;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        let rows = raw.time.len();
        if let Some((column, values)) = raw.columns.iter().find(|(_, v)| v.len() != rows) {
            return Err(MisalignedColumn {
                column: column.clone(),
                len: values.len(),
                rows,
            });
        }
        Ok(Self {
            time: raw.time,
            columns: raw.columns,
        })
    }
}

impl Dataset {
    /// Create a table with a time index and no value columns
    pub fn new(time: Vec<DateTime<Utc>>) -> Self {
        Self {
            time,
            columns: BTreeMap::new(),
        }
    }

    /// Builder variant of [`Dataset::insert_column`]
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        self.insert_column(name, values);
        self
    }

    /// Insert or replace a column. Values are padded with `None` or truncated
    /// to the number of rows.
    pub fn insert_column(&mut self, name: impl Into<String>, mut values: Vec<Option<f64>>) {
        values.resize(self.time.len(), None);
        self.columns.insert(name.into(), values);
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.time
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Value at `row` in column `name`, or `None` if absent, missing or NaN
    pub fn value(&self, name: &str, row: usize) -> Option<f64> {
        self.columns
            .get(name)
            .and_then(|column| column.get(row).copied().flatten())
            .filter(|v| !v.is_nan())
    }

    /// Mark the given columns as missing for one row
    pub fn set_missing(&mut self, row: usize, names: &[&str]) {
        for name in names {
            if let Some(slot) = self.columns.get_mut(*name).and_then(|c| c.get_mut(row)) {
                *slot = None;
            }
        }
    }

    /// Keep only the rows for which `keep(row_index)` is true
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(usize) -> bool,
    {
        let mask: Vec<bool> = (0..self.len()).map(&mut keep).collect();
        let mut index = 0;
        self.time.retain(|_| {
            let k = mask[index];
            index += 1;
            k
        });
        for column in self.columns.values_mut() {
            let mut index = 0;
            column.retain(|_| {
                let k = mask[index];
                index += 1;
                k
            });
        }
    }

    /// New table holding the time index and the named columns.
    /// Columns that do not exist are emitted as all-missing.
    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> Dataset {
        let mut projected = Dataset::new(self.time.clone());
        for name in names {
            let name = name.as_ref();
            let values = self
                .columns
                .get(name)
                .cloned()
                .unwrap_or_else(|| vec![None; self.len()]);
            projected.insert_column(name, values);
        }
        projected
    }

    /// Columns in which no row holds a value
    pub fn all_missing_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|(_, values)| values.iter().all(|v| v.map_or(true, f64::is_nan)))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Samples of one column with their timestamps, skipping missing values
    pub fn present_samples<'a>(
        &'a self,
        name: &str,
    ) -> impl Iterator<Item = (DateTime<Utc>, f64)> + 'a {
        let column = self.columns.get(name);
        self.time.iter().enumerate().filter_map(move |(row, t)| {
            column
                .and_then(|c| c.get(row).copied().flatten())
                .filter(|v| !v.is_nan())
                .map(|v| (*t, v))
        })
    }
}
