use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{Dataset, Tag};
use crate::error::{NormalizationError, Result};

/// Baseline as supplied by a caller: tag name -> arbitrary JSON value
pub type RawBaseline = BTreeMap<String, Value>;

/// Reference operating snapshot used to normalize every row of a request.
///
/// Holds a value slot for each required tag; a slot may be `None` when the
/// sensor had no usable sample around the baseline instant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BaselineRecord {
    pub time: Option<DateTime<Utc>>,
    pub values: BTreeMap<String, Option<f64>>,
}

impl BaselineRecord {
    pub fn new(time: Option<DateTime<Utc>>) -> Self {
        Self {
            time,
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, tag: Tag, value: Option<f64>) -> Self {
        self.values.insert(tag.name().to_string(), value);
        self
    }

    pub fn value(&self, tag: Tag) -> Option<f64> {
        self.values.get(tag.name()).copied().flatten()
    }

    /// Build a record from a caller-supplied baseline.
    ///
    /// Fails with `MissingBaselineTag` when a required tag is absent. With
    /// `strict`, non-numeric values fail with `InvalidBaselineValues`;
    /// otherwise numeric strings are parsed and anything else becomes null.
    pub fn from_raw(raw: &RawBaseline, time: Option<DateTime<Utc>>, strict: bool) -> Result<Self> {
        if strict {
            validate_strict(raw)?;
        } else {
            validate(raw)?;
        }
        let values = raw
            .iter()
            .map(|(tag, value)| (tag.clone(), numeric(value)))
            .collect();
        Ok(Self { time, values })
    }

    /// Check that every required tag has a slot
    pub fn validate(&self) -> Result<()> {
        check_required(self.values.keys().map(String::as_str))
    }

    /// Single-row dataset holding the baseline values
    pub fn to_dataset(&self) -> Dataset {
        let time = self.time.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        self.values
            .iter()
            .fold(Dataset::new(vec![time]), |ds, (tag, value)| {
                ds.with_column(tag.clone(), vec![*value])
            })
    }
}

/// Validate a caller-supplied baseline: every required tag must be present,
/// null values are accepted.
pub fn validate(raw: &RawBaseline) -> Result<()> {
    check_required(raw.keys().map(String::as_str))
}

/// Like [`validate`], and additionally reject values that are neither null nor
/// a JSON number.
pub fn validate_strict(raw: &RawBaseline) -> Result<()> {
    validate(raw)?;
    let invalid: Vec<String> = Tag::required()
        .filter(|tag| {
            raw.get(tag.name())
                .is_some_and(|v| !(v.is_null() || v.is_number()))
        })
        .map(|tag| tag.name().to_string())
        .collect();
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(NormalizationError::InvalidBaselineValues(invalid))
    }
}

fn check_required<'a>(present: impl Iterator<Item = &'a str>) -> Result<()> {
    let present: Vec<&str> = present.collect();
    let missing: Vec<String> = Tag::required()
        .filter(|tag| !present.contains(&tag.name()))
        .map(|tag| tag.name().to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(NormalizationError::MissingBaselineTag(missing))
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| !v.is_nan())
}
