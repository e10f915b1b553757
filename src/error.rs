use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced to callers of the normalization engine.
///
/// Numeric failures inside a single formula are not represented here; those
/// degrade to [`crate::normalization::DEGRADED_VALUE`] at the row level.
#[derive(Debug, Error)]
pub enum NormalizationError {
    #[error("No system id configured for baseline resolution")]
    SystemIdNotConfigured,

    #[error("Empty timeseries result: {0}")]
    EmptyTimeseriesResult(String),

    #[error("Baseline is missing required tags: {}", .0.join(", "))]
    MissingBaselineTag(Vec<String>),

    #[error("Tag mapping is missing required tags: {}", .0.join(", "))]
    MissingMappingTag(Vec<String>),

    #[error("Baseline contains non-numeric values for tags: {}", .0.join(", "))]
    InvalidBaselineValues(Vec<String>),

    #[error("No timeseries data found for system {system_id} between {start} and {end}")]
    NoTimeseriesDataFound {
        system_id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Invalid normalization config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Acquisition(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for NormalizationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        NormalizationError::InvalidConfig(errors.to_string())
    }
}

pub type Result<T, E = NormalizationError> = std::result::Result<T, E>;
