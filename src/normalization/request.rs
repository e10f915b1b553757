use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::acquisition::DEFAULT_GROUP_INTERVAL_SECONDS;
use crate::domain::{default_tag_mapping, FilterBounds, FilterMode, NormalizedMetric, TagMapping};
use crate::error::{NormalizationError, Result};

fn default_group_interval() -> u32 {
    DEFAULT_GROUP_INTERVAL_SECONDS
}

/// Parameters of one normalization run. Immutable for the duration of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NormalizationRequest {
    #[validate(length(min = 1, message = "system_id must not be empty"))]
    pub system_id: String,
    #[serde(default = "default_tag_mapping")]
    pub mapping: TagMapping,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default = "default_group_interval")]
    #[validate(range(min = 1, message = "group interval must be at least one second"))]
    pub group_interval_seconds: u32,
    #[validate(length(min = 1, message = "at least one metric must be requested"))]
    pub metrics: Vec<NormalizedMetric>,
    /// Tags passed through to the result unchanged
    #[serde(default)]
    pub extra_tags: Vec<String>,
    #[serde(default)]
    pub filters: FilterBounds,
    #[serde(default)]
    pub filter_mode: FilterMode,
    #[serde(default)]
    pub timezone: Option<Tz>,
}

impl NormalizationRequest {
    pub fn new(
        system_id: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        metrics: Vec<NormalizedMetric>,
    ) -> Self {
        Self {
            system_id: system_id.into(),
            mapping: default_tag_mapping(),
            start,
            end,
            group_interval_seconds: DEFAULT_GROUP_INTERVAL_SECONDS,
            metrics,
            extra_tags: Vec::new(),
            filters: FilterBounds::default(),
            filter_mode: FilterMode::default(),
            timezone: None,
        }
    }

    pub fn with_mapping(mut self, mapping: TagMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn with_extra_tags(mut self, tags: Vec<String>) -> Self {
        self.extra_tags = tags;
        self
    }

    pub fn with_filters(mut self, filters: FilterBounds, mode: FilterMode) -> Self {
        self.filters = filters;
        self.filter_mode = mode;
        self
    }

    pub fn with_group_interval(mut self, seconds: u32) -> Self {
        self.group_interval_seconds = seconds;
        self
    }

    /// Field validation plus the `start < end` window check
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        if self.start >= self.end {
            return Err(NormalizationError::InvalidConfig(format!(
                "start {} must be before end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }

    /// Sensor id for an extra tag: its mapping entry, or the name itself
    pub fn sensor_for<'a>(&'a self, tag: &'a str) -> &'a str {
        self.mapping.get(tag).map(String::as_str).unwrap_or(tag)
    }
}
