//! Data acquisition collaborator
//!
//! The engine only needs tabular samples for a set of tags over a window; the
//! time-series database behind it is an implementation detail of a
//! [`TimeseriesSource`].

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

use crate::domain::Dataset;

#[cfg(feature = "http")]
pub mod http;
pub mod memory;

#[cfg(feature = "http")]
pub use http::HttpTimeseriesSource;
pub use memory::MemoryTimeseriesSource;

/// Default aggregation applied within each group interval
pub const DEFAULT_AGGREGATION: Aggregation = Aggregation::Mean;
/// Default group interval in seconds
pub const DEFAULT_GROUP_INTERVAL_SECONDS: u32 = 10;

/// Aggregation function applied per group interval
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Mean,
    Median,
    Min,
    Max,
    Last,
}

/// One tag of a request: which sensor to read and how to aggregate it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagQuery {
    pub sensor_id: String,
    pub aggregation: Aggregation,
}

/// Request for grouped samples of several tags of one system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRequest {
    pub name: String,
    pub system_id: String,
    /// Logical tag name -> sensor query
    pub tags: BTreeMap<String, TagQuery>,
    pub group_interval_seconds: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<Tz>,
}

impl SeriesRequest {
    pub fn new(
        name: impl Into<String>,
        system_id: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            system_id: system_id.into(),
            tags: BTreeMap::new(),
            group_interval_seconds: DEFAULT_GROUP_INTERVAL_SECONDS,
            start,
            end,
            timezone: None,
        }
    }

    pub fn with_tag(mut self, logical: impl Into<String>, sensor_id: impl Into<String>) -> Self {
        self.tags.insert(
            logical.into(),
            TagQuery {
                sensor_id: sensor_id.into(),
                aggregation: DEFAULT_AGGREGATION,
            },
        );
        self
    }

    pub fn with_group_interval(mut self, seconds: u32) -> Self {
        self.group_interval_seconds = seconds;
        self
    }

    pub fn with_timezone(mut self, timezone: Option<Tz>) -> Self {
        self.timezone = timezone;
        self
    }
}

/// Result of one [`SeriesRequest`]; `data` has one column per logical tag.
/// An empty table means no data for the whole request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesResponse {
    pub name: String,
    pub data: Dataset,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimeseriesSource: Send + Sync {
    async fn get_data(&self, requests: Vec<SeriesRequest>) -> Result<Vec<SeriesResponse>>;
}

/// Pick the response matching `name` out of a batch
pub fn take_response(responses: Vec<SeriesResponse>, name: &str) -> Option<Dataset> {
    responses
        .into_iter()
        .find(|response| response.name == name)
        .map(|response| response.data)
}
