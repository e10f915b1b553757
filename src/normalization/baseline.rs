use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::catalog::BaselineScalar;
use super::evaluator::RowEvaluator;
use crate::acquisition::{take_response, SeriesRequest, TimeseriesSource};
use crate::domain::{missing_from_mapping, BaselineRecord, Dataset, Tag, TagMapping};
use crate::error::{NormalizationError, Result};

/// Half-width of the window fetched around a baseline instant
pub const BASELINE_WINDOW_MINUTES: i64 = 30;
/// Request name used for baseline fetches
pub const BASELINE_REQUEST_NAME: &str = "baseline";

/// Reference values derived once from a baseline record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BaselineScalars(BTreeMap<BaselineScalar, f64>);

impl BaselineScalars {
    /// Evaluate the requested scalars on the baseline record treated as a
    /// one-row dataset.
    pub fn derive(
        record: &BaselineRecord,
        scalars: impl IntoIterator<Item = BaselineScalar>,
    ) -> Self {
        let dataset = record.to_dataset();
        let mut evaluator = RowEvaluator::new(&dataset, None);
        let values = scalars
            .into_iter()
            .map(|scalar| {
                let value = evaluator
                    .evaluate(scalar.quantity())
                    .first()
                    .copied()
                    .unwrap_or_default();
                (scalar, value)
            })
            .collect();
        let scalars = Self(values);
        debug!(?scalars, "derived baseline scalars");
        scalars
    }

    pub fn get(&self, scalar: BaselineScalar) -> Option<f64> {
        self.0.get(&scalar).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(BaselineScalar, f64)> for BaselineScalars {
    fn from_iter<I: IntoIterator<Item = (BaselineScalar, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Extracts a baseline record from history around a given instant
pub struct BaselineResolver<'s, S: ?Sized> {
    source: &'s S,
    group_interval_seconds: u32,
}

impl<'s, S> BaselineResolver<'s, S>
where
    S: TimeseriesSource + ?Sized,
{
    pub fn new(source: &'s S) -> Self {
        Self {
            source,
            group_interval_seconds: crate::acquisition::DEFAULT_GROUP_INTERVAL_SECONDS,
        }
    }

    pub fn with_group_interval(mut self, seconds: u32) -> Self {
        self.group_interval_seconds = seconds;
        self
    }

    /// Fetch ±30 minutes around `instant` and take, per required tag, the
    /// present sample nearest to `instant`. Tags without any sample resolve to
    /// null.
    pub async fn resolve(
        &self,
        system_id: Option<&str>,
        mapping: &TagMapping,
        instant: DateTime<Utc>,
        timezone: Option<Tz>,
    ) -> Result<BaselineRecord> {
        let system_id = system_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(NormalizationError::SystemIdNotConfigured)?;

        let missing = missing_from_mapping(mapping);
        if !missing.is_empty() {
            return Err(NormalizationError::MissingMappingTag(missing));
        }

        let window = Duration::minutes(BASELINE_WINDOW_MINUTES);
        let request = Tag::required()
            .fold(
                SeriesRequest::new(
                    BASELINE_REQUEST_NAME,
                    system_id,
                    instant - window,
                    instant + window,
                ),
                |request, tag| request.with_tag(tag.name(), mapping[tag.name()].as_str()),
            )
            .with_group_interval(self.group_interval_seconds)
            .with_timezone(timezone);

        let responses = self.source.get_data(vec![request]).await?;
        let data = take_response(responses, BASELINE_REQUEST_NAME).unwrap_or_default();
        if data.is_empty() {
            warn!(
                system_id,
                %instant,
                "no baseline data around instant, all baseline values are null"
            );
        }

        let mut record = BaselineRecord::new(Some(instant));
        let mut absent = Vec::new();
        for tag in Tag::required() {
            let value = nearest_sample(&data, tag.name(), instant);
            if value.is_none() {
                absent.push(tag.name());
            }
            record = record.with_value(tag, value);
        }

        if !absent.is_empty() && !data.is_empty() {
            warn!(
                system_id,
                tags = %absent.join(" "),
                "baseline tags contain no data - please check tag mapping and baseline time"
            );
        }
        Ok(record)
    }
}

/// Value of the present sample closest to `instant`; the earlier sample wins
/// a tie.
pub fn nearest_sample(data: &Dataset, column: &str, instant: DateTime<Utc>) -> Option<f64> {
    data.present_samples(column)
        .min_by_key(|(t, _)| ((*t - instant).num_milliseconds().abs(), *t))
        .map(|(_, value)| value)
}
