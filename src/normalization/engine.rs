use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::baseline::{BaselineResolver, BaselineScalars};
use super::catalog::{BaselineScalar, Quantity};
use super::evaluator::{ColumnCache, RowEvaluator};
use super::filter::{QualityFilter, QualitySummary};
use super::request::NormalizationRequest;
use crate::acquisition::{take_response, SeriesRequest, TimeseriesSource};
use crate::domain::{missing_from_mapping, BaselineRecord, Dataset, Tag};
use crate::error::{NormalizationError, Result};

/// Request name used for the main dataset fetch
pub const NORMALIZATION_REQUEST_NAME: &str = "normalization";

/// Everything one run produced, for callers that want more than the table
#[derive(Debug, Clone)]
pub struct NormalizationReport {
    /// `Time`, the requested metrics and extra tags; `None` when filtering
    /// left no rows
    pub table: Option<Dataset>,
    pub summary: QualitySummary,
    pub removed_rows: usize,
    pub nulled_rows: usize,
    pub scalars: BaselineScalars,
    /// Computed columns of the run, with per-column computation counts
    pub columns: ColumnCache,
}

/// Coordinates fetch, filtering and metric evaluation for one system
pub struct NormalizationEngine {
    source: Arc<dyn TimeseriesSource>,
}

impl NormalizationEngine {
    pub fn new(source: Arc<dyn TimeseriesSource>) -> Self {
        Self { source }
    }

    /// Resolve a baseline for `request`'s system from history around `instant`
    pub async fn resolve_baseline(
        &self,
        request: &NormalizationRequest,
        instant: DateTime<Utc>,
    ) -> Result<BaselineRecord> {
        BaselineResolver::new(self.source.as_ref())
            .with_group_interval(request.group_interval_seconds)
            .resolve(Some(&request.system_id), &request.mapping, instant, request.timezone)
            .await
    }

    /// Run a normalization and return the projected result table, or `None`
    /// when no row survives the quality filter.
    pub async fn run(
        &self,
        request: &NormalizationRequest,
        baseline: &BaselineRecord,
    ) -> Result<Option<Dataset>> {
        Ok(self.run_report(request, baseline).await?.table)
    }

    pub async fn run_report(
        &self,
        request: &NormalizationRequest,
        baseline: &BaselineRecord,
    ) -> Result<NormalizationReport> {
        request.check()?;
        baseline.validate()?;
        let missing = missing_from_mapping(&request.mapping);
        if !missing.is_empty() {
            return Err(NormalizationError::MissingMappingTag(missing));
        }

        let raw = self.fetch(request).await?;

        let filter = QualityFilter::new(request.filters, request.filter_mode);
        let outcome = filter.apply(raw);
        let scalars = BaselineScalars::derive(baseline, required_scalars(request));

        if outcome.dataset.is_empty() {
            warn!(
                system_id = %request.system_id,
                start = %request.start,
                end = %request.end,
                "no rows left after quality filtering"
            );
            return Ok(NormalizationReport {
                table: None,
                summary: outcome.summary,
                removed_rows: outcome.removed,
                nulled_rows: outcome.nulled,
                scalars,
                columns: ColumnCache::default(),
            });
        }

        let data = outcome.dataset;
        let mut evaluator = RowEvaluator::new(&data, Some(&scalars));
        for metric in &request.metrics {
            debug!(metric = %metric, "evaluating normalized metric");
            evaluator.evaluate(Quantity::from(*metric));
        }

        let table = project(&data, &evaluator, request, &outcome.invalidated);
        info!(
            system_id = %request.system_id,
            rows = table.len(),
            metrics = request.metrics.len(),
            columns_computed = evaluator.cache().total_computations(),
            "normalization complete"
        );

        Ok(NormalizationReport {
            table: Some(table),
            summary: outcome.summary,
            removed_rows: outcome.removed,
            nulled_rows: outcome.nulled,
            columns: evaluator.into_cache(),
            scalars,
        })
    }

    async fn fetch(&self, request: &NormalizationRequest) -> Result<Dataset> {
        let series = Tag::required()
            .map(|tag| (tag.name(), request.mapping[tag.name()].as_str()))
            .chain(request.extra_tags.iter().map(|t| (t.as_str(), request.sensor_for(t))))
            .fold(
                SeriesRequest::new(
                    NORMALIZATION_REQUEST_NAME,
                    request.system_id.as_str(),
                    request.start,
                    request.end,
                ),
                |series, (logical, sensor)| series.with_tag(logical, sensor),
            )
            .with_group_interval(request.group_interval_seconds)
            .with_timezone(request.timezone);

        let responses = self.source.get_data(vec![series]).await?;
        let data = take_response(responses, NORMALIZATION_REQUEST_NAME).ok_or_else(|| {
            NormalizationError::NoTimeseriesDataFound {
                system_id: request.system_id.clone(),
                start: request.start,
                end: request.end,
            }
        })?;

        if data.is_empty() {
            return Err(NormalizationError::EmptyTimeseriesResult(format!(
                "no data for system {} between {} and {}",
                request.system_id, request.start, request.end
            )));
        }

        let empty_columns = data.all_missing_columns();
        if !empty_columns.is_empty() {
            warn!(
                system_id = %request.system_id,
                tags = %empty_columns.join(" "),
                "the following tags contain no data - please check tag mapping and time range"
            );
        }
        Ok(data)
    }
}

/// Baseline scalars needed by any requested metric
fn required_scalars(request: &NormalizationRequest) -> BTreeSet<BaselineScalar> {
    request
        .metrics
        .iter()
        .flat_map(|metric| Quantity::from(*metric).required_baseline_scalars())
        .collect()
}

/// `Time` + requested metric columns + extra pass-through tags.
/// Metrics of `invalidated` rows are left missing.
fn project(
    data: &Dataset,
    evaluator: &RowEvaluator<'_>,
    request: &NormalizationRequest,
    invalidated: &[usize],
) -> Dataset {
    let mut table = data.project(&request.extra_tags);
    for metric in &request.metrics {
        let mut values: Vec<Option<f64>> = evaluator
            .cache()
            .column(Quantity::from(*metric))
            .map(|column| column.iter().copied().map(Some).collect())
            .unwrap_or_default();
        for &row in invalidated {
            if let Some(slot) = values.get_mut(row) {
                *slot = None;
            }
        }
        table.insert_column(metric.name(), values);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::{MockTimeseriesSource, SeriesResponse};
    use crate::domain::{Bounds, FilterBounds, FilterMode, NormalizedMetric};
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 9, 1, 0, 0, 0).unwrap()
    }

    fn rows(n: usize) -> Dataset {
        let times = (0..n as i64).map(|i| start() + Duration::minutes(5 * i)).collect();
        Tag::required().fold(Dataset::new(times), |ds, tag| {
            let value = match tag {
                Tag::Fit1 => 40.0,
                Tag::Fit2 => 5.0,
                Tag::Fit3 => 30.0,
                Tag::Cit1 => 800.0,
                Tag::Cit2 => 6.0,
                Tag::Cit3 => 25.0,
                Tag::Pt2 => 180.0,
                Tag::Pt3 => 170.0,
                Tag::Pt7 => 10.0,
                Tag::Tt1 => 68.0,
                Tag::LastCcdVr => 80.0,
                _ => 1.0,
            };
            ds.with_column(tag.name(), vec![Some(value); n])
        })
    }

    fn baseline() -> BaselineRecord {
        let data = rows(1);
        Tag::required().fold(BaselineRecord::new(Some(start())), |record, tag| {
            record.with_value(tag, data.value(tag.name(), 0))
        })
    }

    fn request(metrics: Vec<NormalizedMetric>) -> NormalizationRequest {
        NormalizationRequest::new("RO1", start(), start() + Duration::days(1), metrics)
    }

    fn source_returning(data: Dataset) -> Arc<dyn TimeseriesSource> {
        let mut source = MockTimeseriesSource::new();
        source.expect_get_data().times(1).returning(move |_| {
            Ok(vec![SeriesResponse {
                name: NORMALIZATION_REQUEST_NAME.into(),
                data: data.clone(),
            }])
        });
        Arc::new(source)
    }

    #[tokio::test]
    async fn test_projects_time_and_requested_metrics() {
        let engine = NormalizationEngine::new(source_returning(rows(10)));
        let table = engine
            .run(&request(vec![NormalizedMetric::NetDrivingPressure]), &baseline())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(table.len(), 10);
        assert_eq!(
            table.column_names().collect::<Vec<_>>(),
            vec!["net_driving_pressure"]
        );
        assert!(table
            .column("net_driving_pressure")
            .unwrap()
            .iter()
            .all(|v| v.is_some()));
    }

    #[tokio::test]
    async fn test_baseline_rows_normalize_to_raw_quantities() {
        let engine = NormalizationEngine::new(source_returning(rows(3)));
        let table = engine
            .run(&request(vec![NormalizedMetric::PermeateFlow]), &baseline())
            .await
            .unwrap()
            .unwrap();
        // every row equals the baseline, so normalized permeate flow is FIT3
        for value in table.column("normalized_permeate_flow").unwrap() {
            assert!((value.unwrap() - 30.0).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_empty_fetch_is_an_error() {
        let engine = NormalizationEngine::new(source_returning(Dataset::default()));
        let err = engine
            .run(&request(vec![NormalizedMetric::Flux]), &baseline())
            .await
            .unwrap_err();
        assert!(matches!(err, NormalizationError::EmptyTimeseriesResult(_)));
    }

    #[tokio::test]
    async fn test_missing_response_is_no_data_found() {
        let mut source = MockTimeseriesSource::new();
        source.expect_get_data().returning(|_| Ok(vec![]));
        let engine = NormalizationEngine::new(Arc::new(source));
        let err = engine
            .run(&request(vec![NormalizedMetric::Flux]), &baseline())
            .await
            .unwrap_err();
        assert!(matches!(err, NormalizationError::NoTimeseriesDataFound { .. }));
    }

    #[tokio::test]
    async fn test_filtered_to_zero_rows_is_none() {
        let engine = NormalizationEngine::new(source_returning(rows(4)));
        let request = request(vec![NormalizedMetric::Flux]).with_filters(
            FilterBounds::new(Bounds::new(0.0, 50.0), Bounds::default(), Bounds::default()),
            FilterMode::DropRows,
        );
        let report = engine.run_report(&request, &baseline()).await.unwrap();
        assert!(report.table.is_none());
        assert_eq!(report.removed_rows, 4);
    }

    #[tokio::test]
    async fn test_null_mode_withholds_metrics_of_violating_rows() {
        let mut data = rows(3);
        data.insert_column("FIT1", vec![Some(40.0), Some(90.0), Some(40.0)]);
        let engine = NormalizationEngine::new(source_returning(data));
        let request = request(vec![NormalizedMetric::Flux, NormalizedMetric::NetDrivingPressure])
            .with_filters(
                FilterBounds::new(Bounds::default(), Bounds::new(0.0, 50.0), Bounds::default()),
                FilterMode::NullColumns,
            );

        let report = engine.run_report(&request, &baseline()).await.unwrap();
        assert_eq!(report.nulled_rows, 1);
        let table = report.table.unwrap();
        assert_eq!(table.len(), 3);
        for metric in ["normalized_flux", "net_driving_pressure"] {
            let column = table.column(metric).unwrap();
            assert!(column[0].is_some());
            assert_eq!(column[1], None);
            assert!(column[2].is_some());
        }
    }

    #[tokio::test]
    async fn test_invalid_baseline_rejected_before_fetch() {
        let mut source = MockTimeseriesSource::new();
        source.expect_get_data().never();
        let engine = NormalizationEngine::new(Arc::new(source));

        let mut record = baseline();
        record.values.remove("M_DP");
        let err = engine
            .run(&request(vec![NormalizedMetric::Flux]), &record)
            .await
            .unwrap_err();
        assert!(
            matches!(err, NormalizationError::MissingBaselineTag(tags) if tags == vec!["M_DP"])
        );
    }

    #[tokio::test]
    async fn test_extra_tags_pass_through() {
        let mut data = rows(2);
        data.insert_column("TAG037", vec![Some(7.0), None]);
        let mut source = MockTimeseriesSource::new();
        source
            .expect_get_data()
            .withf(|requests| requests[0].tags["TAG037"].sensor_id == "TAG037")
            .returning(move |_| {
                Ok(vec![SeriesResponse {
                    name: NORMALIZATION_REQUEST_NAME.into(),
                    data: data.clone(),
                }])
            });
        let engine = NormalizationEngine::new(Arc::new(source));
        let request =
            request(vec![NormalizedMetric::SaltPassage]).with_extra_tags(vec!["TAG037".into()]);

        let table = engine.run(&request, &baseline()).await.unwrap().unwrap();
        assert_eq!(table.column("TAG037").unwrap(), &[Some(7.0), None]);
        assert!(table.has_column("normalized_salt_passage"));
        assert!(!table.has_column("FIT1"));
    }

    #[test]
    fn test_required_scalars_union() {
        let scalars = required_scalars(&request(vec![
            NormalizedMetric::NetDrivingPressure,
            NormalizedMetric::DifferentialPressure,
            NormalizedMetric::PermeateTds,
        ]));
        assert_eq!(scalars.len(), 4);
    }
}
