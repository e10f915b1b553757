use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{
    Bounds, Dataset, FilterBounds, FilterMode, Tag, FEED_FLOW_TAG, RECOVERY_TAG,
    REJECT_CONDUCTIVITY_TAG,
};

/// Observed min/max of one quality column, rounded to two decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnRange {
    pub min: f64,
    pub max: f64,
}

/// Ranges of the quality columns before filtering
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct QualitySummary {
    pub recovery: Option<ColumnRange>,
    pub feed_flow: Option<ColumnRange>,
    pub reject_conductivity: Option<ColumnRange>,
}

#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub dataset: Dataset,
    /// Rows removed (drop mode)
    pub removed: usize,
    /// Rows whose quality columns were nulled (null mode)
    pub nulled: usize,
    /// Indices of the nulled rows; their metrics are withheld from the result
    pub invalidated: Vec<usize>,
    pub summary: QualitySummary,
}

/// Invalidates rows whose recovery, feed flow or reject conductivity fall
/// outside the configured bounds.
#[derive(Debug, Clone)]
pub struct QualityFilter {
    bounds: FilterBounds,
    mode: FilterMode,
}

fn quality_columns() -> [&'static str; 3] {
    [RECOVERY_TAG, FEED_FLOW_TAG, REJECT_CONDUCTIVITY_TAG].map(Tag::name)
}

impl QualityFilter {
    /// Negative lower bounds are clamped to zero.
    pub fn new(mut bounds: FilterBounds, mode: FilterMode) -> Self {
        for (name, range) in bounds.named_mut() {
            if range.low < 0.0 {
                warn!(filter = name, low = range.low, "filter has negative low bound, using 0");
                range.low = 0.0;
            }
        }
        debug!(
            recovery_low = bounds.recovery.low,
            recovery_high = bounds.recovery.high,
            feed_flow_low = bounds.feed_flow.low,
            feed_flow_high = bounds.feed_flow.high,
            reject_conductivity_low = bounds.reject_conductivity.low,
            reject_conductivity_high = bounds.reject_conductivity.high,
            ?mode,
            "quality filter bounds"
        );
        Self { bounds, mode }
    }

    pub fn bounds(&self) -> &FilterBounds {
        &self.bounds
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn apply(&self, mut dataset: Dataset) -> FilterOutcome {
        let summary = summarize(&dataset);
        debug!(?summary, "quality column ranges before filtering");

        let initial_rows = dataset.len();
        let violating: Vec<bool> = (0..initial_rows)
            .map(|row| self.violates(&dataset, row))
            .collect();

        let quality = quality_columns();
        let (removed, invalidated) = match self.mode {
            FilterMode::DropRows => {
                let all_missing: Vec<bool> = (0..initial_rows)
                    .map(|row| quality.iter().all(|c| dataset.value(c, row).is_none()))
                    .collect();
                dataset.retain_rows(|row| !violating[row] && !all_missing[row]);
                (initial_rows - dataset.len(), Vec::new())
            }
            FilterMode::NullColumns => {
                let rows: Vec<usize> = violating
                    .iter()
                    .enumerate()
                    .filter_map(|(row, v)| v.then_some(row))
                    .collect();
                for &row in &rows {
                    dataset.set_missing(row, &quality);
                }
                (0, rows)
            }
        };
        let nulled = invalidated.len();

        if !dataset.is_empty() {
            info!(removed, nulled, remaining = dataset.len(), "filtered rows");
        }
        FilterOutcome {
            dataset,
            removed,
            nulled,
            invalidated,
            summary,
        }
    }

    fn violates(&self, dataset: &Dataset, row: usize) -> bool {
        let outside = |column: &str, bounds: &Bounds| {
            dataset
                .value(column, row)
                .is_some_and(|value| !bounds.contains(value))
        };
        outside(RECOVERY_TAG.name(), &self.bounds.recovery)
            || outside(FEED_FLOW_TAG.name(), &self.bounds.feed_flow)
            || outside(REJECT_CONDUCTIVITY_TAG.name(), &self.bounds.reject_conductivity)
    }
}

fn summarize(dataset: &Dataset) -> QualitySummary {
    let range = |column: &str| {
        let (min, max) = dataset
            .column(column)?
            .iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .minmax()
            .into_option()?;
        Some(ColumnRange {
            min: round2(*min),
            max: round2(*max),
        })
    };
    QualitySummary {
        recovery: range(RECOVERY_TAG.name()),
        feed_flow: range(FEED_FLOW_TAG.name()),
        reject_conductivity: range(REJECT_CONDUCTIVITY_TAG.name()),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn dataset() -> Dataset {
        let t0 = Utc.with_ymd_and_hms(2022, 9, 1, 0, 0, 0).unwrap();
        Dataset::new((0..5).map(|i| t0 + Duration::minutes(i)).collect())
            .with_column(
                "Last_CCD_VR",
                vec![Some(80.0), Some(95.0), Some(80.0), None, Some(82.0)],
            )
            .with_column(
                "FIT1",
                vec![Some(40.0), Some(40.0), Some(40.0), None, Some(70.123)],
            )
            .with_column("CIT2", vec![Some(6.0), Some(6.0), Some(6.0), None, Some(6.0)])
            .with_column("PT2", vec![Some(180.0); 5])
    }

    fn bounds() -> FilterBounds {
        FilterBounds::new(
            Bounds::new(70.0, 90.0),
            Bounds::new(30.0, 60.0),
            Bounds::default(),
        )
    }

    #[test]
    fn test_drop_mode_removes_violating_and_empty_rows() {
        let outcome = QualityFilter::new(bounds(), FilterMode::DropRows).apply(dataset());
        // row 1 recovery too high, row 3 no quality data, row 4 feed flow too high
        assert_eq!(outcome.removed, 3);
        assert_eq!(outcome.dataset.len(), 2);
        assert_eq!(outcome.dataset.column("PT2").unwrap(), &[Some(180.0), Some(180.0)]);
    }

    #[test]
    fn test_null_mode_keeps_rows() {
        let outcome = QualityFilter::new(bounds(), FilterMode::NullColumns).apply(dataset());
        assert_eq!(outcome.dataset.len(), 5);
        assert_eq!(outcome.nulled, 2);
        assert_eq!(outcome.invalidated, vec![1, 4]);
        for row in [1, 4] {
            for column in quality_columns() {
                assert_eq!(outcome.dataset.value(column, row), None);
            }
            assert_eq!(outcome.dataset.value("PT2", row), Some(180.0));
        }
        assert_eq!(outcome.dataset.value("FIT1", 0), Some(40.0));
    }

    #[test]
    fn test_rows_within_bounds_untouched() {
        let input = dataset();
        let outcome = QualityFilter::new(FilterBounds::default(), FilterMode::NullColumns)
            .apply(input.clone());
        assert_eq!(outcome.dataset, input);
        assert!(outcome.invalidated.is_empty());
    }

    #[test]
    fn test_negative_lows_are_clamped() {
        let filter = QualityFilter::new(
            FilterBounds::new(
                Bounds::new(-5.0, 90.0),
                Bounds::default(),
                Bounds::new(-1.0, 10.0),
            ),
            FilterMode::DropRows,
        );
        assert_eq!(filter.bounds().recovery.low, 0.0);
        assert_eq!(filter.bounds().reject_conductivity.low, 0.0);
        assert_eq!(filter.bounds().recovery.high, 90.0);
    }

    #[test]
    fn test_quality_columns_follow_quality_tags() {
        assert_eq!(quality_columns(), ["Last_CCD_VR", "FIT1", "CIT2"]);
    }

    #[test]
    fn test_summary_reports_rounded_ranges() {
        let outcome = QualityFilter::new(bounds(), FilterMode::DropRows).apply(dataset());
        assert_eq!(outcome.summary.feed_flow, Some(ColumnRange { min: 40.0, max: 70.12 }));
        assert_eq!(outcome.summary.recovery, Some(ColumnRange { min: 80.0, max: 95.0 }));
    }
}
