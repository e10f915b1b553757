use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{SeriesRequest, SeriesResponse, TimeseriesSource};
use crate::domain::Dataset;

/// In-memory source holding one table per system, with columns keyed by
/// sensor id.
///
/// Samples are returned as stored: rows inside `[start, end]` are selected and
/// sensor columns renamed to the logical tag names, without regrouping.
#[derive(Debug, Default)]
pub struct MemoryTimeseriesSource {
    systems: HashMap<String, Dataset>,
    calls: AtomicUsize,
}

impl MemoryTimeseriesSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system(mut self, system_id: impl Into<String>, data: Dataset) -> Self {
        self.systems.insert(system_id.into(), data);
        self
    }

    /// Number of `get_data` calls served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer(&self, request: &SeriesRequest) -> Dataset {
        let Some(stored) = self.systems.get(&request.system_id) else {
            return Dataset::default();
        };

        let rows: Vec<usize> = stored
            .times()
            .iter()
            .enumerate()
            .filter(|(_, t)| **t >= request.start && **t <= request.end)
            .map(|(row, _)| row)
            .collect();
        if rows.is_empty() {
            return Dataset::default();
        }

        let times = rows.iter().map(|&row| stored.times()[row]).collect();
        request
            .tags
            .iter()
            .fold(Dataset::new(times), |data, (logical, query)| {
                let values = rows
                    .iter()
                    .map(|&row| stored.value(&query.sensor_id, row))
                    .collect();
                data.with_column(logical.clone(), values)
            })
    }
}

#[async_trait]
impl TimeseriesSource for MemoryTimeseriesSource {
    async fn get_data(&self, requests: Vec<SeriesRequest>) -> Result<Vec<SeriesResponse>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(requests
            .iter()
            .map(|request| SeriesResponse {
                name: request.name.clone(),
                data: self.answer(request),
            })
            .collect())
    }
}
